use std::sync::Arc;

use allcomplete_buffer::WordSource;
use allcomplete_protocol::{CompletionQuery, CompletionResponse};

use crate::aggregate::Aggregator;
use crate::dedupe::dedupe;
use crate::format::format_candidates;
use crate::settings::Settings;
use crate::store::SettingsStore;

/// Entry point a host calls on every completion request.
///
/// Holds no per-query state; each call reads one settings snapshot and runs
/// aggregation, deduplication and formatting against it.
#[derive(Debug, Clone, Default)]
pub struct CompletionEngine {
    store: Arc<SettingsStore>,
}

impl CompletionEngine {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_store(Arc::new(SettingsStore::new(settings)))
    }

    #[must_use]
    pub const fn with_store(store: Arc<SettingsStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<SettingsStore> {
        &self.store
    }

    pub fn complete<'a>(
        &self,
        query: &CompletionQuery,
        active: &'a dyn WordSource,
        others: &[&'a dyn WordSource],
    ) -> CompletionResponse {
        let settings = self.store.snapshot();
        complete_with(&settings, query, active, others)
    }
}

/// Run one query against an explicit settings snapshot
pub fn complete_with<'a>(
    settings: &Settings,
    query: &CompletionQuery,
    active: &'a dyn WordSource,
    others: &[&'a dyn WordSource],
) -> CompletionResponse {
    let report = Aggregator::new(settings).aggregate(active, query.cursor(), &query.prefix, others);
    let candidates = dedupe(report.candidates);
    let items = format_candidates(&candidates, active.id());
    log::debug!(
        "Prefix {:?}: {} items from {} documents in {}ms",
        query.prefix,
        items.len(),
        report.stats.documents_processed,
        report.stats.elapsed_ms
    );
    CompletionResponse::new(items, report.truncation, report.stats)
}
