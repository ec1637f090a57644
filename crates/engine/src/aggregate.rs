use std::fmt;

use allcomplete_buffer::{DocumentId, WordSource};
use allcomplete_protocol::{AggregationStats, BudgetTruncation};

use crate::budget::Deadline;
use crate::filter::CandidateFilter;
use crate::repair::repair_truncated;
use crate::settings::{DocumentOrder, Settings};

/// A word together with the document it was collected from
#[derive(Clone)]
pub struct Candidate<'a> {
    pub word: String,
    pub source: &'a dyn WordSource,
}

impl<'a> Candidate<'a> {
    pub fn new(word: impl Into<String>, source: &'a dyn WordSource) -> Self {
        Self {
            word: word.into(),
            source,
        }
    }
}

impl fmt::Debug for Candidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Candidate")
            .field("word", &self.word)
            .field("source", &self.source.id())
            .finish()
    }
}

/// Everything one aggregation pass produced
#[derive(Debug, Clone, Default)]
pub struct AggregationReport<'a> {
    /// Candidates in collection order, duplicates included
    pub candidates: Vec<Candidate<'a>>,
    pub truncation: Option<BudgetTruncation>,
    pub stats: AggregationStats,
}

enum Visit {
    Collected,
    Excluded,
    Failed,
}

/// Collects candidates from the active document and then from the others,
/// under the limits of one settings snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Aggregator<'s> {
    settings: &'s Settings,
    filter: CandidateFilter,
}

impl<'s> Aggregator<'s> {
    #[must_use]
    pub const fn new(settings: &'s Settings) -> Self {
        Self {
            settings,
            filter: CandidateFilter::from_settings(settings),
        }
    }

    pub fn aggregate<'a>(
        &self,
        active: &'a dyn WordSource,
        cursor: Option<usize>,
        prefix: &str,
        others: &[&'a dyn WordSource],
    ) -> AggregationReport<'a> {
        let deadline = Deadline::start(self.settings.aggregation_budget);
        let mut report = AggregationReport::default();

        let mut active_failed = false;
        if !self.settings.excluded_scopes.is_empty() {
            match active.scope_at(cursor.unwrap_or(0)) {
                Ok(scope) if self.settings.excluded_scopes.is_excluded(&scope) => {
                    log::debug!("Completion disabled in scope '{scope}'");
                    report.stats.documents_considered = 1;
                    report.stats.documents_excluded = 1;
                    report.stats.elapsed_ms = deadline.elapsed_ms();
                    return report;
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("Cannot read scope of active document {}: {err}", active.id());
                    active_failed = true;
                }
            }
        }

        let (queue, capped) = self.queue(active.id(), others);
        if capped {
            report.truncation = Some(BudgetTruncation::MaxDocuments);
        }
        report.stats.documents_considered = 1 + queue.len();

        if active_failed {
            report.stats.documents_failed += 1;
        } else {
            let visit = self.visit(active, cursor, prefix, true, &mut report);
            record(&mut report.stats, &visit);
        }

        for (idx, &doc) in queue.iter().enumerate() {
            if deadline.is_expired() {
                log::debug!(
                    "Aggregation budget of {:?} spent, skipping {} documents",
                    deadline.budget(),
                    queue.len() - idx
                );
                report.truncation = Some(BudgetTruncation::Timeout);
                break;
            }
            let visit = self.visit(doc, None, prefix, false, &mut report);
            record(&mut report.stats, &visit);
        }

        report.stats.candidates_collected = report.candidates.len();
        report.stats.elapsed_ms = deadline.elapsed_ms();
        report
    }

    /// Other documents in visiting order, without the active one, capped.
    /// The flag is set when the cap dropped documents.
    fn queue<'a>(
        &self,
        active: DocumentId,
        others: &[&'a dyn WordSource],
    ) -> (Vec<&'a dyn WordSource>, bool) {
        let mut queue: Vec<&'a dyn WordSource> = others
            .iter()
            .copied()
            .filter(|doc| doc.id() != active)
            .collect();

        if self.settings.document_order == DocumentOrder::MostRecentlyActive {
            // Stable: unranked documents keep their relative order at the end
            queue.sort_by_key(|doc| std::cmp::Reverse(doc.activation_rank()));
        }

        let limit = self.settings.max_documents.saturating_sub(1);
        let capped = queue.len() > limit;
        if capped {
            log::debug!(
                "Considering {limit} of {} other documents (max_documents = {})",
                queue.len(),
                self.settings.max_documents
            );
            queue.truncate(limit);
        }
        (queue, capped)
    }

    fn visit<'a>(
        &self,
        doc: &'a dyn WordSource,
        anchor: Option<usize>,
        prefix: &str,
        is_active: bool,
        report: &mut AggregationReport<'a>,
    ) -> Visit {
        if self.source_excluded(doc) {
            log::debug!("Skipping {}: source excluded", doc.id());
            return Visit::Excluded;
        }

        if !is_active && !self.settings.excluded_scopes.is_empty() {
            match doc.document_scope() {
                Ok(scope) if self.settings.excluded_scopes.is_excluded(&scope) => {
                    log::debug!("Skipping {}: scope '{scope}' excluded", doc.id());
                    return Visit::Excluded;
                }
                Ok(_) => {}
                Err(err) => {
                    log::warn!("Skipping {}: {err}", doc.id());
                    return Visit::Failed;
                }
            }
        }

        let extracted = match anchor {
            Some(anchor) => doc.extract_candidates_near(prefix, anchor),
            None => doc.extract_candidates(prefix),
        };
        let words = match extracted {
            Ok(words) => words,
            Err(err) => {
                log::warn!("Skipping {}: {err}", doc.id());
                return Visit::Failed;
            }
        };

        let outcome = repair_truncated(
            doc,
            words,
            self.settings.repair_min_word_length,
            self.settings.repair_budget,
        );
        report.stats.repaired_words += outcome.repaired;
        if outcome.budget_exhausted {
            report.stats.repair_budget_exhausted += 1;
        }

        let kept = self.filter.apply(outcome.words);
        log::debug!("{} contributed {} candidates", doc.id(), kept.len());
        report
            .candidates
            .extend(kept.into_iter().map(|word| Candidate::new(word, doc)));
        Visit::Collected
    }

    fn source_excluded(&self, doc: &dyn WordSource) -> bool {
        let rules = &self.settings.excluded_sources;
        if rules.is_empty() {
            return false;
        }
        [doc.source_name(), doc.label()]
            .into_iter()
            .flatten()
            .any(|name| rules.is_excluded(&name))
    }
}

fn record(stats: &mut AggregationStats, visit: &Visit) {
    match visit {
        Visit::Collected => stats.documents_processed += 1,
        Visit::Excluded => stats.documents_excluded += 1,
        Visit::Failed => stats.documents_failed += 1,
    }
}
