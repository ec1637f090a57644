//! # AllComplete Engine
//!
//! Aggregates completion candidates from every open document into one
//! deduplicated list, active document first.
//!
//! ```text
//! CompletionQuery
//!     │
//!     ▼
//! Aggregator ── per document: extract ─> repair ─> filter
//!     │            (cursor scope and source exclusions, time budgets)
//!     ▼
//! dedupe ─> format ─> CompletionResponse
//! ```
//!
//! Settings are loaded from JSON or TOML into an immutable [`Settings`]
//! snapshot; [`SettingsStore`] swaps snapshots atomically on reload.
//!
//! ## Example
//!
//! ```rust
//! use allcomplete_buffer::{TextBuffer, WordSource};
//! use allcomplete_engine::{CompletionEngine, Settings};
//! use allcomplete_protocol::CompletionQuery;
//!
//! let engine = CompletionEngine::new(Settings::default());
//! let active = TextBuffer::new("let total = totals.len();");
//! let other = TextBuffer::new("fn totally() {}").with_path("util.rs");
//! let others: [&dyn WordSource; 1] = [&other];
//!
//! let response = engine.complete(&CompletionQuery::new("tot", vec![8]), &active, &others);
//! assert_eq!(response.insert_texts(), vec!["total", "totals", "totally"]);
//! assert_eq!(response.items[2].label, "totally\t(util.rs)");
//! ```

mod aggregate;
mod budget;
mod dedupe;
mod engine;
mod filter;
mod format;
mod repair;
mod scope;
mod settings;
mod store;

pub use aggregate::{AggregationReport, Aggregator, Candidate};
pub use budget::Deadline;
pub use dedupe::dedupe;
pub use engine::{complete_with, CompletionEngine};
pub use filter::CandidateFilter;
pub use format::{display_word, escape_insertion, format_candidates};
pub use repair::{repair_truncated, RepairOutcome};
pub use scope::{MatchKind, ScopeFilter};
pub use settings::{DocumentOrder, Settings, SETTINGS_SCHEMA_VERSION};
pub use store::SettingsStore;
