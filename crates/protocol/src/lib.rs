use anyhow::Result;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const RESPONSE_SCHEMA_VERSION: u32 = 1;

/// Why a response holds fewer candidates than a full pass would have produced
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum BudgetTruncation {
    /// The global aggregation budget ran out before every document was visited
    Timeout,
    /// Documents beyond `max_documents` were not considered
    MaxDocuments,
}

/// A completion request from the host editor
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct CompletionQuery {
    /// Text typed so far for the word under the cursor
    pub prefix: String,
    /// Cursor positions (character offsets) in the active document; the first one anchors extraction
    #[serde(default)]
    pub locations: Vec<usize>,
}

impl CompletionQuery {
    pub fn new(prefix: impl Into<String>, locations: Vec<usize>) -> Self {
        Self {
            prefix: prefix.into(),
            locations,
        }
    }

    #[must_use]
    pub fn cursor(&self) -> Option<usize> {
        self.locations.first().copied()
    }
}

/// One entry offered to the user
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct CompletionItem {
    /// What the completion popup shows
    pub label: String,
    /// What gets inserted, escaped for the host's insertion syntax
    pub insert_text: String,
    /// Display label of the document the word came from; absent for the active document
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl CompletionItem {
    #[must_use]
    pub fn as_pair(&self) -> (&str, &str) {
        (&self.label, &self.insert_text)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq, JsonSchema)]
pub struct AggregationStats {
    pub documents_considered: usize,
    pub documents_processed: usize,
    pub documents_excluded: usize,
    pub documents_failed: usize,
    pub candidates_collected: usize,
    pub repaired_words: usize,
    pub repair_budget_exhausted: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, JsonSchema)]
pub struct CompletionResponse {
    pub schema_version: u32,
    pub items: Vec<CompletionItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncation: Option<BudgetTruncation>,
    #[serde(default)]
    pub stats: AggregationStats,
}

impl CompletionResponse {
    #[must_use]
    pub fn new(
        items: Vec<CompletionItem>,
        truncation: Option<BudgetTruncation>,
        stats: AggregationStats,
    ) -> Self {
        Self {
            schema_version: RESPONSE_SCHEMA_VERSION,
            items,
            truncation,
            stats,
        }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), None, AggregationStats::default())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `(label, insert_text)` pairs in presentation order
    #[must_use]
    pub fn pairs(&self) -> Vec<(&str, &str)> {
        self.items.iter().map(CompletionItem::as_pair).collect()
    }

    #[must_use]
    pub fn insert_texts(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.insert_text.as_str()).collect()
    }
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

/// JSON Schema describing [`CompletionResponse`]
pub fn response_schema() -> Result<serde_json::Value> {
    serde_json::to_value(schemars::schema_for!(CompletionResponse)).map_err(Into::into)
}
