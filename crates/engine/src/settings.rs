use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::scope::{MatchKind, ScopeFilter};

pub const SETTINGS_SCHEMA_VERSION: u32 = 1;

const DEFAULT_MAX_DOCUMENTS: usize = 20;
const DEFAULT_MAX_CANDIDATES_PER_DOCUMENT: usize = 100;
const DEFAULT_MIN_WORD_LENGTH: usize = 3;
const DEFAULT_MAX_WORD_LENGTH: usize = 50;
const DEFAULT_REPAIR_MIN_WORD_LENGTH: usize = 3;
const DEFAULT_REPAIR_BUDGET_SECS: f64 = 0.01;
const DEFAULT_AGGREGATION_BUDGET_SECS: f64 = 0.1;

const TOP_LEVEL_KEYS: &[&str] = &[
    "schema_version",
    "max_documents",
    "max_candidates_per_document",
    "min_word_length",
    "max_word_length",
    "repair_min_word_length",
    "repair_budget_secs",
    "aggregation_budget_secs",
    "excluded_scopes",
    "excluded_sources",
    "document_order",
];
const RULE_KEYS: &[&str] = &["pattern", "kind"];

/// Order in which documents other than the active one are visited
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentOrder {
    /// Keep the order the host enumerated its documents in
    #[default]
    AsSupplied,
    /// Most recently active first; documents without a rank keep their order after ranked ones
    MostRecentlyActive,
}

/// Immutable configuration snapshot read at the start of every query
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    /// Documents considered per query, active document included
    pub max_documents: usize,

    /// Candidates kept from each document after length filtering
    pub max_candidates_per_document: usize,

    /// Shortest word offered (in characters)
    pub min_word_length: usize,

    /// Longest word offered (in characters)
    pub max_word_length: usize,

    /// Words shorter than this are trusted without truncation checks
    pub repair_min_word_length: usize,

    /// Time allowed for truncation repair in one document
    pub repair_budget: Duration,

    /// Time allowed for the whole aggregation pass
    pub aggregation_budget: Duration,

    /// Cursor/document scopes that disable completion
    pub excluded_scopes: ScopeFilter,

    /// Document sources (paths or labels) that never contribute candidates
    pub excluded_sources: ScopeFilter,

    pub document_order: DocumentOrder,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_documents: DEFAULT_MAX_DOCUMENTS,
            max_candidates_per_document: DEFAULT_MAX_CANDIDATES_PER_DOCUMENT,
            min_word_length: DEFAULT_MIN_WORD_LENGTH,
            max_word_length: DEFAULT_MAX_WORD_LENGTH,
            repair_min_word_length: DEFAULT_REPAIR_MIN_WORD_LENGTH,
            repair_budget: Duration::from_secs_f64(DEFAULT_REPAIR_BUDGET_SECS),
            aggregation_budget: Duration::from_secs_f64(DEFAULT_AGGREGATION_BUDGET_SECS),
            excluded_scopes: ScopeFilter::empty(),
            excluded_sources: ScopeFilter::empty(),
            document_order: DocumentOrder::AsSupplied,
        }
    }
}

impl Settings {
    pub fn from_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_bytes(&bytes)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Parse JSON or TOML settings; missing keys keep their defaults
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let raw = parse_raw(bytes)?;
        Self::from_raw(raw)
    }

    /// Builder: replace both time budgets
    #[must_use]
    pub const fn with_budgets(mut self, repair: Duration, aggregation: Duration) -> Self {
        self.repair_budget = repair;
        self.aggregation_budget = aggregation;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.min_word_length == 0 {
            return Err(anyhow!("min_word_length must be > 0"));
        }
        if self.min_word_length > self.max_word_length {
            return Err(anyhow!(
                "min_word_length ({}) cannot exceed max_word_length ({})",
                self.min_word_length,
                self.max_word_length
            ));
        }
        Ok(())
    }

    /// Effective settings in the same shape the loader accepts
    pub fn to_json(&self) -> Result<serde_json::Value> {
        let raw = RawSettings {
            schema_version: Some(SETTINGS_SCHEMA_VERSION),
            max_documents: Some(self.max_documents),
            max_candidates_per_document: Some(self.max_candidates_per_document),
            min_word_length: Some(self.min_word_length),
            max_word_length: Some(self.max_word_length),
            repair_min_word_length: Some(self.repair_min_word_length),
            repair_budget_secs: Some(self.repair_budget.as_secs_f64()),
            aggregation_budget_secs: Some(self.aggregation_budget.as_secs_f64()),
            excluded_scopes: raw_rules(&self.excluded_scopes),
            excluded_sources: raw_rules(&self.excluded_sources),
            document_order: Some(self.document_order),
        };
        serde_json::to_value(raw).context("Failed to serialize settings")
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        if let Some(schema_version) = raw.schema_version {
            if schema_version != SETTINGS_SCHEMA_VERSION {
                return Err(anyhow!(
                    "settings.schema_version {schema_version} is not supported (expected {SETTINGS_SCHEMA_VERSION})"
                ));
            }
        }

        let defaults = Self::default();
        let settings = Self {
            max_documents: raw.max_documents.unwrap_or(defaults.max_documents),
            max_candidates_per_document: raw
                .max_candidates_per_document
                .unwrap_or(defaults.max_candidates_per_document),
            min_word_length: raw.min_word_length.unwrap_or(defaults.min_word_length),
            max_word_length: raw.max_word_length.unwrap_or(defaults.max_word_length),
            repair_min_word_length: raw
                .repair_min_word_length
                .unwrap_or(defaults.repair_min_word_length),
            repair_budget: budget_from_secs("repair_budget_secs", raw.repair_budget_secs)?
                .unwrap_or(defaults.repair_budget),
            aggregation_budget: budget_from_secs(
                "aggregation_budget_secs",
                raw.aggregation_budget_secs,
            )?
            .unwrap_or(defaults.aggregation_budget),
            excluded_scopes: build_filter(&raw.excluded_scopes)
                .context("Invalid excluded_scopes")?,
            excluded_sources: build_filter(&raw.excluded_sources)
                .context("Invalid excluded_sources")?,
            document_order: raw.document_order.unwrap_or_default(),
        };
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
struct RawSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_version: Option<u32>,
    max_documents: Option<usize>,
    max_candidates_per_document: Option<usize>,
    min_word_length: Option<usize>,
    max_word_length: Option<usize>,
    repair_min_word_length: Option<usize>,
    repair_budget_secs: Option<f64>,
    aggregation_budget_secs: Option<f64>,
    #[serde(default)]
    excluded_scopes: Vec<RawRule>,
    #[serde(default)]
    excluded_sources: Vec<RawRule>,
    document_order: Option<DocumentOrder>,
}

/// Either a bare substring pattern or `{ pattern, kind }`
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum RawRule {
    Plain(String),
    Detailed {
        pattern: String,
        #[serde(default)]
        kind: MatchKind,
    },
}

impl RawRule {
    fn parts(&self) -> (MatchKind, &str) {
        match self {
            Self::Plain(pattern) => (MatchKind::Contains, pattern.as_str()),
            Self::Detailed { pattern, kind } => (*kind, pattern.as_str()),
        }
    }
}

fn build_filter(rules: &[RawRule]) -> Result<ScopeFilter> {
    ScopeFilter::from_rules(rules.iter().map(RawRule::parts))
}

fn raw_rules(filter: &ScopeFilter) -> Vec<RawRule> {
    filter
        .matchers()
        .iter()
        .map(|m| match m.kind() {
            MatchKind::Contains => RawRule::Plain(m.needle().to_string()),
            kind => RawRule::Detailed {
                pattern: m.needle().to_string(),
                kind,
            },
        })
        .collect()
}

fn budget_from_secs(key: &str, secs: Option<f64>) -> Result<Option<Duration>> {
    let Some(secs) = secs else {
        return Ok(None);
    };
    if !secs.is_finite() || secs < 0.0 {
        return Err(anyhow!("{key} must be a finite, non-negative number of seconds"));
    }
    Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|err| anyhow!("{key} is out of range: {err}"))
}

fn parse_raw(bytes: &[u8]) -> Result<RawSettings> {
    let value: serde_json::Value = match serde_json::from_slice(bytes) {
        Ok(value) => value,
        Err(json_err) => {
            let utf8 = std::str::from_utf8(bytes).map_err(|err| anyhow!("{json_err}; {err}"))?;
            let toml_value: toml::Value = toml::from_str(utf8).map_err(|toml_err| {
                anyhow!(
                    "Settings are not valid JSON or TOML ({json_err}); TOML parse error: {toml_err}"
                )
            })?;
            serde_json::to_value(toml_value)
                .map_err(|err| anyhow!("Failed to convert TOML settings to JSON: {err}"))?
        }
    };

    validate_settings_value(&value)?;
    serde_json::from_value(value).map_err(|err| anyhow!("Settings parse error: {err}"))
}

fn validate_settings_value(value: &serde_json::Value) -> Result<()> {
    let serde_json::Value::Object(root) = value else {
        return Err(anyhow!("Settings must be a JSON/TOML object"));
    };

    let mut unknown = Vec::new();
    for key in root.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            unknown.push(key.clone());
        }
    }

    for list in ["excluded_scopes", "excluded_sources"] {
        let Some(entries) = root.get(list) else {
            continue;
        };
        let serde_json::Value::Array(entries) = entries else {
            return Err(anyhow!("{list} must be a list of patterns"));
        };
        for (idx, entry) in entries.iter().enumerate() {
            match entry {
                serde_json::Value::String(_) => {}
                serde_json::Value::Object(rule) => {
                    for key in rule.keys() {
                        if !RULE_KEYS.contains(&key.as_str()) {
                            unknown.push(format!("{list}[{idx}].{key}"));
                        }
                    }
                    if !rule.contains_key("pattern") {
                        return Err(anyhow!("{list}[{idx}] is missing 'pattern'"));
                    }
                }
                _ => {
                    return Err(anyhow!(
                        "{list}[{idx}] must be a string or a {{ pattern, kind }} table"
                    ))
                }
            }
        }
    }

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(anyhow!("Settings have unknown fields: {}", unknown.join(", ")))
    }
}
