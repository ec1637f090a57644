use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    Prefix,
    Suffix,
    #[default]
    Contains,
    Glob,
}

#[derive(Clone, Debug)]
pub(crate) struct Matcher {
    kind: MatchKind,
    needle: String,
    glob: Option<GlobMatcher>,
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.needle == other.needle
    }
}

impl Matcher {
    pub(crate) fn new(kind: MatchKind, needle: &str) -> Result<Self> {
        let needle = needle.trim().to_ascii_lowercase();
        let glob = if kind == MatchKind::Glob {
            Some(
                GlobBuilder::new(&needle)
                    .literal_separator(true)
                    .build()
                    .with_context(|| format!("Invalid glob pattern '{needle}'"))?
                    .compile_matcher(),
            )
        } else {
            None
        };
        Ok(Self { kind, needle, glob })
    }

    pub(crate) fn matches(&self, haystack: &str) -> bool {
        match self.kind {
            MatchKind::Prefix => haystack.starts_with(&self.needle),
            MatchKind::Suffix => haystack.ends_with(&self.needle),
            MatchKind::Contains => haystack.contains(&self.needle),
            MatchKind::Glob => self.glob.as_ref().is_some_and(|g| g.is_match(haystack)),
        }
    }

    pub(crate) const fn kind(&self) -> MatchKind {
        self.kind
    }

    pub(crate) fn needle(&self) -> &str {
        &self.needle
    }
}

/// Set of exclusion patterns tested against scope labels or source names.
///
/// A label is excluded when any pattern matches the whole label or one of its
/// space-separated segments (`"source.python string.quoted"` has two).
/// Matching ignores ASCII case.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScopeFilter {
    matchers: Vec<Matcher>,
}

impl ScopeFilter {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Substring patterns; blank entries are ignored
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        Self::from_rules(patterns.iter().map(|p| (MatchKind::Contains, p.as_ref())))
    }

    pub fn from_rules<'a>(rules: impl IntoIterator<Item = (MatchKind, &'a str)>) -> Result<Self> {
        let mut matchers = Vec::new();
        for (kind, pattern) in rules {
            if pattern.trim().is_empty() {
                continue;
            }
            matchers.push(Matcher::new(kind, pattern)?);
        }
        Ok(Self { matchers })
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.matchers.len()
    }

    #[must_use]
    pub fn is_excluded(&self, label: &str) -> bool {
        if self.matchers.is_empty() {
            return false;
        }
        let lower = label.to_ascii_lowercase();
        self.matchers.iter().any(|m| {
            m.matches(&lower) || lower.split_whitespace().any(|segment| m.matches(segment))
        })
    }

    pub(crate) fn matchers(&self) -> &[Matcher] {
        &self.matchers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_any_part_of_scope() {
        let filter = ScopeFilter::from_patterns(&["string", "comment"]).unwrap();
        assert!(filter.is_excluded("source.python string.quoted.double"));
        assert!(filter.is_excluded("source.rust comment.line"));
        assert!(!filter.is_excluded("source.rust meta.function"));
    }

    #[test]
    fn prefix_matches_individual_segments() {
        let filter = ScopeFilter::from_rules([(MatchKind::Prefix, "string.")]).unwrap();
        assert!(filter.is_excluded("source.python string.quoted"));
        assert!(!filter.is_excluded("source.python meta.string"));
    }

    #[test]
    fn matching_ignores_case() {
        let filter = ScopeFilter::from_patterns(&["Comment"]).unwrap();
        assert!(filter.is_excluded("source.c COMMENT.block"));
    }

    #[test]
    fn glob_matches_source_paths() {
        let filter = ScopeFilter::from_rules([(MatchKind::Glob, "**/*.min.js")]).unwrap();
        assert!(filter.is_excluded("/srv/app/static/vendor.min.js"));
        assert!(!filter.is_excluded("/srv/app/static/app.js"));
    }

    #[test]
    fn blank_patterns_are_ignored() {
        let filter = ScopeFilter::from_patterns(&["", "   "]).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.is_excluded("anything"));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = ScopeFilter::from_rules([(MatchKind::Glob, "src/[")]).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid glob pattern"));
    }
}
