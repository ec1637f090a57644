use crate::settings::Settings;

/// Length bounds and per-document cap applied after repair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateFilter {
    pub min_len: usize,
    pub max_len: usize,
    pub max_count: usize,
}

impl CandidateFilter {
    #[must_use]
    pub const fn new(min_len: usize, max_len: usize, max_count: usize) -> Self {
        Self {
            min_len,
            max_len,
            max_count,
        }
    }

    #[must_use]
    pub const fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.min_word_length,
            settings.max_word_length,
            settings.max_candidates_per_document,
        )
    }

    /// Keep words whose char length is within bounds, then truncate to `max_count`
    #[must_use]
    pub fn apply(&self, words: Vec<String>) -> Vec<String> {
        words
            .into_iter()
            .filter(|word| {
                let len = word.chars().count();
                len >= self.min_len && len <= self.max_len
            })
            .take(self.max_count)
            .collect()
    }
}
