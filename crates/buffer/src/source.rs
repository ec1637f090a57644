use crate::error::Result;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DOCUMENT_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of an open document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Allocate a process-unique id
    #[must_use]
    pub fn next() -> Self {
        Self(NEXT_DOCUMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Location of a word-bounded match, in character offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordMatch {
    pub start: usize,
    pub end: usize,
}

impl WordMatch {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only word extraction and search over one open document.
///
/// The host owns the document; completion only borrows it for the duration
/// of a single query. Every method may fail when the handle went stale (for
/// example the buffer was closed mid-query), in which case the caller treats
/// the document as contributing nothing.
///
/// Positions are character offsets from the start of the document.
pub trait WordSource {
    fn id(&self) -> DocumentId;

    /// Short display label (usually the file name), `None` for unsaved buffers
    fn label(&self) -> Option<String>;

    /// Name matched against source exclusion rules (usually the full path)
    fn source_name(&self) -> Option<String> {
        self.label()
    }

    /// Larger values were active more recently; `None` when the host does not track it
    fn activation_rank(&self) -> Option<u64> {
        None
    }

    /// Space-separated scope stack at `position`, outermost first
    fn scope_at(&self, position: usize) -> Result<String>;

    /// Scope describing the document as a whole
    fn document_scope(&self) -> Result<String> {
        self.scope_at(0)
    }

    /// Words starting with `prefix`, in document order.
    ///
    /// The result may contain words missing their final character; callers
    /// are expected to verify them with [`WordSource::find_first_word_bounded`].
    fn extract_candidates(&self, prefix: &str) -> Result<Vec<String>>;

    /// Like [`WordSource::extract_candidates`], ordered by distance from `anchor`
    fn extract_candidates_near(&self, prefix: &str, anchor: usize) -> Result<Vec<String>>;

    /// First occurrence of `word` with a word boundary on both sides
    fn find_first_word_bounded(&self, word: &str) -> Result<Option<WordMatch>>;

    /// Distinct forms of `word` followed by exactly one word character and a boundary
    fn find_all_extended(&self, word: &str) -> Result<Vec<String>>;
}

impl<T: WordSource + ?Sized> WordSource for &T {
    fn id(&self) -> DocumentId {
        (**self).id()
    }

    fn label(&self) -> Option<String> {
        (**self).label()
    }

    fn source_name(&self) -> Option<String> {
        (**self).source_name()
    }

    fn activation_rank(&self) -> Option<u64> {
        (**self).activation_rank()
    }

    fn scope_at(&self, position: usize) -> Result<String> {
        (**self).scope_at(position)
    }

    fn document_scope(&self) -> Result<String> {
        (**self).document_scope()
    }

    fn extract_candidates(&self, prefix: &str) -> Result<Vec<String>> {
        (**self).extract_candidates(prefix)
    }

    fn extract_candidates_near(&self, prefix: &str, anchor: usize) -> Result<Vec<String>> {
        (**self).extract_candidates_near(prefix, anchor)
    }

    fn find_first_word_bounded(&self, word: &str) -> Result<Option<WordMatch>> {
        (**self).find_first_word_bounded(word)
    }

    fn find_all_extended(&self, word: &str) -> Result<Vec<String>> {
        (**self).find_all_extended(word)
    }
}
