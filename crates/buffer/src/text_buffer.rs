use crate::error::{BufferError, Result};
use crate::source::{DocumentId, WordMatch, WordSource};
use crate::syntax::Syntax;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::ops::Range;
use std::path::{Path, PathBuf};

static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("word pattern must compile"));

/// A scope layered over part of a buffer (string literal, comment, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRegion {
    /// Character range covered by the scope
    pub range: Range<usize>,
    pub scope: String,
}

#[derive(Debug, Clone, Copy)]
struct WordSpan<'a> {
    text: &'a str,
    start: usize,
    end: usize,
}

impl WordSpan<'_> {
    fn distance_to(&self, anchor: usize) -> usize {
        if anchor < self.start {
            self.start - anchor
        } else if anchor > self.end {
            anchor - self.end
        } else {
            0
        }
    }
}

/// In-memory document backed by a plain string, searched with regular expressions.
///
/// Words are runs of Unicode word characters. Prefix matching ignores case, and a
/// word identical to the prefix (the word being typed) is never offered.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    id: DocumentId,
    text: String,
    path: Option<PathBuf>,
    syntax: Syntax,
    regions: Vec<ScopeRegion>,
    activation_rank: Option<u64>,
    closed: bool,
}

impl TextBuffer {
    /// Create an unsaved buffer
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: DocumentId::next(),
            text: text.into(),
            path: None,
            syntax: Syntax::PlainText,
            regions: Vec::new(),
            activation_rank: None,
            closed: false,
        }
    }

    /// Load a buffer from disk, deriving its syntax from the extension
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let buffer = Self::new(text).with_path(path);
        log::debug!(
            "Opened {} as {} ({} chars)",
            path.display(),
            buffer.id,
            buffer.len_chars()
        );
        Ok(buffer)
    }

    /// Builder: override the document id
    #[must_use]
    pub const fn with_id(mut self, id: DocumentId) -> Self {
        self.id = id;
        self
    }

    /// Builder: attach a file path (also sets the syntax)
    #[must_use]
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        self.syntax = Syntax::from_path(&path);
        self.path = Some(path);
        self
    }

    /// Builder: set syntax explicitly
    #[must_use]
    pub const fn with_syntax(mut self, syntax: Syntax) -> Self {
        self.syntax = syntax;
        self
    }

    /// Builder: layer a scope over a character range
    #[must_use]
    pub fn with_scope_region(mut self, range: Range<usize>, scope: impl Into<String>) -> Self {
        self.regions.push(ScopeRegion {
            range,
            scope: scope.into(),
        });
        self
    }

    /// Builder: set the activation rank used by most-recently-active ordering
    #[must_use]
    pub const fn with_activation_rank(mut self, rank: u64) -> Self {
        self.activation_rank = Some(rank);
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    #[must_use]
    pub const fn syntax(&self) -> Syntax {
        self.syntax
    }

    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.text.chars().count()
    }

    /// Mark the buffer closed; every later read fails with [`BufferError::Closed`]
    pub fn close(&mut self) {
        self.closed = true;
    }

    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(BufferError::Closed(self.id));
        }
        Ok(())
    }

    fn check_position(&self, position: usize) -> Result<()> {
        let len = self.len_chars();
        if position > len {
            return Err(BufferError::InvalidPosition {
                id: self.id,
                position,
                len,
            });
        }
        Ok(())
    }

    fn words(&self) -> Vec<WordSpan<'_>> {
        let mut spans = Vec::new();
        let mut byte_cursor = 0;
        let mut char_cursor = 0;
        for m in WORD.find_iter(&self.text) {
            char_cursor += self.text[byte_cursor..m.start()].chars().count();
            let len = m.as_str().chars().count();
            spans.push(WordSpan {
                text: m.as_str(),
                start: char_cursor,
                end: char_cursor + len,
            });
            char_cursor += len;
            byte_cursor = m.end();
        }
        spans
    }

    fn char_offset(&self, byte: usize) -> usize {
        self.text[..byte].chars().count()
    }
}

fn matches_prefix(word: &str, prefix: &str) -> bool {
    if word == prefix {
        return false;
    }
    prefix.is_empty() || word.to_lowercase().starts_with(&prefix.to_lowercase())
}

impl WordSource for TextBuffer {
    fn id(&self) -> DocumentId {
        self.id
    }

    fn label(&self) -> Option<String> {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    }

    fn source_name(&self) -> Option<String> {
        self.path.as_ref().map(|p| p.display().to_string())
    }

    fn activation_rank(&self) -> Option<u64> {
        self.activation_rank
    }

    fn scope_at(&self, position: usize) -> Result<String> {
        self.ensure_open()?;
        self.check_position(position)?;
        let mut scope = self.syntax.scope().to_string();
        for region in &self.regions {
            if region.range.contains(&position) {
                scope.push(' ');
                scope.push_str(&region.scope);
            }
        }
        Ok(scope)
    }

    fn document_scope(&self) -> Result<String> {
        self.ensure_open()?;
        Ok(self.syntax.scope().to_string())
    }

    fn extract_candidates(&self, prefix: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for span in self.words() {
            if matches_prefix(span.text, prefix) && seen.insert(span.text) {
                out.push(span.text.to_string());
            }
        }
        Ok(out)
    }

    fn extract_candidates_near(&self, prefix: &str, anchor: usize) -> Result<Vec<String>> {
        self.ensure_open()?;
        self.check_position(anchor)?;

        // word -> (closest distance, first occurrence index)
        let mut best: HashMap<&str, (usize, usize)> = HashMap::new();
        for (idx, span) in self.words().into_iter().enumerate() {
            if !matches_prefix(span.text, prefix) {
                continue;
            }
            let distance = span.distance_to(anchor);
            best.entry(span.text)
                .and_modify(|entry| entry.0 = entry.0.min(distance))
                .or_insert((distance, idx));
        }

        let mut ranked: Vec<(&str, (usize, usize))> = best.into_iter().collect();
        ranked.sort_by_key(|(_, key)| *key);
        Ok(ranked.into_iter().map(|(word, _)| word.to_string()).collect())
    }

    fn find_first_word_bounded(&self, word: &str) -> Result<Option<WordMatch>> {
        self.ensure_open()?;
        if word.is_empty() {
            return Ok(None);
        }
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(word)))?;
        Ok(pattern.find(&self.text).map(|m| {
            let start = self.char_offset(m.start());
            WordMatch {
                start,
                end: start + m.as_str().chars().count(),
            }
        }))
    }

    fn find_all_extended(&self, word: &str) -> Result<Vec<String>> {
        self.ensure_open()?;
        if word.is_empty() {
            return Ok(Vec::new());
        }
        let pattern = Regex::new(&format!(r"\b{}\w\b", regex::escape(word)))?;
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for m in pattern.find_iter(&self.text) {
            if seen.insert(m.as_str()) {
                out.push(m.as_str().to_string());
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn extracts_prefix_words_in_document_order() {
        let buffer = TextBuffer::new("widget width Widow wid window widget");
        let words = buffer.extract_candidates("wid").unwrap();
        assert_eq!(words, vec!["widget", "width", "Widow"]);
    }

    #[test]
    fn empty_prefix_yields_every_word() {
        let buffer = TextBuffer::new("a b a c");
        assert_eq!(buffer.extract_candidates("").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn near_extraction_orders_by_distance() {
        let buffer = TextBuffer::new("foobar xx fo foo food");
        let words = buffer.extract_candidates_near("fo", 12).unwrap();
        assert_eq!(words, vec!["foo", "food", "foobar"]);
    }

    #[test]
    fn near_extraction_rejects_out_of_range_anchor() {
        let buffer = TextBuffer::new("abc");
        let err = buffer.extract_candidates_near("a", 10).unwrap_err();
        assert!(matches!(err, BufferError::InvalidPosition { len: 3, .. }));
    }

    #[test]
    fn word_bounded_search_uses_char_offsets() {
        let buffer = TextBuffer::new("größe width");
        let found = buffer.find_first_word_bounded("width").unwrap().unwrap();
        assert_eq!(found, WordMatch { start: 6, end: 11 });
        assert!(buffer.find_first_word_bounded("widt").unwrap().is_none());
    }

    #[test]
    fn extended_search_finds_one_char_extensions() {
        let buffer = TextBuffer::new("width widths widget wide awidt");
        let found = buffer.find_all_extended("wid").unwrap();
        assert_eq!(found, vec!["wide"]);
        let found = buffer.find_all_extended("widt").unwrap();
        assert_eq!(found, vec!["width"]);
    }

    #[test]
    fn scope_includes_regions() {
        let buffer = TextBuffer::new("let s = \"quoted\";")
            .with_syntax(Syntax::Rust)
            .with_scope_region(8..16, "string.quoted.double");
        assert_eq!(buffer.scope_at(2).unwrap(), "source.rust");
        assert_eq!(
            buffer.scope_at(10).unwrap(),
            "source.rust string.quoted.double"
        );
        assert_eq!(buffer.document_scope().unwrap(), "source.rust");
    }

    #[test]
    fn closed_buffer_rejects_reads() {
        let mut buffer = TextBuffer::new("alpha");
        assert!(!buffer.is_closed());
        buffer.close();
        assert!(buffer.is_closed());
        assert!(matches!(
            buffer.extract_candidates("al"),
            Err(BufferError::Closed(_))
        ));
        assert!(buffer.find_all_extended("alph").is_err());
    }

    #[test]
    fn explicit_id_is_kept() {
        let buffer = TextBuffer::new("x").with_id(DocumentId::new(42));
        assert_eq!(buffer.id().get(), 42);
        assert_eq!(buffer.id(), DocumentId::new(42));
    }

    #[test]
    fn label_is_file_name() {
        let buffer = TextBuffer::new("x").with_path("/tmp/project/src/main.rs");
        assert_eq!(buffer.label().as_deref(), Some("main.rs"));
        assert_eq!(buffer.syntax(), Syntax::Rust);
        assert!(TextBuffer::new("x").label().is_none());
    }
}
