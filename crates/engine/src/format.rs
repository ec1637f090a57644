use allcomplete_buffer::DocumentId;
use allcomplete_protocol::CompletionItem;

use crate::aggregate::Candidate;

/// Turn deduplicated candidates into popup entries.
///
/// Words from other documents carry their document's label after a tab so the
/// popup shows where they came from.
#[must_use]
pub fn format_candidates(candidates: &[Candidate<'_>], active: DocumentId) -> Vec<CompletionItem> {
    candidates
        .iter()
        .map(|candidate| {
            let display = display_word(&candidate.word);
            if candidate.source.id() == active {
                CompletionItem {
                    label: display.to_string(),
                    insert_text: escape_insertion(&candidate.word),
                    source: None,
                }
            } else {
                let origin = candidate.source.label().unwrap_or_default();
                CompletionItem {
                    label: format!("{display}\t({origin})"),
                    insert_text: escape_insertion(&candidate.word),
                    source: Some(origin),
                }
            }
        })
        .collect()
}

/// Word as shown in the popup: anything from the first `(` on is dropped
#[must_use]
pub fn display_word(word: &str) -> &str {
    word.find('(').map_or(word, |idx| &word[..idx])
}

/// Escape characters the host's insertion syntax treats specially
#[must_use]
pub fn escape_insertion(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for ch in word.chars() {
        if matches!(ch, '\\' | '$') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
