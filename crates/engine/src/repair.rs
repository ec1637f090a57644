use std::collections::HashSet;
use std::time::Duration;

use allcomplete_buffer::WordSource;

use crate::budget::Deadline;

/// Result of checking one document's candidates for truncation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    pub words: Vec<String>,
    /// Words replaced by their extended forms
    pub repaired: usize,
    /// The budget ran out and the tail passed through unchecked
    pub budget_exhausted: bool,
}

/// Replace words the fast extractor cut short by their complete forms.
///
/// A word with no word-bounded occurrence in `source` is assumed to be missing
/// its last character; it is replaced by every one-character extension found,
/// or kept as-is when there is none. Words shorter than `min_len` are trusted.
/// Once `budget` is spent the remaining words are passed through unchanged.
pub fn repair_truncated(
    source: &dyn WordSource,
    words: Vec<String>,
    min_len: usize,
    budget: Duration,
) -> RepairOutcome {
    let deadline = Deadline::start(budget);
    let mut outcome = RepairOutcome {
        words: Vec::with_capacity(words.len()),
        ..RepairOutcome::default()
    };

    let mut pending = words.into_iter();
    while let Some(word) = pending.next() {
        if word.chars().count() < min_len {
            outcome.words.push(word);
        } else {
            match check_word(source, &word) {
                Ok(Some(extended)) => {
                    log::trace!("{} repaired {word:?} -> {extended:?}", source.id());
                    outcome.repaired += 1;
                    outcome.words.extend(extended);
                }
                Ok(None) => outcome.words.push(word),
                Err(err) => {
                    log::warn!(
                        "Truncation check failed in {}, passing words through: {err}",
                        source.id()
                    );
                    outcome.words.push(word);
                    outcome.words.extend(pending);
                    break;
                }
            }
        }

        if deadline.is_expired() {
            let rest: Vec<String> = pending.collect();
            if !rest.is_empty() {
                log::debug!(
                    "Repair budget of {:?} spent in {}, {} words unchecked",
                    deadline.budget(),
                    source.id(),
                    rest.len()
                );
                outcome.budget_exhausted = true;
                outcome.words.extend(rest);
            }
            break;
        }
    }

    outcome
}

/// `Some(forms)` when `word` is truncated and has extensions, `None` to keep it
fn check_word(
    source: &dyn WordSource,
    word: &str,
) -> allcomplete_buffer::Result<Option<Vec<String>>> {
    if source.find_first_word_bounded(word)?.is_some() {
        return Ok(None);
    }
    let mut seen = HashSet::new();
    let extended: Vec<String> = source
        .find_all_extended(word)?
        .into_iter()
        .filter(|form| seen.insert(form.clone()))
        .collect();
    Ok((!extended.is_empty()).then_some(extended))
}
