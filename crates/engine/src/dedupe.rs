use std::collections::HashSet;

use crate::aggregate::Candidate;

/// Drop repeated words, keeping the first occurrence and its source
#[must_use]
pub fn dedupe<'a>(candidates: Vec<Candidate<'a>>) -> Vec<Candidate<'a>> {
    let mut seen: HashSet<String> = HashSet::with_capacity(candidates.len());
    candidates
        .into_iter()
        .filter(|candidate| seen.insert(candidate.word.clone()))
        .collect()
}
