use std::cell::Cell;
use std::time::Duration;

use allcomplete_buffer::{DocumentId, Result, TextBuffer, WordMatch, WordSource};
use allcomplete_engine::{complete_with, ScopeFilter, Settings};
use allcomplete_protocol::{BudgetTruncation, CompletionQuery, CompletionResponse};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn unlimited() -> Settings {
    Settings::default().with_budgets(Duration::from_secs(3600), Duration::from_secs(3600))
}

/// Returns a fixed extraction result and answers searches from the real text
struct Scripted {
    inner: TextBuffer,
    extracted: Vec<String>,
}

impl Scripted {
    fn new(text: &str, extracted: &[&str]) -> Self {
        Self {
            inner: TextBuffer::new(text),
            extracted: extracted.iter().map(|w| w.to_string()).collect(),
        }
    }
}

impl WordSource for Scripted {
    fn id(&self) -> DocumentId {
        self.inner.id()
    }

    fn label(&self) -> Option<String> {
        Some("scripted".to_string())
    }

    fn scope_at(&self, position: usize) -> Result<String> {
        self.inner.scope_at(position)
    }

    fn extract_candidates(&self, _prefix: &str) -> Result<Vec<String>> {
        Ok(self.extracted.clone())
    }

    fn extract_candidates_near(&self, _prefix: &str, _anchor: usize) -> Result<Vec<String>> {
        Ok(self.extracted.clone())
    }

    fn find_first_word_bounded(&self, word: &str) -> Result<Option<WordMatch>> {
        self.inner.find_first_word_bounded(word)
    }

    fn find_all_extended(&self, word: &str) -> Result<Vec<String>> {
        self.inner.find_all_extended(word)
    }
}

/// Counts how often words are read out of the wrapped buffer
struct Spy {
    inner: TextBuffer,
    extractions: Cell<usize>,
}

impl Spy {
    fn new(inner: TextBuffer) -> Self {
        Self {
            inner,
            extractions: Cell::new(0),
        }
    }
}

impl WordSource for Spy {
    fn id(&self) -> DocumentId {
        self.inner.id()
    }

    fn label(&self) -> Option<String> {
        self.inner.label()
    }

    fn scope_at(&self, position: usize) -> Result<String> {
        self.inner.scope_at(position)
    }

    fn document_scope(&self) -> Result<String> {
        self.inner.document_scope()
    }

    fn extract_candidates(&self, prefix: &str) -> Result<Vec<String>> {
        self.extractions.set(self.extractions.get() + 1);
        self.inner.extract_candidates(prefix)
    }

    fn extract_candidates_near(&self, prefix: &str, anchor: usize) -> Result<Vec<String>> {
        self.extractions.set(self.extractions.get() + 1);
        self.inner.extract_candidates_near(prefix, anchor)
    }

    fn find_first_word_bounded(&self, word: &str) -> Result<Option<WordMatch>> {
        self.inner.find_first_word_bounded(word)
    }

    fn find_all_extended(&self, word: &str) -> Result<Vec<String>> {
        self.inner.find_all_extended(word)
    }
}

fn run(
    settings: &Settings,
    prefix: &str,
    cursor: usize,
    active: &dyn WordSource,
    others: &[&dyn WordSource],
) -> CompletionResponse {
    complete_with(
        settings,
        &CompletionQuery::new(prefix, vec![cursor]),
        active,
        others,
    )
}

#[test]
fn end_to_end_with_provenance() {
    let active = TextBuffer::new("x = foo; fo");
    let a = TextBuffer::new("food = 1").with_path("/proj/a.txt");
    let b = TextBuffer::new("foobar(food)").with_path("/proj/b.txt");
    let others: [&dyn WordSource; 2] = [&a, &b];

    let response = run(&unlimited(), "fo", 11, &active, &others);
    assert_eq!(
        response.pairs(),
        vec![
            ("foo", "foo"),
            ("food\t(a.txt)", "food"),
            ("foobar\t(b.txt)", "foobar"),
        ]
    );
    assert_eq!(response.items[0].source, None);
    assert_eq!(response.items[2].source.as_deref(), Some("b.txt"));
    assert_eq!(response.truncation, None);
}

#[test]
fn truncated_candidate_is_repaired() {
    let active = Scripted::new("we set the width here", &["widt"]);
    let response = run(&unlimited(), "wid", 0, &active, &[]);
    assert_eq!(response.insert_texts(), vec!["width"]);
    assert_eq!(response.stats.repaired_words, 1);
}

#[test]
fn truncated_candidate_without_extension_is_kept() {
    let active = Scripted::new("window widths", &["widt"]);
    let response = run(&unlimited(), "wid", 0, &active, &[]);
    assert_eq!(response.insert_texts(), vec!["widt"]);
    assert_eq!(response.stats.repaired_words, 0);
}

#[test]
fn spent_budget_returns_first_document_only() {
    let active = TextBuffer::new("lorem lorax");
    let second = TextBuffer::new("loremipsum");
    let third = TextBuffer::new("lorentz");
    let others: [&dyn WordSource; 2] = [&second, &third];

    let settings = Settings::default().with_budgets(Duration::from_secs(3600), Duration::ZERO);
    let response = run(&settings, "lor", 0, &active, &others);
    assert_eq!(response.insert_texts(), vec!["lorem", "lorax"]);
    assert_eq!(response.truncation, Some(BudgetTruncation::Timeout));
}

#[test]
fn excluded_cursor_scope_reads_no_words() {
    let active = Spy::new(
        TextBuffer::new("print(\"fooba\") foobar").with_scope_region(6..13, "string.quoted"),
    );
    let other = Spy::new(TextBuffer::new("football"));
    let others: [&dyn WordSource; 1] = [&other];

    let settings = Settings {
        excluded_scopes: ScopeFilter::from_patterns(&["string"]).unwrap(),
        ..unlimited()
    };
    let response = run(&settings, "foo", 10, &active, &others);
    assert!(response.is_empty());
    assert_eq!(active.extractions.get(), 0);
    assert_eq!(other.extractions.get(), 0);

    let response = run(&settings, "foo", 21, &active, &others);
    assert_eq!(response.insert_texts(), vec!["foobar", "fooba", "football"]);
    assert_eq!(active.extractions.get(), 1);
}

#[test]
fn per_document_cap_is_enforced() {
    let text: Vec<String> = (0..50).map(|i| format!("item{i:02}")).collect();
    let active = TextBuffer::new(text.join(" "));
    let settings = Settings {
        max_candidates_per_document: 5,
        ..unlimited()
    };

    let response = run(&settings, "item", 0, &active, &[]);
    assert_eq!(
        response.insert_texts(),
        vec!["item00", "item01", "item02", "item03", "item04"]
    );
}

#[test]
fn duplicates_keep_the_active_document() {
    let active = TextBuffer::new("shared");
    let other = TextBuffer::new("shared shared_more").with_path("other.rs");
    let others: [&dyn WordSource; 1] = [&other];

    let response = run(&unlimited(), "sha", 0, &active, &others);
    assert_eq!(
        response.pairs(),
        vec![("shared", "shared"), ("shared_more\t(other.rs)", "shared_more")]
    );
}

#[test]
fn closed_other_document_is_tolerated() {
    let active = TextBuffer::new("gamma");
    let mut closed = TextBuffer::new("gammas").with_path("closed.txt");
    closed.close();
    let open = TextBuffer::new("gammaray").with_path("open.txt");
    let others: [&dyn WordSource; 2] = [&closed, &open];

    let response = run(&unlimited(), "gam", 5, &active, &others);
    assert_eq!(response.insert_texts(), vec!["gamma", "gammaray"]);
    assert_eq!(response.stats.documents_failed, 1);
}

#[test]
fn dollar_words_are_escaped() {
    let active = TextBuffer::new("");
    let other = Scripted::new("$price", &["$price"]);
    let others: [&dyn WordSource; 1] = [&other];
    let settings = Settings {
        repair_min_word_length: 100,
        ..unlimited()
    };

    let response = run(&settings, "", 0, &active, &others);
    assert_eq!(response.pairs(), vec![("$price\t(scripted)", "\\$price")]);
}

fn documents() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::collection::vec("[a-c]{1,7}", 0..25).prop_map(|words| words.join(" ")),
        1..5,
    )
}

proptest! {
    #[test]
    fn pipeline_invariants(texts in documents(), prefix in "[a-c]{0,2}") {
        let buffers: Vec<TextBuffer> = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| TextBuffer::new(text.as_str()).with_path(format!("doc{idx}.txt")))
            .collect();
        let (active, rest) = buffers.split_first().unwrap();
        let others: Vec<&dyn WordSource> = rest.iter().map(|b| b as &dyn WordSource).collect();
        let settings = unlimited();

        let first = run(&settings, &prefix, 0, active, &others);
        let second = run(&settings, &prefix, 0, active, &others);
        prop_assert_eq!(&first.items, &second.items);

        let mut seen = std::collections::HashSet::new();
        for item in &first.items {
            prop_assert!(seen.insert(item.insert_text.clone()), "duplicate {}", item.insert_text);
            let len = item.insert_text.chars().count();
            prop_assert!(len >= settings.min_word_length && len <= settings.max_word_length);
        }

        let first_other = first.items.iter().position(|item| item.source.is_some());
        if let Some(boundary) = first_other {
            prop_assert!(first.items[boundary..].iter().all(|item| item.source.is_some()));
        }
    }
}
