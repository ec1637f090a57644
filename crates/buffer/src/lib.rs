//! # AllComplete Buffer
//!
//! The read-only view completion has of an open editor document.
//!
//! A host editor implements [`WordSource`] for its own buffer type; the
//! engine only ever calls the operations below, borrowing the document for
//! the duration of one query:
//!
//! ```text
//! WordSource
//!     ├──> extract_candidates(prefix)            fast scan, may truncate
//!     ├──> extract_candidates_near(prefix, pos)  same, ordered by proximity
//!     ├──> find_first_word_bounded(word)         exact \bword\b search
//!     └──> find_all_extended(word)               \bword\w\b search
//! ```
//!
//! [`TextBuffer`] is a plain-string implementation used by the CLI host and
//! by tests.
//!
//! ## Example
//!
//! ```rust
//! use allcomplete_buffer::{TextBuffer, WordSource};
//!
//! let buffer = TextBuffer::new("let width = widget.width();");
//! let words = buffer.extract_candidates("wid").unwrap();
//! assert_eq!(words, vec!["width", "widget"]);
//! ```

mod error;
mod source;
mod syntax;
mod text_buffer;

pub use error::{BufferError, Result};
pub use source::{DocumentId, WordMatch, WordSource};
pub use syntax::Syntax;
pub use text_buffer::{ScopeRegion, TextBuffer};
