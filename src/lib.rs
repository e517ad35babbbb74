#![allow(clippy::too_many_arguments)]

//! known-words-store
//!
//! An embedded store and prefix tokenizer for learned transliteration
//! words and patterns. Transliteration engines use this crate to
//! remember which typed pattern produces which native-script word, to
//! find the longest such pattern at the front of arbitrary input, and
//! to ship learnings between installations as sharded text files.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use known_words_store::{Store, StoreConfig, learn, best_match};
//!
//! let mut store = Store::open(&db_path, StoreConfig::default())?;
//!
//! // Persist a word plus every pattern implied by its decomposition.
//! learn(&mut store, "malayalam", &decomposition, 1, &renderer)?;
//!
//! // Look up an exact learned pattern.
//! for candidate in best_match(&mut store, "malayaalam")? {
//!     println!("{} (confidence {})", candidate.word, candidate.confidence);
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │ tokenize_prefix()  — C3, longest prefix match + handoff    │
//! │ best_match() / suggestions() / delete_word()  — C4         │
//! │ export_learned() / export_full() / import()   — C5         │
//! └─────────────────────────┬─────────────────────────────────┘
//!                           │
//!                           ▼
//!                     learn()  — C2
//!                           │
//!                           ▼
//!                      Store  — C1 (rusqlite, WAL)
//! ```
//!
//! `SymbolTokenizer` and `Renderer` are the seams onto a surrounding
//! transliteration engine: this crate calls them, it does not implement
//! them.

pub mod config;
pub mod error;
pub mod exchange;
pub mod learner;
pub mod pool;
pub mod query;
pub mod store;
pub mod tokenizer;
pub mod types;

pub use config::StoreConfig;
pub use error::{CoreError, Result};
pub use exchange::{export_full, export_learned, import, ImportSummary, ProgressCallback};
pub use learner::{learn, LearnReport};
pub use query::{best_match, delete_word, suggestions, word_id_of};
pub use store::Store;
pub use tokenizer::tokenize_prefix;
pub use types::{
    Decomposition, MatchKind, Pattern, RenderedWord, Renderer, SymbolTokenizer, Token,
    TokenAlternatives, TokenKind, TokenSequence, TokenizeResult, TokenizerKind, Word, WordMatch,
};
