//! Shared data shapes: rows persisted by the store, and the token
//! structures the learner, tokenizer and external collaborators pass
//! between each other.

use crate::error::CoreError;

/// A single token produced by a symbol tokenizer.
///
/// `pattern` is what gets concatenated into a stored pattern string;
/// `value` is the surface-form text a renderer would consume. Joiner and
/// non-joiner tokens render but never contribute to a pattern string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub pattern: String,
    pub value: String,
    pub kind: TokenKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Joiner,
    NonJoiner,
    Generic,
}

impl Token {
    pub fn new(pattern: impl Into<String>, value: impl Into<String>, kind: TokenKind) -> Self {
        Token {
            pattern: pattern.into(),
            value: value.into(),
            kind,
        }
    }

    /// Whether this token's pattern text should be concatenated when
    /// building a pattern string.
    pub fn contributes_to_pattern(&self) -> bool {
        !matches!(self.kind, TokenKind::Joiner | TokenKind::NonJoiner)
    }
}

/// One position's alternatives in a token decomposition, e.g. all the
/// distinct ways a single grapheme could have been typed.
pub type TokenAlternatives = Vec<Token>;

/// `L1 x L2 x ... x Lk` — the learner's input shape, and also what a
/// symbol tokenizer returns: one entry per position, each holding that
/// position's alternative tokens.
pub type Decomposition = Vec<TokenAlternatives>;

/// A single concrete choice, one token per position.
pub type TokenSequence = Vec<Token>;

/// The prefix tokenizer's output: up to `PATTERN_LOOKUP_CAP_PER_STEP`
/// alternative full token sequences, each a candidate rendering of the
/// input.
pub type TokenizeResult = Vec<TokenSequence>;

/// A persisted word row.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub id: i64,
    pub text: String,
    pub confidence: i64,
    pub learned_on: i64,
}

/// A persisted pattern row.
#[derive(Debug, Clone, PartialEq)]
pub struct Pattern {
    pub pattern: String,
    pub word_id: i64,
    pub learned: bool,
}

/// A word returned from `best_match`/`suggestions`.
#[derive(Debug, Clone, PartialEq)]
pub struct WordMatch {
    pub word: String,
    pub confidence: i64,
}

/// Whether a symbol tokenizer is being asked to tokenize the `pattern`
/// half of a match or the already-rendered `value` half.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenizerKind {
    Pattern,
    Value,
}

/// Whether the caller wants only rows that correspond to an exact
/// tokenization of the whole input, or is probing for any possibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Possibility,
}

/// A rendered word, as produced by an external renderer collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWord {
    pub text: String,
}

/// Breaks surface text into alternative token decompositions. Owned by
/// the scheme/language layer; out of scope for this crate.
pub trait SymbolTokenizer {
    fn tokenize(
        &self,
        text: &str,
        kind: TokenizerKind,
        match_kind: MatchKind,
    ) -> Result<Decomposition, CoreError>;
}

/// Turns a concrete token sequence into the script text it represents.
/// Owned by the scheme/language layer; out of scope for this crate.
pub trait Renderer {
    fn render(&self, tokens: &[Token]) -> Result<RenderedWord, CoreError>;
}
