//! C3 — the prefix tokenizer: longest-prefix match against `patterns`,
//! handed off to a symbol tokenizer for the matched word(s) and for the
//! unmatched suffix.

use tracing::debug;

use crate::error::Result;
use crate::store::Store;
use crate::types::{MatchKind, SymbolTokenizer, TokenSequence, TokenizeResult, TokenizerKind};

/// Walk `input` one character at a time, looking for the longest prefix
/// that has any learned words attached to it, then split into up to
/// `pattern_lookup_cap_per_step` alternatives: one per matched word, each
/// followed by a literal tokenization of whatever text didn't match.
///
/// Returns an empty result when nothing in the store matches any prefix
/// of `input` — callers fall back to literal tokenization entirely on
/// their own.
pub fn tokenize_prefix(
    store: &mut Store,
    symbol_tokenizer: &dyn SymbolTokenizer,
    input: &str,
) -> Result<TokenizeResult> {
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let cap = store.config().pattern_lookup_cap_per_step;

    let mut lookup = String::new();
    let mut matches: Vec<String> = Vec::new();
    let mut matchpos = 0usize;

    for (char_index, ch) in input.chars().enumerate() {
        lookup.push(ch);

        let rows = store.get_matches_for_word(&lookup, cap)?;
        if !rows.is_empty() {
            matches = rows;
            matchpos = char_index + 1;
        }

        if !store.can_find_possible_match(&lookup)? {
            break;
        }
    }

    if matches.is_empty() {
        debug!(input, "tokenize_prefix found no match");
        return Ok(Vec::new());
    }

    let mut result: Vec<TokenSequence> = Vec::new();
    for matched_word in matches.iter().take(cap) {
        let decomposition =
            symbol_tokenizer.tokenize(matched_word, TokenizerKind::Value, MatchKind::Exact)?;
        result.push(first_elements(&decomposition));
    }

    let remainder: String = input.chars().skip(matchpos).collect();
    if !remainder.is_empty() {
        let remainder_decomposition =
            symbol_tokenizer.tokenize(&remainder, TokenizerKind::Pattern, MatchKind::Exact)?;
        let suffix = first_elements(&remainder_decomposition);
        for entry in result.iter_mut() {
            entry.extend(suffix.iter().cloned());
        }
    }

    debug!(input, matchpos, alternatives = result.len(), "tokenize_prefix done");
    Ok(result)
}

/// Take the first token of each position, skipping positions with no
/// alternatives at all.
fn first_elements(decomposition: &crate::types::Decomposition) -> TokenSequence {
    decomposition
        .iter()
        .filter_map(|alternatives| alternatives.first().cloned())
        .collect()
}
