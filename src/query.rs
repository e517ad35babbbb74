//! C4 — the read/delete surface built on top of the store: best match,
//! suggestions, word lookup and deletion.

use crate::error::{CoreError, Result};
use crate::store::Store;
use crate::types::WordMatch;

/// Learned words whose pattern exactly equals `input`, best confidence
/// first, capped at `best_match_result_cap`. Below
/// `min_input_len_for_suggestion` characters this always returns empty.
pub fn best_match(store: &mut Store, input: &str) -> Result<Vec<WordMatch>> {
    let needle = input.trim().to_lowercase();
    if needle.chars().count() < store.config().min_input_len_for_suggestion {
        return Ok(Vec::new());
    }
    let cap = store.config().best_match_result_cap;
    store.best_match_rows(&needle, cap)
}

/// Learned words reachable by extending `input`, deduplicated by word
/// text, best confidence first, capped at `suggestion_result_cap`. Below
/// `min_input_len_for_suggestion` characters this always returns empty.
pub fn suggestions(store: &mut Store, input: &str) -> Result<Vec<WordMatch>> {
    let needle = input.trim().to_lowercase();
    if needle.chars().count() < store.config().min_input_len_for_suggestion {
        return Ok(Vec::new());
    }
    let cap = store.config().suggestion_result_cap;
    store.suggestion_rows(&needle, cap)
}

/// The id of a learned word, or `-1` if the word is unknown.
pub fn word_id_of(store: &mut Store, text: &str) -> Result<i64> {
    store.word_id_of(text.trim())
}

/// Remove a word and every pattern that points to it.
pub fn delete_word(store: &mut Store, text: &str) -> Result<()> {
    let id = store.word_id_of(text.trim())?;
    if id < 0 {
        return Err(CoreError::NotFound(text.to_string()));
    }
    store.delete_word_rows(id)
}
