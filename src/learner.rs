//! C2 — turns a word plus its token decomposition into persisted full and
//! prefix patterns.

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::store::Store;
use crate::types::{Decomposition, Renderer, Token};

/// Outcome of a `learn` call.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnReport {
    pub word_id: i64,
    pub full_patterns_persisted: u32,
    pub prefix_patterns_persisted: u32,
    pub capped: bool,
}

/// Persist `word_text` plus every pattern implied by `decomposition`.
///
/// Walks the cartesian product `L1 x L2 x ... x Lk` with an explicit
/// offset vector (not recursion). Each full-length tuple is persisted as
/// a learned pattern; for tuples of length >= 3, every prefix of length
/// in `[2, k-1]` is also persisted against its own (rendered) word, but
/// not marked `learned`. That prefix word is itself `learn`ed with
/// confidence 1 — and only once per top-level call, on the first tuple
/// processed, matching the reference behavior this crate follows.
pub fn learn(
    store: &mut Store,
    word_text: &str,
    decomposition: &Decomposition,
    confidence: i64,
    renderer: &dyn Renderer,
) -> Result<LearnReport> {
    let trimmed = word_text.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Args("word text must not be empty".into()));
    }
    if decomposition.is_empty() || decomposition.iter().any(|alts| alts.is_empty()) {
        return Err(CoreError::Args(
            "token decomposition must have at least one non-empty position".into(),
        ));
    }

    let word_id = store.learn_word(trimmed, confidence)?;

    let k = decomposition.len();
    let max_patterns = store.config().max_patterns_per_word;

    let mut offsets = store.offset_pool.take();
    offsets.clear();
    offsets.resize(k, 0usize);

    let mut full_persisted: u32 = 0;
    let mut prefix_persisted: u32 = 0;
    let mut capped = false;
    let mut word_already_learned = false;

    loop {
        let mut pattern = store.string_pool.take();
        pattern.clear();
        let mut tuple = store.token_pool.take();
        tuple.clear();

        for (position, &offset) in offsets.iter().enumerate() {
            let token = decomposition[position][offset].clone();
            if token.contributes_to_pattern() {
                pattern.push_str(&token.pattern);
            }
            tuple.push(token);
        }

        store.insert_pattern(&pattern, word_id, true)?;
        full_persisted += 1;

        if k >= 3 {
            for prefix_len in 2..k {
                let prefix_tokens = &tuple[0..prefix_len];
                let rendered = renderer.render(prefix_tokens)?;

                if !word_already_learned {
                    store.learn_word(&rendered.text, 1)?;
                }

                let prefix_word_id = store.word_id_of(&rendered.text)?;
                let mut prefix_pattern = String::new();
                for token in prefix_tokens {
                    if token.contributes_to_pattern() {
                        prefix_pattern.push_str(&token.pattern);
                    }
                }
                store.insert_pattern(&prefix_pattern, prefix_word_id, false)?;
                prefix_persisted += 1;
            }
            word_already_learned = true;
        }

        store.string_pool.give_back(pattern);
        store.token_pool.give_back(tuple);

        if full_persisted >= max_patterns {
            capped = true;
            break;
        }

        if !advance(&mut offsets, decomposition) {
            break;
        }
    }

    store.offset_pool.give_back(offsets);

    debug!(
        word_id,
        full_persisted, prefix_persisted, capped, "learn complete"
    );

    Ok(LearnReport {
        word_id,
        full_patterns_persisted: full_persisted,
        prefix_patterns_persisted: prefix_persisted,
        capped,
    })
}

/// Increment the offset vector with carry, right to left. Returns false
/// once every combination has been visited.
fn advance(offsets: &mut [usize], decomposition: &Decomposition) -> bool {
    let mut i = offsets.len();
    loop {
        if i == 0 {
            return false;
        }
        i -= 1;
        offsets[i] += 1;
        if offsets[i] < decomposition[i].len() {
            return true;
        }
        offsets[i] = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::types::{RenderedWord, TokenKind};

    struct JoinRenderer;
    impl Renderer for JoinRenderer {
        fn render(&self, tokens: &[Token]) -> Result<RenderedWord> {
            let text: String = tokens
                .iter()
                .filter(|t| t.contributes_to_pattern())
                .map(|t| t.value.clone())
                .collect();
            Ok(RenderedWord { text })
        }
    }

    fn tok(pattern: &str, value: &str) -> Token {
        Token::new(pattern, value, TokenKind::Generic)
    }

    #[test]
    fn single_alternative_per_position_yields_one_full_pattern() {
        let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
        let decomposition = vec![vec![tok("m", "m")], vec![tok("a", "a")]];
        let report = learn(&mut store, "ma", &decomposition, 1, &JoinRenderer).unwrap();
        assert_eq!(report.full_patterns_persisted, 1);
        assert_eq!(report.prefix_patterns_persisted, 0);
        assert!(!report.capped);
    }

    #[test]
    fn cartesian_product_enumerates_every_combination() {
        let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
        let decomposition = vec![
            vec![tok("k", "k"), tok("kh", "kh")],
            vec![tok("a", "a"), tok("aa", "aa")],
        ];
        let report = learn(&mut store, "word", &decomposition, 1, &JoinRenderer).unwrap();
        assert_eq!(report.full_patterns_persisted, 4);
    }

    #[test]
    fn three_positions_persist_length_two_prefix() {
        let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
        let decomposition = vec![
            vec![tok("m", "m")],
            vec![tok("a", "a")],
            vec![tok("n", "n")],
        ];
        let report = learn(&mut store, "man", &decomposition, 1, &JoinRenderer).unwrap();
        assert_eq!(report.full_patterns_persisted, 1);
        assert_eq!(report.prefix_patterns_persisted, 1);
    }

    #[test]
    fn empty_word_is_an_args_error() {
        let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
        let decomposition = vec![vec![tok("a", "a")]];
        let err = learn(&mut store, "   ", &decomposition, 1, &JoinRenderer).unwrap_err();
        assert!(matches!(err, CoreError::Args(_)));
    }

    #[test]
    fn joiner_tokens_do_not_contribute_to_pattern_text() {
        let mut store = Store::open_in_memory(StoreConfig::default()).unwrap();
        let decomposition = vec![
            vec![tok("k", "k")],
            vec![Token::new("_", "_", TokenKind::Joiner)],
            vec![tok("a", "a")],
        ];
        learn(&mut store, "ka", &decomposition, 1, &JoinRenderer).unwrap();
        let rows: i64 = store
            .conn()
            .query_row(
                "SELECT COUNT(*) FROM patterns WHERE pattern = 'ka'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(rows, 1);
    }
}
