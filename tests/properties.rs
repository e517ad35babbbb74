//! End-to-end scenarios and property tests against the public API.
//!
//! Exercises learn/best_match/suggestions/delete_word/export/import
//! together the way a transliteration engine host would, rather than
//! poking at internals the way the per-module unit tests do.

use known_words_store::{
    best_match, delete_word, export_full, export_learned, import, learn, suggestions,
    word_id_of, RenderedWord, Renderer, Store, StoreConfig, Token, TokenKind,
};
use proptest::prelude::*;
use tempfile::tempdir;

struct JoinRenderer;
impl Renderer for JoinRenderer {
    fn render(&self, tokens: &[Token]) -> known_words_store::Result<RenderedWord> {
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

fn store() -> Store {
    Store::open_in_memory(StoreConfig::default()).unwrap()
}

/// Scenario 1 — learn and retrieve.
#[test]
fn learn_and_retrieve() {
    let mut s = store();
    let decomposition = vec![
        vec![tok("m", "മ")],
        vec![tok("a", "")],
        vec![tok("l", "ല")],
        vec![tok("a", "")],
        vec![tok("y", "യ")],
        vec![tok("aa", "ാ")],
        vec![tok("l", "ള")],
        vec![tok("a", "")],
        vec![tok("m", "ം")],
    ];
    learn(&mut s, "മലയാളം", &decomposition, 1, &JoinRenderer).unwrap();
    let matches = best_match(&mut s, "malayaalam").unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].word, "മലയാളം");
    assert_eq!(matches[0].confidence, 1);
}

/// Scenario 2 — confidence bump across repeated learns.
#[test]
fn confidence_bumps_on_repeat_learn() {
    let mut s = store();
    let decomposition = vec![
        vec![tok("v", "വ")],
        vec![tok("a", "ർ")],
        vec![tok("r", "ണ")],
        vec![tok("n", "ം")],
    ];
    for _ in 0..3 {
        learn(&mut s, "വർണം", &decomposition, 1, &JoinRenderer).unwrap();
    }
    let matches = best_match(&mut s, "varn").unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].word, "വർണം");
    assert_eq!(matches[0].confidence, 3);
}

/// Scenario 3 — prefix completion via suggestions.
#[test]
fn prefix_completion_via_suggestions() {
    let mut s = store();
    let decomposition = vec![
        vec![tok("m", "മ")],
        vec![tok("a", "")],
        vec![tok("l", "ല")],
        vec![tok("a", "")],
        vec![tok("y", "യ")],
        vec![tok("aa", "ാ")],
        vec![tok("l", "ള")],
        vec![tok("a", "")],
        vec![tok("m", "ം")],
    ];
    learn(&mut s, "മലയാളം", &decomposition, 1, &JoinRenderer).unwrap();
    let hits = suggestions(&mut s, "malay").unwrap();
    assert!(hits.iter().any(|m| m.word == "മലയാളം"));
}

/// Scenario 4 — deletion removes the word and every pattern pointing at it.
#[test]
fn delete_word_removes_patterns_too() {
    let mut s = store();
    let decomposition = vec![vec![tok("m", "മ")], vec![tok("a", "")], vec![tok("l", "ല")]];
    learn(&mut s, "മല", &decomposition, 1, &JoinRenderer).unwrap();
    assert!(word_id_of(&mut s, "മല").unwrap() >= 0);

    delete_word(&mut s, "മല").unwrap();

    assert!(best_match(&mut s, "mal").unwrap().is_empty());
    assert_eq!(word_id_of(&mut s, "മല").unwrap(), -1);
}

/// Scenario 5 — export is sharded by `words_per_file`.
#[test]
fn export_is_sharded() {
    let mut s = store();
    for (word, pattern) in [
        ("a", "aa"),
        ("b", "bb"),
        ("c", "cc"),
        ("d", "dd"),
        ("e", "ee"),
    ] {
        let decomposition = vec![vec![tok(pattern, word)]];
        learn(&mut s, word, &decomposition, 1, &JoinRenderer).unwrap();
    }

    let dir = tempdir().unwrap();
    export_learned(&mut s, 2, dir.path(), None).unwrap();

    let count_lines = |name: &str| -> usize {
        std::fs::read_to_string(dir.path().join(name))
            .map(|c| c.lines().count())
            .unwrap_or(0)
    };
    assert_eq!(count_lines("0.txt"), 2);
    assert_eq!(count_lines("1.txt"), 2);
    assert_eq!(count_lines("2.txt"), 1);
    assert!(!dir.path().join("3.txt").exists());
}

/// Scenario 6 — a malformed import line is reported, not fatal.
#[test]
fn import_reports_bad_line_without_aborting() {
    let mut s = store();
    let dir = tempdir().unwrap();
    let path = dir.path().join("patterns.txt");
    std::fs::write(&path, "patterns-export-metadata-marker\n1 df\n").unwrap();

    let mut failures = Vec::new();
    let summary = import(&mut s, &path, |line| failures.push(line.to_string())).unwrap();
    assert_eq!(failures, vec!["1 df".to_string()]);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.inserted, 0);
}

/// P4 — export_full/import round-trips word and pattern rows.
#[test]
fn export_full_then_import_round_trips() {
    let mut source = store();
    for (word, pattern, confidence) in [("aa", "aa", 2), ("bb", "bb", 5)] {
        let decomposition = vec![vec![tok(pattern, word)]];
        learn(&mut source, word, &decomposition, confidence, &JoinRenderer).unwrap();
    }

    let dir = tempdir().unwrap();
    export_full(&mut source, 10, dir.path(), None).unwrap();

    let mut target = store();
    import(&mut target, &dir.path().join("0.words.txt"), |_| {}).unwrap();
    import(&mut target, &dir.path().join("0.patterns.txt"), |_| {}).unwrap();

    assert_eq!(
        target.count_all_words().unwrap(),
        source.count_all_words().unwrap()
    );
    assert_eq!(
        target.count_all_patterns().unwrap(),
        source.count_all_patterns().unwrap()
    );
}

/// P6 — best_match/suggestions return empty below the minimum query
/// length, even for patterns that would otherwise match.
#[test]
fn min_length_shortcut_applies_to_both_lookups() {
    let mut s = store();
    let decomposition = vec![vec![tok("ab", "x")]];
    learn(&mut s, "x", &decomposition, 1, &JoinRenderer).unwrap();
    assert!(best_match(&mut s, "ab").unwrap().is_empty());
    assert!(suggestions(&mut s, "ab").unwrap().is_empty());
    assert!(suggestions(&mut s, "a").unwrap().is_empty());
}

proptest! {
    /// P1 — learning the same word twice bumps confidence by exactly one
    /// between the two calls.
    #[test]
    fn confidence_increments_by_one_per_learn(
        word in "[a-z]{2,8}",
        pattern in "[a-z]{3,8}",
        initial_confidence in 1i64..10,
    ) {
        let mut s = store();
        let decomposition = vec![vec![tok(&pattern, &word)]];
        learn(&mut s, &word, &decomposition, initial_confidence, &JoinRenderer).unwrap();
        let before = best_match(&mut s, &pattern).unwrap()[0].confidence;
        prop_assert!(before >= 1);

        learn(&mut s, &word, &decomposition, initial_confidence, &JoinRenderer).unwrap();
        let after = best_match(&mut s, &pattern).unwrap()[0].confidence;
        prop_assert_eq!(after, before + 1);
    }

    /// P2 — a single-position decomposition yields exactly one full
    /// pattern and no prefixes, regardless of alternative count.
    #[test]
    fn single_position_never_emits_prefixes(alt_count in 1usize..6) {
        let mut s = store();
        let alternatives: Vec<Token> = (0..alt_count)
            .map(|i| tok(&format!("p{i}"), &format!("v{i}")))
            .collect();
        let decomposition = vec![alternatives];
        let report = learn(&mut s, "word", &decomposition, 1, &JoinRenderer).unwrap();
        prop_assert_eq!(report.full_patterns_persisted as usize, alt_count);
        prop_assert_eq!(report.prefix_patterns_persisted, 0);
    }
}
