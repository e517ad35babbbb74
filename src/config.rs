//! Tunable limits and handle-level configuration.

/// Literal constants from the data model.
pub mod limits {
    pub const MAX_PATTERNS_PER_WORD: u32 = 1000;
    pub const MIN_INPUT_LEN_FOR_SUGGESTION: usize = 3;
    pub const BEST_MATCH_RESULT_CAP: usize = 5;
    pub const SUGGESTION_RESULT_CAP: usize = 5;
    pub const PATTERN_LOOKUP_CAP_PER_STEP: usize = 3;
    pub const IMPORT_LINE_BUFFER: usize = 1000;
}

/// Handle-level configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// When true, `learn_word` assumes most incoming words are new and
    /// tries an insert before an update; when false it assumes most are
    /// repeat learns and tries an update first.
    pub mostly_new_words: bool,
    pub max_patterns_per_word: u32,
    pub min_input_len_for_suggestion: usize,
    pub best_match_result_cap: usize,
    pub suggestion_result_cap: usize,
    pub pattern_lookup_cap_per_step: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            mostly_new_words: false,
            max_patterns_per_word: limits::MAX_PATTERNS_PER_WORD,
            min_input_len_for_suggestion: limits::MIN_INPUT_LEN_FOR_SUGGESTION,
            best_match_result_cap: limits::BEST_MATCH_RESULT_CAP,
            suggestion_result_cap: limits::SUGGESTION_RESULT_CAP,
            pattern_lookup_cap_per_step: limits::PATTERN_LOOKUP_CAP_PER_STEP,
        }
    }
}
