//! C1 — the two-table associative store: schema bootstrap, prepared-query
//! dispatch, transaction control and the pooled scratch buffers the
//! learner borrows.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::config::StoreConfig;
use crate::error::{CoreError, Result};
use crate::pool::Pool;
use crate::types::{Token, WordMatch};

const SCHEMA: &str = r#"
PRAGMA page_size = 4096;
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS words (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL UNIQUE,
    confidence INTEGER NOT NULL DEFAULT 1,
    learned_on INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS patterns (
    pattern TEXT NOT NULL,
    word_id INTEGER NOT NULL REFERENCES words(id),
    learned INTEGER NOT NULL DEFAULT 0,
    UNIQUE(pattern, word_id)
);

CREATE INDEX IF NOT EXISTS idx_patterns_pattern ON patterns(pattern);
CREATE INDEX IF NOT EXISTS idx_patterns_word_id ON patterns(word_id);
"#;

/// Identifies a SQL text so call sites dispatch through an enum instead
/// of building or naming SQL strings ad hoc. `Connection::prepare_cached`
/// gives the lazy-prepare-once / retained-for-the-connection's-lifetime
/// behavior the design calls for, so there is no hand-rolled statement
/// slot map here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum StmtId {
    WordIdByText,
    InsertWord,
    UpdateWordConfidence,
    InsertPatternIgnore,
    MarkPatternLearned,
    MatchesForPattern,
    PossibleMatch,
    BestMatchWordIds,
    SuggestionWordIds,
    DeletePatternsForWord,
    DeleteWordById,
    CountLearnedWords,
    CountAllWords,
    CountAllPatterns,
}

fn sql_for(id: StmtId) -> &'static str {
    match id {
        StmtId::WordIdByText => "SELECT id FROM words WHERE text = ?1",
        StmtId::InsertWord => {
            "INSERT INTO words (text, confidence, learned_on) VALUES (?1, ?2, ?3)"
        }
        StmtId::UpdateWordConfidence => "UPDATE words SET confidence = confidence + 1 WHERE text = ?1",
        StmtId::InsertPatternIgnore => {
            "INSERT OR IGNORE INTO patterns (pattern, word_id, learned) VALUES (trim(lower(?1)), ?2, ?3)"
        }
        StmtId::MarkPatternLearned => {
            "UPDATE patterns SET learned = 1 WHERE pattern = trim(lower(?1)) AND word_id = ?2 AND learned = 0"
        }
        StmtId::MatchesForPattern => {
            "SELECT DISTINCT w.text FROM patterns p JOIN words w ON w.id = p.word_id \
             WHERE p.pattern = ?1 LIMIT ?2"
        }
        StmtId::PossibleMatch => {
            "SELECT 1 FROM patterns WHERE pattern > ?1 AND pattern <= ?1 || 'z' LIMIT 1"
        }
        StmtId::BestMatchWordIds => {
            "SELECT w.text, w.confidence FROM words w WHERE w.id IN \
             (SELECT word_id FROM patterns WHERE pattern = ?1 AND learned = 1) \
             ORDER BY w.confidence DESC LIMIT ?2"
        }
        StmtId::SuggestionWordIds => {
            "SELECT w.text, w.confidence FROM words w WHERE w.id IN \
             (SELECT word_id FROM patterns WHERE pattern > ?1 AND pattern <= ?1 || 'z' \
              AND learned = 1) \
             ORDER BY w.confidence DESC LIMIT ?2"
        }
        StmtId::DeletePatternsForWord => "DELETE FROM patterns WHERE word_id = ?1",
        StmtId::DeleteWordById => "DELETE FROM words WHERE id = ?1",
        StmtId::CountLearnedWords => {
            "SELECT COUNT(DISTINCT word_id) FROM patterns WHERE learned = 1"
        }
        StmtId::CountAllWords => "SELECT COUNT(*) FROM words",
        StmtId::CountAllPatterns => "SELECT COUNT(*) FROM patterns",
    }
}

/// A handle onto one known-words database. Not `Send`/`Sync`: callers
/// share a handle the way the rest of this crate's concurrency model
/// expects — one owner, cooperative access.
pub struct Store {
    conn: Connection,
    config: StoreConfig,
    last_learned: Option<(String, i64)>,
    last_error: Option<String>,
    pub(crate) string_pool: Pool<String>,
    pub(crate) token_pool: Pool<Vec<Token>>,
    pub(crate) offset_pool: Pool<Vec<usize>>,
}

impl Store {
    pub fn open(path: &Path, config: StoreConfig) -> Result<Store> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        debug!(?path, "store opened");
        Ok(Store::from_connection(conn, config))
    }

    /// Open an ephemeral in-process database, useful for tests and
    /// short-lived callers that don't need persistence.
    pub fn open_in_memory(config: StoreConfig) -> Result<Store> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store::from_connection(conn, config))
    }

    fn from_connection(conn: Connection, config: StoreConfig) -> Store {
        Store {
            conn,
            config,
            last_learned: None,
            last_error: None,
            string_pool: Pool::new(),
            token_pool: Pool::new(),
            offset_pool: Pool::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn fail(&mut self, e: impl Into<CoreError>) -> CoreError {
        let err = e.into();
        self.last_error = Some(err.to_string());
        err
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn begin(&mut self) -> Result<()> {
        self.conn
            .execute_batch("BEGIN")
            .map_err(|e| self.fail(e))
    }

    pub fn commit(&mut self) -> Result<()> {
        self.conn
            .execute_batch("COMMIT")
            .map_err(|e| self.fail(e))
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.conn
            .execute_batch("ROLLBACK")
            .map_err(|e| self.fail(e))
    }

    /// Relax durability for a run of bulk inserts.
    pub fn tune_for_bulk(&mut self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA synchronous = OFF")
            .map_err(|e| self.fail(e))
    }

    /// Deliberately a no-op: the reference implementation this crate's
    /// behavior follows never restores `synchronous = FULL` after a bulk
    /// run either.
    pub fn end_bulk(&mut self) -> Result<()> {
        Ok(())
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }

    /// Last-learned-word shortcut, consulted before a database round
    /// trip. Returns `-1` when the word is not known.
    pub(crate) fn word_id_of(&mut self, text: &str) -> Result<i64> {
        if let Some((ref cached_text, id)) = self.last_learned {
            if cached_text == text {
                return Ok(id);
            }
        }
        let id: Option<i64> = {
            let mut stmt = self
                .conn
                .prepare_cached(sql_for(StmtId::WordIdByText))
                .map_err(|e| CoreError::Storage(e))?;
            stmt.query_row(params![text], |row| row.get(0))
                .optional()
                .map_err(|e| CoreError::Storage(e))?
        };
        match id {
            Some(id) => Ok(id),
            None => Ok(-1),
        }
    }

    /// Persist (or bump the confidence of) a word row. Returns its id.
    /// The last-learned shortcut is refreshed only when an actual row is
    /// inserted, never on a confidence-only update.
    pub(crate) fn learn_word(&mut self, text: &str, confidence: i64) -> Result<i64> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(self.fail(CoreError::Args("word text must not be empty".into())));
        }

        self.last_learned = None;

        let existing = self.word_id_of(trimmed)?;

        if self.config.mostly_new_words {
            match self.try_insert_word(trimmed, confidence)? {
                Some(id) => {
                    self.last_learned = Some((trimmed.to_string(), id));
                    Ok(id)
                }
                None => {
                    self.bump_confidence(trimmed)?;
                    self.word_id_of(trimmed)
                }
            }
        } else if existing >= 0 {
            self.bump_confidence(trimmed)?;
            Ok(existing)
        } else {
            match self.try_insert_word(trimmed, confidence)? {
                Some(id) => {
                    self.last_learned = Some((trimmed.to_string(), id));
                    Ok(id)
                }
                None => self.word_id_of(trimmed),
            }
        }
    }

    fn try_insert_word(&mut self, text: &str, confidence: i64) -> Result<Option<i64>> {
        let now = Self::now();
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::InsertWord))
            .map_err(|e| CoreError::Storage(e))?;
        match stmt.execute(params![text, confidence, now]) {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                Ok(Some(id))
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(None)
            }
            Err(e) => Err(self.fail(e)),
        }
    }

    fn bump_confidence(&mut self, text: &str) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::UpdateWordConfidence))
            .map_err(|e| CoreError::Storage(e))?;
        stmt.execute(params![text])
            .map_err(|e| self.fail(e))?;
        Ok(())
    }

    /// `INSERT OR IGNORE` the pattern row, then upgrade `learned` from
    /// false to true if requested. Never downgrades an already-learned
    /// pattern.
    pub(crate) fn insert_pattern(&mut self, pattern: &str, word_id: i64, learned: bool) -> Result<()> {
        {
            let mut stmt = self
                .conn
                .prepare_cached(sql_for(StmtId::InsertPatternIgnore))
                .map_err(|e| CoreError::Storage(e))?;
            stmt.execute(params![pattern, word_id, learned as i64])
                .map_err(|e| self.fail(e))?;
        }
        if learned {
            let mut stmt = self
                .conn
                .prepare_cached(sql_for(StmtId::MarkPatternLearned))
                .map_err(|e| CoreError::Storage(e))?;
            stmt.execute(params![pattern, word_id])
                .map_err(|e| self.fail(e))?;
        }
        Ok(())
    }

    /// Word texts whose pattern exactly equals `lookup`. Not filtered by
    /// `learned` — this backs the tokenizer's internal lookup, which must
    /// see prefix-only patterns too.
    pub(crate) fn get_matches_for_word(&mut self, lookup: &str, cap: usize) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::MatchesForPattern))
            .map_err(|e| CoreError::Storage(e))?;
        let rows = stmt
            .query_map(params![lookup, cap as i64], |row| row.get::<_, String>(0))
            .map_err(|e| CoreError::Storage(e))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| CoreError::Storage(e))?);
        }
        Ok(out)
    }

    /// Whether any pattern extends `lookup` further.
    pub(crate) fn can_find_possible_match(&mut self, lookup: &str) -> Result<bool> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::PossibleMatch))
            .map_err(|e| CoreError::Storage(e))?;
        let found: Option<i64> = stmt
            .query_row(params![lookup], |row| row.get(0))
            .optional()
            .map_err(|e| CoreError::Storage(e))?;
        Ok(found.is_some())
    }

    pub(crate) fn best_match_rows(&mut self, pattern: &str, cap: usize) -> Result<Vec<WordMatch>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::BestMatchWordIds))
            .map_err(|e| CoreError::Storage(e))?;
        let rows = stmt
            .query_map(params![pattern, cap as i64], |row| {
                Ok(WordMatch {
                    word: row.get(0)?,
                    confidence: row.get(1)?,
                })
            })
            .map_err(|e| CoreError::Storage(e))?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.map_err(|e| CoreError::Storage(e))?);
        }
        Ok(out)
    }

    /// Prefix-range scan, deduplicated by word text, ordered by
    /// confidence.
    pub(crate) fn suggestion_rows(&mut self, prefix: &str, cap: usize) -> Result<Vec<WordMatch>> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::SuggestionWordIds))
            .map_err(|e| CoreError::Storage(e))?;
        let rows = stmt
            .query_map(params![prefix, cap as i64], |row| {
                Ok(WordMatch {
                    word: row.get(0)?,
                    confidence: row.get(1)?,
                })
            })
            .map_err(|e| CoreError::Storage(e))?;
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for row in rows {
            let m = row.map_err(|e| CoreError::Storage(e))?;
            if seen.insert(m.word.clone()) {
                out.push(m);
            }
        }
        Ok(out)
    }

    pub(crate) fn delete_word_rows(&mut self, word_id: i64) -> Result<()> {
        self.begin()?;

        let delete_patterns = {
            let mut stmt = self
                .conn
                .prepare_cached(sql_for(StmtId::DeletePatternsForWord))
                .map_err(|e| CoreError::Storage(e));
            match stmt {
                Ok(ref mut stmt) => stmt.execute(params![word_id]).map_err(CoreError::Storage),
                Err(e) => Err(e),
            }
        };
        if let Err(e) = delete_patterns {
            let _ = self.rollback();
            return Err(self.fail(e));
        }

        let delete_word = {
            let mut stmt = self
                .conn
                .prepare_cached(sql_for(StmtId::DeleteWordById))
                .map_err(|e| CoreError::Storage(e));
            match stmt {
                Ok(ref mut stmt) => stmt.execute(params![word_id]).map_err(CoreError::Storage),
                Err(e) => Err(e),
            }
        };
        if let Err(e) = delete_word {
            let _ = self.rollback();
            return Err(self.fail(e));
        }

        self.commit()
    }

    pub fn count_learned_words(&mut self) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::CountLearnedWords))
            .map_err(|e| CoreError::Storage(e))?;
        stmt.query_row([], |row| row.get(0)).map_err(|e| self.fail(e))
    }

    pub fn count_all_words(&mut self) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::CountAllWords))
            .map_err(|e| CoreError::Storage(e))?;
        stmt.query_row([], |row| row.get(0)).map_err(|e| self.fail(e))
    }

    pub fn count_all_patterns(&mut self) -> Result<i64> {
        let mut stmt = self
            .conn
            .prepare_cached(sql_for(StmtId::CountAllPatterns))
            .map_err(|e| CoreError::Storage(e))?;
        stmt.query_row([], |row| row.get(0)).map_err(|e| self.fail(e))
    }
}
