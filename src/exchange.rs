//! C5 — sharded export/import of learned words and patterns.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::config::limits;
use crate::error::{CoreError, Result};
use crate::store::Store;

const WORDS_EXPORT_METADATA_MARKER: &str = "words-export-metadata-marker";
const PATTERNS_EXPORT_METADATA_MARKER: &str = "patterns-export-metadata-marker";

/// Progress notification: `(processed, total)`.
pub type ProgressCallback<'a> = dyn FnMut(usize, usize) + 'a;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub failed: usize,
}

/// Export only learned words (one `<word> <confidence>` line per word, no
/// header), sharded across `words_per_file`-sized `.txt` files.
pub fn export_learned(
    store: &mut Store,
    words_per_file: usize,
    out_dir: &Path,
    mut progress: Option<&mut ProgressCallback<'_>>,
) -> Result<()> {
    if words_per_file == 0 {
        return Err(CoreError::Args(
            "words_per_file must be greater than zero".into(),
        ));
    }

    let rows: Vec<(String, i64)> = {
        let mut stmt = store.conn_mut().prepare(
            "SELECT w.text, w.confidence FROM words w \
             WHERE w.id IN (SELECT DISTINCT word_id FROM patterns WHERE learned = 1) \
             ORDER BY w.confidence DESC",
        )?;
        let mapped = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;
        let mut out = Vec::new();
        for row in mapped {
            out.push(row?);
        }
        out
    };

    let total = rows.len();
    let mut processed = 0usize;
    for (shard_index, chunk) in rows.chunks(words_per_file).enumerate() {
        let path = out_dir.join(format!("{}.txt", shard_index));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        for (word, confidence) in chunk {
            writeln!(writer, "{} {}", word, confidence)?;
        }
        writer.flush()?;
        processed += chunk.len();
        if let Some(cb) = progress.as_mut() {
            cb(processed, total);
        }
    }

    debug!(total, words_per_file, "export_learned complete");
    Ok(())
}

/// Export every word and every pattern (learned or not), each in its own
/// shard series with a metadata-marker header line.
pub fn export_full(
    store: &mut Store,
    words_per_file: usize,
    out_dir: &Path,
    mut progress: Option<&mut ProgressCallback<'_>>,
) -> Result<()> {
    if words_per_file == 0 {
        return Err(CoreError::Args(
            "words_per_file must be greater than zero".into(),
        ));
    }

    let words: Vec<(i64, String, i64)> = {
        let mut stmt = store
            .conn_mut()
            .prepare("SELECT id, text, confidence FROM words ORDER BY id")?;
        let mapped = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in mapped {
            out.push(row?);
        }
        out
    };

    let words_total = words.len();
    let mut words_processed = 0usize;
    for (shard_index, chunk) in words.chunks(words_per_file).enumerate() {
        let path = out_dir.join(format!("{}.words.txt", shard_index));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", WORDS_EXPORT_METADATA_MARKER)?;
        for (id, word, confidence) in chunk {
            writeln!(writer, "{} {} {}", id, word, confidence)?;
        }
        writer.flush()?;
        words_processed += chunk.len();
        if let Some(cb) = progress.as_mut() {
            cb(words_processed, words_total);
        }
    }

    let patterns: Vec<(i64, String, bool)> = {
        let mut stmt = store
            .conn_mut()
            .prepare("SELECT word_id, pattern, learned FROM patterns ORDER BY word_id, pattern")?;
        let mapped = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i64>(2)? != 0,
            ))
        })?;
        let mut out = Vec::new();
        for row in mapped {
            out.push(row?);
        }
        out
    };

    let patterns_total = patterns.len();
    let mut patterns_processed = 0usize;
    for (shard_index, chunk) in patterns.chunks(words_per_file).enumerate() {
        let path = out_dir.join(format!("{}.patterns.txt", shard_index));
        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", PATTERNS_EXPORT_METADATA_MARKER)?;
        for (word_id, pattern, learned) in chunk {
            writeln!(writer, "{} {} {}", word_id, pattern, *learned as i64)?;
        }
        writer.flush()?;
        patterns_processed += chunk.len();
        if let Some(cb) = progress.as_mut() {
            cb(patterns_processed, patterns_total);
        }
    }

    debug!(
        words = words.len(),
        patterns = patterns.len(),
        "export_full complete"
    );
    Ok(())
}

/// Import a file produced by `export_full`, auto-detecting whether it
/// holds words or patterns from its header marker. Lines that don't
/// split into exactly three whitespace-separated fields are reported to
/// `on_failure` (passed the whole line) and otherwise skipped — a
/// malformed line never aborts the import.
pub fn import(
    store: &mut Store,
    file_path: &Path,
    mut on_failure: impl FnMut(&str),
) -> Result<ImportSummary> {
    let file = File::open(file_path)?;
    let mut reader = BufReader::with_capacity(limits::IMPORT_LINE_BUFFER, file);

    let mut header = String::new();
    reader.read_line(&mut header)?;
    let header = header.trim_end();

    let mut summary = ImportSummary::default();

    if header == WORDS_EXPORT_METADATA_MARKER {
        for line in reader.lines() {
            let line = line?;
            match parse_word_line(&line) {
                Some((id, text, confidence)) => {
                    insert_word_row(store, id, &text, confidence)?;
                    summary.inserted += 1;
                }
                None => {
                    on_failure(&line);
                    summary.failed += 1;
                }
            }
        }
    } else if header == PATTERNS_EXPORT_METADATA_MARKER {
        for line in reader.lines() {
            let line = line?;
            match parse_pattern_line(&line) {
                Some((word_id, pattern, learned)) => {
                    insert_pattern_row(store, word_id, &pattern, learned)?;
                    summary.inserted += 1;
                }
                None => {
                    on_failure(&line);
                    summary.failed += 1;
                }
            }
        }
    } else {
        return Err(CoreError::UnknownFileType(
            file_path.display().to_string(),
        ));
    }

    debug!(
        ?file_path,
        inserted = summary.inserted,
        failed = summary.failed,
        "import complete"
    );
    Ok(summary)
}

fn parse_word_line(line: &str) -> Option<(i64, String, i64)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return None;
    }
    let id: i64 = fields[0].parse().ok()?;
    let confidence: i64 = fields[2].parse().ok()?;
    Some((id, fields[1].to_string(), confidence))
}

fn parse_pattern_line(line: &str) -> Option<(i64, String, bool)> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() != 3 {
        return None;
    }
    let word_id: i64 = fields[0].parse().ok()?;
    let learned: i64 = fields[2].parse().ok()?;
    Some((word_id, fields[1].to_string(), learned != 0))
}

fn insert_word_row(store: &mut Store, id: i64, text: &str, confidence: i64) -> Result<()> {
    store.conn_mut().execute(
        "INSERT OR REPLACE INTO words (id, text, confidence, learned_on) \
         VALUES (?1, ?2, ?3, COALESCE((SELECT learned_on FROM words WHERE id = ?1), 0))",
        rusqlite::params![id, text, confidence],
    )?;
    Ok(())
}

fn insert_pattern_row(store: &mut Store, word_id: i64, pattern: &str, learned: bool) -> Result<()> {
    store.conn_mut().execute(
        "INSERT OR IGNORE INTO patterns (pattern, word_id, learned) VALUES (?1, ?2, ?3)",
        rusqlite::params![pattern, word_id, learned as i64],
    )?;
    Ok(())
}
