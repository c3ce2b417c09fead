//! JSON Lines (JSONL) I/O for records.
//!
//! This module provides:
//! - **Lazy reading**: [`read_jsonl`] yields one [`Record`] per non-empty line;
//! - **Writing**: [`write_jsonl`] writes one JSON object per line;
//! - **Input binding**: [`Bindings::bind_jsonl`] binds a file as a named input.
//!
//! # Notes
//! - Empty and whitespace-only lines are skipped on read.
//! - Every line must hold a JSON object; anything else is a parse error that
//!   names the file and line number.
//! - Compressed files are handled transparently, see [`compression`](crate::io::compression).

use crate::bindings::Bindings;
use crate::io::compression::{auto_detect_reader, auto_detect_writer};
use crate::record::Record;
use anyhow::{Context, Result};
use std::fs::{File, create_dir_all};
use std::io::{BufRead, Lines, Write};
use std::path::{Path, PathBuf};

/// Lazy iterator over the records of one JSONL file. The file is closed when the
/// iterator is dropped.
pub struct JsonlRecords {
    lines: Lines<Box<dyn BufRead>>,
    path: PathBuf,
    line_no: usize,
}

impl Iterator for JsonlRecords {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    return Some(Err(e).with_context(|| {
                        format!("read line {} in {}", self.line_no, self.path.display())
                    }));
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            return Some(serde_json::from_str(&line).with_context(|| {
                format!(
                    "parse JSONL line {} in {}: {line}",
                    self.line_no,
                    self.path.display()
                )
            }));
        }
    }
}

/// Open a JSONL file for lazy reading.
///
/// # Errors
/// If the file cannot be opened or its compression cannot be set up. Line-level
/// errors are reported by the iterator.
pub fn read_jsonl(path: impl AsRef<Path>) -> Result<JsonlRecords> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let reader = auto_detect_reader(f, path)
        .with_context(|| format!("setup decompression for {}", path.display()))?;
    Ok(JsonlRecords {
        lines: reader.lines(),
        path: path.to_path_buf(),
        line_no: 0,
    })
}

/// Write records as a JSONL file, creating parent directories as needed.
///
/// # Returns
/// The number of records written.
///
/// # Errors
/// If the file cannot be created or written.
pub fn write_jsonl<'a>(
    path: impl AsRef<Path>,
    records: impl IntoIterator<Item = &'a Record>,
) -> Result<usize> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        create_dir_all(parent).with_context(|| format!("mkdir -p {}", parent.display()))?;
    }
    let f = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut w = auto_detect_writer(f, path)
        .with_context(|| format!("setup compression for {}", path.display()))?;
    let mut written = 0;
    for record in records {
        serde_json::to_writer(&mut w, record)
            .with_context(|| format!("serialize record {} to {}", written + 1, path.display()))?;
        w.write_all(b"\n")?;
        written += 1;
    }
    w.finish()
        .with_context(|| format!("finish {}", path.display()))?;
    Ok(written)
}

impl Bindings {
    /// Bind `name` to the records of a JSONL file, read lazily during the run.
    ///
    /// # Errors
    /// If the file cannot be opened.
    pub fn bind_jsonl(self, name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.bind_fallible(name, read_jsonl(path)?))
    }
}
