use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::record::{BenchmarkRecord, CSV_HEADER, CSV_HEADER_PER_CORE};

/// Append-only raw log of benchmark trials.
///
/// The header is written exactly once, when the file is created (or found
/// empty); existing content is never re-validated or rewritten. Single-writer,
/// sequential-append usage only.
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a CSV row, creating the log with a header first
    /// if it does not exist yet.
    pub fn append(&self, record: &BenchmarkRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {:?}", parent))?;
            }
        }

        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(_) => true,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open raw log {:?}", self.path))?;

        if needs_header {
            let header = if record.core_id.is_some() {
                CSV_HEADER_PER_CORE
            } else {
                CSV_HEADER
            };
            writeln!(file, "{}", header)
                .with_context(|| format!("failed to write header to {:?}", self.path))?;
        }
        writeln!(file, "{}", record.to_csv_row())
            .with_context(|| format!("failed to append to {:?}", self.path))?;
        Ok(())
    }

    /// Lazy line-by-line scan of the raw log, header included.
    pub fn scan(&self) -> Result<io::Lines<BufReader<File>>> {
        let file = File::open(&self.path)
            .with_context(|| format!("failed to open raw log {:?}", self.path))?;
        Ok(BufReader::new(file).lines())
    }
}
