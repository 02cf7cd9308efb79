// crates/core/src/clean.rs
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::record::{self, BenchmarkRecord, CSV_HEADER, CSV_HEADER_PER_CORE};
use crate::store::RecordStore;

/// Produces the canonical dataset from the raw log.
///
/// The raw log is the source of truth and is never modified; the canonical
/// dataset is a derived artifact that is fully regenerated on each cleaning
/// pass and is safe to delete at any time.
pub struct Cleaner {
    raw_path: PathBuf,
    clean_path: PathBuf,
}

impl Cleaner {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(raw_path: P, clean_path: Q) -> Self {
        Self {
            raw_path: raw_path.into(),
            clean_path: clean_path.into(),
        }
    }

    pub fn clean_path(&self) -> &Path {
        &self.clean_path
    }

    /// Load the canonical dataset if it already exists, otherwise clean the
    /// raw log to produce it.
    pub fn load_or_clean(&self) -> Result<Vec<BenchmarkRecord>> {
        if self.clean_path.exists() {
            info!("loading existing canonical dataset {:?}", self.clean_path);
            return self.load_canonical();
        }
        self.clean()
    }

    /// Read the full raw log, drop rows that fail validation, recompute the
    /// derived metrics, and replace the canonical dataset with the survivors.
    pub fn clean(&self) -> Result<Vec<BenchmarkRecord>> {
        if !self.raw_path.exists() {
            warn!(
                "raw log {:?} not found; writing an empty canonical dataset",
                self.raw_path
            );
            self.write_canonical(&[], false)?;
            return Ok(Vec::new());
        }

        let store = RecordStore::new(&self.raw_path);
        let mut per_core = false;
        let mut rows = Vec::new();
        for line in store.scan()? {
            let line = line.with_context(|| format!("failed to read {:?}", self.raw_path))?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("timestamp") {
                per_core = line.contains("core_id");
                continue;
            }
            // Interleaved garbage or partial writes are expected in the raw
            // log; anything that fails validation is dropped, not an error.
            if let Some(record) = parse_row(line, per_core) {
                rows.push(record);
            }
        }

        self.write_canonical(&rows, per_core)?;
        info!(
            "cleaned {:?}: {} valid rows -> {:?}",
            self.raw_path,
            rows.len(),
            self.clean_path
        );
        Ok(rows)
    }

    /// Parse an existing canonical dataset. Uses the same row validation as
    /// cleaning, so a stale or corrupt file degrades to fewer rows rather
    /// than an error.
    pub fn load_canonical(&self) -> Result<Vec<BenchmarkRecord>> {
        let text = fs::read_to_string(&self.clean_path)
            .with_context(|| format!("failed to read canonical dataset {:?}", self.clean_path))?;
        let mut per_core = false;
        let mut rows = Vec::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.starts_with("timestamp") {
                per_core = line.contains("core_id");
                continue;
            }
            if let Some(record) = parse_row(line, per_core) {
                rows.push(record);
            }
        }
        Ok(rows)
    }

    fn write_canonical(&self, rows: &[BenchmarkRecord], per_core: bool) -> Result<()> {
        if let Some(parent) = self.clean_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {:?}", parent))?;
            }
        }
        let header = if per_core { CSV_HEADER_PER_CORE } else { CSV_HEADER };
        let mut out = String::with_capacity(rows.len() * 64 + header.len() + 1);
        out.push_str(header);
        out.push('\n');
        for row in rows {
            out.push_str(&row.to_csv_row());
            out.push('\n');
        }
        fs::write(&self.clean_path, out)
            .with_context(|| format!("failed to write canonical dataset {:?}", self.clean_path))
    }
}

/// Validate and coerce one raw CSV row.
///
/// Field order is timestamp,duration,ops,real_time,usr_time,sys_time, then
/// the two persisted derived columns (ignored and recomputed), then core_id
/// in the per-core variant. Returns `None` on any shape, format, or type
/// failure, and when recomputed metrics come out non-finite.
fn parse_row(line: &str, per_core: bool) -> Option<BenchmarkRecord> {
    let fields: Vec<&str> = line.split(',').collect();
    let expected = if per_core { 9 } else { 8 };
    if fields.len() != expected {
        return None;
    }

    let timestamp = record::parse_timestamp(fields[0].trim()).ok()?;
    let duration: f64 = fields[1].trim().parse().ok()?;
    let ops: f64 = fields[2].trim().parse().ok()?;
    let real_time: f64 = fields[3].trim().parse().ok()?;
    let usr_time: f64 = fields[4].trim().parse().ok()?;
    let sys_time: f64 = fields[5].trim().parse().ok()?;
    // "NaN" and "inf" satisfy f64::parse, so coercion alone is not enough
    if ![duration, ops, real_time, usr_time, sys_time]
        .iter()
        .all(|v| v.is_finite())
    {
        return None;
    }
    if duration <= 0.0 || real_time <= 0.0 {
        return None;
    }
    let core_id = if per_core {
        Some(fields[8].trim().parse::<i64>().ok()?)
    } else {
        None
    };

    let mut record = BenchmarkRecord {
        timestamp,
        duration,
        ops,
        real_time,
        usr_time,
        sys_time,
        ops_per_sec_real: 0.0,
        ops_per_sec_cpu: 0.0,
        core_id,
    };
    record.recompute_derived();
    if !record.derived_metrics_finite() {
        return None;
    }
    Some(record)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_with_wrong_field_count_is_dropped() {
        assert!(parse_row("2025-01-01_00:00:00,10,100,10,2,3,10", false).is_none());
        assert!(parse_row("2025-01-01_00:00:00,10,100,10,2,3,10,20,1", false).is_none());
    }

    #[test]
    fn persisted_derived_values_are_ignored() {
        // stale derived columns (999) must be recomputed, not trusted
        let record = parse_row("2025-01-01_00:00:00,10,100,10.2,2,3,999,999", false).unwrap();
        assert!((record.ops_per_sec_real - 10.0).abs() < 1e-9);
        assert!((record.ops_per_sec_cpu - 20.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_raw_fields_are_dropped() {
        // NaN real_time slips past a plain <= 0.0 comparison
        assert!(parse_row("2025-01-01_00:00:00,10,100,NaN,2,3,10,20", false).is_none());
        // inf duration would yield a bogus ops_per_sec_real of 0
        assert!(parse_row("2025-01-01_00:00:00,inf,100,10.1,2,3,10,20", false).is_none());
        assert!(parse_row("2025-01-01_00:00:00,10,inf,10.1,2,3,10,20", false).is_none());
        assert!(parse_row("2025-01-01_00:00:00,10,100,10.1,NaN,3,10,20", false).is_none());
        assert!(parse_row("2025-01-01_00:00:00,10,100,10.1,2,-inf,10,20", false).is_none());
    }

    #[test]
    fn zero_cpu_time_row_is_dropped() {
        assert!(parse_row("2025-01-01_00:00:00,10,100,10.2,0,0,10,20", false).is_none());
    }

    #[test]
    fn per_core_row_keeps_core_id() {
        let record = parse_row("2025-01-01_00:00:00,10,100,10.2,2,3,10,20,2", true).unwrap();
        assert_eq!(record.core_id, Some(2));
    }

    #[test]
    fn non_numeric_core_id_is_dropped() {
        assert!(parse_row("2025-01-01_00:00:00,10,100,10.2,2,3,10,20,two", true).is_none());
    }
}
