use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::extract::RawMetrics;

/// Timestamp layout shared by the raw log and the canonical dataset.
/// Second precision; insertion order is what matters, not uniqueness.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";

/// Canonical column order of both CSV files.
pub const CSV_HEADER: &str =
    "timestamp,duration,ops,real_time,usr_time,sys_time,ops_per_sec_real,ops_per_sec_cpu";

/// Variant header for per-core logs; `core_id` is always the last column.
pub const CSV_HEADER_PER_CORE: &str =
    "timestamp,duration,ops,real_time,usr_time,sys_time,ops_per_sec_real,ops_per_sec_cpu,core_id";

/// One completed benchmark trial.
///
/// The `ops_per_sec_*` fields are derived and always recomputed from the raw
/// fields during cleaning; values read back from a raw log are never trusted.
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkRecord {
    pub timestamp: NaiveDateTime,
    pub duration: f64,
    pub ops: f64,
    pub real_time: f64,
    pub usr_time: f64,
    pub sys_time: f64,
    pub ops_per_sec_real: f64,
    pub ops_per_sec_cpu: f64,
    pub core_id: Option<i64>,
}

impl BenchmarkRecord {
    /// Build a record from a fresh workload capture, stamping derived metrics.
    pub fn from_capture(timestamp: NaiveDateTime, duration: f64, metrics: RawMetrics) -> Self {
        let mut record = Self {
            timestamp,
            duration,
            ops: metrics.ops,
            real_time: metrics.real_time,
            usr_time: metrics.usr_time,
            sys_time: metrics.sys_time,
            ops_per_sec_real: 0.0,
            ops_per_sec_cpu: 0.0,
            core_id: None,
        };
        record.recompute_derived();
        record
    }

    /// Recompute both throughput figures from the raw fields.
    ///
    /// `ops_per_sec_real` uses the configured trial duration, not the
    /// workload-reported wall time (see DESIGN.md). A zero CPU-time
    /// denominator yields a non-finite value, which the cleaner discards.
    pub fn recompute_derived(&mut self) {
        self.ops_per_sec_real = self.ops / self.duration;
        self.ops_per_sec_cpu = self.ops / (self.usr_time + self.sys_time);
    }

    pub fn derived_metrics_finite(&self) -> bool {
        self.ops_per_sec_real.is_finite() && self.ops_per_sec_cpu.is_finite()
    }

    /// Render one CSV row in canonical field order.
    pub fn to_csv_row(&self) -> String {
        let mut row = format!(
            "{},{},{},{},{},{},{},{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.duration,
            self.ops,
            self.real_time,
            self.usr_time,
            self.sys_time,
            self.ops_per_sec_real,
            self.ops_per_sec_cpu,
        );
        if let Some(core_id) = self.core_id {
            row.push(',');
            row.push_str(&core_id.to_string());
        }
        row
    }
}

pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIMESTAMP_FORMAT)
        .with_context(|| format!("timestamp {:?} does not match {}", text, TIMESTAMP_FORMAT))
}
