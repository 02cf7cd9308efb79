//! Core library for cpu-bench ─ stress-ng invocation, metrics ingestion and cleaning.

pub mod clean;
pub mod config;
pub mod extract;
pub mod invoke;
pub mod record;
pub mod store;
pub mod summary;

pub use clean::Cleaner;
pub use config::BenchConfig;
pub use extract::{ExtractError, RawMetrics};
pub use invoke::BenchRunner;
pub use record::BenchmarkRecord;
pub use store::RecordStore;
pub use summary::{summarize, MetricStats, PerfSummary};
