// crates/core/src/config.rs
use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Benchmark pipeline configuration, loadable from YAML.
///
/// Every field is optional; accessors supply the defaults so a missing file
/// or an empty mapping still yields a runnable configuration. CLI flags
/// override by writing `Some` values before the pipeline starts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BenchConfig {
    pub iterations: Option<u32>,
    pub duration_secs: Option<u64>,
    pub idle_secs: Option<u64>,
    pub workers: Option<u32>,
    pub workload: Option<String>,
    pub raw_path: Option<PathBuf>,
    pub clean_path: Option<PathBuf>,
}

impl BenchConfig {
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {:?}", path.as_ref()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("failed to parse config file {:?}", path.as_ref()))
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.unwrap_or(5)
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs.unwrap_or(10)
    }

    pub fn idle_secs(&self) -> u64 {
        self.idle_secs.unwrap_or(2)
    }

    pub fn workers(&self) -> u32 {
        self.workers.unwrap_or(4)
    }

    pub fn workload(&self) -> &str {
        self.workload.as_deref().unwrap_or("stress-ng")
    }

    pub fn raw_path(&self) -> PathBuf {
        self.raw_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("results/cpu_results.csv"))
    }

    pub fn clean_path(&self) -> PathBuf {
        self.clean_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("results/cpu_results_clean.csv"))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.duration_secs() > 0, "trial duration must be > 0 seconds");
        ensure!(self.workers() > 0, "worker count must be > 0");
        ensure!(
            !self.workload().is_empty(),
            "workload binary name must not be empty"
        );
        Ok(())
    }
}
