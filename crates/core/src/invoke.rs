use anyhow::{bail, Context, Result};
use chrono::Local;
use std::io::ErrorKind;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::BenchConfig;
use crate::extract;
use crate::record::BenchmarkRecord;
use crate::store::RecordStore;

/// Stressor tag expected on the workload's metrics line.
const STRESSOR: &str = "cpu";

/// Sequential trial driver: one workload subprocess at a time, one raw-log
/// append per successful trial.
///
/// Trials never overlap; concurrent runs would contend for the CPU resources
/// under measurement and invalidate the results.
pub struct BenchRunner {
    config: BenchConfig,
    store: RecordStore,
}

impl BenchRunner {
    pub fn new(config: BenchConfig) -> Self {
        let store = RecordStore::new(config.raw_path());
        Self { config, store }
    }

    /// Run the configured number of trials, appending each success to the
    /// raw log. Returns the number of records appended, which may be fewer
    /// than the iteration count: a failed trial is forfeited, not retried.
    pub async fn run(&self) -> Result<usize> {
        let iterations = self.config.iterations();
        let mut appended = 0usize;

        for i in 0..iterations {
            info!("run {}/{}", i + 1, iterations);
            if let Some(record) = self.run_trial().await? {
                self.store
                    .append(&record)
                    .context("failed to append trial result to raw log")?;
                appended += 1;
                info!(
                    ops = record.ops,
                    real_time = record.real_time,
                    usr_time = record.usr_time,
                    sys_time = record.sys_time,
                    "run {} metrics captured",
                    i + 1
                );
            }
            // idle interval lets transient CPU state settle before the next
            // measurement; skipped after the final trial
            if i + 1 < iterations {
                tokio::time::sleep(Duration::from_secs(self.config.idle_secs())).await;
            }
        }

        Ok(appended)
    }

    /// One trial: launch the workload, wait for it to exit, extract metrics.
    /// Every failure mode short of a missing binary forfeits the trial with a
    /// warning and returns `None`.
    async fn run_trial(&self) -> Result<Option<BenchmarkRecord>> {
        let duration = self.config.duration_secs();
        let output = match Command::new(self.config.workload())
            .arg("--cpu")
            .arg(self.config.workers().to_string())
            .arg("--timeout")
            .arg(format!("{}s", duration))
            .arg("--metrics-brief")
            .output()
            .await
        {
            Ok(output) => output,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                bail!(
                    "workload binary {:?} not found; install it or point `workload` at one",
                    self.config.workload()
                );
            }
            Err(err) => {
                warn!("failed to launch workload: {err}");
                return Ok(None);
            }
        };

        if !output.status.success() {
            warn!("workload exited with {}", output.status);
            return Ok(None);
        }

        // stress-ng splits its report across stdout and stderr depending on
        // version, so search the combined capture
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push('\n');
        text.push_str(&String::from_utf8_lossy(&output.stderr));

        let Some(line) = extract::find_metrics_line(&text, STRESSOR) else {
            warn!("no metrics report line in workload output");
            return Ok(None);
        };

        let metrics = match extract::extract_metrics(line) {
            Ok(metrics) => metrics,
            Err(err) => {
                warn!("metrics extraction failed: {err}");
                return Ok(None);
            }
        };

        let timestamp = Local::now().naive_local();
        Ok(Some(BenchmarkRecord::from_capture(
            timestamp,
            duration as f64,
            metrics,
        )))
    }
}
