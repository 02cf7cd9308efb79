use crate::record::BenchmarkRecord;

/// min/max/mean of one derived metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl MetricStats {
    fn over<I: IntoIterator<Item = f64>>(values: I) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in values {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 {
            return None;
        }
        Some(Self {
            min,
            max,
            mean: sum / count as f64,
        })
    }
}

/// Summary over the canonical dataset. Only ever built from a non-empty
/// dataset; "no data" is `None` from [`summarize`], never a summary of NaNs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerfSummary {
    pub samples: usize,
    pub ops_per_sec_real: MetricStats,
    pub ops_per_sec_cpu: MetricStats,
}

impl PerfSummary {
    pub fn print(&self) {
        println!("\n=== CPU Benchmark Summary ===");
        println!("Samples: {}", self.samples);
        println!(
            "Ops/sec (Real Time): min={:.2}, max={:.2}, avg={:.2}",
            self.ops_per_sec_real.min, self.ops_per_sec_real.max, self.ops_per_sec_real.mean
        );
        println!(
            "Ops/sec (CPU Time):  min={:.2}, max={:.2}, avg={:.2}",
            self.ops_per_sec_cpu.min, self.ops_per_sec_cpu.max, self.ops_per_sec_cpu.mean
        );
        println!("=============================\n");
    }
}

pub fn summarize(records: &[BenchmarkRecord]) -> Option<PerfSummary> {
    let ops_per_sec_real = MetricStats::over(records.iter().map(|r| r.ops_per_sec_real))?;
    let ops_per_sec_cpu = MetricStats::over(records.iter().map(|r| r.ops_per_sec_cpu))?;
    Some(PerfSummary {
        samples: records.len(),
        ops_per_sec_real,
        ops_per_sec_cpu,
    })
}
