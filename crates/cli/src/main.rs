use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cpu_bench_core::record::TIMESTAMP_FORMAT;
use cpu_bench_core::{summarize, BenchConfig, BenchRunner, Cleaner};
use std::path::PathBuf;
use tracing::info;

/// cpu-bench – stress-ng benchmark driver with durable CSV ingestion
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run benchmark trials, then clean and summarize the results
    Run {
        /// Path to a YAML config file; CLI flags override its values
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of benchmark trials
        #[arg(long)]
        iterations: Option<u32>,

        /// Duration of each trial in seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Idle seconds between trials
        #[arg(long)]
        idle: Option<u64>,

        /// Worker count passed to the workload
        #[arg(long)]
        workers: Option<u32>,

        /// Workload binary to invoke
        #[arg(long)]
        workload: Option<String>,

        /// Raw log path
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Canonical dataset path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Regenerate the canonical dataset from an existing raw log
    Clean {
        /// Raw log path
        #[arg(long, default_value = "results/cpu_results.csv")]
        raw: PathBuf,

        /// Canonical dataset path
        #[arg(short, long, default_value = "results/cpu_results_clean.csv")]
        output: PathBuf,

        /// Re-clean even if a canonical dataset already exists
        #[arg(long)]
        force: bool,
    },
    /// Print a performance summary of the canonical dataset
    Summarize {
        /// Raw log path (cleaned on demand if no canonical dataset exists)
        #[arg(long, default_value = "results/cpu_results.csv")]
        raw: PathBuf,

        /// Canonical dataset path
        #[arg(short, long, default_value = "results/cpu_results_clean.csv")]
        output: PathBuf,

        /// Number of most recent rows to echo before the summary
        #[arg(long, default_value_t = 5)]
        tail: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "cpu_bench={},cpu_bench_core={}",
            log_level, log_level
        ))
        .init();

    info!("cpu-bench v{} starting", env!("CARGO_PKG_VERSION"));

    match args.command {
        Commands::Run {
            config,
            iterations,
            duration,
            idle,
            workers,
            workload,
            raw,
            output,
        } => {
            let config = build_config(
                config.as_deref(),
                iterations,
                duration,
                idle,
                workers,
                workload,
                raw,
                output,
            )?;
            run_pipeline(config).await
        }
        Commands::Clean { raw, output, force } => run_clean(&raw, &output, force),
        Commands::Summarize { raw, output, tail } => run_summarize(&raw, &output, tail),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_config(
    config_path: Option<&std::path::Path>,
    iterations: Option<u32>,
    duration: Option<u64>,
    idle: Option<u64>,
    workers: Option<u32>,
    workload: Option<String>,
    raw: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<BenchConfig> {
    let mut config = match config_path {
        Some(path) => BenchConfig::from_yaml_file(path)
            .with_context(|| format!("failed to load config {:?}", path))?,
        None => BenchConfig::default(),
    };
    if iterations.is_some() {
        config.iterations = iterations;
    }
    if duration.is_some() {
        config.duration_secs = duration;
    }
    if idle.is_some() {
        config.idle_secs = idle;
    }
    if workers.is_some() {
        config.workers = workers;
    }
    if workload.is_some() {
        config.workload = workload;
    }
    if raw.is_some() {
        config.raw_path = raw;
    }
    if output.is_some() {
        config.clean_path = output;
    }
    config.validate()?;
    Ok(config)
}

/// Full pipeline: N sequential trials → raw log → canonical dataset → summary.
async fn run_pipeline(config: BenchConfig) -> Result<()> {
    println!("[*] Starting CPU benchmark pipeline");

    let runner = BenchRunner::new(config.clone());
    let appended = runner.run().await?;
    println!(
        "[*] {} of {} trials recorded to {:?}",
        appended,
        config.iterations(),
        config.raw_path()
    );

    // fresh results just landed, so always re-clean instead of loading a
    // stale canonical dataset
    let cleaner = Cleaner::new(config.raw_path(), config.clean_path());
    let records = cleaner.clean()?;
    println!(
        "[*] Saved cleaned results to {:?} ({} rows)",
        config.clean_path(),
        records.len()
    );

    match summarize(&records) {
        Some(summary) => summary.print(),
        None => println!("[!] No valid benchmark rows to summarize."),
    }
    Ok(())
}

fn run_clean(raw: &std::path::Path, output: &std::path::Path, force: bool) -> Result<()> {
    let cleaner = Cleaner::new(raw, output);
    let records = if force {
        cleaner.clean()?
    } else {
        cleaner.load_or_clean()?
    };
    println!(
        "[*] Canonical dataset {:?}: {} rows",
        output,
        records.len()
    );
    Ok(())
}

fn run_summarize(raw: &std::path::Path, output: &std::path::Path, tail: usize) -> Result<()> {
    let cleaner = Cleaner::new(raw, output);
    let records = cleaner.load_or_clean()?;

    if tail > 0 && !records.is_empty() {
        let start = records.len().saturating_sub(tail);
        println!("[*] Latest results:");
        for record in &records[start..] {
            println!(
                "    {}  ops/s(real)={:.2}  ops/s(cpu)={:.2}",
                record.timestamp.format(TIMESTAMP_FORMAT),
                record.ops_per_sec_real,
                record.ops_per_sec_cpu
            );
        }
    }

    match summarize(&records) {
        Some(summary) => summary.print(),
        None => println!("[!] No valid benchmark rows to summarize."),
    }
    Ok(())
}
