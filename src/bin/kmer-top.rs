//! Command-line front end: most frequent k-mers of a FASTQ file

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, level_filters::LevelFilter, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kmerstream::config::{self, EngineConfig, ShortSequencePolicy};
use kmerstream::engine::KmerEngine;
use kmerstream::source::{SequenceFormat, SequenceReader};
use kmerstream::traits::IngestError;

const PROGRESS_INTERVAL: u64 = 100_000;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum InputFormat {
    /// Four-line FASTQ records
    Fastq,
    /// One sequence per line
    Lines,
}

impl From<InputFormat> for SequenceFormat {
    fn from(format: InputFormat) -> Self {
        match format {
            InputFormat::Fastq => SequenceFormat::Fastq,
            InputFormat::Lines => SequenceFormat::Lines,
        }
    }
}

/// Find the most frequent k-mers in a sequencing file using bounded memory
#[derive(Parser, Debug)]
#[command(name = "kmer-top")]
#[command(version)]
struct Cli {
    /// Input file
    input: PathBuf,

    /// Length of the counted substrings
    #[arg(short, long, default_value_t = config::DEFAULT_KMER_SIZE)]
    k_mer_size: usize,

    /// Number of k-mers printed in the summary
    #[arg(short = 'n', long, default_value_t = config::DEFAULT_TOP_N)]
    top: usize,

    /// Fairness constant of the eviction heuristic (should be between 1 and 2)
    #[arg(short, long, default_value_t = config::DEFAULT_FAIRNESS_CONST)]
    fairness: f64,

    /// File receiving every surviving k-mer
    #[arg(short, long, default_value = "output.txt")]
    output: PathBuf,

    /// Table size that triggers the first eviction pass
    #[arg(long, default_value_t = config::DEFAULT_CAPACITY_LIMIT)]
    initial_capacity: usize,

    /// Input layout
    #[arg(long, value_enum, default_value_t = InputFormat::Fastq)]
    format: InputFormat,

    /// Skip sequences shorter than the k-mer size instead of aborting
    #[arg(long)]
    skip_short: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn init_logging(&self) {
        let level = if self.verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        };

        tracing_subscriber::registry()
            .with(fmt::layer().with_target(false).with_writer(io::stderr))
            .with(
                EnvFilter::builder()
                    .with_default_directive(level.into())
                    .from_env_lossy(),
            )
            .init();
    }

    fn engine_config(&self) -> EngineConfig {
        let policy = if self.skip_short {
            ShortSequencePolicy::Skip
        } else {
            ShortSequencePolicy::Abort
        };

        EngineConfig::default()
            .with_kmer_size(self.k_mer_size)
            .with_top_n(self.top)
            .with_fairness_const(self.fairness)
            .with_initial_capacity_limit(self.initial_capacity)
            .with_short_sequence_policy(policy)
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.engine_config();
    if !(1.0..=2.0).contains(&config.fairness_const) {
        warn!(
            fairness = config.fairness_const,
            "fairness constant outside the tested range 1.0 - 2.0"
        );
    }
    let mut engine = KmerEngine::new(config).context("invalid configuration")?;

    let mut reader = SequenceReader::open(&cli.input, cli.format.into())
        .with_context(|| format!("failed to open {}", cli.input.display()))?;
    info!("Counting {}-mers in {}", cli.k_mer_size, cli.input.display());

    let started = Instant::now();
    let mut next_progress = PROGRESS_INTERVAL;
    let mut skipped = 0u64;

    while let Some(line) = reader.next() {
        let line = line.with_context(|| format!("failed to read {}", cli.input.display()))?;

        if reader.lines_read() >= next_progress {
            info!("Processing.. at line {}", reader.lines_read());
            next_progress += PROGRESS_INTERVAL;
        }

        match engine.ingest_line(&line) {
            Ok(outcome) => {
                if let Some(report) = outcome.eviction {
                    debug!(
                        before = report.before,
                        removed = report.removed,
                        mode = ?report.mode,
                        capacity_limit = report.capacity_limit,
                        "eviction pass"
                    );
                    if report.mode_switched {
                        debug!(
                            "capacity limit reached {}, switching to harsh eviction",
                            report.capacity_limit
                        );
                    }
                }
            }
            Err(err @ IngestError::SequenceTooShort { .. }) => {
                if engine.config().short_sequence_policy == ShortSequencePolicy::Skip {
                    skipped += 1;
                    debug!(line = reader.lines_read(), "{}, skipping", err);
                    continue;
                }
                warn!(
                    "Given sequence is shorter than {} chars. Aborting..",
                    cli.k_mer_size
                );
                break;
            }
        }
    }

    let stats = engine.stats();
    let (top_n, k) = (engine.config().top_n, engine.config().k_mer_size);
    let (ranking, last_pass) = engine.finish_with_report();
    let elapsed = started.elapsed();

    info!(
        lines = stats.lines_seen,
        skipped,
        evictions = stats.evictions,
        final_removed = last_pass.removed,
        capacity_limit = last_pass.capacity_limit,
        "Substring search took: {:.3} sec",
        elapsed.as_secs_f64()
    );

    let out = File::create(&cli.output)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;
    ranking
        .write_records(BufWriter::new(out))
        .with_context(|| format!("failed to write {}", cli.output.display()))?;
    info!("The results are written to file: {}", cli.output.display());

    println!();
    ranking
        .write_summary(io::stdout().lock(), top_n, k)
        .context("failed to write summary")?;

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_logging();
    run(&cli)
}
