#![warn(missing_docs)]
//! Tokbench CLI
//!
//! Command-line harness for comparing two tokenizer engine
//! implementations. Two subcommands cover the two evaluation tracks:
//!
//! - `tokbench bench`  — run both engines repeatedly, aggregate their
//!   reported throughput, and publish a bootstrap-CI comparison with a
//!   practical-equivalence decision per feature.
//! - `tokbench parity` — align both engines' structural dumps over a
//!   dataset and score tokenization/segmentation agreement.
//!
//! Engine commands and defaults can live in a `tokbench.toml` discovered
//! by walking up from the current directory; flags override the file.

mod config;
mod executor;
mod metadata;

pub use config::{BenchConfig, EnginesConfig, TokbenchConfig};
pub use executor::{run_bench, run_parity, BenchSettings, ParitySettings};
pub use metadata::collect_environment;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Interleaving policy between the two engines across repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum EngineOrder {
    /// Even repeats run reference first, odd repeats candidate first.
    Alternate,
    /// Reference always runs first within a repeat.
    ReferenceFirst,
    /// Candidate always runs first within a repeat.
    CandidateFirst,
}

impl EngineOrder {
    /// Stable name used in config files and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            EngineOrder::Alternate => "alternate",
            EngineOrder::ReferenceFirst => "reference-first",
            EngineOrder::CandidateFirst => "candidate-first",
        }
    }
}

impl std::fmt::Display for EngineOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tokbench CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "tokbench")]
#[command(version, about = "Compare two tokenizer engines: throughput and structural parity")]
pub struct Cli {
    /// Subcommand selecting the evaluation track.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run both engines repeatedly and compare throughput.
    Bench(BenchArgs),
    /// Score structural output parity over a dataset.
    Parity(ParityArgs),
}

/// Arguments for the `bench` subcommand.
#[derive(clap::Args, Debug)]
pub struct BenchArgs {
    /// Reference engine command line (whitespace-split).
    #[arg(long)]
    pub reference_cmd: Option<String>,

    /// Candidate engine command line (whitespace-split).
    #[arg(long)]
    pub candidate_cmd: Option<String>,

    /// Engine id the reference command must report.
    #[arg(long)]
    pub reference_id: Option<String>,

    /// Engine id the candidate command must report.
    #[arg(long)]
    pub candidate_id: Option<String>,

    /// How many full benchmark rounds to execute.
    #[arg(long)]
    pub repeats: Option<usize>,

    /// Execution order policy between engines.
    #[arg(long, value_enum)]
    pub engine_order: Option<EngineOrder>,

    /// Sleep milliseconds between the two engine runs in one repeat.
    #[arg(long, default_value_t = 0)]
    pub sleep_between_engines_ms: u64,

    /// Sleep milliseconds between repeats.
    #[arg(long, default_value_t = 0)]
    pub sleep_between_runs_ms: u64,

    /// Allowed sink ratio deviation from 1.0 before warning (0.05 = 5%).
    #[arg(long)]
    pub sink_warning_threshold: Option<f64>,

    /// Bootstrap resample count for the throughput ratio 95% CI.
    #[arg(long)]
    pub bootstrap_samples: Option<usize>,

    /// Practical-equivalence band around a 1.0 ratio (0.05 = ±5%).
    #[arg(long)]
    pub equivalence_band: Option<f64>,

    /// Exit non-zero when any sink parity warning appears.
    #[arg(long)]
    pub strict_sink_check: bool,

    /// Dataset TSV profiled into the report (`category<TAB>text`).
    #[arg(long)]
    pub dataset_tsv: Option<PathBuf>,

    /// Restrict the dataset profile to one category.
    #[arg(long)]
    pub dataset_category: Option<String>,

    /// Write the markdown report here.
    #[arg(long)]
    pub md_out: Option<PathBuf>,

    /// Write the raw JSON report here.
    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

/// Arguments for the `parity` subcommand.
#[derive(clap::Args, Debug)]
pub struct ParityArgs {
    /// Dataset TSV path (`category<TAB>text`).
    #[arg(long)]
    pub dataset_tsv: PathBuf,

    /// Reference engine structural dump (NDJSON).
    #[arg(long)]
    pub reference_jsonl: PathBuf,

    /// Candidate engine structural dump (NDJSON).
    #[arg(long)]
    pub candidate_jsonl: PathBuf,

    /// Command producing the reference dump, run before loading.
    #[arg(long)]
    pub reference_cmd: Option<String>,

    /// Command producing the candidate dump, run before loading.
    #[arg(long)]
    pub candidate_cmd: Option<String>,

    /// Engine id label for the reference side.
    #[arg(long)]
    pub reference_id: Option<String>,

    /// Engine id label for the candidate side.
    #[arg(long)]
    pub candidate_id: Option<String>,

    /// Cap on representative mismatch examples.
    #[arg(long, default_value_t = tokbench_parity::DEFAULT_EXAMPLE_CAP)]
    pub max_examples: usize,

    /// Write the markdown report here.
    #[arg(long)]
    pub md_out: Option<PathBuf>,

    /// Write the JSON report here.
    #[arg(long)]
    pub json_out: Option<PathBuf>,
}

/// Parse arguments, execute, and translate errors into an exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();
    let config = TokbenchConfig::discover().unwrap_or_default();
    let outcome = match cli.command {
        Commands::Bench(args) => BenchSettings::resolve(args, &config).and_then(run_bench),
        Commands::Parity(args) => ParitySettings::resolve(args, &config).and_then(run_parity),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    }
}
