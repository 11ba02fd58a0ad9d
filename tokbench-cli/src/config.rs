//! Configuration loading from tokbench.toml
//!
//! Defaults can be specified in a `tokbench.toml` discovered by walking
//! up from the current directory; CLI flags override file values.
//!
//! ```toml
//! [engines]
//! reference_id = "ref-engine"
//! candidate_id = "cand-engine"
//! reference_cmd = "./target/release/ref-engine --bench"
//! candidate_cmd = "python3 bench_candidate.py"
//!
//! [bench]
//! repeats = 5
//! engine_order = "alternate"
//! bootstrap_samples = 2000
//! equivalence_band = 0.05
//! sink_warning_threshold = 0.05
//! ```

use serde::Deserialize;
use std::path::Path;

/// Top-level tokbench configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokbenchConfig {
    /// Engine identities and command lines.
    #[serde(default)]
    pub engines: EnginesConfig,
    /// Benchmark defaults.
    #[serde(default)]
    pub bench: BenchConfig,
}

/// Engine identities and command lines.
#[derive(Debug, Clone, Deserialize)]
pub struct EnginesConfig {
    /// Engine id the reference command reports.
    #[serde(default = "default_reference_id")]
    pub reference_id: String,
    /// Engine id the candidate command reports.
    #[serde(default = "default_candidate_id")]
    pub candidate_id: String,
    /// Reference engine command line.
    #[serde(default)]
    pub reference_cmd: Option<String>,
    /// Candidate engine command line.
    #[serde(default)]
    pub candidate_cmd: Option<String>,
}

impl Default for EnginesConfig {
    fn default() -> Self {
        Self {
            reference_id: default_reference_id(),
            candidate_id: default_candidate_id(),
            reference_cmd: None,
            candidate_cmd: None,
        }
    }
}

/// Benchmark defaults applied when flags are absent.
#[derive(Debug, Clone, Deserialize)]
pub struct BenchConfig {
    /// Full benchmark rounds.
    #[serde(default = "default_repeats")]
    pub repeats: usize,
    /// Interleaving policy: "alternate", "reference-first",
    /// "candidate-first".
    #[serde(default = "default_engine_order")]
    pub engine_order: String,
    /// Bootstrap resample count.
    #[serde(default = "default_bootstrap_samples")]
    pub bootstrap_samples: usize,
    /// Practical-equivalence band around 1.0.
    #[serde(default = "default_equivalence_band")]
    pub equivalence_band: f64,
    /// Sink ratio warning threshold.
    #[serde(default = "default_sink_warning_threshold")]
    pub sink_warning_threshold: f64,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            repeats: default_repeats(),
            engine_order: default_engine_order(),
            bootstrap_samples: default_bootstrap_samples(),
            equivalence_band: default_equivalence_band(),
            sink_warning_threshold: default_sink_warning_threshold(),
        }
    }
}

fn default_reference_id() -> String {
    "reference".to_string()
}
fn default_candidate_id() -> String {
    "candidate".to_string()
}
fn default_repeats() -> usize {
    3
}
fn default_engine_order() -> String {
    "alternate".to_string()
}
fn default_bootstrap_samples() -> usize {
    tokbench_stats::DEFAULT_BOOTSTRAP_SAMPLES
}
fn default_equivalence_band() -> f64 {
    tokbench_stats::DEFAULT_EQUIVALENCE_BAND
}
fn default_sink_warning_threshold() -> f64 {
    0.05
}

impl TokbenchConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Discover and load configuration by walking up from the current
    /// directory.
    pub fn discover() -> Option<Self> {
        let mut dir = std::env::current_dir().ok()?;
        loop {
            let config_path = dir.join("tokbench.toml");
            if config_path.exists() {
                return Self::load(&config_path).ok();
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }
}
