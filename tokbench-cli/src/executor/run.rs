//! Engine Invocation
//!
//! Runs the two engine commands as subprocesses, captures their combined
//! output, and parses each invocation into a typed run sample. The
//! repeat schedule interleaves engines according to the configured
//! policy to control for order bias; aggregation downstream is invariant
//! to whichever policy was used.

use crate::EngineOrder;
use anyhow::{bail, Context};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tokbench_core::{parse_run_output, RunSample};
use tokbench_report::{RepeatSchedule, RunRecord};

/// One engine's identity and command line.
#[derive(Debug, Clone)]
pub struct EngineCommand {
    /// Engine id the command's output must report.
    pub id: String,
    /// Executable and arguments.
    pub argv: Vec<String>,
}

impl EngineCommand {
    /// Build from an id and a whitespace-split command line.
    pub fn new(id: &str, command_line: &str) -> anyhow::Result<Self> {
        let argv = split_command(command_line)?;
        Ok(EngineCommand {
            id: id.to_string(),
            argv,
        })
    }

    /// The command line as a display string.
    pub fn display(&self) -> String {
        self.argv.join(" ")
    }
}

/// Split a command line on whitespace. Quoting is not interpreted.
pub(crate) fn split_command(command_line: &str) -> anyhow::Result<Vec<String>> {
    let argv: Vec<String> = command_line
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if argv.is_empty() {
        bail!("empty engine command");
    }
    Ok(argv)
}

/// Run one engine invocation and return its combined stdout+stderr.
pub(crate) fn run_engine_once(engine: &EngineCommand) -> anyhow::Result<String> {
    let output = std::process::Command::new(&engine.argv[0])
        .args(&engine.argv[1..])
        .output()
        .with_context(|| format!("spawning `{}`", engine.display()))?;
    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));
    if !output.status.success() {
        bail!(
            "command failed ({}): {}\n{}",
            output.status,
            engine.display(),
            combined
        );
    }
    Ok(combined)
}

/// Engines in execution order for one repeat.
fn order_for_repeat<'a>(
    policy: EngineOrder,
    repeat_index: usize,
    reference: &'a EngineCommand,
    candidate: &'a EngineCommand,
) -> [&'a EngineCommand; 2] {
    match policy {
        EngineOrder::ReferenceFirst => [reference, candidate],
        EngineOrder::CandidateFirst => [candidate, reference],
        EngineOrder::Alternate => {
            if repeat_index % 2 == 0 {
                [reference, candidate]
            } else {
                [candidate, reference]
            }
        }
    }
}

/// Everything collected across the repeat schedule.
#[derive(Debug)]
pub struct RunCollection {
    /// Parsed samples in execution order.
    pub samples: Vec<RunSample>,
    /// Raw run records for the JSON report.
    pub records: Vec<RunRecord>,
    /// The schedule actually executed.
    pub schedule: Vec<RepeatSchedule>,
}

/// Execute the full repeat schedule against both engines.
pub fn collect_runs(
    reference: &EngineCommand,
    candidate: &EngineCommand,
    repeats: usize,
    policy: EngineOrder,
    sleep_between_engines_ms: u64,
    sleep_between_runs_ms: u64,
) -> anyhow::Result<RunCollection> {
    let pb = ProgressBar::new((repeats * 2) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let mut samples = Vec::with_capacity(repeats * 2);
    let mut records = Vec::with_capacity(repeats * 2);
    let mut schedule = Vec::with_capacity(repeats);

    for repeat_index in 0..repeats {
        let order = order_for_repeat(policy, repeat_index, reference, candidate);
        schedule.push(RepeatSchedule {
            repeat: repeat_index + 1,
            order: order.iter().map(|e| e.id.clone()).collect(),
        });
        for (position, engine) in order.iter().enumerate() {
            pb.set_message(format!("{} (run {}/{})", engine.id, repeat_index + 1, repeats));
            let output = run_engine_once(engine)?;
            let sample = parse_run_output(&output).with_context(|| {
                format!("parsing {} output (repeat {})", engine.id, repeat_index + 1)
            })?;
            if sample.engine_id != engine.id {
                bail!(
                    "engine output mismatch: expected={}, parsed={}",
                    engine.id,
                    sample.engine_id
                );
            }
            records.push(RunRecord {
                repeat: repeat_index + 1,
                sample: sample.clone(),
            });
            samples.push(sample);
            pb.inc(1);
            if position == 0 && sleep_between_engines_ms > 0 {
                std::thread::sleep(Duration::from_millis(sleep_between_engines_ms));
            }
        }
        if repeat_index + 1 < repeats && sleep_between_runs_ms > 0 {
            std::thread::sleep(Duration::from_millis(sleep_between_runs_ms));
        }
    }
    pb.finish_and_clear();

    Ok(RunCollection {
        samples,
        records,
        schedule,
    })
}
