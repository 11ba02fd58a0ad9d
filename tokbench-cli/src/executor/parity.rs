//! Parity Pipeline
//!
//! Loads (or first generates) both engines' structural dumps for a
//! dataset, scores their agreement, and renders the parity report.

use super::run::split_command;
use crate::config::TokbenchConfig;
use crate::ParityArgs;
use anyhow::{bail, Context};
use std::path::{Path, PathBuf};
use tokbench_parity::{load_structural_file, score};
use tokbench_report::{generate_json_report, render_parity_markdown, ParityReport};

/// Fully resolved settings for one parity invocation.
#[derive(Debug)]
pub struct ParitySettings {
    /// Reference engine label.
    pub reference_id: String,
    /// Candidate engine label.
    pub candidate_id: String,
    /// Dataset TSV path.
    pub dataset_tsv: PathBuf,
    /// Reference structural dump path.
    pub reference_jsonl: PathBuf,
    /// Candidate structural dump path.
    pub candidate_jsonl: PathBuf,
    /// Command generating the reference dump, if any.
    pub reference_cmd: Option<String>,
    /// Command generating the candidate dump, if any.
    pub candidate_cmd: Option<String>,
    /// Representative example cap.
    pub max_examples: usize,
    /// Markdown output path.
    pub md_out: Option<PathBuf>,
    /// JSON output path.
    pub json_out: Option<PathBuf>,
}

impl ParitySettings {
    /// Merge CLI flags over config-file defaults.
    pub fn resolve(args: ParityArgs, config: &TokbenchConfig) -> anyhow::Result<Self> {
        Ok(ParitySettings {
            reference_id: args
                .reference_id
                .unwrap_or_else(|| config.engines.reference_id.clone()),
            candidate_id: args
                .candidate_id
                .unwrap_or_else(|| config.engines.candidate_id.clone()),
            dataset_tsv: args.dataset_tsv,
            reference_jsonl: args.reference_jsonl,
            candidate_jsonl: args.candidate_jsonl,
            reference_cmd: args.reference_cmd,
            candidate_cmd: args.candidate_cmd,
            max_examples: args.max_examples,
            md_out: args.md_out,
            json_out: args.json_out,
        })
    }
}

/// Run a dump-producing command, failing loudly with its output.
fn run_dump_command(label: &str, command_line: &str) -> anyhow::Result<()> {
    let argv = split_command(command_line)?;
    let output = std::process::Command::new(&argv[0])
        .args(&argv[1..])
        .output()
        .with_context(|| format!("spawning {label} dump command `{command_line}`"))?;
    if !output.status.success() {
        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        bail!(
            "{label} dump command failed ({}): {command_line}\n{combined}",
            output.status
        );
    }
    Ok(())
}

fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    println!("[written] {}", path.display());
    Ok(())
}

/// Execute the parity track end to end. Returns the process exit code.
pub fn run_parity(settings: ParitySettings) -> anyhow::Result<i32> {
    if let Some(cmd) = &settings.reference_cmd {
        run_dump_command("reference", cmd)?;
    }
    if let Some(cmd) = &settings.candidate_cmd {
        run_dump_command("candidate", cmd)?;
    }

    let rows = tokbench_core::load_dataset_rows(&settings.dataset_tsv)?;
    let reference_rows = load_structural_file(&settings.reference_jsonl)?;
    let candidate_rows = load_structural_file(&settings.candidate_jsonl)?;
    let result = score(&rows, &reference_rows, &candidate_rows, settings.max_examples)?;

    let report = ParityReport {
        reference_id: settings.reference_id.clone(),
        candidate_id: settings.candidate_id.clone(),
        dataset_path: settings.dataset_tsv.display().to_string(),
        result,
    };

    let markdown = render_parity_markdown(&report);
    println!("{markdown}");

    if let Some(md_out) = &settings.md_out {
        write_output(md_out, &format!("{markdown}\n"))?;
    }
    if let Some(json_out) = &settings.json_out {
        let json = generate_json_report(&report.json_payload())?;
        write_output(json_out, &format!("{json}\n"))?;
    }
    Ok(0)
}
