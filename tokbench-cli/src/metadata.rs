//! Environment Metadata Collection
//!
//! Captures the host context a comparison ran under: CPU, memory, OS,
//! git state. Linux-specific sources (`/proc/cpuinfo`, `/proc/meminfo`)
//! gracefully degrade to placeholders on other platforms, so reports
//! stay renderable everywhere.

use chrono::Local;
use tokbench_report::EnvironmentInfo;

/// Collect environment metadata for report provenance.
pub fn collect_environment() -> EnvironmentInfo {
    let git_head = git_output(&["rev-parse", "HEAD"]);
    let git_branch = git_output(&["rev-parse", "--abbrev-ref", "HEAD"]);
    let git_dirty = git_output(&["status", "--porcelain"])
        .map(|s| !s.is_empty())
        .unwrap_or(false);

    EnvironmentInfo {
        timestamp_local: Local::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string(),
        os: format!("{} {}", std::env::consts::OS, std::env::consts::ARCH),
        cpu_model: cpu_model().unwrap_or_else(|| "Unknown".to_string()),
        physical_cores: physical_cores(),
        logical_cores: logical_cores(),
        memory: memory_bytes().map(format_bytes).unwrap_or_default(),
        harness_version: env!("CARGO_PKG_VERSION").to_string(),
        git_head,
        git_branch,
        git_dirty,
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = std::process::Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// CPU model name from /proc/cpuinfo (Linux only).
fn cpu_model() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("model name"))
                    .and_then(|l| l.split(':').nth(1))
                    .map(|s| s.trim().to_string())
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Distinct (physical id, core id) pairs from /proc/cpuinfo (Linux only).
fn physical_cores() -> Option<u32> {
    #[cfg(target_os = "linux")]
    {
        let content = std::fs::read_to_string("/proc/cpuinfo").ok()?;
        let mut pairs = std::collections::BTreeSet::new();
        let mut physical_id = "";
        let mut core_id = "";
        for line in content.lines().chain(std::iter::once("")) {
            if line.trim().is_empty() {
                if !physical_id.is_empty() || !core_id.is_empty() {
                    pairs.insert((physical_id.to_string(), core_id.to_string()));
                }
                physical_id = "";
                core_id = "";
                continue;
            }
            if let Some(value) = line.strip_prefix("physical id") {
                physical_id = value.trim_start_matches(&[' ', '\t', ':'][..]).trim();
            } else if let Some(value) = line.strip_prefix("core id") {
                core_id = value.trim_start_matches(&[' ', '\t', ':'][..]).trim();
            }
        }
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.len() as u32)
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

fn logical_cores() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(1)
}

/// Total system memory in bytes (Linux only).
fn memory_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/meminfo")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("MemTotal"))
                    .and_then(|l| {
                        l.split_whitespace()
                            .nth(1)
                            .and_then(|s| s.parse::<u64>().ok())
                    })
                    .map(|kb| kb * 1024)
            })
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Human-readable byte count with the raw value attached.
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {} ({bytes} bytes)", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512.00 B (512 bytes)");
        assert_eq!(format_bytes(2048), "2.00 KiB (2048 bytes)");
        assert_eq!(
            format_bytes(16 * 1024 * 1024 * 1024),
            "16.00 GiB (17179869184 bytes)"
        );
    }

    #[test]
    fn test_collect_environment_is_renderable() {
        let env = collect_environment();
        assert!(!env.timestamp_local.is_empty());
        assert!(!env.os.is_empty());
        assert!(env.logical_cores >= 1);
        assert!(!env.harness_version.is_empty());
    }
}
