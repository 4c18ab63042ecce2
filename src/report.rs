//! Console and JSON output for pipeline results.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use serde_json::json;

use crate::discovery::Discovery;
use crate::thermal::TemperatureReading;
use crate::types::{CloseOutcome, CloseReport, DescriptorHandle, DescriptorLimit, LimitSource};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// `index -> path` per reconciled entry, plus a one-line summary.
pub fn print_map(discovery: &Discovery, as_json: bool) -> Result<()> {
    if as_json {
        return print_json(discovery);
    }
    for entry in &discovery.entries {
        println!(
            "{:>6} -> {}",
            entry.index.to_string().cyan(),
            entry.path.display()
        );
    }
    println!(
        "{}",
        format!(
            "{} mapped | {} open | {} listed | limit {}",
            discovery.entries.len(),
            discovery.handles.len(),
            discovery.records.len(),
            discovery.limit.value
        )
        .dimmed()
    );
    Ok(())
}

/// Every open index with its kind.
pub fn print_handles(handles: &[DescriptorHandle], as_json: bool) -> Result<()> {
    if as_json {
        return print_json(handles);
    }
    for h in handles {
        println!("{:>6} {}", h.index.to_string().cyan(), h.kind.label());
    }
    Ok(())
}

pub fn print_limit(limit: &DescriptorLimit, as_json: bool) -> Result<()> {
    if as_json {
        return print_json(limit);
    }
    let source = match limit.source {
        LimitSource::HardRlimit => "hard RLIMIT_NOFILE",
        LimitSource::SoftRlimit => "soft RLIMIT_NOFILE",
        LimitSource::MaxStdio => "_getmaxstdio (soft cap)",
    };
    let capped = if limit.capped { " (capped)" } else { "" };
    println!("{}{} from {}", limit.value.to_string().cyan(), capped, source);
    Ok(())
}

/// One line per close attempt; failures in red with the OS error.
pub fn print_close(reports: &[CloseReport], as_json: bool) -> Result<()> {
    if as_json {
        let rows: Vec<_> = reports
            .iter()
            .map(|r| {
                let error = match &r.outcome {
                    CloseOutcome::Closed => None,
                    CloseOutcome::Failed(e) => Some(e.to_string()),
                };
                json!({
                    "index": r.entry.index,
                    "path": r.entry.path,
                    "closed": r.outcome.is_closed(),
                    "error": error,
                })
            })
            .collect();
        return print_json(&rows);
    }
    for r in reports {
        let status = match &r.outcome {
            CloseOutcome::Closed => "closed".green().to_string(),
            CloseOutcome::Failed(e) => format!("{} ({})", "failed".red(), e),
        };
        println!(
            "{:>6} -> {} {}",
            r.entry.index.to_string().cyan(),
            r.entry.path.display(),
            status
        );
    }
    Ok(())
}

pub fn print_temperatures(readings: &[TemperatureReading], as_json: bool) -> Result<()> {
    if as_json {
        return print_json(readings);
    }
    for r in readings {
        println!("{:<24} {:>6.1} C", r.label, r.celsius);
    }
    Ok(())
}
