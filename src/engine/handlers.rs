//! Command handlers

use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::discovery::{discover, probe, resolve_limit_with};
use crate::platform::detect_ncpus;
use crate::report;
use crate::thermal;
use crate::types::{DiscoverOpts, FdIndex, Opts};

/// Handle map command
pub fn handle_map(opts: &Opts) -> Result<()> {
    let discovery = discover(&DiscoverOpts::from(opts)).context("descriptor discovery")?;
    if discovery.limit.capped {
        info!(
            "Descriptor limit is unlimited or very large; scanned the first {} indices",
            discovery.limit.value
        );
    }
    report::print_map(&discovery, opts.json)
}

/// Handle probe command
pub fn handle_probe(opts: &Opts) -> Result<()> {
    let limit = resolve_limit_with(opts.limit, opts.max_scan)?;
    report::print_handles(&probe(&limit), opts.json)
}

/// Handle limit command
pub fn handle_limit(opts: &Opts) -> Result<()> {
    let limit = resolve_limit_with(opts.limit, opts.max_scan)?;
    report::print_limit(&limit, opts.json)
}

/// Handle cleanup command. Held files are released to the closer; the log file is kept.
#[cfg(unix)]
pub fn handle_cleanup(opts: &Opts, held: Vec<File>, log_fd: Option<FdIndex>) -> Result<()> {
    use crate::discovery::{CleanupOpts, clean_up};
    use std::os::fd::IntoRawFd;

    // Ownership of the held descriptors moves to the closer.
    let _released: Vec<FdIndex> = held.into_iter().map(IntoRawFd::into_raw_fd).collect();
    let cleanup = CleanupOpts {
        include_stdio: opts.include_stdio,
        keep: log_fd.into_iter().collect(),
    };
    if cleanup.include_stdio {
        warn!("Closing stdin/stdout/stderr as well; later output may be lost");
    }
    // SAFETY: apart from stdio (excluded unless asked for) and the log file (kept), the only
    // regular files this process holds are the released --hold descriptors.
    let reports = unsafe { clean_up(&DiscoverOpts::from(opts), &cleanup) }
        .context("descriptor cleanup")?;
    let failed = reports.iter().filter(|r| !r.outcome.is_closed()).count();
    if failed > 0 {
        warn!("{} of {} descriptors could not be closed", failed, reports.len());
    }
    report::print_close(&reports, opts.json)
}

#[cfg(not(unix))]
pub fn handle_cleanup(_opts: &Opts, _held: Vec<File>, _log_fd: Option<FdIndex>) -> Result<()> {
    anyhow::bail!("cleanup is only supported on unix")
}

/// Handle cpus command
pub fn handle_cpus(opts: &Opts) -> Result<()> {
    let n = detect_ncpus();
    if opts.json {
        println!("{}", serde_json::json!({ "cpus": n }));
    } else {
        println!("{n}");
    }
    Ok(())
}

/// Handle temps command: one sample, or a logging loop until Ctrl-C with `--watch`.
pub fn handle_temps(opts: &Opts) -> Result<()> {
    if !opts.thermal.watch {
        let readings = thermal::sample(&opts.thermal)?;
        return report::print_temperatures(&readings, opts.json);
    }

    let stop = Arc::new(AtomicBool::new(false));
    let stop_handler = Arc::clone(&stop);
    ctrlc::set_handler(move || stop_handler.store(true, Ordering::SeqCst))
        .context("install Ctrl-C handler")?;

    let as_json = opts.json;
    thermal::watch(&opts.thermal, &stop, |readings| {
        if let Err(e) = report::print_temperatures(readings, as_json) {
            warn!("print temperatures: {}", e);
        }
    })?;
    Ok(())
}
