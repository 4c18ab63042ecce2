//! CLI command handler: file config, then flags, then dispatch. `map` when no command is given.

use anyhow::{Context, Result};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::engine::arg_parser::{Cli, Commands};
use crate::engine::handlers::{
    handle_cleanup, handle_cpus, handle_limit, handle_map, handle_probe, handle_temps,
};
use crate::types::Opts;
use crate::utils::fdrecon_toml::{apply_file_to_opts, config_path, load_fdrecon_toml};
use crate::utils::config::PackagePaths;
use crate::utils::setup_logging;

/// Defaults, then `.fdrecon.toml` (or `$FDRECON_CONFIG`) from `dir`, then CLI flags.
pub fn resolve_opts(cli: &Cli, dir: &Path) -> Opts {
    let mut opts = Opts::default();
    if let Some(file) = load_fdrecon_toml(&config_path(dir)) {
        apply_file_to_opts(&file, &mut opts);
    }
    if cli.verbose {
        opts.verbose = true;
    }
    if cli.json {
        opts.json = true;
    }
    if let Some(limit) = cli.limit {
        opts.limit = limit;
    }
    if let Some(max_scan) = cli.max_scan {
        opts.max_scan = max_scan;
    }
    if cli.log_file.is_some() {
        opts.log_file = cli.log_file.clone();
    }
    opts.hold = cli.hold.clone();

    match &cli.command {
        Some(Commands::Cleanup { include_stdio }) if *include_stdio => opts.include_stdio = true,
        Some(Commands::Temps {
            watch,
            interval,
            log,
            disk,
            sysfs_root,
        }) => {
            opts.thermal.watch = *watch;
            if let Some(secs) = interval {
                opts.thermal.interval_secs = *secs;
            }
            if let Some(p) = log {
                opts.thermal.log_path = p.clone();
            }
            if !disk.is_empty() {
                opts.thermal.disks = disk.clone();
            }
            if let Some(p) = sysfs_root {
                opts.thermal.sysfs_root = p.clone();
            }
        }
        _ => {}
    }
    opts
}

fn hold_files(paths: &[PathBuf]) -> Result<Vec<File>> {
    paths
        .iter()
        .map(|p| File::open(p).with_context(|| format!("open --hold file {}", p.display())))
        .collect()
}

/// Run the selected command.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let _ = dotenvy::dotenv();
    let cwd = std::env::current_dir().context("current directory")?;
    let opts = resolve_opts(cli, &cwd);
    let log_fd = setup_logging(opts.verbose, opts.log_file.as_deref())?;
    debug!(
        "{} CONFIG:{:#?}",
        PackagePaths::get().pkg_name().to_uppercase(),
        opts
    );

    let held = hold_files(&opts.hold)?;
    match cli.command.as_ref().unwrap_or(&Commands::Map) {
        Commands::Map => handle_map(&opts),
        Commands::Probe => handle_probe(&opts),
        Commands::Limit => handle_limit(&opts),
        Commands::Cleanup { .. } => handle_cleanup(&opts, held, log_fd),
        Commands::Cpus => handle_cpus(&opts),
        Commands::Temps { .. } => handle_temps(&opts),
    }
}
