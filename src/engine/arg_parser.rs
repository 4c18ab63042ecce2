use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::LimitKind;

/// Map this process's open file descriptors to paths.
#[derive(Clone, Parser)]
#[command(name = "fdrecon")]
#[command(about = "Discover open file descriptors, map them to paths, optionally close them.")]
pub struct Cli {
    /// What to do. Default: map.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Verbose output.
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Print results as JSON.
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Which RLIMIT_NOFILE value bounds the descriptor scan.
    #[arg(long, value_enum, global = true)]
    pub limit: Option<LimitKind>,

    /// Never scan more than this many indices (applies when the OS limit is unlimited or huge).
    #[arg(long, global = true, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_scan: Option<u32>,

    /// Write log lines to this file instead of stderr.
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    /// Open this file before discovery (repeatable), so it shows up in the mapping.
    #[arg(long, global = true, value_name = "PATH")]
    pub hold: Vec<PathBuf>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Print `index -> path` for every descriptor that could be attributed to a file.
    Map,
    /// Print every open descriptor index with its kind (REG, DIR, SOCK, ...).
    Probe,
    /// Print the descriptor limit the scan uses.
    Limit,
    /// Close every mapped descriptor except stdio and the log file.
    Cleanup {
        /// Also close stdin, stdout and stderr.
        #[arg(long)]
        include_stdio: bool,
    },
    /// Print the number of effective CPUs.
    Cpus,
    /// Print CPU/SoC (and optionally disk) temperatures.
    Temps {
        /// Keep sampling and append each sample to the log until Ctrl-C.
        #[arg(long, short = 'w')]
        watch: bool,

        /// Seconds between samples in watch mode.
        #[arg(long, short = 'i', value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Temperature log file for watch mode.
        #[arg(long)]
        log: Option<PathBuf>,

        /// Block device to query with smartctl (repeatable), e.g. `--disk sda`.
        #[arg(long)]
        disk: Vec<String>,

        /// Directory holding thermal_zoneN entries.
        #[arg(long)]
        sysfs_root: Option<PathBuf>,
    },
}
