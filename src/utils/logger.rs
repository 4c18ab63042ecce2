use anyhow::{Context, Result};
use colored::Colorize;
use env_logger::{Builder, Target};
use log::Level;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use crate::types::FdIndex;
use crate::utils::config::PackagePaths;

/// Initialise logging. With `log_file`, lines are appended there uncoloured instead of going
/// to stderr; the returned index is that file's descriptor so callers can keep it open.
pub fn setup_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<FdIndex>> {
    use log::LevelFilter;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    let pkg_name = PackagePaths::get().pkg_name();
    let mut builder = Builder::from_default_env();
    builder
        .filter_level(LevelFilter::Warn) // Default: only warnings from dependencies
        .filter_module(pkg_name, level); // Our crate: use requested level

    let mut log_fd = None;
    let plain = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            log_fd = raw_index(&file);
            builder.target(Target::Pipe(Box::new(file)));
            true
        }
        None => false,
    };

    builder
        .format(move |buf, record| {
            if plain {
                return writeln!(buf, "[{} {}] {}", pkg_name, record.level(), record.args());
            }
            let line = match record.level() {
                Level::Error | Level::Warn => {
                    let level_str = match record.level() {
                        Level::Warn => "WARN".yellow(),
                        Level::Error => "ERROR".red(),
                        _ => unreachable!(),
                    };
                    let path = record.target().to_string().white();
                    format!("[{} {} {}] {}", pkg_name.cyan(), level_str, path, record.args())
                }
                _ => format!("[{}] {}", pkg_name.cyan(), record.args()),
            };
            writeln!(buf, "{}", line)
        })
        .init();
    Ok(log_fd)
}

#[cfg(unix)]
fn raw_index(file: &std::fs::File) -> Option<FdIndex> {
    use std::os::fd::AsRawFd;
    Some(file.as_raw_fd())
}

#[cfg(not(unix))]
fn raw_index(_file: &std::fs::File) -> Option<FdIndex> {
    None
}
