//! Error types for descriptor discovery and temperature sampling.

use std::io;
use std::path::PathBuf;

/// Fatal discovery errors. Per-descriptor races (closed index, vanished path,
/// identity check failing mid-scan) are absorbed where they happen and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum FdError {
    /// The descriptor ceiling could not be read, so there is nothing to bound the scan with.
    #[error("failed to resolve descriptor limit via {what}: {source}")]
    ResourceQuery {
        what: &'static str,
        source: io::Error,
    },

    /// The OS process-accounting facility could not list this process's open files.
    #[error("failed to list open files via {what}: {source}")]
    ProcessQuery {
        what: &'static str,
        source: io::Error,
    },

    /// A listed path exists but could not be reopened for the identity check.
    #[error("failed to reopen {}: {source}", .path.display())]
    Reopen { path: PathBuf, source: io::Error },
}

/// Errors that can occur when sampling temperature sensors.
#[derive(Debug, thiserror::Error)]
pub enum ThermalError {
    /// Failed to read a sysfs file.
    #[error("failed to read {path}: {source}")]
    ReadError { path: String, source: io::Error },

    /// Failed to parse a temperature out of a sensor file or tool output.
    #[error("failed to parse temperature from {path}: {detail}")]
    ParseError { path: String, detail: String },

    /// The sensor source does not exist on this machine.
    #[error("sensor source not found: {path}")]
    NotAvailable { path: String },

    /// An external tool (smartctl) could not be run.
    #[error("failed to run {tool}: {source}")]
    Command {
        tool: &'static str,
        source: io::Error,
    },
}
