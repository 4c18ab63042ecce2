//! fdrecon: open file descriptor discovery for the current process

pub mod discovery;
pub mod engine;
pub mod error;
pub mod introspect;
pub mod platform;
pub mod report;
pub mod sys;
pub mod thermal;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use discovery::{
    CleanupOpts, Discovery, clean_up, close_all, discover, mapped_descriptors, probe,
    reconcile, resolve_limit,
};
pub use error::{FdError, ThermalError};
pub use introspect::list_open_files;

/// Result alias used by the public fdrecon API
pub type Result<T> = std::result::Result<T, FdError>;
