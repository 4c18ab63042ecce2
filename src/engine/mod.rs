//! Engine module: CLI parsing and command handlers

pub mod arg_parser;
pub mod cli;
pub mod handlers;

// Re-export commonly used functions
pub use arg_parser::{Cli, Commands};
pub use cli::{handle_run, resolve_opts};
pub use handlers::{
    handle_cleanup, handle_cpus, handle_limit, handle_map, handle_probe, handle_temps,
};
