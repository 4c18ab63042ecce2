//! fdrecon CLI: map open descriptors to paths; probe, limit, cleanup, cpus and temps subcommands.

use anyhow::Result;
use clap::Parser;
use fdrecon::engine::Cli;
use fdrecon::engine::handle_run;
use std::time::Instant;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    handle_run(&cli)?;
    log::debug!("Total time: {:?}", start_time.elapsed());
    Ok(())
}
