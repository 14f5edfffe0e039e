//! Command implementations for the tracker processor CLI
//!
//! Each command lives in its own module; [`shared`] holds logging setup,
//! configuration loading and bundle discovery used across commands.

pub mod shared;
pub mod validate;

pub use shared::RunSummary;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Main command runner
///
/// Dispatches to the handler of the given subcommand. `main` shows help
/// before calling this when no subcommand was given.
pub async fn run(args: Args) -> Result<RunSummary> {
    match args.command {
        Some(Commands::Validate(validate_args)) => validate::run_validate(validate_args).await,
        None => Ok(RunSummary::default()),
    }
}
