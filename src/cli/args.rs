//! Command-line argument definitions for the tracker processor
//!
//! This module defines the CLI interface using the clap derive API.

use crate::config::{AtomicMode, Config, ValidationMode};
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the tracker bundle processor
///
/// Completes and validates tracker bundles (tracked entities, enrollments,
/// events and relationships) against a metadata snapshot.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tracker-processor",
    version,
    about = "Preprocess and validate tracker bundles against a metadata snapshot",
    long_about = "Loads a metadata snapshot once, then fills in omitted program, program stage \
                  and attribute option combo identifiers of each tracker bundle and runs the \
                  validation hook chain over it. Every bundle is processed on its own copy of \
                  the metadata cache."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands for the tracker processor
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Preprocess and validate one or more tracker bundles
    Validate(ValidateArgs),
}

/// Arguments for the validate command
#[derive(Debug, Clone, Parser)]
pub struct ValidateArgs {
    /// Metadata snapshot (JSON)
    ///
    /// Programs, program stages, category combos, category options, category
    /// option combos, organisation units, tracked entity types and records
    /// that already exist.
    #[arg(
        short = 'm',
        long = "metadata",
        value_name = "FILE",
        help = "Metadata snapshot file (JSON)"
    )]
    pub metadata: PathBuf,

    /// Bundle file, or a directory searched recursively for `*.json` bundles
    #[arg(
        short = 'b',
        long = "bundle",
        value_name = "PATH",
        help = "Bundle file or directory of bundle files"
    )]
    pub bundle: PathBuf,

    /// Path to configuration file (JSON)
    ///
    /// Identifier schemes and validation behaviour. Command line flags
    /// override the validation settings of the file.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Path to configuration file (JSON format)"
    )]
    pub config_file: Option<PathBuf>,

    /// Validation mode
    #[arg(
        long = "validation-mode",
        value_enum,
        help = "Validation mode (overrides the config file)"
    )]
    pub validation_mode: Option<ValidationModeArg>,

    /// Atomic mode
    #[arg(
        long = "atomic-mode",
        value_enum,
        help = "Reject single records or whole bundles (overrides the config file)"
    )]
    pub atomic_mode: Option<AtomicModeArg>,

    /// Number of bundles processed concurrently
    ///
    /// Defaults to the number of CPUs.
    #[arg(
        short = 'j',
        long = "jobs",
        value_name = "COUNT",
        help = "Number of bundles processed concurrently"
    )]
    pub jobs: Option<usize>,

    /// Output format for the report
    #[arg(
        long = "format",
        value_enum,
        default_value = "text",
        help = "Output format for the report"
    )]
    pub output_format: OutputFormat,

    /// Logging verbosity level
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)"
    )]
    pub verbose: u8,

    /// Suppress output (quiet mode)
    ///
    /// Only show errors. Overrides verbose settings.
    #[arg(
        short = 'q',
        long = "quiet",
        help = "Suppress output except errors",
        conflicts_with = "verbose"
    )]
    pub quiet: bool,
}

/// Output format options for the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable coloured output
    Text,
    /// JSON format for scripting
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ValidationModeArg {
    Full,
    FailFast,
    Skip,
}

impl From<ValidationModeArg> for ValidationMode {
    fn from(arg: ValidationModeArg) -> Self {
        match arg {
            ValidationModeArg::Full => ValidationMode::Full,
            ValidationModeArg::FailFast => ValidationMode::FailFast,
            ValidationModeArg::Skip => ValidationMode::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AtomicModeArg {
    Object,
    All,
}

impl From<AtomicModeArg> for AtomicMode {
    fn from(arg: AtomicModeArg) -> Self {
        match arg {
            AtomicModeArg::Object => AtomicMode::Object,
            AtomicModeArg::All => AtomicMode::All,
        }
    }
}

impl ValidateArgs {
    /// Validate the command arguments for consistency
    pub fn validate(&self) -> Result<()> {
        if !self.metadata.is_file() {
            return Err(Error::configuration(format!(
                "Metadata snapshot does not exist: {}",
                self.metadata.display()
            )));
        }

        if !self.bundle.exists() {
            return Err(Error::bundle_not_found(self.bundle.display().to_string()));
        }

        if let Some(config_file) = &self.config_file {
            if !config_file.is_file() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }

        if self.jobs == Some(0) {
            return Err(Error::configuration(
                "Number of jobs must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Apply command line overrides to a loaded configuration
    pub fn apply_overrides(&self, mut config: Config) -> Config {
        if let Some(mode) = self.validation_mode {
            config = config.with_validation_mode(mode.into());
        }
        if let Some(mode) = self.atomic_mode {
            config = config.with_atomic_mode(mode.into());
        }
        config
    }

    /// Number of bundles to process concurrently
    pub fn concurrency(&self) -> usize {
        self.jobs.unwrap_or_else(num_cpus::get).max(1)
    }

    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars only for interactive text output
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Text
    }
}
