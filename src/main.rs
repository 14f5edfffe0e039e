use clap::Parser;
use std::process;
use tracker_processor::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        tokio::select! {
            result = commands::run(args) => result,
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    eprintln!("Failed to listen for CTRL+C: {}", e);
                }
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(tracker_processor::Error::processing_interrupted(
                    "Processing interrupted by user",
                ))
            }
        }
    });

    match result {
        // Reports have already been printed by the command
        Ok(summary) if summary.is_clean() => process::exit(0),
        Ok(_) => process::exit(2),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("Tracker Processor - Tracker bundle preprocessing and validation");
    println!("===============================================================");
    println!();
    println!("Completes events with identifiers derived from metadata and validates");
    println!("tracked entities, enrollments, events and relationships against a");
    println!("metadata snapshot.");
    println!();
    println!("USAGE:");
    println!("    tracker-processor <COMMAND> [OPTIONS]");
    println!();
    println!("COMMANDS:");
    println!("    validate    Preprocess and validate tracker bundles");
    println!("    help        Show this help message or help for specific commands");
    println!();
    println!("EXIT CODES:");
    println!("    0    every bundle validated without errors");
    println!("    1    the run failed (unreadable metadata, bad configuration)");
    println!("    2    at least one bundle had validation errors or could not be read");
    println!();
    println!("EXAMPLES:");
    println!("    # Validate a single bundle:");
    println!("    tracker-processor validate --metadata metadata.json --bundle bundle.json");
    println!();
    println!("    # Validate a directory of bundles, rejecting whole bundles on error:");
    println!("    tracker-processor validate -m metadata.json -b bundles/ --atomic-mode all");
    println!();
    println!("    # JSON report for scripting:");
    println!("    tracker-processor validate -m metadata.json -b bundles/ --format json -q");
    println!();
    println!("For detailed help on any command, use:");
    println!("    tracker-processor <COMMAND> --help");
}
