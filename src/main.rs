//! buildprep - Main entry point
//!
//! A fail-fast dependency bootstrap invoked as a hosting platform build step:
//! upgrade the package installer, install one pinned dependency without its
//! dependency closure, then install the manifest.

use log::{debug, error, info};
use std::path::PathBuf;

use buildprep::cli::{Cli, Commands};
use buildprep::manifest::Manifest;
use buildprep::sequencer::{run_sequence, SequenceOptions};
use buildprep::steps::pip::MANIFEST_PATH;
use buildprep::{process_guard, ProcessGuard};

/// Initialize the logger with appropriate settings
fn init_logger() {
    use env_logger::Builder;
    use std::io::Write;

    Builder::from_default_env()
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}:{}] {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .parse_default_env() // Allows RUST_LOG env var to override
        .init();
}

/// Main application entry point
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging first
    init_logger();
    info!("buildprep starting up");

    // Initialize signal handlers so installer children are terminated if the
    // platform cancels the build (SIGINT/SIGTERM/SIGHUP)
    if let Err(e) = process_guard::init_signal_handlers() {
        log::warn!("Failed to initialize signal handlers: {}", e);
        // Continue anyway - cleanup still works via Drop
    }
    debug!("Signal handlers initialized");

    // Held for the whole run: terminates surviving children on any exit path
    let _guard = ProcessGuard::new();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Some(Commands::Validate { manifest }) => {
            let path = manifest.unwrap_or_else(|| PathBuf::from(MANIFEST_PATH));
            info!("Validating manifest: {:?}", path);
            match Manifest::load_from_file(&path) {
                Ok(manifest) => match manifest.validate() {
                    Ok(()) => {
                        info!("Manifest validation successful");
                        println!(
                            "✓ Manifest is valid: {} ({} package(s))",
                            path.display(),
                            manifest.len()
                        );
                    }
                    Err(e) => {
                        error!("Manifest validation failed: {:#}", e);
                        eprintln!("✗ Manifest validation failed: {:#}", e);
                        std::process::exit(1);
                    }
                },
                Err(e) => {
                    error!("Failed to load manifest: {:#}", e);
                    eprintln!("✗ Failed to load manifest: {:#}", e);
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Run) | None => {
            info!("Running install sequence");
            let opts = SequenceOptions {
                dry_run: cli.dry_run,
            };
            match run_sequence(&opts) {
                Ok(()) => {
                    println!("\n✓ All dependencies installed");
                }
                Err(e) => {
                    eprintln!("\n✗ Dependency bootstrap failed: {}", e);
                    // Propagate the failed step's exit code unchanged
                    std::process::exit(e.exit_code());
                }
            }
        }
    }

    Ok(())
}
