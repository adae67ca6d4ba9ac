//! Edge delivery CLI - Inspect fingerprints and simulate response delivery.
//!
//! Commands:
//! - `edge-deliver fingerprint` - Print the entity tag of a rendered file
//! - `edge-deliver normalize` - Print the canonical form used for fingerprints
//! - `edge-deliver simulate` - Run a full delivery against an in-memory transport
//! - `edge-deliver config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use delivery_observability::{init_logging, LogLevel};

use commands::{ConfigArgs, FingerprintArgs, NormalizeArgs, SimulateArgs};

/// Edge delivery CLI - Fingerprint, normalize and simulate rendered responses
#[derive(Parser)]
#[command(name = "edge-deliver")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the entity tag of a rendered file
    Fingerprint(FingerprintArgs),

    /// Print the normalized form of a rendered file
    Normalize(NormalizeArgs),

    /// Deliver a rendered file and report status, headers and body size
    Simulate(SimulateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup output formatting
    let output = output::Output::new(cli.verbose, cli.json);

    // Load config
    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let mut logging = ctx.config.logging;
    if cli.verbose {
        logging = logging.with_level(LogLevel::Debug);
    }
    if let Err(e) = init_logging(&logging) {
        ctx.output.warn(&e.to_string());
    }

    // Execute command
    let result = match cli.command {
        Commands::Fingerprint(args) => commands::fingerprint::run(args, &ctx).await,
        Commands::Normalize(args) => commands::normalize::run(args, &ctx).await,
        Commands::Simulate(args) => commands::simulate::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
