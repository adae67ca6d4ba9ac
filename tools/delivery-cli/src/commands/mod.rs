//! CLI command implementations.

pub mod config;
pub mod fingerprint;
pub mod normalize;
pub mod simulate;

use clap::{Args, Subcommand};
use delivery_cache::RevalidatePolicy;
use delivery_core::{ContentKind, Method};

/// Arguments for the fingerprint command.
#[derive(Args)]
pub struct FingerprintArgs {
    /// Rendered file.
    pub file: String,

    /// Content kind: markup, structured-data or component-stream.
    #[arg(short, long, default_value = "markup")]
    pub kind: ContentKind,
}

/// Arguments for the normalize command.
#[derive(Args)]
pub struct NormalizeArgs {
    /// Rendered file.
    pub file: String,

    /// Content kind: markup, structured-data or component-stream.
    #[arg(short, long, default_value = "markup")]
    pub kind: ContentKind,

    /// Fail instead of falling back to the original on markup errors.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the simulate command.
#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Rendered file.
    pub file: String,

    /// Content kind: markup, structured-data or component-stream.
    #[arg(short, long, default_value = "markup")]
    pub kind: ContentKind,

    /// Request method.
    #[arg(short, long, default_value = "GET")]
    pub method: Method,

    /// `If-None-Match` request header.
    #[arg(long)]
    pub if_none_match: Option<String>,

    /// `If-Modified-Since` request header.
    #[arg(long)]
    pub if_modified_since: Option<String>,

    /// `Last-Modified` response header set before delivery.
    #[arg(long)]
    pub last_modified: Option<String>,

    /// Revalidation policy: seconds, `never` or `on-demand`.
    #[arg(long, value_parser = parse_revalidate)]
    pub revalidate: Option<RevalidatePolicy>,

    /// Stale-while-revalidate window in seconds.
    #[arg(long)]
    pub stale: Option<u64>,

    /// Deliver the file line by line as a streamed body.
    #[arg(long)]
    pub stream: bool,

    /// Print the body after the report.
    #[arg(long)]
    pub show_body: bool,
}

fn parse_revalidate(value: &str) -> Result<RevalidatePolicy, String> {
    RevalidatePolicy::parse(value)
        .ok_or_else(|| format!("expected seconds, `never` or `on-demand`, got `{}`", value))
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Validate the config file.
    Validate,
}
