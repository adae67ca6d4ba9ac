//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};
use http::HeaderValue;

use super::{ConfigArgs, ConfigCommand};
use crate::config::{generate_default_config, CliConfig, CONFIG_FILE};
use crate::context::Context;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx).await,
        ConfigCommand::Init { force } => init_config(force, ctx).await,
        ConfigCommand::Validate => validate_config(ctx).await,
    }
}

async fn show_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Current Configuration");

    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    let delivery = &ctx.config.delivery;
    ctx.output.info("");
    ctx.output.info("[delivery]");
    ctx.output.kv("generate_etags", &delivery.generate_etags.to_string());
    ctx.output.kv("powered_by_header", &delivery.powered_by_header.to_string());
    ctx.output.kv("powered_by_value", &delivery.powered_by_value);
    ctx.output.kv("stream_marker", &delivery.stream_marker);

    ctx.output.info("");
    ctx.output.info("[logging]");
    ctx.output.kv("format", &format!("{:?}", ctx.config.logging.format).to_lowercase());
    ctx.output.kv("level", &ctx.config.logging.level.to_string().to_lowercase());

    Ok(())
}

async fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join(CONFIG_FILE);

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}

async fn validate_config(ctx: &Context) -> Result<()> {
    ctx.output.header("Validating configuration");

    let (errors, warnings) = check_config(&ctx.config);

    if errors.is_empty() && warnings.is_empty() {
        ctx.output.success("Configuration is valid");
        return Ok(());
    }

    for error in &errors {
        ctx.output.error(&format!("Error: {}", error));
    }

    for warning in &warnings {
        ctx.output.warn(&format!("Warning: {}", warning));
    }

    if !errors.is_empty() {
        bail!("Configuration has {} error(s)", errors.len());
    }

    ctx.output.success("Configuration is valid (with warnings)");

    Ok(())
}

fn check_config(config: &CliConfig) -> (Vec<String>, Vec<String>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let delivery = &config.delivery;

    if delivery.powered_by_header {
        if delivery.powered_by_value.is_empty() {
            errors.push("delivery.powered_by_value is empty".to_string());
        } else if HeaderValue::from_str(&delivery.powered_by_value).is_err() {
            errors.push(format!(
                "delivery.powered_by_value '{}' is not a valid header value",
                delivery.powered_by_value
            ));
        }
    }

    if delivery.stream_marker.is_empty() {
        warnings.push("delivery.stream_marker is empty; markup will not be normalized".to_string());
    }

    if !delivery.generate_etags {
        warnings.push("delivery.generate_etags is off; conditional requests always get 200".to_string());
    }

    (errors, warnings)
}
