//! CLI configuration.

use std::path::Path;

use anyhow::{Context, Result};
use delivery_core::DeliveryConfig;
use delivery_observability::LogSettings;
use serde::{Deserialize, Serialize};

/// Default config file name.
pub const CONFIG_FILE: &str = "edge-deliver.toml";

/// Config file names searched for, in order.
pub const CONFIG_NAMES: [&str; 3] = [CONFIG_FILE, ".edge-deliver.toml", "edge-deliver.json"];

/// CLI configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Delivery flags.
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LogSettings,
}

impl CliConfig {
    /// Load config from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display()))
        } else {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
        }
    }
}

/// Generate a default edge-deliver.toml config file.
pub fn generate_default_config() -> String {
    let delivery = DeliveryConfig::default();
    format!(
        r#"# Edge delivery configuration

[delivery]
# Compute entity tags and answer conditional requests with 304
generate_etags = {etags}
# Send the identity header on markup responses
powered_by_header = {powered_by}
powered_by_value = "{powered_by_value}"
# Inline scripts containing this token are reordered before fingerprinting
stream_marker = "{marker}"

[logging]
# "human" or "json"; RUST_LOG overrides the level
format = "human"
level = "info"
"#,
        etags = delivery.generate_etags,
        powered_by = delivery.powered_by_header,
        powered_by_value = delivery.powered_by_value,
        marker = delivery.stream_marker,
    )
}

#[cfg(test)]
mod tests {
    use delivery_observability::{LogFormat, LogLevel};

    use super::*;

    #[test]
    fn test_generated_config_parses_to_defaults() {
        let config: CliConfig = toml::from_str(&generate_default_config()).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config: CliConfig = toml::from_str(
            "[delivery]\ngenerate_etags = false\n\n[logging]\nformat = \"json\"\n",
        )
        .unwrap();

        assert!(!config.delivery.generate_etags);
        assert!(config.delivery.powered_by_header);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_load_json_file() {
        let path = std::env::temp_dir().join(format!("edge-deliver-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"delivery": {"stream_marker": "__flight"}}"#).unwrap();

        let config = CliConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.delivery.stream_marker, "__flight");
    }

    #[test]
    fn test_load_missing_file() {
        assert!(CliConfig::load("/nonexistent/edge-deliver.toml").is_err());
    }
}
