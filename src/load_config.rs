use std::fs;
use std::path::Path;

use anyhow::Result;
use deckforge_core::config::GeneratorConfig;
use tracing::{error, info};

/// Loads a static YAML config file (no secrets) into a [`GeneratorConfig`].
///
/// Every key is optional; missing keys keep their defaults. An empty file is the
/// default configuration.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<GeneratorConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e));
        }
    };

    if config_content.trim().is_empty() {
        info!(config_path = ?path_ref, "Config file is empty, using defaults");
        return Ok(GeneratorConfig::default());
    }

    let config: GeneratorConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    if !(0.0..=2.0).contains(&config.temperature) {
        error!(temperature = config.temperature, "temperature out of range");
        anyhow::bail!("temperature must be between 0.0 and 2.0, got {}", config.temperature);
    }

    info!(
        output_dir = %config.output_dir.display(),
        text_model = %config.text_model,
        "Config loaded successfully"
    );
    Ok(config)
}

/// [`load_config`] when a path was given, otherwise the defaults.
pub fn load_config_or_default(path: Option<&Path>) -> Result<GeneratorConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            info!("No config file given, using defaults");
            Ok(GeneratorConfig::default())
        }
    }
}
