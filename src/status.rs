//! `deckforge status`: which services are configured, and output directories ready.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use deckforge_core::config::GeneratorConfig;
use deckforge_core::providers::{read_env, GROQ_API_KEY_VAR, HF_TOKEN_VAR};
use deckforge_core::store::FileStore;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub status: &'static str,
    pub text_service_available: bool,
    pub image_service_available: bool,
    /// Directories that did not exist before this call.
    pub directories_created: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

/// Check credentials and create the output directories.
pub fn status_report(config: &GeneratorConfig) -> Result<StatusReport> {
    let store = FileStore::new(config.output_dir.clone());
    let mut directories_created = Vec::new();
    for name in [config.images_dir.as_str(), config.presentations_dir.as_str()] {
        if store.has_dir(name) {
            continue;
        }
        let path = store
            .dir(name)
            .with_context(|| format!("could not create output directory {name}"))?;
        info!(path = %path.display(), "Created output directory");
        directories_created.push(path.display().to_string());
    }

    Ok(StatusReport {
        status: "healthy",
        text_service_available: read_env(GROQ_API_KEY_VAR).is_some(),
        image_service_available: read_env(HF_TOKEN_VAR).is_some(),
        directories_created,
        timestamp: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckforge_core::providers::GroqClient;
    use serial_test::serial;
    use tempfile::tempdir;

    #[test]
    #[serial]
    fn test_status_creates_directories_once_and_reads_env() {
        let tmp = tempdir().unwrap();
        let config = GeneratorConfig {
            output_dir: tmp.path().join("static"),
            ..GeneratorConfig::default()
        };
        std::env::set_var(HF_TOKEN_VAR, "hf_test");
        std::env::remove_var(GROQ_API_KEY_VAR);

        let first = status_report(&config).unwrap();
        assert_eq!(first.status, "healthy");
        assert!(first.image_service_available);
        assert!(!first.text_service_available);
        assert_eq!(first.directories_created.len(), 2);
        assert!(tmp.path().join("static/images").is_dir());
        assert!(tmp.path().join("static/presentations").is_dir());

        let second = status_report(&config).unwrap();
        assert!(second.directories_created.is_empty());

        std::env::remove_var(HF_TOKEN_VAR);
    }

    #[test]
    #[serial]
    fn test_blank_credential_is_not_available() {
        let tmp = tempdir().unwrap();
        let config = GeneratorConfig {
            output_dir: tmp.path().join("static"),
            ..GeneratorConfig::default()
        };
        std::env::set_var(GROQ_API_KEY_VAR, "   ");
        std::env::remove_var(HF_TOKEN_VAR);

        let report = status_report(&config).unwrap();
        assert!(!report.text_service_available);
        assert!(GroqClient::from_env(&config).is_err());

        std::env::remove_var(GROQ_API_KEY_VAR);
    }
}
