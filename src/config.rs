use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Top-level configuration, read from `~/.whisper-scribe.toml`
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Model storage and inference settings
    pub model: ModelConfig,
    /// Telemetry settings
    pub telemetry: TelemetryConfig,
}

/// Model storage and inference settings
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Directory where downloaded ggml model files live
    pub models_dir: String,
    /// Number of CPU threads for inference
    pub threads: usize,
}

/// Telemetry settings
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Whether to log to a file instead of stdout
    pub enabled: bool,
    /// Log file path (used when `enabled` is true)
    pub log_path: String,
}

impl Config {
    /// Load config from ~/.whisper-scribe.toml, creating it with defaults first
    /// if it does not exist
    ///
    /// # Errors
    /// Returns error if the file cannot be read, created, or parsed
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default(&config_path).context("failed to create default config")?;
        }

        let contents = fs::read_to_string(&config_path).context("failed to read config file")?;

        let config: Self = toml::from_str(&contents).context("failed to parse config TOML")?;

        Ok(config)
    }

    fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME").context("HOME environment variable not set")?;
        Ok(PathBuf::from(home).join(".whisper-scribe.toml"))
    }

    fn create_default(path: &PathBuf) -> Result<()> {
        let default_config = r#"[model]
models_dir = "~/.whisper-scribe/models"
threads = 4

[telemetry]
enabled = false
log_path = "~/.whisper-scribe/scribe.log"
"#;
        fs::write(path, default_config).context("failed to write default config")?;
        Ok(())
    }

    /// Expand ~ in paths to home directory
    ///
    /// # Errors
    /// Returns error if the path starts with `~/` and HOME is not set
    pub fn expand_path(path: &str) -> Result<PathBuf> {
        if let Some(stripped) = path.strip_prefix("~/") {
            let home = std::env::var("HOME").context("HOME environment variable not set")?;
            Ok(PathBuf::from(home).join(stripped))
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_path_with_tilde() {
        let home = std::env::var("HOME").unwrap();
        let result = Config::expand_path("~/models/ggml-tiny.bin").unwrap();
        assert_eq!(result, PathBuf::from(home).join("models/ggml-tiny.bin"));
    }

    #[test]
    fn test_expand_path_absolute() {
        let result = Config::expand_path("/opt/models/ggml-tiny.bin").unwrap();
        assert_eq!(result, PathBuf::from("/opt/models/ggml-tiny.bin"));
    }

    #[test]
    fn test_expand_path_relative() {
        let result = Config::expand_path("models/ggml-tiny.bin").unwrap();
        assert_eq!(result, PathBuf::from("models/ggml-tiny.bin"));
    }

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"[model]
models_dir = "/data/models"
threads = 8

[telemetry]
enabled = true
log_path = "/tmp/scribe.log"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.model.models_dir, "/data/models");
        assert_eq!(config.model.threads, 8);
        assert!(config.telemetry.enabled);
        assert_eq!(config.telemetry.log_path, "/tmp/scribe.log");
    }

    #[test]
    fn test_parse_missing_section_fails() {
        let toml_str = r#"[model]
models_dir = "/data/models"
threads = 8
"#;
        let result: Result<Config, _> = toml::from_str(toml_str);
        assert!(result.is_err());
    }
}
