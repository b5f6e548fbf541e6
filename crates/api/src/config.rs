//! Service configuration
//!
//! Layered with the `config` crate: an optional TOML file, then environment
//! variables such as `APPRENTICE__ARTIFACT__PATH=/srv/best_model.json`.

use crate::rate_limit::RateLimitConfig;
use config::{Config, ConfigError, Environment, File};
use data_validator::InputLimits;
use feature_engine::FeatureMapping;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Config file used when `APPRENTICE_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "predictor.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub artifact: ArtifactConfig,
    pub dataset: DatasetConfig,
    pub features: FeatureMapping,
    pub input: InputLimits,
    pub rate_limit: RateLimitConfig,
    pub metrics: MetricsConfig,
}

impl AppConfig {
    /// Load from `APPRENTICE_CONFIG` (or the default path) plus environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("APPRENTICE_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load from a specific file (which may be absent) plus environment
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix("APPRENTICE").separator("__"))
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace, debug, info, warn or error
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("best_model.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// CSV or spreadsheet; when unset the artifact's `reference_dataset` is used
    pub path: Option<PathBuf>,
    /// Label column, matched after name normalization
    pub target_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: None,
            target_column: "Estado Aprendiz".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Install the Prometheus recorder and serve `/metrics`
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_without_file() {
        let config = AppConfig::load_from("/nonexistent/predictor.toml").unwrap();
        assert_eq!(config.artifact.path, PathBuf::from("best_model.json"));
        assert_eq!(config.dataset.target_column, "Estado Aprendiz");
        assert!(config.dataset.path.is_none());
        assert_eq!(config.features.age, "Edad");
        assert_eq!(config.input.age.max, 100);
        assert!(!config.rate_limit.enabled);
    }

    #[test]
    fn test_file_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
addr = "127.0.0.1:9000"

[logging]
format = "json"

[dataset]
path = "data/aprendices.xlsx"
target_column = "estado_aprendiz"

[features]
complaints = "Quejas"

[input.stratum]
min = 1
max = 3
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.server.addr, "127.0.0.1:9000");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(
            config.dataset.path,
            Some(PathBuf::from("data/aprendices.xlsx"))
        );
        assert_eq!(config.features.complaints, "Quejas");
        assert_eq!(config.features.age, "Edad");
        assert_eq!(config.input.stratum.max, 3);
        assert_eq!(config.input.age.min, 18);
    }
}
