use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::assembler::AssemblerOptions;
use crate::metric::DistanceMetric;

/// Upper bound on `recommender.neighbors`; every query scans all items anyway.
pub const MAX_NEIGHBORS: usize = 500;

const DEFAULT_CONFIG_PATHS: [&str; 2] = ["bookrec.toml", "config/bookrec.toml"];

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub recommender: RecommenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommenderConfig {
    /// Neighbors returned per seed item.
    pub neighbors: usize,
    pub metric: DistanceMetric,
    pub parallel: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub neighbors: Option<usize>,
    pub metric: Option<DistanceMetric>,
    pub parallel: Option<bool>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            recommender: RecommenderConfig {
                neighbors: 10,
                metric: DistanceMetric::Cosine,
                parallel: false,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATHS[0]));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn assembler_options(&self) -> AssemblerOptions {
        AssemblerOptions { metric: self.recommender.metric, parallel: self.recommender.parallel }
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(recommender) = patch.recommender {
            if let Some(neighbors) = recommender.neighbors {
                self.recommender.neighbors = neighbors;
            }
            if let Some(metric) = recommender.metric {
                self.recommender.metric = metric;
            }
            if let Some(parallel) = recommender.parallel {
                self.recommender.parallel = parallel;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(neighbors) = env_value("BOOKREC_RECOMMENDER_NEIGHBORS")? {
            self.recommender.neighbors = neighbors;
        }
        if let Some(metric) = env_value("BOOKREC_RECOMMENDER_METRIC")? {
            self.recommender.metric = metric;
        }
        if let Some(parallel) = env_value("BOOKREC_RECOMMENDER_PARALLEL")? {
            self.recommender.parallel = parallel;
        }

        // the short LOG_* spellings are accepted as aliases
        for key in ["BOOKREC_LOGGING_LEVEL", "BOOKREC_LOG_LEVEL"] {
            if let Some(level) = env_value::<String>(key)? {
                self.logging.level = level;
                break;
            }
        }
        for key in ["BOOKREC_LOGGING_FORMAT", "BOOKREC_LOG_FORMAT"] {
            if let Some(format) = env_value(key)? {
                self.logging.format = format;
                break;
            }
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(neighbors) = overrides.neighbors {
            self.recommender.neighbors = neighbors;
        }
        if let Some(metric) = overrides.metric {
            self.recommender.metric = metric;
        }
        if let Some(parallel) = overrides.parallel {
            self.recommender.parallel = parallel;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_recommender(&self.recommender)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    match explicit_path {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS.iter().map(PathBuf::from).find(|path| path.exists()),
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_recommender(recommender: &RecommenderConfig) -> Result<(), ConfigError> {
    if recommender.neighbors == 0 || recommender.neighbors > MAX_NEIGHBORS {
        return Err(ConfigError::Validation(format!(
            "recommender.neighbors must be in range 1..={MAX_NEIGHBORS}"
        )));
    }

    recommender
        .metric
        .validate()
        .map_err(|error| ConfigError::Validation(format!("recommender.metric: {error}")))
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

/// Blank variables count as unset.
fn env_value<T: FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    let Some(raw) = env::var(key).ok().filter(|value| !value.trim().is_empty()) else {
        return Ok(None);
    };
    let parsed: Result<T, _> = raw.trim().parse();
    parsed
        .map(Some)
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_string(), value: raw })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    recommender: Option<RecommenderPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommenderPatch {
    neighbors: Option<usize>,
    metric: Option<DistanceMetric>,
    parallel: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
