use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::advisory::GeminiConfig;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Values accepted in the optional YAML file pointed to by `KRISHI_CONFIG`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub model_path: Option<PathBuf>,
    pub labels_path: Option<PathBuf>,
    pub upload_dir: Option<PathBuf>,
    pub feedback_log: Option<PathBuf>,
    pub gemini: GeminiSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GeminiSection {
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub upload_dir: PathBuf,
    pub feedback_log: PathBuf,
    pub jwt_secret: String,
    pub gemini: GeminiConfig,
}

impl FileConfig {
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }
}

impl AppConfig {
    /// Environment variables win over the YAML file, which wins over defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match env::var("KRISHI_CONFIG") {
            Ok(path) => FileConfig::from_yaml(&std::fs::read_to_string(path)?)?,
            Err(_) => FileConfig::default(),
        };
        Self::resolve(file, |key| env::var(key).ok())
    }

    pub fn resolve(
        file: FileConfig,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let port = match var("PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|_| ConfigError::Invalid { key: "PORT", value })?,
            None => file.port.unwrap_or(8081),
        };

        let timeout_secs = match var("ADVISORY_TIMEOUT_SECS") {
            Some(value) => value.parse::<u64>().map_err(|_| ConfigError::Invalid {
                key: "ADVISORY_TIMEOUT_SECS",
                value,
            })?,
            None => file.gemini.timeout_secs.unwrap_or(20),
        };

        let jwt_secret = var("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let gemini_api_key = var("GEMINI_API_KEY").unwrap_or_default();
        if gemini_api_key.is_empty() {
            log::warn!("GEMINI_API_KEY is not set; every advisory request will get the fallback answer");
        }

        Ok(Self {
            port,
            model_path: var("MODEL_PATH")
                .map(PathBuf::from)
                .or(file.model_path)
                .unwrap_or_else(|| PathBuf::from("finetuned_model.tflite")),
            labels_path: var("LABELS_PATH")
                .map(PathBuf::from)
                .or(file.labels_path)
                .unwrap_or_else(|| PathBuf::from("labels.txt")),
            upload_dir: var("UPLOAD_DIR")
                .map(PathBuf::from)
                .or(file.upload_dir)
                .unwrap_or_else(|| PathBuf::from("static/uploads")),
            feedback_log: var("FEEDBACK_LOG")
                .map(PathBuf::from)
                .or(file.feedback_log)
                .unwrap_or_else(|| PathBuf::from("feedback.jsonl")),
            jwt_secret,
            gemini: GeminiConfig {
                api_key: gemini_api_key,
                model: var("GEMINI_MODEL")
                    .or(file.gemini.model)
                    .unwrap_or_else(|| "gemini-1.5-flash-latest".to_string()),
                base_url: var("GEMINI_BASE_URL")
                    .or(file.gemini.base_url)
                    .unwrap_or_else(|| "https://generativelanguage.googleapis.com".to_string()),
                timeout: Duration::from_secs(timeout_secs),
            },
        })
    }
}
