//! Application configuration.
//!
//! Sources, lowest priority first: built-in defaults, an optional TOML file, `APPRAISE__*`
//! environment variables (`APPRAISE__SERVER__MAX_UPLOAD_BYTES=...`,
//! `APPRAISE__MODELS__REGRESSOR__PATH=...`), and finally `PORT`.

use std::path::{Path, PathBuf};

use appraise_error::FatalError;
use appraise_predict::ModelConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
const ENV_PREFIX: &str = "APPRAISE";

#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub models: ModelConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on a whole `/predict` request body.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for the daily rolling log file; `None` logs to stderr only.
    pub dir: Option<PathBuf>,
    pub file_prefix: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info,candle_core=warn,candle_transformers=warn,tokenizers=error,hyper=warn,hf_hub=warn"
                .to_string(),
            dir: Some(PathBuf::from("logs")),
            file_prefix: "appraise.log".to_string(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Reads `path` (if any) and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self, FatalError> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(::config::File::from(path).required(true));
        } else {
            builder = builder.add_source(::config::File::with_name("appraise").required(false));
        }

        let mut config = builder
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>())
            .map_err(|e| FatalError::Config(e.to_string()))?;

        config.apply_port_override(std::env::var("PORT").ok().as_deref())?;
        Ok(config)
    }

    /// `PORT` wins over every other source, matching common container platforms.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<(), FatalError> {
        if let Some(raw) = port {
            self.server.port = raw
                .trim()
                .parse()
                .map_err(|e| FatalError::Config(format!("invalid PORT `{raw}`: {e}")))?;
        }
        Ok(())
    }
}
