use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::{AdvisorError, Result};

/// Runtime settings. Later sources win: defaults, YAML file, environment, CLI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub catalog: String,          // file path or http(s) URL
    pub chat_endpoint: String,
    pub db_path: PathBuf,
    pub bind: String,
    pub static_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>, // None inherits the transport default
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            catalog: "products.json".to_string(),
            chat_endpoint: "http://127.0.0.1:8787/".to_string(),
            db_path: PathBuf::from("advisor_db"),
            bind: "127.0.0.1:3000".to_string(),
            static_dir: None,
            request_timeout_secs: None,
        }
    }
}

impl AdvisorConfig {
    /// Defaults, then the YAML file if given, then `ADVISOR_*` variables
    /// (a `.env` file is honoured).
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_yaml_file(path)?,
            None => Self::default(),
        };
        dotenvy::dotenv().ok();
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        debug!(?config, "Configuration resolved");
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AdvisorError::Config(format!("{}: {e}", path.display())))?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        serde_yaml::from_str(raw).map_err(|e| AdvisorError::Config(e.to_string()))
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("ADVISOR_CATALOG") {
            self.catalog = v;
        }
        if let Some(v) = lookup("ADVISOR_CHAT_ENDPOINT") {
            self.chat_endpoint = v;
        }
        if let Some(v) = lookup("ADVISOR_DB_PATH") {
            self.db_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("ADVISOR_BIND") {
            self.bind = v;
        }
        if let Some(v) = lookup("ADVISOR_STATIC_DIR") {
            self.static_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ADVISOR_TIMEOUT_SECS") {
            let secs = v
                .parse()
                .map_err(|_| AdvisorError::Config(format!("ADVISOR_TIMEOUT_SECS is not a number: {v}")))?;
            self.request_timeout_secs = Some(secs);
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chat_endpoint.trim().is_empty() {
            return Err(AdvisorError::Config("chat endpoint is empty".into()));
        }
        if self.catalog.trim().is_empty() {
            return Err(AdvisorError::Config("catalog source is empty".into()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}
