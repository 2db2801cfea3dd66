use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::auth::pam::{validate_service, DEFAULT_SERVICE};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pam: PamConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PamConfig {
    pub service: String,
    /// Ask modules not to print informational messages.
    pub silent: bool,
    pub allow_empty_password: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console: bool,
    pub journald: bool,
}

impl Default for PamConfig {
    fn default() -> Self {
        Self {
            service: DEFAULT_SERVICE.to_string(),
            silent: false,
            allow_empty_password: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console: true,
            journald: false,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        info!("Configuration loaded successfully");
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        validate_service(&self.pam.service)
            .map_err(|e| anyhow!("Invalid PAM service {:?}: {}", self.pam.service, e))?;

        if !["trace", "debug", "info", "warn", "error"].contains(&self.logging.level.as_str()) {
            return Err(anyhow!("Invalid log level: {}", self.logging.level));
        }

        if let Some(file) = &self.logging.file {
            if file.is_empty() {
                return Err(anyhow!("Log file path cannot be empty"));
            }
        }

        if !self.logging.console && self.logging.file.is_none() && !self.logging.journald {
            return Err(anyhow!(
                "No log output enabled: set logging.console, logging.file or logging.journald"
            ));
        }

        Ok(())
    }
}
