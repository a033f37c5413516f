//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the
//! backend address, request timeout, where the bearer token is kept, and the
//! last email used to sign in.
//!
//! Configuration is stored at `~/.config/creditline/config.json`. The
//! `CREDITLINE_API_URL` and `CREDITLINE_CREDENTIAL_BACKEND` environment
//! variables override the file.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::REQUEST_TIMEOUT_SECS;

/// Application name used for config/data directory paths
const APP_NAME: &str = "creditline";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Backend address when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

pub const API_URL_ENV: &str = "CREDITLINE_API_URL";
pub const CREDENTIAL_BACKEND_ENV: &str = "CREDITLINE_CREDENTIAL_BACKEND";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialBackend {
    /// OS keychain.
    Keyring,
    /// Token file in the data directory.
    #[default]
    File,
}

impl FromStr for CredentialBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "keyring" | "keychain" => Ok(CredentialBackend::Keyring),
            "file" => Ok(CredentialBackend::File),
            other => Err(anyhow::anyhow!("Unknown credential backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub api_url: Option<String>,
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub credential_backend: CredentialBackend,
    pub last_email: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config: Self = if path.exists() {
            let contents = std::fs::read_to_string(&path).context("Failed to read config file")?;
            serde_json::from_str(&contents).context("Failed to parse config file")?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Let environment variables override the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_url = Some(url);
            }
        }
        if let Ok(backend) = std::env::var(CREDENTIAL_BACKEND_ENV) {
            match backend.parse() {
                Ok(backend) => self.credential_backend = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", CREDENTIAL_BACKEND_ENV),
            }
        }
    }

    pub fn api_url(&self) -> &str {
        self.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(REQUEST_TIMEOUT_SECS))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Directory for the token file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        let data_dir =
            dirs::data_dir().ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?;
        Ok(data_dir.join(APP_NAME))
    }
}
