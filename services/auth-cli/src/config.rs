//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! The federated REST API key is loaded from KAKAO_REST_API_KEY or
//! kakao_key_file, never stored in the TOML directly to avoid leaking secrets.

use common::Secret;
use provider_auth::ClientConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub client: ClientConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub federated: FederatedConfig,
}

/// Where sessions are kept
#[derive(Debug, Deserialize)]
pub struct StorageConfig {
    /// Token pair store; survives reboots
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
    /// Session hint store; defaults to the OS temp dir so it is cleared sooner
    #[serde(default)]
    pub session_path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            session_path: None,
        }
    }
}

impl StorageConfig {
    pub fn session_path(&self, client_id: &str) -> PathBuf {
        self.session_path.clone().unwrap_or_else(|| {
            std::env::temp_dir().join(format!("provider-auth-{client_id}.session.json"))
        })
    }
}

/// Third-party login credentials
#[derive(Debug, Default, Deserialize)]
pub struct FederatedConfig {
    #[serde(skip)]
    pub kakao_key: Option<Secret<String>>,
    /// Path to a file containing the Kakao REST API key
    #[serde(default)]
    pub kakao_key_file: Option<PathBuf>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("provider-auth-session.json")
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Kakao key resolution order:
    /// 1. KAKAO_REST_API_KEY env var
    /// 2. kakao_key_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        config
            .client
            .validate()
            .map_err(|e| common::Error::Config(e.to_string()))?;

        if let Some(key) = std::env::var("KAKAO_REST_API_KEY")
            .ok()
            .and_then(|key| Secret::from_trimmed(&key))
        {
            config.federated.kakao_key = Some(key);
        } else if let Some(ref key_file) = config.federated.kakao_key_file {
            let key = std::fs::read_to_string(key_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read kakao_key_file {}: {e}",
                    key_file.display()
                ))
            })?;
            config.federated.kakao_key = Secret::from_trimmed(&key);
        }

        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("provider-auth.toml")
    }
}
