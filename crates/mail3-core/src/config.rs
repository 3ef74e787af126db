use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{API_URL, APP_URL, DEFAULT_AVATAR_SRC, REQUEST_TIMEOUT_SECS, SUPPORTED_ALIAS_SUFFIXES};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Client configuration that can be loaded from a JSON file.
///
/// Every field is optional in the file; missing fields fall back to the
/// built-in defaults from [`crate::constants`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClientConfig {
    /// REST API base URL (no trailing slash)
    pub api_url: String,

    /// Web app origin used for share links and notification routing
    pub app_url: String,

    /// URL the server uses for "no custom avatar"
    pub default_avatar_url: String,

    /// Alias suffixes treated as resolvable (e.g. ".eth")
    pub alias_suffixes: Vec<String>,

    pub request_timeout_secs: u64,

    /// Bearer token for authenticated calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: API_URL.to_string(),
            app_url: APP_URL.to_string(),
            default_avatar_url: DEFAULT_AVATAR_SRC.to_string(),
            alias_suffixes: SUPPORTED_ALIAS_SUFFIXES.iter().map(|s| s.to_string()).collect(),
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            jwt: None,
        }
    }
}

impl ClientConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, else from the default location if it exists,
    /// else defaults. Environment overrides are applied last.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::load(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_env();
        Ok(config)
    }

    /// `MAIL3_API_URL`, `MAIL3_APP_URL` and `MAIL3_JWT` take precedence over the file.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("MAIL3_API_URL") {
            if !url.is_empty() {
                self.api_url = url;
            }
        }
        if let Ok(url) = std::env::var("MAIL3_APP_URL") {
            if !url.is_empty() {
                self.app_url = url;
            }
        }
        if let Ok(jwt) = std::env::var("MAIL3_JWT") {
            if !jwt.is_empty() {
                self.jwt = Some(jwt);
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn api_base(&self) -> &str {
        self.api_url.trim_end_matches('/')
    }

    pub fn app_base(&self) -> &str {
        self.app_url.trim_end_matches('/')
    }
}

/// `<config dir>/mail3/config.json`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("mail3").join("config.json"))
}
