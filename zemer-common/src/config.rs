//! Configuration loading
//!
//! Resolution priority, highest first:
//! 1. Command-line argument (config path)
//! 2. `ZEMER_CONFIG` environment variable (config path)
//! 3. Platform config dir (`<config>/zemer/config.toml`)
//! 4. Compiled defaults
//!
//! A missing config file is a warning plus defaults, never fatal. Individual
//! fields can be overridden with `ZEMER_PORT`, `ZEMER_AUTH_USERNAME` and
//! `ZEMER_AUTH_PASSWORD` after the file is applied.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::warn;

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Directory served at `/` (the one-page download UI)
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            static_dir: PathBuf::from("zemer-dl/static"),
        }
    }
}

/// Credentials for the Basic-auth gate and session lifetime
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
    pub session_ttl_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            username: "zemereshet".to_string(),
            password: "download2026".to_string(),
            session_ttl_secs: 3600,
        }
    }
}

/// Outbound fetch behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for the song page itself
    pub page_timeout_secs: u64,
    /// Timeout for each audio asset (binary, can be large)
    pub asset_timeout_secs: u64,
    /// Pause between consecutive asset fetches
    pub inter_fetch_delay_ms: u64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_timeout_secs: 30,
            asset_timeout_secs: 60,
            inter_fetch_delay_ms: 300,
            user_agent: format!("zemer-dl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Which request hosts are accepted by the download endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub allowed_hosts: Vec<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: vec![
                "www.zemereshet.co.il".to_string(),
                "zemereshet.co.il".to_string(),
            ],
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub fetch: FetchConfig,
    pub site: SiteConfig,
}

impl Config {
    /// Load configuration following the resolution priority above.
    ///
    /// Returns an error only for an unreadable or malformed file that was
    /// explicitly requested; an absent default-location file degrades to
    /// compiled defaults with a warning.
    pub fn load(cli_path: Option<&Path>) -> Result<Config> {
        let mut config = match resolve_config_path(cli_path) {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) if cli_path.is_some() || std::env::var("ZEMER_CONFIG").is_ok() => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            _ => {
                warn!("No config file found, using compiled defaults");
                Config::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse a specific TOML config file
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("cannot parse {}: {e}", path.display())))
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("ZEMER_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => warn!("Ignoring non-numeric ZEMER_PORT value"),
            }
        }
        if let Ok(username) = std::env::var("ZEMER_AUTH_USERNAME") {
            self.auth.username = username;
        }
        if let Ok(password) = std::env::var("ZEMER_AUTH_PASSWORD") {
            self.auth.password = password;
        }
    }
}

fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var("ZEMER_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("zemer").join("config.toml"))
}
