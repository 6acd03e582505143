//! TOML configuration for the native shell.
//!
//! Stored at `stockscan/shell.toml` under the platform config directory:
//! - Windows:  `%APPDATA%\StockScan\shell.toml`
//! - Linux:    `~/.config/stockscan/shell.toml`
//! - macOS:    `~/Library/Application Support/StockScan/shell.toml`
//!
//! ```toml
//! [shell]
//! web_app_url = "http://localhost:3000"
//! log_level = "info"
//!
//! [bridge]
//! enforce_directions = false
//! ```
//!
//! Every field has a `#[serde(default = "...")]`, so a missing file, a
//! missing section, or a file written by an older shell all load cleanly.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use stockscan_core::protocol::{DirectionPolicy, Peer};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level shell configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ShellConfig {
    #[serde(default)]
    pub shell: ShellSection,
    #[serde(default)]
    pub bridge: BridgeSection,
}

/// Settings for the embedded page and the shell process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShellSection {
    /// URL of the inventory web application loaded into the surface.
    #[serde(default = "default_web_app_url")]
    pub web_app_url: String,
    /// `tracing` filter used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Bridge behaviour.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BridgeSection {
    /// Reject messages travelling against the conventional direction.
    #[serde(default)]
    pub enforce_directions: bool,
}

fn default_web_app_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ShellSection {
    fn default() -> Self {
        Self {
            web_app_url: default_web_app_url(),
            log_level: default_log_level(),
        }
    }
}

impl ShellConfig {
    /// The direction policy the host bridge should be built with.
    pub fn direction_policy(&self) -> DirectionPolicy {
        if self.bridge.enforce_directions {
            DirectionPolicy::conventional(Peer::Host)
        } else {
            DirectionPolicy::permissive()
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the default config file path.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("shell.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads the config at `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<ShellConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("no config at {}, using defaults", path.display());
            Ok(ShellConfig::default())
        }
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &ShellConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("StockScan"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("stockscan"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("StockScan")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
