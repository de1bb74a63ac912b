//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$THREADARCHIVE_CONFIG` (environment variable)
//! 2. `~/.config/threadarchive/config.toml` (Linux/macOS)
//!    `%APPDATA%\threadarchive\config.toml` (Windows)
//! 3. Built-in defaults

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Where and under which names the archive is written.
    pub archive: ArchiveConfig,
    /// Mail-store session settings.
    pub fetch: FetchConfig,
    /// Message normalization rules.
    pub normalize: NormalizeConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Archive layout. Relative names are resolved against `output_dir`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// Root of the archive.
    pub output_dir: PathBuf,
    /// Directory holding one raw message per UID.
    pub raw_dir: String,
    /// Directory holding one JSON document per conversation.
    pub conversation_dir: String,
    /// Summary document listing every conversation.
    pub summary_file: String,
    /// Static viewer written once if absent.
    pub landing_page: String,
}

/// Mail-store session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Mailbox used when the URL has no path.
    pub default_mailbox: String,
    /// Number of UIDs requested per `UID FETCH`.
    pub batch_size: usize,
    /// Socket read timeout applied before `LOGOUT`.
    pub logout_timeout_secs: u64,
    /// Look up credentials in `~/.netrc`.
    pub use_netrc: bool,
}

/// Message normalization rules.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Header names pruned in addition to the built-in list.
    pub extra_pruned_headers: Vec<String>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "warn".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            raw_dir: "raw".to_string(),
            conversation_dir: "c".to_string(),
            summary_file: "mail.json".to_string(),
            landing_page: "index.html".to_string(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            default_mailbox: "INBOX".to_string(),
            batch_size: 500,
            logout_timeout_secs: 30,
            use_netrc: true,
        }
    }
}

impl ArchiveConfig {
    /// Absolute-or-relative path of the raw store.
    pub fn raw_path(&self) -> PathBuf {
        self.output_dir.join(&self.raw_dir)
    }

    /// Path of the conversation document directory.
    pub fn conversation_path(&self) -> PathBuf {
        self.output_dir.join(&self.conversation_dir)
    }

    /// Path of the summary document.
    pub fn summary_path(&self) -> PathBuf {
        self.output_dir.join(&self.summary_file)
    }

    /// Path of the landing page.
    pub fn landing_path(&self) -> PathBuf {
        self.output_dir.join(&self.landing_page)
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    if let Some(path) = config_file_path() {
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<Config>(&contents) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "Loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "Failed to parse config, using defaults"
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Failed to read config file, using defaults"
                    );
                }
            }
        }
    }
    Config::default()
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("THREADARCHIVE_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("threadarchive").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("threadarchive")
}
