//! Application configuration for the `rfc822` binary.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$RFC822_CONFIG` (environment variable)
//! 2. `~/.config/rfc822/config.toml` (Linux/macOS)
//!    `%APPDATA%\rfc822\config.toml` (Windows)
//! 3. Built-in defaults

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::charset::aliases::CharsetAliases;
use crate::charset::TextEncoding;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Charset resolution.
    pub charset: CharsetConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
}

/// Charset alias settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharsetConfig {
    /// Start from the built-in alias table.
    pub use_default_aliases: bool,
    /// Extra aliases: charset name → encoding label.
    pub aliases: BTreeMap<String, String>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            cache_dir: None,
        }
    }
}

impl Default for CharsetConfig {
    fn default() -> Self {
        Self {
            use_default_aliases: true,
            aliases: BTreeMap::new(),
        }
    }
}

impl CharsetConfig {
    /// Build the alias table described by this section.
    ///
    /// Aliases whose target label the encoding registry does not know are
    /// skipped with a warning.
    pub fn build_aliases(&self) -> Arc<CharsetAliases> {
        let mut aliases = if self.use_default_aliases {
            CharsetAliases::with_defaults()
        } else {
            CharsetAliases::new()
        };

        for (name, label) in &self.aliases {
            match TextEncoding::for_label(label.as_bytes()) {
                Some(encoding) => aliases.add_alias(name, encoding),
                None => tracing::warn!(
                    alias = %name,
                    label = %label,
                    "Unknown encoding in charset alias, skipping"
                ),
            }
        }

        Arc::new(aliases)
    }
}

// ── Load / save ─────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found or on parse error.
pub fn load_config() -> Config {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Config::default(),
    }
}

/// Load configuration from a specific file, falling back to defaults.
pub fn load_config_from(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => {
                tracing::info!(path = %path.display(), "Loaded config");
                cfg
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse config, using defaults"
                );
                Config::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to read config file, using defaults"
            );
            Config::default()
        }
    }
}

/// Save configuration to the standard location, returning the path written.
pub fn save_config(config: &Config) -> anyhow::Result<PathBuf> {
    let path = config_file_path()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config file path"))?;
    save_config_to(config, &path)?;
    Ok(path)
}

/// Save configuration to a specific file, creating parent directories.
pub fn save_config_to(config: &Config, path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("RFC822_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("rfc822").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rfc822")
}
