//! Configuration file management for ladle.
//!
//! Provides a TOML-based config file at `~/.config/ladle/config.toml` and a
//! resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use ladle_core::gateway::OpenAiConfig;
use ladle_db::config::{DbConfig, DATABASE_URL_VAR};

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    pub openai: OpenAiSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OpenAiSection {
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the ladle config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/ladle` or `~/.config/ladle`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("ladle");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("ladle")
}

/// Return the path to the ladle config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix (the file holds an API key).
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct LadleConfig {
    pub db_config: DbConfig,
    pub openai: OpenAiConfig,
}

impl LadleConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// - DB URL: `cli_db_url` > `LADLE_DATABASE_URL` env > `config_file.database.url` > `DbConfig::DEFAULT_URL`
    /// - API key: `LADLE_OPENAI_API_KEY` env > `config_file.openai.api_key` > error
    /// - Model/embedding-model/base URL: config file when set, OpenAI defaults otherwise
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        // DB URL resolution.
        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(DATABASE_URL_VAR) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };
        let db_config = DbConfig::new(db_url);

        // API key resolution.
        let api_key = if let Ok(key) = std::env::var("LADLE_OPENAI_API_KEY") {
            key
        } else if let Some(ref cfg) = file_config {
            cfg.openai.api_key.clone()
        } else {
            String::new()
        };
        if api_key.is_empty() {
            bail!(
                "OpenAI API key not found; set LADLE_OPENAI_API_KEY or run `ladle init` to create a config file"
            );
        }

        let mut openai = OpenAiConfig::new(api_key);
        if let Some(ref cfg) = file_config {
            if let Some(ref model) = cfg.openai.model {
                openai.model = model.clone();
            }
            if let Some(ref model) = cfg.openai.embedding_model {
                openai.embedding_model = model.clone();
            }
            if let Some(ref base) = cfg.openai.api_base {
                openai.api_base = base.clone();
            }
        }

        Ok(Self { db_config, openai })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
