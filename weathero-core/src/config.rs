use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::api::{DEFAULT_COUNTRY_CODE, DEFAULT_TIMEZONE, weatherkit::DEFAULT_BASE_URL};
use crate::model::Location;

/// Environment variable that overrides the configured API token.
pub const TOKEN_ENV_VAR: &str = "WEATHERO_API_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// base_url = "https://weatherkit.apple.com"
/// api_token = "..."
/// country_code = "GB"
/// timezone = "GMT"
///
/// [default_location]
/// latitude = 51.493169
/// longitude = -0.098912
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub api_token: Option<String>,
    pub country_code: String,
    pub timezone: String,
    pub request_timeout_secs: u64,
    pub default_location: Option<Location>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_location: None,
        }
    }
}

impl Config {
    /// Token from the environment if set, otherwise from the file.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|t| !t.is_empty())
            .or_else(|| self.api_token.clone())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Return the default location, or an error with a hint on how to set one.
    pub fn default_location(&self) -> Result<Location> {
        self.default_location.ok_or_else(|| {
            anyhow!(
                "No location given and no default location configured.\n\
                 Hint: pass --latitude/--longitude or run `weathero configure --latitude .. --longitude ..`."
            )
        })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weathero", "weathero")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}
