use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Env var holding the full endpoint URL
pub const API_URL_ENV: &str = "GEMBOT_API_URL";
/// Env var holding a Gemini API key, used when no URL is configured
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub escape_markup: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: Some(DEFAULT_MODEL.to_string()),
            escape_markup: false,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| anyhow!("Invalid config file {}: {}", path.display(), e))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    /// Resolve the endpoint URL using the process environment.
    pub fn endpoint(&self) -> Result<String> {
        self.endpoint_with(|name| std::env::var(name).ok())
    }

    /// Resolve the endpoint URL: explicit URL (env, then file), else a URL
    /// built from an API key (env, then file) and the model.
    pub fn endpoint_with<F>(&self, env: F) -> Result<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        if let Some(url) = non_empty(env(API_URL_ENV)).or_else(|| non_empty(self.api_url.clone())) {
            return Ok(url);
        }

        let key = non_empty(env(API_KEY_ENV))
            .or_else(|| non_empty(self.api_key.clone()))
            .ok_or_else(|| {
                anyhow!(
                    "No Gemini endpoint configured. Set {} or {}, or add api_url/api_key to {}",
                    API_URL_ENV,
                    API_KEY_ENV,
                    Self::config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|_| "the config file".to_string())
                )
            })?;

        Ok(format!(
            "{}/models/{}:generateContent?key={}",
            GEMINI_BASE_URL,
            self.model(),
            key
        ))
    }

    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("gembot"))
    }

    fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.json"))
    }
}
