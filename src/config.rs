use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Serialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_text_model")]
    pub text_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_video_model")]
    pub video_model: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            text_model: default_text_model(),
            image_model: default_image_model(),
            video_model: default_video_model(),
        }
    }
}

impl ProviderConfig {
    /// Get the base URL, using the public endpoint if not set
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or("https://generativelanguage.googleapis.com/v1beta")
    }
}

fn default_text_model() -> String {
    "gemini-3-pro-preview".to_string()
}

fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

fn default_video_model() -> String {
    "veo-3.1-fast-generate-preview".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GenerationConfig {
    /// Per-call image timeout; 0 disables it
    #[serde(default = "default_image_timeout")]
    pub image_timeout_secs: u64,
    #[serde(default = "default_poll_interval")]
    pub video_poll_interval_secs: u64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            image_timeout_secs: default_image_timeout(),
            video_poll_interval_secs: default_poll_interval(),
            output_dir: default_output_dir(),
        }
    }
}

impl GenerationConfig {
    pub fn image_timeout(&self) -> Option<Duration> {
        (self.image_timeout_secs > 0).then(|| Duration::from_secs(self.image_timeout_secs))
    }

    pub fn video_poll_interval(&self) -> Duration {
        Duration::from_secs(self.video_poll_interval_secs.max(1))
    }
}

fn default_image_timeout() -> u64 {
    120
}

fn default_poll_interval() -> u64 {
    5
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("adpulse-out")
}

impl Config {
    /// Load config from file or default location
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path(),
        };

        let mut config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config from {:?}", config_path))?;
            Self::parse(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", config_path))?
        } else {
            Config::default()
        };

        config.apply_env_fallbacks();
        Ok(config)
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Default config path: ~/.config/adpulse/config.toml
    pub fn default_path() -> PathBuf {
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("adpulse").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("adpulse")
            .join("config.toml")
    }

    fn apply_env_fallbacks(&mut self) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = std::env::var("GEMINI_API_KEY")
                .or_else(|_| std::env::var("API_KEY"))
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
    }

    /// Get the API key, returning an error if not set
    pub fn api_key(&self) -> Result<&str> {
        self.provider.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "API key not configured.\n\nSet environment variable:\n   export GEMINI_API_KEY=your-key-here\n\nOr add to config file:\n   {}",
                Self::default_path().display()
            )
        })
    }

    /// Copy of the config safe to print
    pub fn redacted(&self) -> Config {
        let mut config = self.clone();
        if let Some(key) = config.provider.api_key.as_mut() {
            let len = key.chars().count();
            *key = if len <= 4 {
                "****".to_string()
            } else {
                let tail: String = key.chars().skip(len - 4).collect();
                format!("****{}", tail)
            };
        }
        config
    }

    /// Write config to the given path
    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, toml_str)
            .with_context(|| format!("Failed to write config to {:?}", path))?;
        Ok(())
    }
}
