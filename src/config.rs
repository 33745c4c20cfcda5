use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::prompts;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

const CONFIG_FILE: &str = "config.toml";
const SYSTEM_PROMPT_FILE: &str = "SYSTEM.md";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bearer credential for the completion endpoint
    pub api_key: Option<String>,

    /// Environment variable consulted when `api_key` is unset
    pub api_key_env: String,

    /// Chat completion endpoint
    pub endpoint: String,

    /// Model identifier sent with every request
    pub model: String,

    /// Replaces the built-in system instruction
    pub system_prompt: Option<String>,

    /// Per-request timeout; unset means wait until the call settles
    pub request_timeout_secs: Option<u64>,

    /// UI preferences
    pub ui: UiConfig,

    /// Instructions picked up from SYSTEM.md
    #[serde(skip)]
    pub user_instructions: Option<String>,

    /// Supportbot home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_welcome: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { show_welcome: true }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: None,
            request_timeout_secs: None,
            ui: UiConfig::default(),
            user_instructions: None,
            home: default_home(),
        }
    }
}

fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".supportbot")
}

impl Config {
    /// Load `~/.supportbot/config.toml`, or defaults when it does not exist
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".supportbot");

        fs::create_dir_all(&home).context("Failed to create .supportbot directory")?;

        Self::load_from(&home.join(CONFIG_FILE))
    }

    /// Load configuration from an explicit file path
    pub fn load_from(path: &Path) -> Result<Self> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self::load_from_with_cwd(path, &cwd)
    }

    /// Like [`Config::load_from`], looking for SYSTEM.md in `cwd` instead of the process directory
    pub fn load_from_with_cwd(path: &Path, cwd: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            config.home = parent.to_path_buf();
        }
        config.user_instructions = Self::load_system_md(cwd, &config.home)?;
        Ok(config)
    }

    /// Path of the config file inside the home directory
    pub fn config_path(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    /// Save configuration to the home directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&self.config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// SYSTEM.md in the working directory wins over the one in the home directory
    fn load_system_md(cwd: &Path, home: &Path) -> Result<Option<String>> {
        let locations = [cwd.join(SYSTEM_PROMPT_FILE), home.join(SYSTEM_PROMPT_FILE)];

        for path in locations {
            if path.exists() {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                if !content.trim().is_empty() {
                    return Ok(Some(content));
                }
            }
        }

        Ok(None)
    }

    /// Instruction that becomes the hidden first transcript entry
    pub fn effective_system_prompt(&self) -> String {
        let non_blank = |p: &&str| !p.trim().is_empty();
        self.system_prompt
            .as_deref()
            .filter(non_blank)
            .or(self.user_instructions.as_deref().filter(non_blank))
            .unwrap_or(prompts::default_system_prompt())
            .to_string()
    }

    /// Get API key from config or environment
    pub fn get_api_key(&self) -> Option<String> {
        self.resolve_api_key(|name| std::env::var(name).ok())
    }

    /// Config value first, then the named environment variable; blank values count as unset
    pub fn resolve_api_key<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| lookup(&self.api_key_env).filter(|key| !key.trim().is_empty()))
    }

    pub fn has_api_key(&self) -> bool {
        self.get_api_key().is_some()
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_openrouter() {
        let config = Config::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, "gpt-3.5-turbo");
        assert_eq!(config.api_key_env, "OPENROUTER_API_KEY");
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: Config = toml::from_str("model = \"openai/gpt-4o-mini\"\n").unwrap();
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert!(config.ui.show_welcome);
    }

    #[test]
    fn config_key_wins_over_environment() {
        let config = Config {
            api_key: Some("from-config".to_string()),
            ..Config::default()
        };
        let key = config.resolve_api_key(|_| Some("from-env".to_string()));
        assert_eq!(key.as_deref(), Some("from-config"));
    }

    #[test]
    fn environment_used_when_config_key_blank() {
        let config = Config {
            api_key: Some("  ".to_string()),
            api_key_env: "CUSTOM_KEY".to_string(),
            ..Config::default()
        };
        let key = config.resolve_api_key(|name| {
            assert_eq!(name, "CUSTOM_KEY");
            Some("from-env".to_string())
        });
        assert_eq!(key.as_deref(), Some("from-env"));
        assert!(Config::default().resolve_api_key(|_| None).is_none());
    }

    #[test]
    fn explicit_system_prompt_overrides_builtin() {
        let mut config = Config::default();
        assert_eq!(config.effective_system_prompt(), prompts::default_system_prompt());

        config.user_instructions = Some("from SYSTEM.md".to_string());
        assert_eq!(config.effective_system_prompt(), "from SYSTEM.md");

        config.system_prompt = Some("from config".to_string());
        assert_eq!(config.effective_system_prompt(), "from config");
    }

    #[test]
    fn blank_system_prompt_does_not_hide_system_md() {
        let config = Config {
            system_prompt: Some(String::new()),
            user_instructions: Some("from SYSTEM.md".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_system_prompt(), "from SYSTEM.md");

        let config = Config {
            system_prompt: Some("  ".to_string()),
            user_instructions: Some("\n".to_string()),
            ..Config::default()
        };
        assert_eq!(config.effective_system_prompt(), prompts::default_system_prompt());
    }

    #[test]
    fn zero_timeout_means_none() {
        let config = Config {
            request_timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(config.request_timeout().is_none());
    }
}
