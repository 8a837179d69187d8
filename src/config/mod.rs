//! Configuration system (layered: defaults < config file < env < explicit).

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ChatError, Result};
use crate::models::GeminiModel;
use crate::types::{GenerationSettings, DEFAULT_TEMPERATURE};
use crate::util::retry::RetryPolicy;

/// Public Gemini REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Address the web UI listens on unless overridden.
pub const DEFAULT_BIND: &str = "127.0.0.1:8501";

/// Transport-level retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Web sessions unused for this long are dropped.
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;

/// Resolved configuration for the agent and both front-ends.
#[derive(Clone, PartialEq)]
pub struct ChatConfig {
    pub api_key: Option<String>,
    /// Whether `api_key` came from the environment (or `.env`).
    pub api_key_from_env: bool,
    pub model: GeminiModel,
    /// Default system prompt for new conversations.
    pub system_prompt: Option<String>,
    /// Gemini REST root, up to and including the API version.
    pub base_url: String,
    pub temperature: f64,
    pub max_output_tokens: Option<u32>,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Web server listen address.
    pub bind: String,
    /// Seconds a web session may sit unused before it is dropped.
    pub session_idle_secs: u64,
}

impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| ".."))
            .field("api_key_from_env", &self.api_key_from_env)
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("base_url", &self.base_url)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("max_retries", &self.max_retries)
            .field("bind", &self.bind)
            .field("session_idle_secs", &self.session_idle_secs)
            .finish()
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_from_env: false,
            model: GeminiModel::default(),
            system_prompt: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: None,
            max_retries: DEFAULT_MAX_RETRIES,
            bind: DEFAULT_BIND.to_string(),
            session_idle_secs: DEFAULT_SESSION_IDLE_SECS,
        }
    }
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub base_url: Option<String>,
    pub temperature: Option<f64>,
    pub max_output_tokens: Option<u32>,
    pub max_retries: Option<u32>,
    pub bind: Option<String>,
    pub session_idle_secs: Option<u64>,
}

impl ChatConfig {
    /// Resolve defaults, then the config file, then the environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        match path {
            Some(path) => config.apply_file(&read_file_config(path)?)?,
            None => {
                if let Some(path) = default_config_path().filter(|p| p.is_file()) {
                    config.apply_file(&read_file_config(&path)?)?;
                }
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    /// Load from environment variables only (after `.env`).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML document on top of the defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let mut config = Self::default();
        config.apply_file(&toml::from_str(raw)?)?;
        Ok(config)
    }

    pub fn apply_file(&mut self, file: &FileConfig) -> Result<()> {
        if let Some(key) = non_empty(file.api_key.as_deref()) {
            self.api_key = Some(key);
            self.api_key_from_env = false;
        }
        if let Some(ref model) = file.model {
            self.model = GeminiModel::parse(model)?;
        }
        if let Some(prompt) = non_empty(file.system_prompt.as_deref()) {
            self.system_prompt = Some(prompt);
        }
        if let Some(ref url) = file.base_url {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(temperature) = file.temperature {
            self.set_temperature(temperature)?;
        }
        if file.max_output_tokens.is_some() {
            self.max_output_tokens = file.max_output_tokens;
        }
        if let Some(retries) = file.max_retries {
            self.max_retries = retries;
        }
        if let Some(ref bind) = file.bind {
            self.bind = bind.clone();
        }
        if let Some(secs) = file.session_idle_secs {
            self.session_idle_secs = secs;
        }
        Ok(())
    }

    /// Load `.env` if present, then read the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "Loaded .env file");
        }
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides from an arbitrary lookup.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let key = ["GOOGLE_API_KEY", "GEMINI_API_KEY"]
            .iter()
            .find_map(|name| non_empty(lookup(name).as_deref()));
        if let Some(key) = key {
            self.api_key = Some(key);
            self.api_key_from_env = true;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.model = GeminiModel::parse(&model)?;
        }
        if let Some(url) = non_empty(lookup("GEMINI_BASE_URL").as_deref()) {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(prompt) = non_empty(lookup("GEMINI_SYSTEM_PROMPT").as_deref()) {
            self.system_prompt = Some(prompt);
        }
        if let Some(bind) = non_empty(lookup("GEMINI_CHAT_BIND").as_deref()) {
            self.bind = bind;
        }
        Ok(())
    }

    /// Set an explicit API key (CLI flag or web form). Blank keys clear it.
    pub fn set_api_key(&mut self, key: &str) {
        self.api_key = non_empty(Some(key));
        self.api_key_from_env = false;
    }

    pub fn set_temperature(&mut self, temperature: f64) -> Result<()> {
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ChatError::InvalidArgument(format!(
                "temperature must be within 0.0..=2.0, got {temperature}"
            )));
        }
        self.temperature = temperature;
        Ok(())
    }

    /// The API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    pub fn generation_settings(&self) -> GenerationSettings {
        GenerationSettings {
            temperature: Some(self.temperature),
            max_tokens: self.max_output_tokens,
            ..Default::default()
        }
    }

    /// Fixed-attempt retry policy applied by the provider.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_retries + 1,
            ..Default::default()
        }
    }

    /// Request timeout used by the HTTP client.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(120)
    }

    /// How long an unused web session is kept.
    pub fn session_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

/// `<config_dir>/gemini-chat/config.toml` for the current platform.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "gemini-chat")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ChatError::Configuration(format!("cannot read {}: {e}", path.display()))
    })?;
    debug!(path = %path.display(), "Loaded config file");
    Ok(toml::from_str(&raw)?)
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
