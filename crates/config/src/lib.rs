//! Configuration loading, validation, and management for Toaster.
//!
//! Loads configuration from `~/.toaster/config.toml` with environment
//! variable overrides. Validates all settings at startup; a configuration
//! error is fatal.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.toaster/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BotConfig {
    /// Chat platform connection
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Model backend and model selection
    #[serde(default)]
    pub models: ModelsConfig,

    /// Conversation behavior
    #[serde(default)]
    pub behavior: BehaviorConfig,

    /// Inbound event relay
    #[serde(default)]
    pub relay: RelayConfig,

    /// GIF search collaborator
    #[serde(default)]
    pub gif: GifConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

fn default_true() -> bool {
    true
}

#[derive(Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the platform API
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// The bot's own account id on the platform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<String>,

    /// How many recent messages to fetch when assembling a window
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_base_url() -> String {
    "http://localhost:8080".into()
}
fn default_history_limit() -> usize {
    20
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            bot_user_id: None,
            history_limit: default_history_limit(),
        }
    }
}

impl std::fmt::Debug for PlatformConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformConfig")
            .field("base_url", &self.base_url)
            .field("token", &redact(&self.token))
            .field("bot_user_id", &self.bot_user_id)
            .field("history_limit", &self.history_limit)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// OpenAI-compatible endpoint. Defaults to `<platform.base_url>/api`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// Backend API key. Falls back to the platform token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model that arbitrates whether to reply
    #[serde(default = "default_model")]
    pub decision_model: String,

    /// Model that writes the replies
    #[serde(default = "default_model")]
    pub chat_model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on every backend call
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Token ceiling for the window sent to the chat model
    #[serde(default = "default_token_ceiling")]
    pub token_ceiling: usize,
}

fn default_model() -> String {
    "x-ai/grok-beta".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_token_ceiling() -> usize {
    8000
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            decision_model: default_model(),
            chat_model: default_model(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            token_ceiling: default_token_ceiling(),
        }
    }
}

impl std::fmt::Debug for ModelsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelsConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("decision_model", &self.decision_model)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .field("token_ceiling", &self.token_ceiling)
            .finish()
    }
}

/// How dialogue turns are rendered for the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentFormat {
    /// `{user, message, reactions}` JSON per turn
    #[default]
    Structured,
    /// Bare message text
    Plain,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehaviorConfig {
    /// Prefix that marks a message as a command
    #[serde(default = "default_sentinel")]
    pub sentinel: char,

    #[serde(default = "default_bot_name")]
    pub bot_name: String,

    /// Other names the bot answers to
    #[serde(default = "default_aliases")]
    pub aliases: Vec<String>,

    #[serde(default = "default_persona")]
    pub persona: String,

    /// Free-form persona traits; replaces the catalog persona when set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_persona: Option<String>,

    #[serde(default)]
    pub content_format: ContentFormat,

    /// Post the raw decision text when the arbiter answers neither yes nor no
    #[serde(default = "default_true")]
    pub speak_unparseable_verdicts: bool,
}

fn default_sentinel() -> char {
    '$'
}
fn default_bot_name() -> String {
    "Toaster".into()
}
fn default_aliases() -> Vec<String> {
    vec!["toast".into(), "toaster".into()]
}
fn default_persona() -> String {
    "default".into()
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            sentinel: default_sentinel(),
            bot_name: default_bot_name(),
            aliases: default_aliases(),
            persona: default_persona(),
            custom_persona: None,
            content_format: ContentFormat::default(),
            speak_unparseable_verdicts: true,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// HMAC-SHA256 secret for `X-Signature`. None = no verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_secret: Option<String>,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8787
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            shared_secret: None,
        }
    }
}

impl std::fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("shared_secret", &redact(&self.shared_secret))
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct GifConfig {
    #[serde(default = "default_gif_url")]
    pub api_url: String,

    #[serde(default = "default_gif_key")]
    pub api_key: Option<String>,

    /// Results to sample from
    #[serde(default = "default_gif_limit")]
    pub limit: u32,
}

fn default_gif_url() -> String {
    "https://g.tenor.com/v1/search".into()
}
fn default_gif_key() -> Option<String> {
    Some("LIVDSRZULELA".into())
}
fn default_gif_limit() -> u32 {
    20
}

impl Default for GifConfig {
    fn default() -> Self {
        Self {
            api_url: default_gif_url(),
            api_key: default_gif_key(),
            limit: default_gif_limit(),
        }
    }
}

impl std::fmt::Debug for GifConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GifConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("limit", &self.limit)
            .finish()
    }
}

impl BotConfig {
    /// Load configuration from the default path (~/.toaster/config.toml),
    /// then apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_overrides(&Self::config_dir().join("config.toml"))
    }

    /// Load from `path`, apply environment overrides, validate.
    pub fn load_with_overrides(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Recognised: `WEBUI_URL`, `TOKEN`, `OPENWEBUI_API_KEY`,
    /// `TOASTER_BOT_USER_ID`, `TOASTER_API_URL`, `TOASTER_DECISION_MODEL`,
    /// `TOASTER_CHAT_MODEL`, `TOASTER_TOKEN_CEILING`, `TOASTER_RELAY_SECRET`,
    /// `TENOR_API_KEY`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WEBUI_URL") {
            self.platform.base_url = url;
        }
        if let Some(token) = lookup("TOKEN") {
            self.platform.token = Some(token);
        }
        if let Some(id) = lookup("TOASTER_BOT_USER_ID") {
            self.platform.bot_user_id = Some(id);
        }
        if let Some(key) = lookup("OPENWEBUI_API_KEY") {
            self.models.api_key = Some(key);
        }
        if let Some(url) = lookup("TOASTER_API_URL") {
            self.models.api_url = Some(url);
        }
        if let Some(model) = lookup("TOASTER_DECISION_MODEL") {
            self.models.decision_model = model;
        }
        if let Some(model) = lookup("TOASTER_CHAT_MODEL") {
            self.models.chat_model = model;
        }
        if let Some(raw) = lookup("TOASTER_TOKEN_CEILING") {
            self.models.token_ceiling = raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "TOASTER_TOKEN_CEILING must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        if let Some(secret) = lookup("TOASTER_RELAY_SECRET") {
            self.relay.shared_secret = Some(secret);
        }
        if let Some(key) = lookup("TENOR_API_KEY") {
            self.gif.api_key = Some(key);
        }
        Ok(())
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".toaster")
    }

    /// The OpenAI-compatible endpoint for the model backend.
    pub fn model_api_url(&self) -> String {
        match &self.models.api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("{}/api", self.platform.base_url.trim_end_matches('/')),
        }
    }

    /// The backend API key, falling back to the platform token.
    pub fn model_api_key(&self) -> Option<&str> {
        self.models
            .api_key
            .as_deref()
            .or(self.platform.token.as_deref())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.models.temperature < 0.0 || self.models.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "models.temperature must be between 0.0 and 2.0".into(),
            ));
        }
        if self.models.token_ceiling == 0 {
            return Err(ConfigError::ValidationError(
                "models.token_ceiling must be > 0".into(),
            ));
        }
        if self.models.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "models.timeout_secs must be > 0".into(),
            ));
        }
        if self.models.decision_model.trim().is_empty() || self.models.chat_model.trim().is_empty()
        {
            return Err(ConfigError::ValidationError(
                "models.decision_model and models.chat_model must not be empty".into(),
            ));
        }
        if !(1..=200).contains(&self.platform.history_limit) {
            return Err(ConfigError::ValidationError(
                "platform.history_limit must be between 1 and 200".into(),
            ));
        }
        let sentinel = self.behavior.sentinel;
        if sentinel.is_alphanumeric() || sentinel.is_whitespace() {
            return Err(ConfigError::ValidationError(format!(
                "behavior.sentinel must be a symbol, got '{sentinel}'"
            )));
        }
        Ok(())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
