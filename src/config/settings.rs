//! Configuration settings structure
//!
//! Defines the main settings structure and loading logic for the client.

use crate::{
    Error, Result,
    session::{Credentials, LoginMode},
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main configuration settings for the client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API endpoint configuration
    pub api: ApiSettings,
    /// Session and login configuration
    pub session: SessionSettings,
    /// Logging configuration
    pub logging: LoggingSettings,
}

/// API endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Full URL of `api.php`
    pub endpoint: String,
    /// Caller identification, prepended to the library's User-Agent
    pub user_agent: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Session and login configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Username to log in with; anonymous when unset
    pub username: Option<String>,
    /// Password (or bot password) for `username`
    pub password: Option<String>,
    /// Login flow to use
    pub login_mode: LoginMode,
    /// Seconds to refuse re-login attempts after one failed
    pub relogin_cooldown_secs: u64,
    /// Cookie name suffix that marks a live session
    pub session_cookie_suffix: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level
    pub level: String,
    /// Enable verbose logging
    pub verbose: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost/w/api.php".to_string(),
            user_agent: None,
            timeout_secs: 30,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            username: None,
            password: None,
            login_mode: LoginMode::Bot,
            relogin_cooldown_secs: 10,
            session_cookie_suffix: "_session".to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            verbose: false,
        }
    }
}

impl Settings {
    /// Create new settings with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings pointing at `endpoint`, everything else default
    pub fn for_endpoint(endpoint: impl Into<String>) -> Self {
        let mut settings = Self::default();
        settings.api.endpoint = endpoint.into();
        settings
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid config file {}: {}", path.display(), e)))
    }

    /// Load settings from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().merge_with_env()
    }

    /// Override fields with any environment variables that are set
    pub fn merge_with_env(mut self) -> Result<Self> {
        if let Ok(url) = std::env::var("MEDIAWIKI_URL") {
            self.api.endpoint = url;
        }

        if let Ok(ua) = std::env::var("MEDIAWIKI_USER_AGENT") {
            self.api.user_agent = Some(ua);
        }

        if let Ok(timeout) = std::env::var("MEDIAWIKI_TIMEOUT") {
            self.api.timeout_secs = timeout
                .parse()
                .map_err(|e| Error::Config(format!("Invalid timeout: {}", e)))?;
        }

        if let Ok(username) = std::env::var("MEDIAWIKI_USERNAME") {
            self.session.username = Some(username);
        }

        if let Ok(password) = std::env::var("MEDIAWIKI_PASSWORD") {
            self.session.password = Some(password);
        }

        if let Ok(mode) = std::env::var("MEDIAWIKI_LOGIN_MODE") {
            self.session.login_mode = mode.parse()?;
        }

        if let Ok(cooldown) = std::env::var("MEDIAWIKI_RELOGIN_COOLDOWN") {
            self.session.relogin_cooldown_secs = cooldown
                .parse()
                .map_err(|e| Error::Config(format!("Invalid re-login cooldown: {}", e)))?;
        }

        Ok(self)
    }

    /// Check the settings for values the client cannot work with
    pub fn validate(&self) -> Result<()> {
        let url = self.endpoint_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "Unsupported endpoint scheme: {}",
                url.scheme()
            )));
        }

        if self.api.timeout_secs == 0 {
            return Err(Error::config("Timeout must be greater than zero"));
        }

        if self.session.username.is_some() && self.session.password.is_none() {
            return Err(Error::config("Username configured without a password"));
        }

        if self.session.session_cookie_suffix.is_empty() {
            return Err(Error::config("Session cookie suffix must not be empty"));
        }

        Ok(())
    }

    /// Parsed API endpoint
    pub fn endpoint_url(&self) -> Result<Url> {
        Url::parse(&self.api.endpoint)
            .map_err(|e| Error::config(format!("Invalid endpoint {}: {}", self.api.endpoint, e)))
    }

    /// Request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Cooldown applied after a failed re-login
    pub fn relogin_cooldown(&self) -> Duration {
        Duration::from_secs(self.session.relogin_cooldown_secs)
    }

    /// Configured login, if both username and password are set
    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.session.username, &self.session.password) {
            (Some(username), Some(password)) => Some(Credentials::new(username, password)),
            _ => None,
        }
    }
}
