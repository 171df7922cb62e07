//! Server configuration.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// How invitation mail is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailMode {
    /// No transport; invitations fail with 503.
    #[default]
    Disabled,
    /// Render mail and write it to the log.
    Log,
}

impl FromStr for MailMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "disabled" | "none" | "off" => Ok(MailMode::Disabled),
            "log" => Ok(MailMode::Log),
            other => Err(format!("unknown mail mode '{}' (expected 'log' or 'disabled')", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Redis connection string; the in-memory store is used when unset.
    pub redis_url: Option<String>,
    pub enable_registration: bool,
    pub mail: MailMode,
    /// Base URL used in links sent to users.
    pub public_url: String,
    /// Bearer token for `/internal/*`; those routes are off when unset.
    pub internal_token: Option<String>,
    /// Pending messages per subscriber before it is dropped as too slow.
    pub subscriber_buffer: usize,
    pub keep_alive_secs: u64,
    pub invitation_ttl_days: i64,
    pub invitation_sweep_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            redis_url: None,
            enable_registration: true,
            mail: MailMode::Disabled,
            public_url: "http://localhost:3000".to_string(),
            internal_token: None,
            subscriber_buffer: 64,
            keep_alive_secs: 15,
            invitation_ttl_days: 7,
            invitation_sweep_secs: 3600,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Gap between SSE keep-alive comments, at least one second.
    pub fn keep_alive_interval(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs.max(1))
    }

    /// Gap between invitation sweeps, at least one second.
    pub fn invitation_sweep_interval(&self) -> Duration {
        Duration::from_secs(self.invitation_sweep_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ServerConfig::from_toml_str(
            r#"
            port = 8080
            mail = "log"
            internal_token = "secret"
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.mail, MailMode::Log);
        assert_eq!(config.internal_token.as_deref(), Some("secret"));
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.subscriber_buffer, 64);
        assert_eq!(config.keep_alive_secs, 15);
        assert!(config.enable_registration);
    }

    #[test]
    fn test_zero_intervals_are_clamped() {
        let config = ServerConfig::from_toml_str(
            r#"
            keep_alive_secs = 0
            invitation_sweep_secs = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.keep_alive_interval(), Duration::from_secs(1));
        assert_eq!(config.invitation_sweep_interval(), Duration::from_secs(1));
        assert_eq!(ServerConfig::default().keep_alive_interval(), Duration::from_secs(15));
    }

    #[test]
    fn test_mail_mode_from_str() {
        assert_eq!("LOG".parse::<MailMode>().unwrap(), MailMode::Log);
        assert_eq!("none".parse::<MailMode>().unwrap(), MailMode::Disabled);
        assert!("smtp".parse::<MailMode>().is_err());
    }
}
