//! Web server command.

use std::path::PathBuf;

use anyhow::Result;
use boardstack_web::{MailMode, ServerConfig};
use clap::Args;
use tracing::info;

use crate::output;

/// Settings that override the config file.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// TOML config file
    #[arg(short, long, env = "BOARDSTACK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long, env = "BOARDSTACK_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "BOARDSTACK_PORT")]
    pub port: Option<u16>,

    /// Redis connection string (in-memory store when unset)
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// Allow new accounts to sign up
    #[arg(
        long,
        env = "ENABLE_REGISTRATION",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub enable_registration: Option<bool>,

    /// Invitation mail delivery: `log` or `disabled`
    #[arg(long, env = "BOARDSTACK_MAIL")]
    pub mail: Option<MailMode>,

    /// Bearer token for the internal publish endpoint
    #[arg(long, env = "BOARDSTACK_INTERNAL_TOKEN", hide_env_values = true)]
    pub internal_token: Option<String>,
}

impl ConfigOverrides {
    /// Load the config file, if any, and apply the overrides on top.
    pub fn resolve(&self) -> Result<ServerConfig> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(url) = &self.redis_url {
            config.redis_url = Some(url.clone());
        }
        if let Some(enabled) = self.enable_registration {
            config.enable_registration = enabled;
        }
        if let Some(mail) = self.mail {
            config.mail = mail;
        }
        if let Some(token) = &self.internal_token {
            config.internal_token = Some(token.clone());
        }
        Ok(config)
    }
}

#[derive(Args)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ConfigOverrides,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

pub async fn execute(args: ServeArgs) -> Result<()> {
    let config = args.overrides.resolve()?;
    output::print_banner(&config);
    info!(
        addr = %config.bind_addr(),
        redis = config.redis_url.is_some(),
        mail = ?config.mail,
        registration = config.enable_registration,
        "Starting BoardStack"
    );
    boardstack_web::run_server(config).await
}
