//! Application configuration management with security considerations.
//!
//! This module handles all configuration values required for the webhook
//! server. Webhook secrets are optional: a provider without a configured
//! secret answers every delivery with a 500 while the other providers keep
//! working.
//!
//! # Security Notes
//! - Sensitive fields are clearly marked and should never be logged
//! - Production environments should use secure secret management systems

use chrono::TimeDelta;
use envconfig::Envconfig;
use std::sync::OnceLock;

use crate::consts;

/// Backend used to remember processed webhook events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupBackend {
    /// Process-local map. Lost on restart and not shared between instances.
    Memory,
    /// SQLite table shared by every process pointing to the same database.
    Sqlite,
}

/// Application configuration with security-aware field management.
///
/// Every field is read from the environment variable with the same name in
/// upper case (e.g. `stripe_webhook_secret` -> `STRIPE_WEBHOOK_SECRET`).
#[derive(Envconfig, Clone)]
pub struct AppConfig {
    /// Environment name to deploy the app (NON-SENSITIVE)
    /// Values: "local", "dev", "staging", "prod"
    #[envconfig(default = "local")]
    pub env: String,

    /// Host address for web server binding (NON-SENSITIVE)
    #[envconfig(default = "0.0.0.0")]
    pub web_server_host: String,

    /// Port for web server binding (NON-SENSITIVE)
    #[envconfig(default = "8080")]
    pub web_server_port: u16,

    /// Path to SSL private key file (SENSITIVE PATH)
    #[envconfig(default = "server.key")]
    pub private_key_path: String,

    /// Path to SSL certificate file (NON-SENSITIVE)
    #[envconfig(default = "server.crt")]
    pub certificate_path: String,

    /// 🔒 SENSITIVE: token used to ship traces and metrics to logfire
    pub logfire_token: Option<String>,

    /// 🔒 SENSITIVE: Stripe endpoint signing secret (`whsec_...`)
    pub stripe_webhook_secret: Option<String>,

    /// Max age in seconds of the `t=` timestamp of a Stripe signature (NON-SENSITIVE)
    #[envconfig(default = "300")]
    pub stripe_signature_tolerance_secs: i64,

    /// 🔒 SENSITIVE: GitHub App webhook secret
    pub github_webhook_secret: Option<String>,

    /// 🔒 SENSITIVE: secret shared with senders of the generic `sha256=` webhook
    pub hub_webhook_secret: Option<String>,

    /// 🔒 SENSITIVE: GitHub App installation token used to comment on pull requests
    /// Security: When absent, pull request events are only logged
    pub github_app_installation_token: Option<String>,

    /// Name the bot signs its pull request comments with (NON-SENSITIVE)
    #[envconfig(default = "YONI")]
    pub github_bot_alias: String,

    /// Hours a processed event id is remembered (NON-SENSITIVE)
    /// Must exceed the retry horizon of every sender
    #[envconfig(default = "24")]
    pub dedup_retention_hours: i64,

    /// Where processed event ids live (NON-SENSITIVE)
    /// Values: "memory", "sqlite"
    #[envconfig(default = "memory")]
    pub dedup_backend: String,

    /// Database host value, only used by the sqlite dedup backend (NON-SENSITIVE)
    /// Example: "sqlite:data/webhooks.db"
    #[envconfig(default = "sqlite:data/webhooks.db?mode=rwc")]
    pub db_host: String,

    /// 🔒 SENSITIVE: Database password to encrypt SQLite data
    pub db_pass_encrypt: Option<String>,
}

impl AppConfig {
    /// Checks if running in production environment
    pub fn is_prod(&self) -> bool {
        self.env.to_lowercase() == "prod"
    }

    pub fn dedup_retention(&self) -> TimeDelta {
        TimeDelta::try_hours(self.dedup_retention_hours)
            .filter(|retention| *retention > TimeDelta::zero())
            .unwrap_or(consts::DEFAULT_DEDUP_RETENTION)
    }

    pub fn stripe_signature_tolerance(&self) -> TimeDelta {
        TimeDelta::try_seconds(self.stripe_signature_tolerance_secs)
            .filter(|tolerance| *tolerance > TimeDelta::zero())
            .unwrap_or(consts::DEFAULT_STRIPE_TOLERANCE)
    }

    pub fn dedup_backend(&self) -> anyhow::Result<DedupBackend> {
        match self.dedup_backend.to_lowercase().as_str() {
            "memory" => Ok(DedupBackend::Memory),
            "sqlite" => Ok(DedupBackend::Sqlite),
            other => anyhow::bail!("unknown DEDUP_BACKEND value: {other}"),
        }
    }
}

/// Global application configuration instance, set once by [`init_config`].
pub static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Loads the configuration from the environment into [`APP_CONFIG`].
pub fn init_config() -> anyhow::Result<()> {
    let app_config = AppConfig::init_from_env()?;

    APP_CONFIG
        .set(app_config)
        .map_err(|_| anyhow::anyhow!("app config was already initialized"))
}
