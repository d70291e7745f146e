use std::env;
use std::time::Duration;

use config::Config as ConfigBuilder;
use config::ConfigError;
use config::Environment;
use config::File;
use serde::Deserialize;

use crate::domain::authentication::models::AuthSettings;
use crate::domain::authentication::models::RefreshPolicy;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub jwt: JwtConfig,
    pub confirmation: ConfirmationConfig,
    pub mail: MailConfig,
    #[serde(default)]
    pub reaper: ReaperConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Deadline applied to every store call
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
}

impl DatabaseConfig {
    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub http_port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_expiry_hours: u32,
    pub refresh_expiry_hours: u32,
    #[serde(default)]
    pub refresh_policy: RefreshPolicy,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConfirmationConfig {
    pub code_length: usize,
    pub expiry_hours: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub from: String,
    /// Empty host switches the notifier to log-only mode
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub smtp_username: String,
    #[serde(default)]
    pub smtp_password: String,
    #[serde(default)]
    pub use_starttls: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReaperConfig {
    pub interval_secs: u64,
}

impl ReaperConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_statement_timeout_ms() -> u64 {
    5_000
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    /// Load configuration from files with environment variable overrides
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (DATABASE__URL, JWT__ACCESS_SECRET, etc.)
    /// 2. Environment-specific config file (config/{environment}.toml)
    /// 3. Default config file (config/default.toml)
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let configuration = ConfigBuilder::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Example: JWT__REFRESH_POLICY=reuse overrides jwt.refresh_policy
            .add_source(Environment::with_prefix("").separator("__"))
            .build()?;

        let config: Config = configuration.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.access_secret.is_empty() || self.jwt.refresh_secret.is_empty() {
            return Err(ConfigError::Message(
                "jwt.access_secret and jwt.refresh_secret must be set".to_string(),
            ));
        }

        if self.jwt.access_secret == self.jwt.refresh_secret {
            return Err(ConfigError::Message(
                "jwt.access_secret and jwt.refresh_secret must differ".to_string(),
            ));
        }

        if self.confirmation.code_length == 0 {
            return Err(ConfigError::Message(
                "confirmation.code_length must be positive".to_string(),
            ));
        }

        Ok(())
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            access_expiry_hours: self.jwt.access_expiry_hours,
            refresh_expiry_hours: self.jwt.refresh_expiry_hours,
            code_length: self.confirmation.code_length,
            code_expiry_hours: self.confirmation.expiry_hours,
            mail_from: self.mail.from.clone(),
            refresh_policy: self.jwt.refresh_policy,
        }
    }
}
