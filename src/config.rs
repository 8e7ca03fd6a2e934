use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_BATCH_SIZE: usize = 1000;
const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;

/// Key/value settings keys shared with the remote store.
pub const ADMIN_PASSWORD_KEY: &str = "AdminPassword";
pub const USER_PASSWORD_PREFIX: &str = "User:";

/// Fallback admin password when the service is running in local-only mode.
/// Credential checks here are a convenience gate, not a security boundary.
pub const LOCAL_FALLBACK_ADMIN_PASSWORD: &str = "0000";

/// Remote table names. Overridable so a deployment can point at a
/// differently-prefixed schema without code changes.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableConfig {
    #[serde(default = "default_orders_table")]
    pub orders: String,
    #[serde(default = "default_products_table")]
    pub products: String,
    #[serde(default = "default_customers_table")]
    pub customers: String,
    #[serde(default = "default_technicians_table")]
    pub technicians: String,
    #[serde(default = "default_admin_settings_table")]
    pub admin_settings: String,
    #[serde(default = "default_user_settings_table")]
    pub user_settings: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            orders: default_orders_table(),
            products: default_products_table(),
            customers: default_customers_table(),
            technicians: default_technicians_table(),
            admin_settings: default_admin_settings_table(),
            user_settings: default_user_settings_table(),
        }
    }
}

fn default_orders_table() -> String {
    "cali_orders".to_string()
}
fn default_products_table() -> String {
    "cali_products".to_string()
}
fn default_customers_table() -> String {
    "cali_customers".to_string()
}
fn default_technicians_table() -> String {
    "cali_technicians".to_string()
}
fn default_admin_settings_table() -> String {
    "cali_admin_settings".to_string()
}
fn default_user_settings_table() -> String {
    "cali_settings".to_string()
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Remote table store endpoint (project URL). Empty disables the remote
    /// backend and the service runs local-only from startup.
    #[serde(default)]
    pub remote_url: String,

    /// API key for the remote table store
    #[serde(default)]
    pub remote_api_key: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Page size for remote full-table reads
    #[serde(default = "default_batch_size")]
    #[validate(range(min = 1, max = 10000))]
    pub batch_size: usize,

    /// Remote HTTP client timeout (seconds)
    #[serde(default = "default_remote_timeout_secs")]
    pub remote_timeout_secs: u64,

    /// CORS: comma-separated list of allowed origins (production)
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// Allow permissive CORS fallback outside development
    #[serde(default)]
    pub cors_allow_any_origin: bool,

    /// Seed the local mirror with demo rows on startup
    #[serde(default = "default_true_bool")]
    pub seed_sample_data: bool,

    /// Remote table names
    #[serde(default)]
    pub tables: TableConfig,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_remote_timeout_secs() -> u64 {
    DEFAULT_REMOTE_TIMEOUT_SECS
}
fn default_true_bool() -> bool {
    true
}

impl AppConfig {
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn should_allow_permissive_cors(&self) -> bool {
        self.is_development() || self.cors_allow_any_origin
    }

    /// Superficial connection-parameter check: the remote backend is only
    /// constructed when both values are present and the URL is URL-shaped.
    /// This gates the *initial* connection state; the first failed write
    /// latches the store to local-only regardless.
    pub fn remote_configured(&self) -> bool {
        !self.remote_api_key.trim().is_empty()
            && !self.remote_url.trim().is_empty()
            && self.remote_url.trim().starts_with("http")
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration load error: {0}")]
    Load(#[from] ConfigError),
    #[error("Configuration validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("caliops_api={},tower_http=debug", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    if json {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .json()
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(EnvFilter::new(filter_directive))
            .try_init();
    }
}

/// Loads application configuration
///
/// Layers configuration sources in this order:
/// 1. Default config (config/default.toml)
/// 2. Environment-specific config (config/{env}.toml)
/// 3. Environment variables (APP__*)
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", DEFAULT_PORT as i64)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    if !app_config.remote_configured() {
        info!("Remote store not configured; starting in local-only mode");
    }

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        AppConfig {
            remote_url: String::new(),
            remote_api_key: String::new(),
            host: "127.0.0.1".into(),
            port: 8080,
            environment: "development".into(),
            log_level: "info".into(),
            log_json: false,
            batch_size: DEFAULT_BATCH_SIZE,
            remote_timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
            seed_sample_data: true,
            tables: TableConfig::default(),
        }
    }

    #[test]
    fn remote_requires_url_shape_and_key() {
        let mut cfg = base_config();
        assert!(!cfg.remote_configured());

        cfg.remote_url = "https://project.example.co".into();
        assert!(!cfg.remote_configured(), "key still missing");

        cfg.remote_api_key = "anon-key".into();
        assert!(cfg.remote_configured());

        cfg.remote_url = "ftp://project.example.co".into();
        assert!(!cfg.remote_configured(), "non-http URL rejected");
    }

    #[test]
    fn table_names_default_to_cali_schema() {
        let tables = TableConfig::default();
        assert_eq!(tables.orders, "cali_orders");
        assert_eq!(tables.user_settings, "cali_settings");
    }
}
