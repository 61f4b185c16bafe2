use config::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::env;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use validator::Validate;

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const CONFIG_DIR: &str = "config";
const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_STORAGE_DIR: &str = ".localstore";
const DEFAULT_MANAGER_POLL_SECS: u64 = 3;
const DEFAULT_DELIVERY_POLL_SECS: u64 = 5;
const DEFAULT_CUSTOMER_POLL_SECS: u64 = 4;

fn default_delivery_fee() -> Decimal {
    dec!(2.99)
}

fn default_delivery_areas() -> Vec<String> {
    // Postcode areas the store van covers out of the box; override per
    // deployment via config file or LOCALSTORE__DELIVERY_AREAS.
    ["SW", "SE", "NW", "N", "E", "W", "EC", "WC", "BR", "CR"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_manager_poll_secs() -> u64 {
    DEFAULT_MANAGER_POLL_SECS
}

fn default_delivery_poll_secs() -> u64 {
    DEFAULT_DELIVERY_POLL_SECS
}

fn default_customer_poll_secs() -> u64 {
    DEFAULT_CUSTOMER_POLL_SECS
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

/// Application configuration structure with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the LocalStore REST API
    #[validate(url)]
    pub api_base_url: String,

    /// Directory for persisted session snapshots (cart, token, current order)
    pub storage_dir: String,

    /// Flat delivery fee added to every delivery order
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: Decimal,

    /// Postcode areas eligible for delivery (outward-code letters)
    #[serde(default = "default_delivery_areas")]
    #[validate(length(min = 1))]
    pub delivery_areas: Vec<String>,

    /// Poll interval for the manager order feed (seconds)
    #[serde(default = "default_manager_poll_secs")]
    #[validate(range(min = 1, max = 300))]
    pub manager_poll_secs: u64,

    /// Poll interval for the delivery order feed (seconds)
    #[serde(default = "default_delivery_poll_secs")]
    #[validate(range(min = 1, max = 300))]
    pub delivery_poll_secs: u64,

    /// Poll interval for the customer order feed (seconds)
    #[serde(default = "default_customer_poll_secs")]
    #[validate(range(min = 1, max = 300))]
    pub customer_poll_secs: u64,

    /// Optional HTTP request timeout in seconds; absent means no timeout,
    /// matching the stock browser client behaviour
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,

    /// Application environment
    #[serde(default)]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_dir: DEFAULT_STORAGE_DIR.to_string(),
            delivery_fee: default_delivery_fee(),
            delivery_areas: default_delivery_areas(),
            manager_poll_secs: DEFAULT_MANAGER_POLL_SECS,
            delivery_poll_secs: DEFAULT_DELIVERY_POLL_SECS,
            customer_poll_secs: DEFAULT_CUSTOMER_POLL_SECS,
            request_timeout_secs: None,
            environment: DEFAULT_ENV.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_json: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("configuration error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Loads configuration from `config/default`, `config/<env>`, and
/// `LOCALSTORE__`-prefixed environment variables, in that order.
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
        .set_default("api_base_url", DEFAULT_API_BASE_URL)?
        .set_default("storage_dir", DEFAULT_STORAGE_DIR)?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .set_default("log_json", false)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("LOCALSTORE").separator("__"))
        .build()?;

    let app_config: AppConfig = config.try_deserialize()?;
    app_config.validate()?;
    Ok(app_config)
}

/// Initialises the global tracing subscriber. `RUST_LOG`, when set, wins
/// over the configured level.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("localstore_client={}", level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);
    let filter = EnvFilter::try_new(filter_directive).unwrap_or_else(|_| EnvFilter::new("info"));

    if json {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init();
    } else {
        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init();
    }
}
