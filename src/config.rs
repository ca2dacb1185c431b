use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";

/// Pricing and fulfilment knobs for the checkout engine.
/// All monetary values are integer minor units (cents).
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CheckoutConfig {
    /// ISO currency code stamped on confirmations
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Tax rate in basis points applied to (subtotal - discount)
    #[serde(default = "default_tax_rate_bps")]
    pub tax_rate_bps: i64,

    /// Subtotal at or above which delivery is free
    #[serde(default = "default_free_shipping_threshold")]
    pub free_shipping_threshold: i64,

    /// Flat delivery fee below the threshold
    #[serde(default = "default_delivery_fee")]
    pub delivery_fee: i64,

    /// Days from order commit to estimated delivery
    #[serde(default = "default_delivery_estimate_days")]
    pub delivery_estimate_days: i64,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            tax_rate_bps: default_tax_rate_bps(),
            free_shipping_threshold: default_free_shipping_threshold(),
            delivery_fee: default_delivery_fee(),
            delivery_estimate_days: default_delivery_estimate_days(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}
fn default_tax_rate_bps() -> i64 {
    200
}
fn default_free_shipping_threshold() -> i64 {
    1_500
}
fn default_delivery_fee() -> i64 {
    500
}
fn default_delivery_estimate_days() -> i64 {
    4
}

/// Payment gateway selection and simulated-gateway behavior.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentConfig {
    /// Gateway backend: "simulated" is the only built-in implementation
    #[serde(default = "default_gateway")]
    pub gateway: String,

    /// Probability that a non-COD authorization is declined
    #[serde(default = "default_decline_rate")]
    pub decline_rate: f64,

    /// Probability of a transient network-style failure
    #[serde(default = "default_network_failure_rate")]
    pub network_failure_rate: f64,

    /// Artificial latency for non-COD authorizations
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Hard timeout on the authorization call; elapsing is a network failure
    #[serde(default = "default_payment_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            gateway: default_gateway(),
            decline_rate: default_decline_rate(),
            network_failure_rate: default_network_failure_rate(),
            latency_ms: default_latency_ms(),
            timeout_secs: default_payment_timeout_secs(),
        }
    }
}

fn default_gateway() -> String {
    "simulated".to_string()
}
fn default_decline_rate() -> f64 {
    0.05
}
fn default_network_failure_rate() -> f64 {
    0.01
}
fn default_latency_ms() -> u64 {
    400
}
fn default_payment_timeout_secs() -> u64 {
    5
}

/// Application configuration, loaded from `config/*.toml` plus `APP__*`
/// environment variables. Unknown top-level keys are tolerated because the
/// environment source also surfaces unrelated `APP_*` variables.
#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// DB acquire timeout (seconds)
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,

    #[serde(default)]
    pub checkout: CheckoutConfig,

    #[serde(default)]
    pub payment: PaymentConfig,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}
fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}
fn default_db_max_connections() -> u32 {
    10
}
fn default_db_min_connections() -> u32 {
    1
}
fn default_db_connect_timeout_secs() -> u64 {
    30
}
fn default_db_acquire_timeout_secs() -> u64 {
    8
}

impl AppConfig {
    /// Convenience constructor used by tests and tooling.
    pub fn new(database_url: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: default_host(),
            port: default_port(),
            environment: environment.into(),
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
            checkout: CheckoutConfig::default(),
            payment: PaymentConfig::default(),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }
}

/// Loads configuration from `config/default.toml`, an environment-specific
/// overlay, and `APP__*` environment variables (highest precedence).
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = env::var("APP_ENV").unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let cfg = Config::builder()
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, environment)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .set_override("environment", environment)?
        .build()?;

    cfg.try_deserialize()
}

/// Installs the global tracing subscriber.
pub fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
