//! Application configuration parsed from environment variables.
//!
//! Every operational option in §6 of the spec (pricing, dispatcher tuning,
//! provider roster, rate limiting) is a field here, loaded the way the
//! platform's other services load config: flat env vars with sane
//! production defaults, no config file.

use std::env;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must be a valid {1}")]
    Invalid(&'static str, &'static str),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,

    pub bus_type: BusType,
    pub nats_url: String,

    pub host: String,
    pub port: u16,

    pub pricing: PricingConfig,
    pub dispatcher: DispatcherConfig,
    pub rate_limit: RateLimitConfig,
    pub providers: Vec<ProviderConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusType {
    InMemory,
    Nats,
}

#[derive(Debug, Clone, Copy)]
pub struct PricingConfig {
    pub normal: i64,
    pub express: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct MaxRetryAttempts {
    pub normal: u32,
    pub express: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct DispatcherConfig {
    pub worker_count: usize,
    pub batch_size: usize,
    pub batch_wait: Duration,
    pub max_retry_attempts: MaxRetryAttempts,
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub rps: u32,
    pub burst: u32,
}

#[derive(Debug, Clone)]
pub struct BreakerConfig {
    pub fail_threshold: u32,
    pub open_for: Duration,
}

#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub name: String,
    pub enabled: bool,
    pub base_url: String,
    pub normal_path: String,
    pub express_path: String,
    pub timeout: Duration,
    pub breaker: BreakerConfig,
}

fn env_string(key: &'static str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(
    key: &'static str,
    type_name: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(v) => v.parse().map_err(|_| ConfigError::Invalid(key, type_name)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let db_max_connections = env_parse("DB_MAX_CONNECTIONS", "u32", 10)?;
        let db_acquire_timeout_secs: u64 = env_parse("DB_ACQUIRE_TIMEOUT_SECS", "u64", 3)?;

        let bus_type = match env_string("BUS_TYPE", "inmemory").to_lowercase().as_str() {
            "inmemory" => BusType::InMemory,
            "nats" => BusType::Nats,
            _ => return Err(ConfigError::Invalid("BUS_TYPE", "inmemory|nats")),
        };
        let nats_url = env_string("NATS_URL", "nats://localhost:4222");

        let host = env_string("HOST", "0.0.0.0");
        let port: u16 = env_parse("PORT", "u16", 8090)?;

        let pricing = PricingConfig {
            normal: env_parse("PRICING_NORMAL", "i64", 10)?,
            express: env_parse("PRICING_EXPRESS", "i64", 25)?,
        };

        let dispatcher = DispatcherConfig {
            worker_count: env_parse("DISPATCHER_WORKER_COUNT", "usize", 64)?,
            batch_size: env_parse("DISPATCHER_BATCH_SIZE", "usize", 200)?,
            batch_wait: Duration::from_millis(env_parse(
                "DISPATCHER_BATCH_WAIT_MS",
                "u64",
                300,
            )?),
            max_retry_attempts: MaxRetryAttempts {
                normal: env_parse("DISPATCHER_MAX_RETRY_NORMAL", "u32", 2)?,
                express: env_parse("DISPATCHER_MAX_RETRY_EXPRESS", "u32", 3)?,
            },
        };

        let rate_limit = RateLimitConfig {
            rps: env_parse("RATE_LIMIT_RPS", "u32", 10)?,
            burst: env_parse("RATE_LIMIT_BURST", "u32", 20)?,
        };

        let providers = load_providers()?;

        Ok(Config {
            database_url,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(db_acquire_timeout_secs),
            bus_type,
            nats_url,
            host,
            port,
            pricing,
            dispatcher,
            rate_limit,
            providers,
        })
    }
}

/// Loads the provider roster from `PROVIDERS` (comma-separated names) plus
/// one `PROVIDER_<NAME>_*` block per name, e.g.:
///
/// ```text
/// PROVIDERS=alpha,beta
/// PROVIDER_ALPHA_BASE_URL=http://alpha.example
/// PROVIDER_ALPHA_NORMAL_PATH=/send/normal
/// PROVIDER_ALPHA_EXPRESS_PATH=/send/express
/// ```
fn load_providers() -> Result<Vec<ProviderConfig>, ConfigError> {
    let names = env_string("PROVIDERS", "");
    if names.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut providers = Vec::new();
    for name in names.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let upper = name.to_uppercase();
        let prefix = format!("PROVIDER_{upper}_");

        let base_url = env::var(format!("{prefix}BASE_URL"))
            .map_err(|_| ConfigError::Missing("PROVIDER_*_BASE_URL"))?;
        let normal_path = env_string(
            Box::leak(format!("{prefix}NORMAL_PATH").into_boxed_str()),
            "/send/normal",
        );
        let express_path = env_string(
            Box::leak(format!("{prefix}EXPRESS_PATH").into_boxed_str()),
            "/send/express",
        );
        let enabled = env::var(format!("{prefix}ENABLED"))
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);
        let timeout_ms: u64 = env::var(format!("{prefix}TIMEOUT_MS"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3000);
        let fail_threshold: u32 = env::var(format!("{prefix}BREAKER_FAIL_THRESHOLD"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        let open_for_ms: u64 = env::var(format!("{prefix}BREAKER_OPEN_FOR_MS"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15_000);

        providers.push(ProviderConfig {
            name: name.to_string(),
            enabled,
            base_url,
            normal_path,
            express_path,
            timeout: Duration::from_millis(timeout_ms),
            breaker: BreakerConfig {
                fail_threshold,
                open_for: Duration::from_millis(open_for_ms),
            },
        });
    }

    Ok(providers)
}
