use marquee_catalog::{SeatLayout, SeatPricing};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingRules,
    #[serde(default)]
    pub seat_map: SeatLayout,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Redis,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,
    pub redis_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
    /// Shared key exchanged for an admin token at `/v1/auth/admin`
    pub admin_api_key: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingRules {
    #[serde(default = "default_max_seats")]
    pub max_seats: usize,
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Simulated processing time of the mock payment provider
    #[serde(default = "default_payment_delay_ms")]
    pub payment_delay_ms: u64,
    /// Card number the mock provider always declines
    pub decline_card_number: Option<String>,
    #[serde(default = "default_vip_surcharge")]
    pub vip_surcharge_percent: u32,
    #[serde(default = "default_rounding_unit")]
    pub price_rounding_unit: i64,
    /// Seat count given to showtimes created without one
    #[serde(default = "default_showtime_seats")]
    pub default_showtime_seats: u32,
    /// Seat-selection sessions untouched for this long are dropped
    #[serde(default = "default_session_idle_seconds")]
    pub session_idle_seconds: u64,
}

fn default_max_seats() -> usize { 8 }
fn default_currency() -> String { marquee_shared::DEFAULT_CURRENCY.to_string() }
fn default_payment_delay_ms() -> u64 { 3000 }
fn default_vip_surcharge() -> u32 { 0 }
fn default_rounding_unit() -> i64 { 100 }
fn default_showtime_seats() -> u32 { 100 }
fn default_session_idle_seconds() -> u64 { 1800 }

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            max_seats: default_max_seats(),
            currency: default_currency(),
            payment_delay_ms: default_payment_delay_ms(),
            decline_card_number: None,
            vip_surcharge_percent: default_vip_surcharge(),
            price_rounding_unit: default_rounding_unit(),
            default_showtime_seats: default_showtime_seats(),
            session_idle_seconds: default_session_idle_seconds(),
        }
    }
}

impl BookingRules {
    pub fn seat_pricing(&self) -> SeatPricing {
        SeatPricing {
            vip_surcharge_percent: self.vip_surcharge_percent,
            rounding_unit: self.price_rounding_unit,
        }
    }
}

/// Optional backend reservation service. Every call to it is best effort.
#[derive(Debug, Deserialize, Clone)]
pub struct RemoteConfig {
    pub reservation_service_url: Option<String>,
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_remote_timeout_ms() -> u64 { 2000 }

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            reservation_service_url: None,
            timeout_ms: default_remote_timeout_ms(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RetryStrategy {
    None,
    Fixed,
    #[default]
    Exponential,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetryConfig {
    #[serde(default)]
    pub strategy: RetryStrategy,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_attempt_timeout_ms")]
    pub attempt_timeout_ms: u64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_delay_ms() -> u64 { 200 }
fn default_max_delay_ms() -> u64 { 2000 }
fn default_attempt_timeout_ms() -> u64 { 3000 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            strategy: RetryStrategy::default(),
            max_attempts: default_max_attempts(),
            delay_ms: default_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            attempt_timeout_ms: default_attempt_timeout_ms(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `MARQUEE__SERVER__PORT=8081`
            .add_source(config::Environment::with_prefix("MARQUEE").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
