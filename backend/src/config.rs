//! Configuration management for the Cafeteria Administration backend
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with CAFE__ prefix (e.g. CAFE__DATABASE__URL)

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File, FileFormat};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use shared::ShiftTemplate;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Token verification
    pub auth: AuthConfig,

    /// Week layout and default shift
    pub schedule: ScheduleConfig,

    /// Loyalty program
    pub loyalty: LoyaltyConfig,

    /// Log output
    pub log: LogConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,

    /// Requests running longer than this are aborted
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Shared secret of the identity provider (HS256)
    pub jwt_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScheduleConfig {
    #[serde(deserialize_with = "deserialize_weekday")]
    pub first_day_of_week: Weekday,

    #[serde(deserialize_with = "deserialize_hhmm")]
    pub default_shift_start: NaiveTime,

    #[serde(deserialize_with = "deserialize_hhmm")]
    pub default_shift_end: NaiveTime,

    /// Offset of the cafeteria's local time from UTC
    pub utc_offset_minutes: i32,
}

impl ScheduleConfig {
    pub fn shift_template(&self) -> ShiftTemplate {
        ShiftTemplate {
            start: self.default_shift_start,
            end: self.default_shift_end,
        }
    }

    /// Current local date and time at the cafeteria
    pub fn local_now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::minutes(i64::from(self.utc_offset_minutes))
    }

    pub fn today(&self) -> NaiveDate {
        self.local_now().date()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoyaltyConfig {
    /// Points earned per currency unit charged
    pub points_rate: Decimal,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    /// `pretty` or `json`
    pub format: String,
}

impl LogConfig {
    pub fn is_json(&self) -> bool {
        self.format.eq_ignore_ascii_case("json")
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("CAFE_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = Self::defaults(&environment)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (CAFE__ prefix)
            .add_source(
                Environment::with_prefix("CAFE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    /// Build a configuration from defaults plus a TOML document
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config = Self::defaults("development")?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Self>()?;

        config.validate()?;
        Ok(config)
    }

    fn defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        config::Config::builder()
            .set_default("environment", environment)?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("schedule.first_day_of_week", "monday")?
            .set_default("schedule.default_shift_start", "08:00")?
            .set_default("schedule.default_shift_end", "16:00")?
            .set_default("schedule.utc_offset_minutes", 0)?
            .set_default("loyalty.points_rate", "0.1")?
            .set_default("log.format", "pretty")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.loyalty.points_rate < Decimal::ZERO {
            return Err(ConfigError::Message(
                "loyalty.points_rate cannot be negative".to_string(),
            ));
        }
        if self.schedule.default_shift_start == self.schedule.default_shift_end {
            return Err(ConfigError::Message(
                "schedule.default_shift_start and default_shift_end cannot be equal".to_string(),
            ));
        }
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::Message("auth.jwt_secret is required".to_string()));
        }
        if !matches!(self.log.format.to_ascii_lowercase().as_str(), "pretty" | "json") {
            return Err(ConfigError::Message(format!(
                "log.format must be 'pretty' or 'json', got '{}'",
                self.log.format
            )));
        }
        Ok(())
    }
}

fn deserialize_weekday<'de, D>(deserializer: D) -> Result<Weekday, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    raw.trim()
        .parse::<Weekday>()
        .map_err(|_| serde::de::Error::custom(format!("invalid weekday '{}'", raw)))
}

fn deserialize_hhmm<'de, D>(deserializer: D) -> Result<NaiveTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .map_err(|_| serde::de::Error::custom(format!("invalid time '{}', expected HH:MM", raw)))
}
