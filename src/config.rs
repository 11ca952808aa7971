use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub state_storage_dir: PathBuf,
    pub tax_rate_percent: Decimal,
    pub shipping_flat: Decimal,
    pub free_shipping_threshold: Option<Decimal>,
    pub notification_queue_size: usize,
    pub reminder_interval: Duration,
    pub email_from: String,
    pub cookie_secure: bool,
}

impl Config {
    /// Reads the process environment. Call `dotenvy::dotenv()` first to pick
    /// up a local `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            port: parse_or(&lookup, "PORT", 3000)?,
            state_storage_dir: lookup("STATE_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/sessions")),
            tax_rate_percent: parse_or(&lookup, "TAX_RATE_PERCENT", Decimal::ZERO)?,
            shipping_flat: parse_or(&lookup, "SHIPPING_FLAT", Decimal::ZERO)?,
            free_shipping_threshold: parse_optional(&lookup, "FREE_SHIPPING_THRESHOLD")?,
            notification_queue_size: parse_or(&lookup, "NOTIFICATION_QUEUE_SIZE", 256)?,
            reminder_interval: Duration::from_secs(parse_or(&lookup, "REMINDER_INTERVAL_SECS", 900)?),
            email_from: lookup("EMAIL_FROM").unwrap_or_else(|| "atelier@tailorline.in".to_string()),
            cookie_secure: parse_or(&lookup, "COOKIE_SECURE", false)?,
        })
    }
}

fn parse_optional<F, T>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name).filter(|value| !value.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(None),
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_optional(lookup, name)?.unwrap_or(default))
}
