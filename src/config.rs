use std::{collections::HashSet, env, net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::services::chat::{OpenAiSettings, DEFAULT_OPENAI_BASE_URL, DEFAULT_OPENAI_MODEL};
use crate::usage::window::{ResetWindow, DEFAULT_RESET_TIMEZONE};
use crate::utils::plan_limits::{
    DailyLimits, FREE_DAILY_MESSAGE_LIMIT, PREMIUM_DAILY_MESSAGE_LIMIT,
};

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_JWT_ISSUER: &str = "sanctum";
pub const DEFAULT_JWT_AUDIENCE: &str = "sanctum-web";
const DEFAULT_OPENAI_TIMEOUT_SECONDS: u64 = 30;
/// Minimum acceptable size for the JWT secret in bytes.
const MIN_JWT_SECRET_LENGTH: usize = 32;
/// Fewer distinct bytes than this means a trivially guessable secret.
const MIN_UNIQUE_JWT_SECRET_BYTES: usize = 8;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("JWT_SECRET must be at least 32 bytes with 8 distinct byte values")]
    WeakJwtSecret,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub frontend_origin: String,
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub reset_window: ResetWindow,
    pub daily_limits: DailyLimits,
    pub openai: OpenAiSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup so parsing can be tested
    /// without touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let database_url = require("DATABASE_URL")?;
        let frontend_origin = require("FRONTEND_ORIGIN")?;
        let jwt_secret = require("JWT_SECRET")?;
        check_jwt_secret(&jwt_secret)?;

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|_| ConfigError::Invalid {
            key: "BIND_ADDR",
            value: bind_raw.clone(),
        })?;

        let tz_raw =
            get("USAGE_RESET_TIMEZONE").unwrap_or_else(|| DEFAULT_RESET_TIMEZONE.to_string());
        let reset_window = ResetWindow::from_name(&tz_raw).ok_or(ConfigError::Invalid {
            key: "USAGE_RESET_TIMEZONE",
            value: tz_raw.clone(),
        })?;

        let daily_limits = DailyLimits {
            free: parse_or(&get, "FREE_DAILY_MESSAGE_LIMIT", FREE_DAILY_MESSAGE_LIMIT)?,
            premium: parse_or(&get, "PREMIUM_DAILY_MESSAGE_LIMIT", PREMIUM_DAILY_MESSAGE_LIMIT)?,
        };

        let openai = OpenAiSettings {
            api_key: require("OPENAI_API_KEY")?,
            model: get("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            timeout: Duration::from_secs(parse_or(
                &get,
                "OPENAI_TIMEOUT_SECONDS",
                DEFAULT_OPENAI_TIMEOUT_SECONDS,
            )?),
        };

        Ok(Config {
            database_url,
            frontend_origin,
            bind_addr,
            jwt_secret,
            jwt_issuer: get("JWT_ISSUER").unwrap_or_else(|| DEFAULT_JWT_ISSUER.to_string()),
            jwt_audience: get("JWT_AUDIENCE").unwrap_or_else(|| DEFAULT_JWT_AUDIENCE.to_string()),
            reset_window,
            daily_limits,
            openai,
        })
    }
}

fn check_jwt_secret(secret: &str) -> Result<(), ConfigError> {
    let bytes = secret.as_bytes();
    let unique = bytes.iter().collect::<HashSet<_>>().len();
    if bytes.len() < MIN_JWT_SECRET_LENGTH || unique < MIN_UNIQUE_JWT_SECRET_BYTES {
        return Err(ConfigError::WeakJwtSecret);
    }
    Ok(())
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/sanctum"),
            ("FRONTEND_ORIGIN", "http://localhost:5173"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("OPENAI_API_KEY", "sk-test"),
        ])
    }

    fn load(vars: &HashMap<&'static str, &'static str>) -> Result<Config, ConfigError> {
        Config::from_lookup(|key| vars.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn applies_defaults() {
        let config = load(&base_env()).expect("config");
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.parse::<SocketAddr>().unwrap());
        assert_eq!(config.daily_limits, DailyLimits::default());
        assert_eq!(
            config.reset_window.timezone(),
            chrono_tz::America::New_York
        );
        assert_eq!(config.openai.model, DEFAULT_OPENAI_MODEL);
        assert_eq!(config.openai.timeout, Duration::from_secs(30));
        assert_eq!(config.jwt_issuer, DEFAULT_JWT_ISSUER);
    }

    #[test]
    fn reads_overrides() {
        let mut vars = base_env();
        vars.insert("USAGE_RESET_TIMEZONE", "America/Los_Angeles");
        vars.insert("FREE_DAILY_MESSAGE_LIMIT", "5");
        vars.insert("PREMIUM_DAILY_MESSAGE_LIMIT", "50");
        vars.insert("BIND_ADDR", "0.0.0.0:8080");

        let config = load(&vars).expect("config");
        assert_eq!(
            config.reset_window.timezone(),
            chrono_tz::America::Los_Angeles
        );
        assert_eq!(config.daily_limits.free, 5);
        assert_eq!(config.daily_limits.premium, 50);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[test]
    fn reports_missing_and_invalid_values() {
        let mut vars = base_env();
        vars.remove("OPENAI_API_KEY");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Missing("OPENAI_API_KEY"))
        ));

        let mut vars = base_env();
        vars.insert("FREE_DAILY_MESSAGE_LIMIT", "three");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                key: "FREE_DAILY_MESSAGE_LIMIT",
                ..
            })
        ));

        let mut vars = base_env();
        vars.insert("JWT_SECRET", "too-short");
        assert!(matches!(load(&vars), Err(ConfigError::WeakJwtSecret)));

        let mut vars = base_env();
        vars.insert("JWT_SECRET", "abababababababababababababababab");
        assert!(matches!(load(&vars), Err(ConfigError::WeakJwtSecret)));

        let mut vars = base_env();
        vars.insert("USAGE_RESET_TIMEZONE", "Nowhere/Special");
        assert!(matches!(
            load(&vars),
            Err(ConfigError::Invalid {
                key: "USAGE_RESET_TIMEZONE",
                ..
            })
        ));
    }
}
