use std::{env, path::PathBuf, str::FromStr};

use thiserror::Error;

use crate::parsing::parse_boolish;

pub const DEFAULT_SYMBOL: &str = "NIFTY";
pub const DEFAULT_NEAREST_STRIKES: usize = 10;
pub const DEFAULT_ALERT_TOP_N: usize = 3;
pub const DEFAULT_MIN_PCT_COI: f64 = 0.0001;
pub const DEFAULT_FETCH_RETRIES: u32 = 3;
pub const DEFAULT_DB_PATH: &str = "oi_alerts.db";
pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    NotANumber { key: &'static str, value: String },
    #[error("{key} must be greater than zero")]
    Zero { key: &'static str },
    #[error("{key} must be a finite, non-negative number, got {value}")]
    InvalidThreshold { key: &'static str, value: f64 },
    #[error("{key} must be one of true/false/yes/no/on/off/1/0, got {value:?}")]
    NotABool { key: &'static str, value: String },
    #[error("{key} must not be empty")]
    Empty { key: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub symbol: String,
    pub nearest_strikes: usize,
    pub alert_top_n: usize,
    pub min_pct_coi: f64,
    pub fetch_retries: u32,
    pub verbose_fetch: bool,
    pub fallback_csv: Option<PathBuf>,
    pub db_path: PathBuf,
    pub execution_log: bool,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            symbol: DEFAULT_SYMBOL.to_string(),
            nearest_strikes: DEFAULT_NEAREST_STRIKES,
            alert_top_n: DEFAULT_ALERT_TOP_N,
            min_pct_coi: DEFAULT_MIN_PCT_COI,
            fetch_retries: DEFAULT_FETCH_RETRIES,
            verbose_fetch: true,
            fallback_csv: None,
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            execution_log: true,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if lookup("OI_SYMBOL").is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::Empty { key: "OI_SYMBOL" });
        }

        let symbol = get("OI_SYMBOL")
            .map(|s| s.to_uppercase())
            .unwrap_or(defaults.symbol);

        let nearest_strikes = match get("OI_NEAREST_STRIKES") {
            Some(raw) => positive("OI_NEAREST_STRIKES", &raw)?,
            None => defaults.nearest_strikes,
        };
        let alert_top_n = match get("OI_ALERT_TOP_N") {
            Some(raw) => positive("OI_ALERT_TOP_N", &raw)?,
            None => defaults.alert_top_n,
        };
        let fetch_retries = match get("OI_FETCH_RETRIES") {
            Some(raw) => positive::<u32>("OI_FETCH_RETRIES", &raw)?,
            None => defaults.fetch_retries,
        };

        let min_pct_coi = match get("OI_MIN_PCT_COI") {
            Some(raw) => {
                let value = raw.parse::<f64>().map_err(|_| ConfigError::NotANumber {
                    key: "OI_MIN_PCT_COI",
                    value: raw.clone(),
                })?;
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::InvalidThreshold {
                        key: "OI_MIN_PCT_COI",
                        value,
                    });
                }
                value
            }
            None => defaults.min_pct_coi,
        };

        let verbose_fetch = match get("OI_VERBOSE_FETCH") {
            Some(raw) => boolish("OI_VERBOSE_FETCH", &raw)?,
            None => defaults.verbose_fetch,
        };
        let execution_log = match get("OI_EXECUTION_LOG") {
            Some(raw) => boolish("OI_EXECUTION_LOG", &raw)?,
            None => defaults.execution_log,
        };

        Ok(Self {
            symbol,
            nearest_strikes,
            alert_top_n,
            min_pct_coi,
            fetch_retries,
            verbose_fetch,
            fallback_csv: get("OI_FALLBACK_CSV").map(PathBuf::from),
            db_path: get("OI_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            execution_log,
            log_level: get("OI_LOG_LEVEL").unwrap_or(defaults.log_level),
        })
    }
}

fn positive<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    let value = raw.parse::<T>().map_err(|_| ConfigError::NotANumber {
        key,
        value: raw.to_string(),
    })?;
    if value == T::default() {
        return Err(ConfigError::Zero { key });
    }
    Ok(value)
}

fn boolish(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    parse_boolish(raw).ok_or_else(|| ConfigError::NotABool {
        key,
        value: raw.to_string(),
    })
}
