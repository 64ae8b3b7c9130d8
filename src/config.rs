use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use chrono::NaiveDate;
use thiserror::Error;

use crate::external::yahoo::{DEFAULT_CHART_URL, DEFAULT_SUMMARY_URL};
use crate::services::forecasting_service::DEFAULT_LOOKBACK_DAYS;

/// Longest forecast history window accepted from the environment.
pub const MAX_LOOKBACK_DAYS: i64 = 3650;

/// Earliest date the date-range picker allows.
pub const MIN_PICKER_DATE: (i32, u32, u32) = (1995, 8, 5);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Yahoo,
    Synthetic,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "synthetic" | "mock" => Ok(ProviderKind::Synthetic),
            other => Err(format!("unknown market data provider '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
    pub host: IpAddr,
    pub port: u16,
    pub debug: bool,
    pub provider: ProviderKind,
    pub yahoo_chart_url: String,
    pub yahoo_summary_url: String,
    pub forecast_lookback_days: i64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8050,
            debug: true,
            provider: ProviderKind::Yahoo,
            yahoo_chart_url: DEFAULT_CHART_URL.to_string(),
            yahoo_summary_url: DEFAULT_SUMMARY_URL.to_string(),
            forecast_lookback_days: DEFAULT_LOOKBACK_DAYS,
        }
    }
}

fn parse_var<T: FromStr>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let forecast_lookback_days = parse_var(
            "FORECAST_LOOKBACK_DAYS",
            lookup("FORECAST_LOOKBACK_DAYS"),
            defaults.forecast_lookback_days,
        )?;
        if !(1..=MAX_LOOKBACK_DAYS).contains(&forecast_lookback_days) {
            return Err(ConfigError::Invalid {
                key: "FORECAST_LOOKBACK_DAYS",
                value: forecast_lookback_days.to_string(),
            });
        }

        Ok(Self {
            host: parse_var("HOST", lookup("HOST"), defaults.host)?,
            port: parse_var("PORT", lookup("PORT"), defaults.port)?,
            debug: parse_var("DASH_DEBUG", lookup("DASH_DEBUG"), defaults.debug)?,
            provider: parse_var("MARKET_DATA_PROVIDER", lookup("MARKET_DATA_PROVIDER"), defaults.provider)?,
            yahoo_chart_url: lookup("YAHOO_CHART_URL").unwrap_or(defaults.yahoo_chart_url),
            yahoo_summary_url: lookup("YAHOO_SUMMARY_URL").unwrap_or(defaults.yahoo_summary_url),
            forecast_lookback_days,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn min_picker_date() -> NaiveDate {
        let (y, m, d) = MIN_PICKER_DATE;
        NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8050");
        assert!(config.debug);
        assert_eq!(config.provider, ProviderKind::Yahoo);
        assert_eq!(config.forecast_lookback_days, 60);
    }

    #[test]
    fn test_overrides() {
        let config = DashboardConfig::from_lookup(lookup(&[
            ("HOST", "0.0.0.0"),
            ("PORT", "9000"),
            ("DASH_DEBUG", "false"),
            ("MARKET_DATA_PROVIDER", "Synthetic"),
            ("FORECAST_LOOKBACK_DAYS", "90"),
        ]))
        .unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:9000");
        assert!(!config.debug);
        assert_eq!(config.provider, ProviderKind::Synthetic);
        assert_eq!(config.forecast_lookback_days, 90);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = DashboardConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));

        assert!(DashboardConfig::from_lookup(lookup(&[("MARKET_DATA_PROVIDER", "bloomberg")])).is_err());
        assert!(DashboardConfig::from_lookup(lookup(&[("FORECAST_LOOKBACK_DAYS", "0")])).is_err());
    }

    #[test]
    fn test_lookback_upper_bound() {
        let config = DashboardConfig::from_lookup(lookup(&[("FORECAST_LOOKBACK_DAYS", "3650")])).unwrap();
        assert_eq!(config.forecast_lookback_days, MAX_LOOKBACK_DAYS);

        let err = DashboardConfig::from_lookup(lookup(&[("FORECAST_LOOKBACK_DAYS", "3651")])).unwrap_err();
        assert!(err.to_string().contains("FORECAST_LOOKBACK_DAYS"));
        assert!(DashboardConfig::from_lookup(lookup(&[("FORECAST_LOOKBACK_DAYS", "9223372036854775807")])).is_err());
    }

    #[test]
    fn test_min_picker_date() {
        assert_eq!(
            DashboardConfig::min_picker_date(),
            NaiveDate::from_ymd_opt(1995, 8, 5).unwrap()
        );
    }
}
