use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

const DEFAULT_FILTER: &str = "info";
const DEFAULT_SERVICE_NAME: &str = "stock-dash";
const DEFAULT_ENVIRONMENT: &str = "development";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("LOKI_ENABLED is true but LOKI_URL is not set")]
    MissingLokiUrl,
    #[error("invalid LOKI_URL: {0}")]
    InvalidLokiUrl(#[from] url::ParseError),
    #[error("invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
    #[error("failed to install log subscriber: {0}")]
    Init(String),
}

/// Loki push endpoint plus the stream labels attached to every event.
#[derive(Debug, Clone, PartialEq)]
pub struct LokiTarget {
    pub url: Url,
    pub service_name: String,
    pub environment: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info,stock_dash=debug`.
    pub filter: String,
    pub loki: Option<LokiTarget>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            loki: None,
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads `RUST_LOG`, `LOKI_ENABLED`, `LOKI_URL`, `SERVICE_NAME` and
    /// `ENVIRONMENT`. Loki settings are only looked at when shipping is on.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let filter = lookup("RUST_LOG")
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        if !lookup("LOKI_ENABLED").as_deref().is_some_and(is_truthy) {
            return Ok(Self { filter, loki: None });
        }

        let raw_url = lookup("LOKI_URL").ok_or(LoggingError::MissingLokiUrl)?;
        let loki = LokiTarget {
            url: Url::parse(raw_url.trim())?,
            service_name: lookup("SERVICE_NAME").unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
        };

        Ok(Self { filter, loki: Some(loki) })
    }

    fn env_filter(&self) -> Result<EnvFilter, LoggingError> {
        EnvFilter::try_new(&self.filter).map_err(|e| LoggingError::Filter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }
}

/// Install the global subscriber: stdout always, Loki when configured and the
/// `loki` feature is compiled in.
pub fn init_logging(config: LoggingConfig) -> Result<(), LoggingError> {
    let filter = config.env_filter()?;
    let loki = match &config.loki {
        Some(target) => loki_layer(target)?,
        None => None,
    };
    let shipping = loki.is_some();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(loki)
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    match (&config.loki, shipping) {
        (Some(target), true) => tracing::info!("✅ Logging to console and Loki at {}", target.url),
        (Some(_), false) => tracing::warn!("LOKI_ENABLED is set but the loki feature is not compiled in"),
        (None, _) => tracing::info!("📊 Console logging initialized ({})", config.filter),
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn loki_layer(target: &LokiTarget) -> Result<Option<tracing_loki::Layer>, LoggingError> {
    let init = |e: tracing_loki::Error| LoggingError::Init(e.to_string());

    let (layer, task) = tracing_loki::builder()
        .label("service", &target.service_name)
        .map_err(init)?
        .label("environment", &target.environment)
        .map_err(init)?
        .build_url(target.url.clone())
        .map_err(init)?;

    // ships buffered events to Loki
    tokio::spawn(task);
    Ok(Some(layer))
}

#[cfg(not(feature = "loki"))]
fn loki_layer(_target: &LokiTarget) -> Result<Option<tracing_subscriber::layer::Identity>, LoggingError> {
    Ok(None)
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
    fn test_defaults_to_console_at_info() {
        let config = LoggingConfig::from_lookup(lookup(&[("LOKI_URL", "http://localhost:3100")])).unwrap();
        assert_eq!(config, LoggingConfig::default());
    }

    #[test]
    fn test_loki_target_with_labels() {
        let config = LoggingConfig::from_lookup(lookup(&[
            ("RUST_LOG", "stock_dash=debug,tower_http=info"),
            ("LOKI_ENABLED", "TRUE"),
            ("LOKI_URL", " http://localhost:3100 "),
            ("ENVIRONMENT", "staging"),
        ]))
        .unwrap();

        let target = config.loki.clone().unwrap();
        assert_eq!(target.url.as_str(), "http://localhost:3100/");
        assert_eq!(target.service_name, "stock-dash");
        assert_eq!(target.environment, "staging");
        assert!(config.env_filter().is_ok());
    }

    #[test]
    fn test_loki_requires_valid_url() {
        let err = LoggingConfig::from_lookup(lookup(&[("LOKI_ENABLED", "1")])).unwrap_err();
        assert!(matches!(err, LoggingError::MissingLokiUrl));

        let err = LoggingConfig::from_lookup(lookup(&[("LOKI_ENABLED", "yes"), ("LOKI_URL", "not a url")]))
            .unwrap_err();
        assert!(matches!(err, LoggingError::InvalidLokiUrl(_)));
    }
}
