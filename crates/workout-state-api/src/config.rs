use std::net::SocketAddr;
use std::time::Duration;

use axum::http::HeaderValue;
use thiserror::Error;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Which origins may call the API from a browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    /// `*`. Served by echoing the caller's origin, since credentials are allowed.
    Any,
    Exact(HeaderValue),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Runtime configuration, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `CACHE_TABLE_NAME`: DynamoDB table holding states and API keys.
    pub table_name: String,
    /// `CORS_ORIGIN`, default `*`.
    pub cors_origin: CorsOrigin,
    /// `LISTEN_ADDR`, default `0.0.0.0:8080`.
    pub listen_addr: SocketAddr,
    /// `REQUEST_TIMEOUT`, default `10s`.
    pub request_timeout: Duration,
    /// `LOG_FORMAT`: `pretty` (default) or `json`.
    pub log_format: LogFormat,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} environment variable must be set")]
    Missing(&'static str),

    #[error("invalid {name} value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let table_name = lookup("CACHE_TABLE_NAME")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("CACHE_TABLE_NAME"))?;

        let cors_origin = match lookup("CORS_ORIGIN").as_deref() {
            None | Some("*") => CorsOrigin::Any,
            Some(origin) => HeaderValue::from_str(origin)
                .map(CorsOrigin::Exact)
                .map_err(|e| ConfigError::Invalid {
                    name: "CORS_ORIGIN",
                    value: origin.to_string(),
                    reason: e.to_string(),
                })?,
        };

        let listen_addr = lookup("LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr = listen_addr.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            name: "LISTEN_ADDR",
            value: listen_addr.clone(),
            reason: e.to_string(),
        })?;

        let request_timeout = match lookup("REQUEST_TIMEOUT") {
            None => DEFAULT_REQUEST_TIMEOUT,
            Some(value) => parse_timeout(&value).ok_or_else(|| ConfigError::Invalid {
                name: "REQUEST_TIMEOUT",
                value: value.clone(),
                reason: "expected a positive duration such as 10s".to_string(),
            })?,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    reason: "expected \"pretty\" or \"json\"".to_string(),
                });
            }
        };

        Ok(Self {
            table_name,
            cors_origin,
            listen_addr,
            request_timeout,
            log_format,
        })
    }
}

/// `humantime` shorthand (`10s`, `1m30s`, `250ms`) or whole seconds.
/// Zero is rejected.
fn parse_timeout(value: &str) -> Option<Duration> {
    humantime::parse_duration(value)
        .ok()
        .or_else(|| value.parse::<u64>().ok().map(Duration::from_secs))
        .filter(|d| !d.is_zero())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let config = load(&[("CACHE_TABLE_NAME", "program-rig-cache-dev")]).unwrap();
        assert_eq!(config.table_name, "program-rig-cache-dev");
        assert_eq!(config.cors_origin, CorsOrigin::Any);
        assert_eq!(config.listen_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn table_name_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::Missing("CACHE_TABLE_NAME"))));
        assert!(matches!(
            load(&[("CACHE_TABLE_NAME", "")]),
            Err(ConfigError::Missing("CACHE_TABLE_NAME"))
        ));
    }

    #[test]
    fn overrides() {
        let config = load(&[
            ("CACHE_TABLE_NAME", "t"),
            ("CORS_ORIGIN", "https://example.com"),
            ("LISTEN_ADDR", "127.0.0.1:3000"),
            ("REQUEST_TIMEOUT", "2m"),
            ("LOG_FORMAT", "json"),
        ])
        .unwrap();
        assert_eq!(
            config.cors_origin,
            CorsOrigin::Exact(HeaderValue::from_static("https://example.com"))
        );
        assert_eq!(config.listen_addr, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn timeout_forms() {
        assert_eq!(parse_timeout("10s"), Some(Duration::from_secs(10)));
        assert_eq!(parse_timeout("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_timeout("250ms"), Some(Duration::from_millis(250)));
        assert_eq!(parse_timeout("30"), Some(Duration::from_secs(30)));
    }

    #[test]
    fn timeout_must_be_positive() {
        assert_eq!(parse_timeout("0"), None);
        assert_eq!(parse_timeout("0s"), None);
        assert_eq!(parse_timeout("-5"), None);
        assert_eq!(parse_timeout("soon"), None);
        assert_eq!(parse_timeout(""), None);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            load(&[("CACHE_TABLE_NAME", "t"), ("LISTEN_ADDR", "nowhere")]),
            Err(ConfigError::Invalid { name: "LISTEN_ADDR", .. })
        ));
        assert!(matches!(
            load(&[("CACHE_TABLE_NAME", "t"), ("REQUEST_TIMEOUT", "0")]),
            Err(ConfigError::Invalid { name: "REQUEST_TIMEOUT", .. })
        ));
        assert!(matches!(
            load(&[("CACHE_TABLE_NAME", "t"), ("LOG_FORMAT", "xml")]),
            Err(ConfigError::Invalid { name: "LOG_FORMAT", .. })
        ));
        assert!(matches!(
            load(&[("CACHE_TABLE_NAME", "t"), ("CORS_ORIGIN", "bad\norigin")]),
            Err(ConfigError::Invalid { name: "CORS_ORIGIN", .. })
        ));
    }
}
