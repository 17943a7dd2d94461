use std::env;

use crate::constants::{DEFAULT_DATA_PATH, DEFAULT_HOST, DEFAULT_PORT};
use crate::error::ConfigError;

/// Runtime settings, read from the environment (and `.env` via dotenv).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory holding one `<collection>.json` file per entity type
    pub data_path: String,
    /// Exact CORS origin; any origin is allowed when unset
    pub frontend_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, so tests need not touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        if host.trim().is_empty() {
            return Err(ConfigError::Empty("HOST"));
        }

        let port_raw = lookup("PORT").unwrap_or_else(|| DEFAULT_PORT.to_string());
        let port = port_raw
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort(port_raw.clone()))?;

        let data_path = lookup("DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string());
        if data_path.trim().is_empty() {
            return Err(ConfigError::Empty("DATA_PATH"));
        }

        let frontend_origin = lookup("FRONTEND_ORIGIN")
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty() && origin != "*");

        Ok(Self {
            host,
            port,
            data_path,
            frontend_origin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5000");
        assert_eq!(config.data_path, "data");
        assert!(config.frontend_origin.is_none());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8081"),
            ("DATA_PATH", "/tmp/center"),
            ("FRONTEND_ORIGIN", "http://localhost:5173"),
        ]))
        .unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8081");
        assert_eq!(config.data_path, "/tmp/center");
        assert_eq!(
            config.frontend_origin.as_deref(),
            Some("http://localhost:5173")
        );
    }

    #[test]
    fn wildcard_origin_means_any() {
        let config = Config::from_lookup(lookup_from(&[("FRONTEND_ORIGIN", "*")])).unwrap();
        assert!(config.frontend_origin.is_none());
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort(_)));
    }
}
