use std::env;
use std::time::Duration;

use crate::error::{MaduraError, Result};

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Backend
    pub api_base: String,
    pub request_timeout: Duration,
    pub health_interval: Duration,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from the process environment.
    /// Every variable is optional; malformed numbers are reported, not defaulted.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base = lookup("MADURA_API_BASE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        let health_interval: u64 = parse_number(&lookup, "HEALTH_INTERVAL_SECS", 15)?;
        if health_interval == 0 {
            return Err(MaduraError::Config(
                "HEALTH_INTERVAL_SECS must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            api_base: normalize_base(&api_base),
            request_timeout: Duration::from_secs(parse_number(&lookup, "REQUEST_TIMEOUT_SECS", 5)?),
            health_interval: Duration::from_secs(health_interval),
            web_host: lookup("WEB_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            web_port: parse_number(&lookup, "WEB_PORT", 5500)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.web_host, self.web_port)
    }
}

/// Strip trailing slashes so paths can be appended with a leading `/`.
pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

fn parse_number<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| MaduraError::Config(format!("{key} must be a number, got {raw:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_point_at_loopback_backend() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.api_base, "http://127.0.0.1:8000");
        assert_eq!(config.web_port, 5500);
        assert_eq!(config.health_interval, Duration::from_secs(15));
        assert_eq!(config.bind_addr(), "127.0.0.1:5500");
    }

    #[test]
    fn api_base_loses_trailing_slash() {
        let config = config_with(&[("MADURA_API_BASE", "http://backend:9000/")]).unwrap();
        assert_eq!(config.api_base, "http://backend:9000");
    }

    #[test]
    fn blank_api_base_falls_back_to_default() {
        let config = config_with(&[("MADURA_API_BASE", "   ")]).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = config_with(&[("WEB_PORT", "eighty")]).unwrap_err();
        assert!(matches!(err, MaduraError::Config(_)));
        assert!(err.to_string().contains("WEB_PORT"));
    }

    #[test]
    fn zero_health_interval_is_rejected() {
        assert!(matches!(
            config_with(&[("HEALTH_INTERVAL_SECS", "0")]),
            Err(MaduraError::Config(_))
        ));
    }
}
