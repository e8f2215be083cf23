use chrono::Duration;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ADMIN_PASSWORD: &str = "1234";
const DEFAULT_SESSION_TTL_SECS: i64 = 8 * 60 * 60;
const MAX_SESSION_TTL_SECS: i64 = 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid {key}=`{value}`: {reason}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

/// Settings for the service, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub data_path: PathBuf,
    pub static_dir: PathBuf,
    pub model_path: PathBuf,
    pub admin_password: String,
    /// True when `ADMIN_PASSWORD` was not set and the built-in secret is in use.
    pub default_admin_password: bool,
    pub session_ttl: Duration,
    pub log_format: LogFormat,
}

impl ServiceConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| ConfigError {
                key: "PORT",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => 3000,
        };

        let session_ttl = match lookup("SESSION_TTL_SECS") {
            Some(raw) => parse_ttl(&raw)?,
            None => Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        };

        let admin_password = lookup("ADMIN_PASSWORD").filter(|p| !p.is_empty());

        let log_format = match get("LOG_FORMAT", "json").as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Ok(Self {
            host: get("HOST", "0.0.0.0"),
            port,
            data_path: get("DATA_PATH", "insurance.csv").into(),
            static_dir: get("STATIC_DIR", "static").into(),
            model_path: get("MODEL_PATH", "models/fraud_model.json").into(),
            default_admin_password: admin_password.is_none(),
            admin_password: admin_password.unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            session_ttl,
            log_format,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_ttl(raw: &str) -> Result<Duration, ConfigError> {
    let invalid = |reason: &str| ConfigError {
        key: "SESSION_TTL_SECS",
        value: raw.to_string(),
        reason: reason.to_string(),
    };
    let secs: i64 = raw
        .trim()
        .parse()
        .map_err(|_| invalid("not an integer"))?;
    if !(1..=MAX_SESSION_TTL_SECS).contains(&secs) {
        return Err(invalid("must be between 1 second and one year"));
    }
    Ok(Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<ServiceConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServiceConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:3000");
        assert_eq!(config.data_path, PathBuf::from("insurance.csv"));
        assert_eq!(config.static_dir, PathBuf::from("static"));
        assert_eq!(config.model_path, PathBuf::from("models/fraud_model.json"));
        assert_eq!(config.admin_password, "1234");
        assert!(config.default_admin_password);
        assert_eq!(config.session_ttl, Duration::hours(8));
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = config(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATA_PATH", "/var/lib/claims.csv"),
            ("ADMIN_PASSWORD", "s3cret"),
            ("SESSION_TTL_SECS", "60"),
            ("LOG_FORMAT", "pretty"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.data_path, PathBuf::from("/var/lib/claims.csv"));
        assert_eq!(config.admin_password, "s3cret");
        assert!(!config.default_admin_password);
        assert_eq!(config.session_ttl, Duration::seconds(60));
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn empty_admin_password_falls_back_to_default() {
        let config = config(&[("ADMIN_PASSWORD", "")]).unwrap();
        assert_eq!(config.admin_password, DEFAULT_ADMIN_PASSWORD);
        assert!(config.default_admin_password);
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        let err = config(&[("PORT", "http")]).unwrap_err();
        assert_eq!(err.key, "PORT");

        let err = config(&[("SESSION_TTL_SECS", "0")]).unwrap_err();
        assert_eq!(err.key, "SESSION_TTL_SECS");

        assert!(config(&[("SESSION_TTL_SECS", "soon")]).is_err());
        assert!(config(&[("PORT", "70000")]).is_err());
    }
}
