use std::env;

use dotenvy::dotenv;
use snafu::prelude::*;

use crate::errors::{ConfigSnafu, CustomResult, ValidationSnafu};
use crate::modules::visibility::DEFAULT_HEADER_OFFSET;

pub const DEFAULT_LOG_FILE: &str = "leaderboard.log";

/// # settings
/// everything read from the environment at start-up
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub extraction_url: Option<String>,
    pub extraction_api_key: Option<String>,
    pub admin_email: Option<String>,
    pub logging_level: String,
    pub log_file: String,
    pub header_offset_px: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: None,
            redis_url: None,
            extraction_url: None,
            extraction_api_key: None,
            admin_email: None,
            logging_level: "INFO".to_string(),
            log_file: DEFAULT_LOG_FILE.to_string(),
            header_offset_px: DEFAULT_HEADER_OFFSET,
        }
    }
}

impl Settings {
    /// load `.env` if present, then read the process environment
    pub fn from_env() -> CustomResult<Settings> {
        dotenv().ok();
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// # settings from a lookup
    /// blank values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> CustomResult<Settings> {
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Settings::default();

        let header_offset_px = match read("HEADER_OFFSET_PX") {
            Some(text) => match text.parse::<f64>() {
                Ok(offset) if offset >= 0.0 => offset,
                _ => {
                    return ValidationSnafu { field: "HEADER_OFFSET_PX", message: format!("`{}` is not a pixel offset", text) }.fail();
                }
            },
            None => defaults.header_offset_px,
        };

        Ok(Settings {
            database_url: read("DATABASE_URL"),
            redis_url: read("REDIS_URL"),
            extraction_url: read("EXTRACTION_URL"),
            extraction_api_key: read("EXTRACTION_API_KEY"),
            admin_email: read("ADMIN_EMAIL"),
            logging_level: read("LOGGING_LEVEL").unwrap_or(defaults.logging_level),
            log_file: read("LOG_FILE").unwrap_or(defaults.log_file),
            header_offset_px,
        })
    }

    /// the database url, for callers that cannot run without one
    pub fn require_database_url(&self) -> CustomResult<&str> {
        self.database_url.as_deref().context(ConfigSnafu { key: "DATABASE_URL" })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::Error;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.header_offset_px, 140.0);
        assert_eq!(settings.log_file, "leaderboard.log");
    }

    #[test]
    fn reads_every_key() {
        let settings = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/laps"),
            ("REDIS_URL", "redis://127.0.0.1/"),
            ("ADMIN_EMAIL", "admin@example.com"),
            ("LOGGING_LEVEL", "DEBUG"),
            ("HEADER_OFFSET_PX", "96"),
            ("EXTRACTION_URL", "  "),
        ]))
        .unwrap();

        assert_eq!(settings.require_database_url().unwrap(), "postgres://localhost/laps");
        assert_eq!(settings.redis_url.as_deref(), Some("redis://127.0.0.1/"));
        assert_eq!(settings.header_offset_px, 96.0);
        assert_eq!(settings.extraction_url, None);
    }

    #[test]
    fn missing_database_url_is_a_config_error() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert!(matches!(settings.require_database_url(), Err(Error::ConfigError { key: "DATABASE_URL" })));
    }

    #[test]
    fn bad_header_offset_is_rejected() {
        let result = Settings::from_lookup(lookup(&[("HEADER_OFFSET_PX", "tall")]));
        assert!(matches!(result, Err(Error::ValidationError { field: "HEADER_OFFSET_PX", .. })));
    }
}
