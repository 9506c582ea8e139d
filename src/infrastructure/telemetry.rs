//! Tracing subscriber setup

use crate::config::LoggingSettings;
use crate::{Error, Result};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    pub fn parse(format: &str) -> Result<Self> {
        match format.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::invalid_setting(
                "logging.format",
                format!("unknown format '{other}', expected 'pretty' or 'json'"),
            )),
        }
    }
}

/// `RUST_LOG` when set, otherwise the configured level
pub fn env_filter(settings: &LoggingSettings) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.level)
            .map_err(|e| Error::invalid_setting("logging.level", e.to_string())),
    }
}

/// Install the global subscriber; fails if one is already installed
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let filter = env_filter(settings)?;

    let installed = match LogFormat::parse(&settings.format)? {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).try_init(),
    };

    installed.map_err(|e| Error::invalid_setting("logging", e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!(LogFormat::parse("json").unwrap(), LogFormat::Json);
        assert_eq!(LogFormat::parse(" Pretty ").unwrap(), LogFormat::Pretty);
        assert!(LogFormat::parse("xml").is_err());
    }

    #[test]
    fn test_configured_level_builds_a_filter() {
        let settings = LoggingSettings {
            level: "danfe_proxy=debug,tower_http=info".to_string(),
            format: "json".to_string(),
        };
        assert!(env_filter(&settings).is_ok());
    }
}
