use thiserror::Error;

/// Application-level error types, raised while wiring the service together
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Email error: {0}")]
    Email(#[from] crate::infrastructure::email::MailError),

    #[error("Proxy error: {0}")]
    Proxy(#[from] crate::proxy::ProxyError),

    #[error("Invalid setting {field}: {reason}")]
    InvalidSetting { field: String, reason: String },
}

impl Error {
    pub fn invalid_setting(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidSetting {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_setting_message_names_the_field() {
        let error = Error::invalid_setting("application.allowed_origin", "not a header value");
        let message = error.to_string();
        assert!(message.contains("application.allowed_origin"));
        assert!(message.contains("not a header value"));
    }
}
