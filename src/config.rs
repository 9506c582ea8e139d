use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Prefix for structured environment overrides, e.g. `DANFE_PROXY__PROVIDER__BASE_URL`
pub const ENV_PREFIX: &str = "DANFE_PROXY";

/// Hosting platforms inject these without any prefix
pub const PORT_ENV: &str = "PORT";
pub const ALLOWED_ORIGIN_ENV: &str = "ALLOWED_ORIGIN";

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub provider: ProviderSettings,
    pub challenge: ChallengeSettings,
    pub email: EmailSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
    pub environment: String,
    /// Single browser origin allowed by CORS; `*` allows any
    pub allowed_origin: String,
    pub max_body_bytes: usize,
}

/// Wire shape used for access-key lookups.
///
/// The provider has accepted both over time, so it is configured rather than assumed.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LookupStyle {
    PostMultipart,
    GetQuery,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    pub command_path: String,
    pub generate_command: String,
    pub lookup_command: String,
    pub verify_command: String,
    pub download_command: String,
    pub lookup_style: LookupStyle,
    /// Public URL of this service's download route, used to build artifact links
    pub relay_base_url: String,
    pub request_timeout_secs: u64,
}

impl ProviderSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChallengeSettings {
    pub verify_url: String,
    /// Without a secret, client tokens are passed through unverified
    pub secret: Option<String>,
    /// Page a `ChallengeSolver` is pointed at when the client sent no token
    pub solver_page_url: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmailTransportKind {
    Smtp,
    File,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub transport: EmailTransportKind,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub file_path: String,
    pub from_address: String,
    pub to_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub format: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let config = Self::with_defaults(&environment)?
            // Add configuration file if it exists
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{environment}")).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables with prefix
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .set_override_option("application.port", env::var(PORT_ENV).ok())?
            .set_override_option(
                "application.allowed_origin",
                env::var(ALLOWED_ORIGIN_ENV).ok(),
            )?
            .build()?;

        config.try_deserialize()
    }

    /// Built-in defaults only, ignoring files and the environment
    pub fn from_defaults() -> Result<Self, ConfigError> {
        Self::with_defaults("development")?.build()?.try_deserialize()
    }

    fn with_defaults(environment: &str) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("application.host", "0.0.0.0")?
            .set_default("application.port", 3001)?
            .set_default("application.environment", environment)?
            .set_default("application.allowed_origin", "http://localhost:3000")?
            .set_default("application.max_body_bytes", 10 * 1024 * 1024)?
            .set_default("provider.base_url", "https://www.fsist.com.br")?
            .set_default("provider.command_path", "/comandos.aspx")?
            .set_default("provider.generate_command", "gerarpdf")?
            .set_default("provider.lookup_command", "consultarchave")?
            .set_default("provider.verify_command", "verificarchave")?
            .set_default("provider.download_command", "gerarpdfdownload")?
            .set_default("provider.lookup_style", "post_multipart")?
            .set_default(
                "provider.relay_base_url",
                "http://localhost:3001/download-artifact",
            )?
            .set_default("provider.request_timeout_secs", 30)?
            .set_default(
                "challenge.verify_url",
                "https://www.google.com/recaptcha/api/siteverify",
            )?
            .set_default(
                "challenge.solver_page_url",
                "https://www.fsist.com.br/consulta",
            )?
            .set_default("email.transport", "file")?
            .set_default("email.smtp_host", "localhost")?
            .set_default("email.smtp_port", 587)?
            .set_default("email.smtp_tls", true)?
            .set_default("email.file_path", "emails")?
            .set_default("email.from_address", "Danfe Proxy <no-reply@danfe-proxy.local>")?
            .set_default("email.to_address", "contato@danfe-proxy.local")?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_can_be_loaded() {
        let settings = Settings::new();
        assert!(settings.is_ok());
    }

    #[test]
    fn test_default_port_and_origin() {
        let settings = Settings::from_defaults().unwrap();
        assert_eq!(settings.application.port, 3001);
        assert_eq!(settings.application.allowed_origin, "http://localhost:3000");
    }

    #[test]
    fn test_default_provider_settings() {
        let settings = Settings::from_defaults().unwrap();
        assert_eq!(settings.provider.lookup_style, LookupStyle::PostMultipart);
        assert_eq!(settings.provider.request_timeout(), Duration::from_secs(30));
        assert!(settings.provider.command_path.starts_with('/'));
        assert!(settings.challenge.secret.is_none());
    }

    #[test]
    fn test_default_email_settings_use_file_transport() {
        let settings = Settings::from_defaults().unwrap();
        assert_eq!(settings.email.transport, EmailTransportKind::File);
        assert!(settings.email.smtp_username.is_none());
    }
}
