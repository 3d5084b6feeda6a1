use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
/// Settings of the backend stand-in, read from environment variables
pub struct BackendSettings {
    pub host: String,
    pub port: u16,
    /// Base url of the web application, used in links sent by email
    pub app_url: String,
    /// Emails are kept in an in-memory outbox when not set
    pub resend_api_key: Option<String>,
    pub email_from: String,
}

impl BackendSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8081)?
            .set_default("app_url", "http://localhost:8080")?
            .set_default("email_from", "Book Inventory <books@gozman.dev>")?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod backend_settings_tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let settings = BackendSettings::from_environment(
            Environment::default().source(Some(HashMap::from([
                ("PORT".to_string(), "9000".to_string()),
                ("RESEND_API_KEY".to_string(), "re_123".to_string()),
            ]))),
        )
        .expect("Failed to load settings");

        assert_eq!(settings.port, 9000);
        assert_eq!(settings.host, "0.0.0.0");
        assert_eq!(settings.app_url, "http://localhost:8080");
        assert_eq!(settings.resend_api_key.as_deref(), Some("re_123"));
    }
}
