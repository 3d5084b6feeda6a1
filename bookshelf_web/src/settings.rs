use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Eq, PartialEq)]
/// Settings of the web front end, read from environment variables
pub struct WebSettings {
    pub host: String,
    pub port: u16,
    pub backend_url: String,
    pub google_books_url: String,
    pub google_books_api_key: Option<String>,
    pub search_stale_secs: u64,
    pub my_books_stale_secs: u64,
}

impl WebSettings {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080)?
            .set_default("backend_url", "http://localhost:8081")?
            .set_default("google_books_url", "https://www.googleapis.com")?
            .set_default("search_stale_secs", 12 * 60 * 60)?
            .set_default("my_books_stale_secs", 60)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn search_stale_time(&self) -> Duration {
        Duration::from_secs(self.search_stale_secs)
    }

    pub fn my_books_stale_time(&self) -> Duration {
        Duration::from_secs(self.my_books_stale_secs)
    }
}

#[cfg(test)]
mod web_settings_tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults() {
        let settings = WebSettings::from_environment(
            Environment::default().source(Some(HashMap::new())),
        )
        .expect("Failed to load settings");

        assert_eq!(settings.port, 8080);
        assert_eq!(settings.backend_url, "http://localhost:8081");
        assert_eq!(settings.google_books_url, "https://www.googleapis.com");
        assert_eq!(settings.google_books_api_key, None);
        assert_eq!(settings.search_stale_time(), Duration::from_secs(43200));
        assert_eq!(settings.my_books_stale_time(), Duration::from_secs(60));
    }

    #[test]
    fn overrides() {
        let settings = WebSettings::from_environment(Environment::default().source(Some(
            HashMap::from([
                ("BACKEND_URL".to_string(), "http://backend:9000".to_string()),
                ("GOOGLE_BOOKS_API_KEY".to_string(), "AIza".to_string()),
                ("MY_BOOKS_STALE_SECS".to_string(), "0".to_string()),
            ]),
        )))
        .expect("Failed to load settings");

        assert_eq!(settings.backend_url, "http://backend:9000");
        assert_eq!(settings.google_books_api_key.as_deref(), Some("AIza"));
        assert_eq!(settings.my_books_stale_time(), Duration::ZERO);
    }
}
