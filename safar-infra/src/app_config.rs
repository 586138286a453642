use safar_booking::BookingSettings;
use serde::Deserialize;
use std::env;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub booking: BookingSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    #[serde(default)]
    pub paths: EndpointPaths,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct EndpointPaths {
    pub search: String,
    pub validate: String,
    pub book: String,
    pub branded_fares: String,
}

impl Default for EndpointPaths {
    fn default() -> Self {
        Self {
            search: "/flights/search".into(),
            validate: "/flights/validate".into(),
            book: "/flights/book".into(),
            branded_fares: "/flights/branded-fares".into(),
        }
    }
}

/// Per-operation timeouts, in seconds. The upstream is slow, so these are
/// generous. A timeout is final for that call.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    pub search_seconds: u64,
    pub validate_seconds: u64,
    pub book_seconds: u64,
    pub branded_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            search_seconds: 120,
            validate_seconds: 60,
            book_seconds: 120,
            branded_seconds: 45,
        }
    }
}

impl TimeoutConfig {
    pub fn search(&self) -> Duration {
        Duration::from_secs(self.search_seconds)
    }

    pub fn validate(&self) -> Duration {
        Duration::from_secs(self.validate_seconds)
    }

    pub fn book(&self) -> Duration {
        Duration::from_secs(self.book_seconds)
    }

    pub fn branded(&self) -> Duration {
        Duration::from_secs(self.branded_seconds)
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    /// Skips the token endpoint entirely when set.
    pub static_token: Option<String>,
    pub token_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Per-environment overrides, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Untracked developer overrides
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SAFAR_PROVIDER__BASE_URL=https://...`
            .add_source(config::Environment::with_prefix("SAFAR").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
