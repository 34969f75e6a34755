use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub fetchers: FetcherConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            fetchers: FetcherConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials and tuning for the live external fetchers.
///
/// A missing API key leaves the matching capability unconfigured, which the
/// engine treats as "no fetcher" rather than as a failure.
#[derive(Clone)]
pub struct FetcherConfig {
    pub brightdata_api_key: Option<String>,
    pub serp_zone: String,
    pub linkedin_dataset: String,
    pub openrouter_api_key: Option<String>,
    pub openrouter_model: String,
    pub request_timeout: Duration,
}

pub const DEFAULT_SERP_ZONE: &str = "serp_api1";
pub const DEFAULT_LINKEDIN_DATASET: &str = "gd_l1viktl72bvl7bjuj0";
pub const DEFAULT_OPENROUTER_MODEL: &str = "google/gemini-2.0-flash-exp:free";
const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;

impl FetcherConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = match env::var("FETCH_TIMEOUT_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout { value: raw })?,
            Err(_) => DEFAULT_FETCH_TIMEOUT_SECS,
        };

        Ok(Self {
            brightdata_api_key: non_empty_var("BRIGHTDATA_API_KEY"),
            serp_zone: env::var("BRIGHTDATA_SERP_ZONE")
                .unwrap_or_else(|_| DEFAULT_SERP_ZONE.to_string()),
            linkedin_dataset: env::var("BRIGHTDATA_LINKEDIN_DATASET")
                .unwrap_or_else(|_| DEFAULT_LINKEDIN_DATASET.to_string()),
            openrouter_api_key: non_empty_var("OPENROUTER_API_KEY"),
            openrouter_model: env::var("OPENROUTER_MODEL")
                .unwrap_or_else(|_| DEFAULT_OPENROUTER_MODEL.to_string()),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    /// Configuration with every live integration disabled.
    pub fn offline() -> Self {
        Self {
            brightdata_api_key: None,
            serp_zone: DEFAULT_SERP_ZONE.to_string(),
            linkedin_dataset: DEFAULT_LINKEDIN_DATASET.to_string(),
            openrouter_api_key: None,
            openrouter_model: DEFAULT_OPENROUTER_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for FetcherConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetcherConfig")
            .field("brightdata_api_key", &self.brightdata_api_key.is_some())
            .field("serp_zone", &self.serp_zone)
            .field("linkedin_dataset", &self.linkedin_dataset)
            .field("openrouter_api_key", &self.openrouter_api_key.is_some())
            .field("openrouter_model", &self.openrouter_model)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: std::net::AddrParseError },
    #[error("FETCH_TIMEOUT_SECS must be a whole number of seconds, got '{value}'")]
    InvalidTimeout { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "BRIGHTDATA_API_KEY",
            "BRIGHTDATA_SERP_ZONE",
            "BRIGHTDATA_LINKEDIN_DATASET",
            "OPENROUTER_API_KEY",
            "OPENROUTER_MODEL",
            "FETCH_TIMEOUT_SECS",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.fetchers.serp_zone, DEFAULT_SERP_ZONE);
        assert_eq!(config.fetchers.request_timeout, Duration::from_secs(20));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        env::remove_var("APP_HOST");
    }

    #[test]
    fn blank_api_keys_are_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("BRIGHTDATA_API_KEY", "   ");
        env::set_var("OPENROUTER_API_KEY", "sk-or-test");
        let config = FetcherConfig::from_env().expect("fetcher config loads");
        assert!(config.brightdata_api_key.is_none());
        assert_eq!(config.openrouter_api_key.as_deref(), Some("sk-or-test"));
        assert!(!format!("{config:?}").contains("sk-or-test"));
        reset_env();
    }

    #[test]
    fn rejects_non_numeric_timeout() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("FETCH_TIMEOUT_SECS", "soon");
        let err = FetcherConfig::from_env().expect_err("timeout must be numeric");
        assert!(matches!(err, ConfigError::InvalidTimeout { .. }));
        reset_env();
    }
}
