use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::recommendations::AggregatorConfig;
use crate::roadmap::DEFAULT_SESSION_KEY;

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
    pub session: SessionConfig,
    pub recommendations: RecommendationConfig,
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

        let session = SessionConfig {
            directory: env::var("ROADMAP_SESSION_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
            key: env::var("ROADMAP_SESSION_KEY")
                .unwrap_or_else(|_| SessionConfig::DEFAULT_KEY.to_string()),
        };

        let lookup_timeout = millis_var("RECOMMENDATION_LOOKUP_TIMEOUT_MS")?
            .unwrap_or(RecommendationConfig::DEFAULT_LOOKUP_TIMEOUT);
        let batch_deadline = millis_var("RECOMMENDATION_BATCH_DEADLINE_MS")?;
        let catalog_path = env::var("RECOMMENDATION_CATALOG")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            session,
            recommendations: RecommendationConfig {
                lookup_timeout,
                batch_deadline,
                catalog_path,
            },
        })
    }
}

fn millis_var(variable: &'static str) -> Result<Option<Duration>, ConfigError> {
    match env::var(variable) {
        Ok(raw) if raw.trim().is_empty() => Ok(None),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(|millis| Some(Duration::from_millis(millis)))
            .map_err(|_| ConfigError::InvalidDuration { variable }),
        Err(_) => Ok(None),
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where the in-progress roadmap session is persisted.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory for the file-backed store; `None` keeps the session in memory.
    pub directory: Option<PathBuf>,
    pub key: String,
}

impl SessionConfig {
    pub const DEFAULT_KEY: &'static str = DEFAULT_SESSION_KEY;
}

/// Timeouts and catalog location for recommendation batches.
#[derive(Debug, Clone)]
pub struct RecommendationConfig {
    pub lookup_timeout: Duration,
    pub batch_deadline: Option<Duration>,
    pub catalog_path: Option<PathBuf>,
}

impl RecommendationConfig {
    pub const DEFAULT_LOOKUP_TIMEOUT: Duration = AggregatorConfig::DEFAULT_LOOKUP_TIMEOUT;

    pub fn aggregator(&self) -> AggregatorConfig {
        AggregatorConfig {
            lookup_timeout: self.lookup_timeout,
            batch_deadline: self.batch_deadline,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDuration { variable: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDuration { variable } => {
                write!(f, "{variable} must be a whole number of milliseconds")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDuration { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
