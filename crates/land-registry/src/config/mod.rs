use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::workflows::wizard::{FlowSettings, SubmissionGating, UploadConstraints};

/// Distinguishes runtime behavior for different stages of the portal.
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
    pub wizard: WizardConfig,
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
            wizard: WizardConfig::from_env()?,
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

/// Timings and gating for the simulated registration, transfer and review calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WizardConfig {
    pub upload_tick: Duration,
    pub registration_delay: Duration,
    pub transfer_delay: Duration,
    pub review_delay: Duration,
    pub gating: SubmissionGating,
    pub max_upload_bytes: u64,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            upload_tick: Duration::from_millis(200),
            registration_delay: Duration::from_millis(2000),
            transfer_delay: Duration::from_millis(3000),
            review_delay: Duration::from_millis(1000),
            gating: SubmissionGating::Lenient,
            max_upload_bytes: UploadConstraints::DEFAULT_MAX_SIZE_BYTES,
        }
    }
}

impl WizardConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let gating = match env::var("APP_SUBMISSION_GATING") {
            Ok(raw) => raw
                .parse::<SubmissionGating>()
                .map_err(|_| ConfigError::InvalidGating { value: raw })?,
            Err(_) => defaults.gating,
        };

        Ok(Self {
            upload_tick: millis_var("APP_UPLOAD_TICK_MS", defaults.upload_tick)?,
            registration_delay: millis_var(
                "APP_REGISTRATION_DELAY_MS",
                defaults.registration_delay,
            )?,
            transfer_delay: millis_var("APP_TRANSFER_DELAY_MS", defaults.transfer_delay)?,
            review_delay: millis_var("APP_REVIEW_DELAY_MS", defaults.review_delay)?,
            gating,
            max_upload_bytes: number_var("APP_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }

    /// Flow settings for a single wizard document slot.
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            gating: self.gating,
            constraints: UploadConstraints::single_document(self.max_upload_bytes),
        }
    }
}

fn number_var(variable: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|_| ConfigError::InvalidNumber { variable }),
        Err(_) => Ok(default),
    }
}

fn millis_var(variable: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let fallback = u64::try_from(default.as_millis()).unwrap_or(u64::MAX);
    number_var(variable, fallback).map(Duration::from_millis)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str },
    InvalidGating { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable } => {
                write!(f, "{variable} must be a non-negative integer")
            }
            ConfigError::InvalidGating { value } => {
                write!(
                    f,
                    "APP_SUBMISSION_GATING must be 'strict' or 'lenient', got '{value}'"
                )
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidGating { .. } => None,
        }
    }
}
