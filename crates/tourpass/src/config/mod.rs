use std::env;
use std::net::{AddrParseError, IpAddr, SocketAddr};

use crate::workflows::refunds::domain::RefundMethod;

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
    pub refunds: RefundPolicyConfig,
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

        let request_number_prefix =
            env::var("REFUND_REQUEST_PREFIX").unwrap_or_else(|_| "REF".to_string());
        let default_method = match env::var("REFUND_DEFAULT_METHOD") {
            Ok(raw) => RefundMethod::from_label(raw.trim())
                .ok_or(ConfigError::InvalidRefundMethod { value: raw })?,
            Err(_) => RefundMethod::OriginalPayment,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            refunds: RefundPolicyConfig {
                request_number_prefix,
                default_method,
            },
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Dials for the refund engine itself.
#[derive(Debug, Clone)]
pub struct RefundPolicyConfig {
    /// Prefix for generated refund request numbers, e.g. `REF-000042`.
    pub request_number_prefix: String,
    /// Settlement channel applied when an approval does not name one.
    pub default_method: RefundMethod,
}

impl Default for RefundPolicyConfig {
    fn default() -> Self {
        Self {
            request_number_prefix: "REF".to_string(),
            default_method: RefundMethod::OriginalPayment,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost { source: AddrParseError },
    #[error("REFUND_DEFAULT_METHOD must be 'original_payment' or 'store_credit', found '{value}'")]
    InvalidRefundMethod { value: String },
}
