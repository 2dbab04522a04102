//! Service configuration.
//!
//! ## Environment variables
//!
//! - `ACCESS_TOKEN_SECRET`: HMAC secret for session tokens (required)
//! - `PORT`: Service port (default: 5000)
//! - `HOST`: Service host (default: 0.0.0.0)
//! - `APP_ENV`: `production` for cross-site secure cookies; anything else is development
//! - `CORS_ALLOWED_ORIGINS`: Comma separated origins allowed to send credentials
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! Database settings are read separately by `PostgresConfig`.

use std::fmt;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

/// Origins allowed by default (the deployed frontends and local dev servers).
pub const DEFAULT_CORS_ORIGINS: &[&str] = &[
    "http://localhost:5100",
    "http://localhost:5173",
    "http://localhost:5174",
    "http://localhost:5175",
    "https://taskmaster-6dafb.firebaseapp.com",
    "https://taskmaster-6dafb.web.app",
];

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
    /// A variable is set but cannot be parsed.
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// Offending value.
        value: String,
    },
}

/// Deployment mode, selecting cookie attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Local development: same-site, non-secure cookies.
    #[default]
    Development,
    /// Production: cross-site, secure cookies.
    Production,
}

impl DeploymentMode {
    /// Parse from the `APP_ENV` value. Only `production` selects production.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("production") => Self::Production,
            _ => Self::Development,
        }
    }

    /// True in production.
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Flattened JSON events (Cloud Logging compatible).
    #[default]
    Json,
    /// Human-readable output for local development.
    Pretty,
}

/// Process-wide service configuration. Read-only after startup.
#[derive(Clone)]
pub struct ServiceConfig {
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Cookie attribute mode.
    pub mode: DeploymentMode,
    /// Session token signing secret.
    pub token_secret: Vec<u8>,
    /// Origins allowed to make credentialed requests.
    pub cors_origins: Vec<String>,
    /// Log output format.
    pub log_format: LogFormat,
}

impl ServiceConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_secret = lookup("ACCESS_TOKEN_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("ACCESS_TOKEN_SECRET"))?
            .into_bytes();

        let port = match lookup("PORT").filter(|s| !s.trim().is_empty()) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let host = lookup("HOST")
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_string());

        let mode = DeploymentMode::from_env_value(lookup("APP_ENV").as_deref());

        let cors_origins = match lookup("CORS_ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        let log_format = match lookup("LOG_FORMAT").as_deref() {
            Some("pretty") => LogFormat::Pretty,
            _ => LogFormat::Json,
        };

        Ok(Self {
            host,
            port,
            mode,
            token_secret,
            cors_origins,
            log_format,
        })
    }

    /// The `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("mode", &self.mode)
            .field("token_secret", &"<redacted>")
            .field("cors_origins", &self.cors_origins)
            .field("log_format", &self.log_format)
            .finish()
    }
}
