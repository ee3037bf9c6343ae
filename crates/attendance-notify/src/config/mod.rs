use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::notifications::DispatchSettings;

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
    pub mail: MailConfig,
    pub dispatch: DispatchSettings,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        // PORT is what most PaaS hosts inject; APP_PORT wins when both are present.
        let port = env::var("APP_PORT")
            .or_else(|_| env::var("PORT"))
            .unwrap_or_else(|_| "10000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            mail: MailConfig::from_env()?,
            dispatch: dispatch_from_env()?,
        })
    }
}

fn dispatch_from_env() -> Result<DispatchSettings, ConfigError> {
    let defaults = DispatchSettings::default();

    let batch_size = match env::var("DISPATCH_BATCH_SIZE") {
        Ok(raw) => raw
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|size| *size >= 1)
            .ok_or(ConfigError::InvalidBatchSize { value: raw })?,
        Err(_) => defaults.batch_size,
    };

    let inter_batch_delay = match env::var("DISPATCH_BATCH_DELAY_MS") {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| ConfigError::InvalidBatchDelay { value: raw })?,
        Err(_) => defaults.inter_batch_delay,
    };

    Ok(DispatchSettings {
        batch_size,
        inter_batch_delay,
    })
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
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Which Mail Sender implementation the service should construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailTransportKind {
    /// Log messages instead of delivering them.
    Console,
    Smtp,
}

/// Outbound mail settings injected into the mailer at construction.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub transport: MailTransportKind,
    /// Address placed in the `From` header of every notification.
    pub from_address: String,
    pub smtp: SmtpSettings,
}

impl MailConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let transport = match env::var("MAIL_TRANSPORT")
            .unwrap_or_else(|_| "console".to_string())
            .trim()
            .to_ascii_lowercase()
            .as_str()
        {
            "console" | "log" => MailTransportKind::Console,
            "smtp" => MailTransportKind::Smtp,
            other => {
                return Err(ConfigError::UnknownMailTransport {
                    value: other.to_string(),
                })
            }
        };

        let username = env::var("EMAIL_USER").ok().filter(|v| !v.trim().is_empty());
        let password = env::var("EMAIL_PASS").ok().filter(|v| !v.is_empty());

        let (username, password) = match (transport, username, password) {
            (MailTransportKind::Smtp, None, _) => {
                return Err(ConfigError::MissingVar { name: "EMAIL_USER" })
            }
            (MailTransportKind::Smtp, _, None) => {
                return Err(ConfigError::MissingVar { name: "EMAIL_PASS" })
            }
            (_, username, password) => (username.unwrap_or_default(), password.unwrap_or_default()),
        };

        let from_address = env::var("EMAIL_FROM")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| Some(username.clone()).filter(|v| !v.is_empty()))
            .unwrap_or_else(|| "attendance@localhost".to_string());

        let host = env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string());
        let port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidSmtpPort)?;
        let use_tls = env::var("SMTP_USE_TLS")
            .map(|raw| !matches!(raw.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);
        let timeout = env::var("SMTP_TIMEOUT_SECS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));

        Ok(Self {
            transport,
            from_address,
            smtp: SmtpSettings {
                host,
                port,
                username,
                password,
                use_tls,
                timeout,
            },
        })
    }
}

/// Relay endpoint and credentials for the SMTP mailer.
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Require STARTTLS on the relay connection.
    pub use_tls: bool,
    pub timeout: Duration,
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("use_tls", &self.use_tls)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSmtpPort,
    MissingVar { name: &'static str },
    UnknownMailTransport { value: String },
    InvalidBatchSize { value: String },
    InvalidBatchDelay { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSmtpPort => write!(f, "SMTP_PORT must be a valid u16"),
            ConfigError::MissingVar { name } => {
                write!(f, "{name} must be set when MAIL_TRANSPORT=smtp")
            }
            ConfigError::UnknownMailTransport { value } => {
                write!(f, "MAIL_TRANSPORT '{value}' is not one of: console, smtp")
            }
            ConfigError::InvalidBatchSize { value } => {
                write!(f, "DISPATCH_BATCH_SIZE '{value}' must be an integer >= 1")
            }
            ConfigError::InvalidBatchDelay { value } => {
                write!(f, "DISPATCH_BATCH_DELAY_MS '{value}' must be a non-negative integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
