use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:3000";
pub const DEFAULT_REFRESH_SECS: u64 = 30;
pub const DEFAULT_PAGE_SIZE: usize = 6;
pub const DEFAULT_SESSION_FILE: &str = ".job-board-session.json";

/// Distinguishes runtime behavior for different stages of the client.
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

/// Top-level configuration for the job board client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub discovery: DiscoveryConfig,
    pub session: SessionConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let api = ApiConfig::new(
            env::var("JOB_BOARD_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        )?;

        let refresh_secs = match env::var("JOB_BOARD_REFRESH_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidRefreshInterval)?,
            Err(_) => DEFAULT_REFRESH_SECS,
        };

        let page_size = match env::var("JOB_BOARD_PAGE_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidPageSize)?,
            Err(_) => DEFAULT_PAGE_SIZE,
        };

        let session_file = env::var("JOB_BOARD_SESSION_FILE")
            .unwrap_or_else(|_| DEFAULT_SESSION_FILE.to_string());
        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_format = env::var("APP_LOG_FORMAT")
            .map(|raw| LogFormat::from_str(&raw))
            .unwrap_or_default();

        Ok(Self {
            environment,
            api,
            discovery: DiscoveryConfig {
                refresh_interval: Duration::from_secs(refresh_secs),
                page_size,
            },
            session: SessionConfig {
                path: PathBuf::from(session_file),
            },
            telemetry: TelemetryConfig {
                log_level,
                format: log_format,
            },
        })
    }
}

/// Location of the REST backend.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
}

impl ApiConfig {
    /// Validates the URL and strips any trailing slash so paths can be appended verbatim.
    pub fn new(raw: impl Into<String>) -> Result<Self, ConfigError> {
        let raw = raw.into();
        let trimmed = raw.trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&trimmed).map_err(|err| ConfigError::InvalidApiUrl {
            value: raw.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidApiUrl {
                value: raw,
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }
        Ok(Self { base_url: trimmed })
    }
}

/// Polling and pagination knobs for the offer discovery engine.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    pub refresh_interval: Duration,
    pub page_size: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(DEFAULT_REFRESH_SECS),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Where the signed-in session is persisted between runs.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub path: PathBuf,
}

/// Line layout of the stderr log stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub format: LogFormat,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidApiUrl { value: String, reason: String },
    InvalidRefreshInterval,
    InvalidPageSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidApiUrl { value, reason } => {
                write!(f, "JOB_BOARD_API_URL '{}' is not a usable URL ({})", value, reason)
            }
            ConfigError::InvalidRefreshInterval => {
                write!(f, "JOB_BOARD_REFRESH_SECS must be a positive integer")
            }
            ConfigError::InvalidPageSize => {
                write!(f, "JOB_BOARD_PAGE_SIZE must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

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
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("APP_LOG_FORMAT");
        env::remove_var("JOB_BOARD_API_URL");
        env::remove_var("JOB_BOARD_REFRESH_SECS");
        env::remove_var("JOB_BOARD_PAGE_SIZE");
        env::remove_var("JOB_BOARD_SESSION_FILE");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.discovery.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.discovery.page_size, 6);
        assert_eq!(config.session.path, PathBuf::from(".job-board-session.json"));
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
    }

    #[test]
    fn json_log_format_is_opt_in() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_LOG_FORMAT", " JSON ");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.telemetry.format, LogFormat::Json);
        env::set_var("APP_LOG_FORMAT", "pretty");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.telemetry.format, LogFormat::Compact);
        reset_env();
    }

    #[test]
    fn api_url_trailing_slash_is_trimmed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("JOB_BOARD_API_URL", "https://api.example.edu/v1/");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.api.base_url, "https://api.example.edu/v1");
        reset_env();
    }

    #[test]
    fn rejects_zero_refresh_interval() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("JOB_BOARD_REFRESH_SECS", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidRefreshInterval)
        ));
        reset_env();
    }

    #[test]
    fn rejects_non_http_api_url() {
        match ApiConfig::new("ftp://files.example.edu") {
            Err(ConfigError::InvalidApiUrl { reason, .. }) => assert!(reason.contains("ftp")),
            other => panic!("expected invalid url, got {other:?}"),
        }
    }
}
