//! Client configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file if present).

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Main client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub resolver: ResolverConfig,
    pub session: SessionConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidValue("APP_ENV", s.to_string())),
        }
    }
}

/// Broadcast server endpoint
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub url: String,
}

/// Room lookup endpoint
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Lookup URL prefix; the user-facing room id is appended verbatim
    pub room_init_url: String,
    pub timeout_secs: u64,
}

impl ResolverConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Per-session protocol settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub heartbeat_interval_secs: u64,
    /// Ceiling on command frames being dispatched at once
    pub dispatch_concurrency: usize,
    /// Outbound frames queued for the writer task
    pub outbound_buffer: usize,
    pub platform: String,
    pub client_version: String,
}

impl SessionConfig {
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_secs: default_heartbeat_interval_secs(),
            dispatch_concurrency: default_dispatch_concurrency(),
            outbound_buffer: default_outbound_buffer(),
            platform: default_platform(),
            client_version: default_client_version(),
        }
    }
}

// Default value functions
fn default_app_name() -> String {
    "danmu".to_string()
}

fn default_env() -> Environment {
    Environment::Development
}

fn default_server_url() -> String {
    "wss://broadcastlv.chat.bilibili.com/sub".to_string()
}

fn default_room_init_url() -> String {
    "https://api.live.bilibili.com/room/v1/Room/room_init?id=".to_string()
}

fn default_http_timeout_secs() -> u64 {
    10
}

fn default_heartbeat_interval_secs() -> u64 {
    30
}

fn default_dispatch_concurrency() -> usize {
    16
}

fn default_outbound_buffer() -> usize {
    32
}

fn default_platform() -> String {
    "web".to_string()
}

fn default_client_version() -> String {
    "1.4.0".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app: AppSettings {
                name: default_app_name(),
                env: default_env(),
            },
            server: ServerConfig {
                url: default_server_url(),
            },
            resolver: ResolverConfig {
                room_init_url: default_room_init_url(),
                timeout_secs: default_http_timeout_secs(),
            },
            session: SessionConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparsable or zero value,
    /// or `APP_ENV` names no known environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    ///
    /// Unset keys fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env: lookup("APP_ENV")
                    .map(|raw| raw.parse::<Environment>())
                    .transpose()?
                    .unwrap_or_default(),
            },
            server: ServerConfig {
                url: lookup("DANMU_SERVER_URL").unwrap_or_else(default_server_url),
            },
            resolver: ResolverConfig {
                room_init_url: lookup("DANMU_ROOM_INIT_URL").unwrap_or_else(default_room_init_url),
                timeout_secs: parse_positive(
                    &lookup,
                    "DANMU_HTTP_TIMEOUT_SECS",
                    default_http_timeout_secs,
                )?,
            },
            session: SessionConfig {
                heartbeat_interval_secs: parse_positive(
                    &lookup,
                    "DANMU_HEARTBEAT_INTERVAL_SECS",
                    default_heartbeat_interval_secs,
                )?,
                dispatch_concurrency: parse_positive(
                    &lookup,
                    "DANMU_DISPATCH_CONCURRENCY",
                    default_dispatch_concurrency,
                )?,
                outbound_buffer: parse_positive(
                    &lookup,
                    "DANMU_OUTBOUND_BUFFER",
                    default_outbound_buffer,
                )?,
                platform: lookup("DANMU_PLATFORM").unwrap_or_else(default_platform),
                client_version: lookup("DANMU_CLIENT_VERSION")
                    .unwrap_or_else(default_client_version),
            },
        })
    }

    /// Override the broadcast server URL (e.g. from the command line)
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server.url = url.into();
        self
    }
}

fn parse_positive<F, T>(lookup: &F, key: &'static str, default: fn() -> T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialEq + From<u8>,
{
    let Some(raw) = lookup(key) else {
        return Ok(default());
    };

    let value = raw
        .trim()
        .parse::<T>()
        .map_err(|_| ConfigError::InvalidValue(key, raw.clone()))?;

    if value == T::from(0) {
        return Err(ConfigError::InvalidValue(key, raw));
    }

    Ok(value)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
