//! Tracing and logging setup
//!
//! Logs always go to stderr; stdout carries the chat stream only, so the
//! two can be redirected separately.

use crate::config::Environment;
use tracing::Level;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

/// Noisy dependencies held at `warn` unless `RUST_LOG` says otherwise
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "rustls", "tungstenite"];

/// Log line layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single line, fields inline
    Compact,
    /// Default `fmt` layout with thread names
    Full,
    /// One JSON object per line
    Json,
}

/// Tracing configuration options
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Level for the client's own crates when `RUST_LOG` is unset
    pub level: Level,
    pub format: LogFormat,
    /// Include file and line numbers
    pub source_location: bool,
    /// Include the event target (module path)
    pub target: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Compact,
            source_location: false,
            target: false,
        }
    }
}

impl TracingConfig {
    /// Verbose human-readable logging
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: Level::DEBUG,
            format: LogFormat::Full,
            source_location: true,
            target: true,
        }
    }

    /// Machine-readable logging for collectors
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Json,
            source_location: false,
            target: true,
        }
    }

    /// Pick the preset for `APP_ENV`
    ///
    /// Development stays compact because the terminal is shared with the
    /// chat stream; staging gets the verbose preset.
    #[must_use]
    pub fn for_environment(env: Environment) -> Self {
        match env {
            Environment::Development => Self::default(),
            Environment::Staging => Self::development(),
            Environment::Production => Self::production(),
        }
    }

    /// Override the level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Filter directives used when `RUST_LOG` is unset
    pub fn default_directives(&self) -> String {
        let mut directives = self.level.to_string().to_lowercase();
        for target in QUIET_TARGETS {
            directives.push_str(&format!(",{target}=warn"));
        }
        directives
    }

    fn fmt_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_file(self.source_location)
            .with_line_number(self.source_location)
            .with_target(self.target);

        match self.format {
            LogFormat::Compact => layer.compact().boxed(),
            LogFormat::Full => layer.with_thread_names(true).boxed(),
            LogFormat::Json => layer.json().boxed(),
        }
    }
}

/// Initialize tracing with the default preset
pub fn try_init_tracing() -> Result<(), TracingError> {
    try_init_tracing_with_config(TracingConfig::default())
}

/// Initialize tracing with custom configuration
///
/// `RUST_LOG` takes precedence over the configured level. Returns an error
/// instead of panicking when a subscriber is already installed.
pub fn try_init_tracing_with_config(config: TracingConfig) -> Result<(), TracingError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directives()));

    tracing_subscriber::registry()
        .with(config.fmt_layer())
        .with(env_filter)
        .try_init()
        .map_err(|_| TracingError::AlreadyInitialized)
}

/// Tracing initialization errors
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Tracing subscriber already initialized")]
    AlreadyInitialized,
}
