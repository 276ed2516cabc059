//! Configuration structs

mod client_config;

pub use client_config::{
    AppSettings, ClientConfig, ConfigError, Environment, ResolverConfig, ServerConfig,
    SessionConfig,
};
