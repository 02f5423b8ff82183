//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use blackjack::{
    discovery::{BROADCAST_INTERVAL, DISCOVERY_PORT},
    messages::NAME_LEN,
    server::{DEFAULT_SERVICE_NAME, DiscoveryConfig, ServerConfig},
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;

/// Values given on the command line. Anything set here wins over the
/// environment.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind_ip: Option<IpAddr>,
    pub port: Option<u16>,
    pub service_name: Option<String>,
    pub discovery_port: Option<u16>,
    pub broadcast_ip: Option<IpAddr>,
    pub idle_timeout_secs: Option<u64>,
    pub no_discovery: bool,
}

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Settings {
    /// Session listener address; port 0 picks one at startup
    pub bind: SocketAddr,
    /// Name advertised in offers
    pub service_name: String,
    /// UDP port offers are sent to
    pub discovery_port: u16,
    /// Address offers are sent to
    pub broadcast_ip: IpAddr,
    /// How long a session may sit idle
    pub idle_timeout: Duration,
    pub discovery_enabled: bool,
}

impl Settings {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a required value is invalid
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let bind_ip = overrides
            .bind_ip
            .unwrap_or_else(|| parse_env_or("BJ_BIND_IP", IpAddr::V4(Ipv4Addr::UNSPECIFIED)));
        let port = overrides.port.unwrap_or_else(|| parse_env_or("BJ_PORT", 0));

        let service_name = overrides.service_name.unwrap_or_else(|| {
            std::env::var("BJ_SERVICE_NAME").unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string())
        });

        let settings = Self {
            bind: SocketAddr::new(bind_ip, port),
            service_name,
            discovery_port: overrides
                .discovery_port
                .unwrap_or_else(|| parse_env_or("BJ_DISCOVERY_PORT", DISCOVERY_PORT)),
            broadcast_ip: overrides
                .broadcast_ip
                .unwrap_or_else(|| parse_env_or("BJ_BROADCAST_IP", IpAddr::V4(Ipv4Addr::BROADCAST))),
            idle_timeout: Duration::from_secs(
                overrides
                    .idle_timeout_secs
                    .unwrap_or_else(|| parse_env_or("BJ_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)),
            ),
            discovery_enabled: !overrides.no_discovery,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validate configuration after loading
    ///
    /// # Errors
    ///
    /// Returns the first value that's out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::Invalid {
                var: "BJ_SERVICE_NAME".to_string(),
                reason: "Must not be empty".to_string(),
            });
        }

        if self.service_name.len() > NAME_LEN {
            return Err(ConfigError::Invalid {
                var: "BJ_SERVICE_NAME".to_string(),
                reason: format!("Must be at most {NAME_LEN} bytes"),
            });
        }

        if self.idle_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "BJ_IDLE_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.discovery_port == 0 {
            return Err(ConfigError::Invalid {
                var: "BJ_DISCOVERY_PORT".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    #[must_use]
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind: self.bind,
            service_name: self.service_name.clone(),
            idle_timeout: self.idle_timeout,
            discovery: self.discovery_enabled.then(|| DiscoveryConfig {
                target: SocketAddr::new(self.broadcast_ip, self.discovery_port),
                interval: BROADCAST_INTERVAL,
            }),
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
