//! Server configuration
//!
//! Built either in code through the builder methods or from `RELAY_*`
//! environment variables.

use std::collections::HashMap;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use crate::broadcast::DEFAULT_VIEWER_QUEUE_CAPACITY;
use crate::protocol::DEFAULT_MAX_FRAME_SIZE;

/// Default bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";

pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";
pub const ENV_MAX_FRAME_SIZE: &str = "RELAY_MAX_FRAME_SIZE";
pub const ENV_VIEWER_QUEUE_CAPACITY: &str = "RELAY_VIEWER_QUEUE_CAPACITY";
pub const ENV_IDLE_TIMEOUT_SECS: &str = "RELAY_IDLE_TIMEOUT_SECS";
pub const ENV_MAX_CONNECTIONS: &str = "RELAY_MAX_CONNECTIONS";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: '{value}' ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Maximum concurrent producer uploads (0 = unlimited)
    pub max_connections: usize,

    /// Largest declared frame length accepted by the decoder
    pub max_frame_size: usize,

    /// Per-viewer queue depth before a viewer counts as slow
    pub viewer_queue_capacity: usize,

    /// End a producer upload after this long without data
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_connections: 0,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            viewer_queue_capacity: DEFAULT_VIEWER_QUEUE_CAPACITY,
            idle_timeout: None,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a map of variables
    ///
    /// Unset variables keep their defaults.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(addr) = vars.get(ENV_BIND_ADDRESS) {
            config.bind_addr = parse_var(ENV_BIND_ADDRESS, addr)?;
        }
        if let Some(size) = vars.get(ENV_MAX_FRAME_SIZE) {
            config.max_frame_size = parse_var(ENV_MAX_FRAME_SIZE, size)?;
            if config.max_frame_size == 0 {
                return Err(invalid(ENV_MAX_FRAME_SIZE, size, "must be greater than zero"));
            }
        }
        if let Some(capacity) = vars.get(ENV_VIEWER_QUEUE_CAPACITY) {
            config.viewer_queue_capacity = parse_var(ENV_VIEWER_QUEUE_CAPACITY, capacity)?;
            if config.viewer_queue_capacity == 0 {
                return Err(invalid(
                    ENV_VIEWER_QUEUE_CAPACITY,
                    capacity,
                    "must be greater than zero",
                ));
            }
        }
        if let Some(secs) = vars.get(ENV_IDLE_TIMEOUT_SECS) {
            let secs: u64 = parse_var(ENV_IDLE_TIMEOUT_SECS, secs)?;
            config.idle_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(max) = vars.get(ENV_MAX_CONNECTIONS) {
            config.max_connections = parse_var(ENV_MAX_CONNECTIONS, max)?;
        }

        Ok(config)
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set maximum concurrent producer uploads
    pub fn max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the frame size limit
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size.max(1);
        self
    }

    /// Set the per-viewer queue depth
    pub fn viewer_queue_capacity(mut self, capacity: usize) -> Self {
        self.viewer_queue_capacity = capacity.max(1);
        self
    }

    /// Set idle timeout
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| invalid(name, value, &e.to_string()))
}

fn invalid(name: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDRESS.parse().unwrap());
        assert_eq!(config.max_connections, 0);
        assert_eq!(config.max_frame_size, 10 * 1024 * 1024);
        assert_eq!(config.viewer_queue_capacity, DEFAULT_VIEWER_QUEUE_CAPACITY);
        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_from_vars_empty_uses_defaults() {
        let config = ServerConfig::from_vars(&HashMap::new()).unwrap();

        assert_eq!(config.bind_addr.port(), 3000);
        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_from_vars_overrides() {
        let config = ServerConfig::from_vars(&vars(&[
            (ENV_BIND_ADDRESS, "127.0.0.1:8080"),
            (ENV_MAX_FRAME_SIZE, "1024"),
            (ENV_VIEWER_QUEUE_CAPACITY, "8"),
            (ENV_IDLE_TIMEOUT_SECS, "30"),
            (ENV_MAX_CONNECTIONS, "16"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.max_frame_size, 1024);
        assert_eq!(config.viewer_queue_capacity, 8);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_from_vars_zero_idle_timeout_disables() {
        let config = ServerConfig::from_vars(&vars(&[(ENV_IDLE_TIMEOUT_SECS, "0")])).unwrap();

        assert!(config.idle_timeout.is_none());
    }

    #[test]
    fn test_from_vars_rejects_garbage() {
        let err = ServerConfig::from_vars(&vars(&[(ENV_BIND_ADDRESS, "not-an-addr")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { ref name, .. } if name == ENV_BIND_ADDRESS
        ));

        let err = ServerConfig::from_vars(&vars(&[(ENV_MAX_FRAME_SIZE, "-5")])).unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_FRAME_SIZE));
    }

    #[test]
    fn test_from_vars_rejects_zero_sizes() {
        assert!(ServerConfig::from_vars(&vars(&[(ENV_MAX_FRAME_SIZE, "0")])).is_err());
        assert!(ServerConfig::from_vars(&vars(&[(ENV_VIEWER_QUEUE_CAPACITY, "0")])).is_err());
    }

    #[test]
    fn test_builder() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = ServerConfig::with_addr(addr)
            .max_connections(4)
            .max_frame_size(0)
            .viewer_queue_capacity(0)
            .idle_timeout(Duration::from_secs(120));

        assert_eq!(config.bind_addr, addr);
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.max_frame_size, 1);
        assert_eq!(config.viewer_queue_capacity, 1);
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(120)));
    }
}
