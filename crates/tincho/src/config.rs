//! Server configuration loaded from environment variables.

use std::time::Duration;

use tincho_room::RegistryConfig;

const DEFAULT_BIND: &str = "0.0.0.0:8080";

/// Everything the server needs to start.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    pub registry: RegistryConfig,
}

/// A variable was set but could not be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {var}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND.to_string(),
            registry: RegistryConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from the process environment.
    ///
    /// | variable              | meaning                         | default        |
    /// |-----------------------|---------------------------------|----------------|
    /// | `TINCHO_BIND`         | listen address                  | `0.0.0.0:8080` |
    /// | `TINCHO_MAX_ROOMS`    | rooms allowed at once           | `100`          |
    /// | `TINCHO_ROOM_TIMEOUT` | room lifetime, in minutes       | `60`           |
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a variable is set to something
    /// that does not parse or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(bind) = lookup("TINCHO_BIND") {
            if bind.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    var: "TINCHO_BIND",
                    value: bind,
                    reason: "must not be empty".into(),
                });
            }
            config.bind_addr = bind;
        }

        if let Some(max_rooms) = parse_var::<usize>(&lookup, "TINCHO_MAX_ROOMS")? {
            if max_rooms == 0 {
                return Err(ConfigError::Invalid {
                    var: "TINCHO_MAX_ROOMS",
                    value: max_rooms.to_string(),
                    reason: "must allow at least one room".into(),
                });
            }
            config.registry.max_rooms = max_rooms;
        }

        if let Some(minutes) = parse_var::<u64>(&lookup, "TINCHO_ROOM_TIMEOUT")? {
            if minutes == 0 {
                return Err(ConfigError::Invalid {
                    var: "TINCHO_ROOM_TIMEOUT",
                    value: minutes.to_string(),
                    reason: "must be at least one minute".into(),
                });
            }
            config.registry.room.room_timeout = Duration::from_secs(minutes * 60);
        }

        Ok(config)
    }
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
            value,
        })
}
