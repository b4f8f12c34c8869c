use std::net::SocketAddr;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name}: invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

/// Process configuration, read once from the environment at startup.
///
/// - `APP_VERSION`: version label stamped on every metric series
///   (default `stable`)
/// - `ENABLE_CACHE`: `true`/`1` enables the prediction cache
///   (default disabled)
/// - `LISTEN_ADDR`: socket address to serve on (default `0.0.0.0:8080`)
#[derive(Debug, Clone)]
pub struct Config {
    pub version: String,
    pub cache_enabled: bool,
    pub listen: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let version = lookup("APP_VERSION").unwrap_or_else(|| "stable".to_string());
        let cache_enabled = match lookup("ENABLE_CACHE") {
            None => false,
            Some(raw) => match raw.to_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "ENABLE_CACHE",
                        value: raw,
                    });
                }
            },
        };
        let listen = match lookup("LISTEN_ADDR") {
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                name: "LISTEN_ADDR",
                value: raw,
            })?,
        };
        Ok(Self {
            version,
            cache_enabled,
            listen,
        })
    }
}
