//! Endpoint configuration.
//!
//! Three external endpoints: the stream-query engine, the secondary
//! aggregator and the knowledge base. Values come from the environment
//! with local defaults; a malformed value is a fatal [`ConfigError`] so a
//! misconfigured service never starts.

use std::env;

use crate::error::ConfigError;

/// Environment variable for the engine address.
pub const ENGINE_ADDRESS_VAR: &str = "VIGIL_ENGINE_ADDRESS";
/// Environment variable for the engine port.
pub const ENGINE_PORT_VAR: &str = "VIGIL_ENGINE_PORT";
/// Environment variable for the secondary-aggregator address.
pub const SDA_ADDRESS_VAR: &str = "VIGIL_SDA_ADDRESS";
/// Environment variable for the secondary-aggregator port.
pub const SDA_PORT_VAR: &str = "VIGIL_SDA_PORT";
/// Environment variable for the knowledge-base address.
pub const KB_ADDRESS_VAR: &str = "VIGIL_KB_ADDRESS";
/// Environment variable for the knowledge-base port.
pub const KB_PORT_VAR: &str = "VIGIL_KB_PORT";

/// Endpoint configuration for the three external collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Stream-query engine host.
    pub engine_address: String,
    /// Stream-query engine port.
    pub engine_port: u16,
    /// Secondary-aggregator host.
    pub sda_address: String,
    /// Secondary-aggregator port.
    pub sda_port: u16,
    /// Knowledge-base host.
    pub kb_address: String,
    /// Knowledge-base port.
    pub kb_port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine_address: "localhost".to_string(),
            engine_port: 8175,
            sda_address: "localhost".to_string(),
            sda_port: 8176,
            kb_address: "localhost".to_string(),
            kb_port: 3030,
        }
    }
}

impl Config {
    /// Loads configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            engine_address: address_var(ENGINE_ADDRESS_VAR, &defaults.engine_address)?,
            engine_port: port_var(ENGINE_PORT_VAR, defaults.engine_port)?,
            sda_address: address_var(SDA_ADDRESS_VAR, &defaults.sda_address)?,
            sda_port: port_var(SDA_PORT_VAR, defaults.sda_port)?,
            kb_address: address_var(KB_ADDRESS_VAR, &defaults.kb_address)?,
            kb_port: port_var(KB_PORT_VAR, defaults.kb_port)?,
        })
    }

    /// Base URL of the stream-query engine.
    #[must_use]
    pub fn engine_url(&self) -> String {
        format!("http://{}:{}", self.engine_address, self.engine_port)
    }

    /// Ingest URL of the secondary aggregator, used as observer callback.
    #[must_use]
    pub fn sda_url(&self) -> String {
        format!("http://{}:{}", self.sda_address, self.sda_port)
    }

    /// Base URL of the knowledge base.
    #[must_use]
    pub fn kb_url(&self) -> String {
        format!("http://{}:{}", self.kb_address, self.kb_port)
    }

    /// URL of the knowledge base's data endpoint, joined by generated
    /// queries via FROM.
    #[must_use]
    pub fn kb_data_url(&self) -> String {
        format!("{}/data", self.kb_url())
    }
}

fn address_var(var: &str, default: &str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) => {
            let cleaned = clean_address(&value);
            if cleaned.is_empty() {
                return Err(ConfigError::InvalidAddress {
                    setting: var.to_string(),
                    value,
                });
            }
            Ok(cleaned)
        }
        Err(_) => Ok(default.to_string()),
    }
}

fn port_var(var: &str, default: u16) -> Result<u16, ConfigError> {
    match env::var(var) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidPort {
            setting: var.to_string(),
            value,
        }),
        Err(_) => Ok(default),
    }
}

/// Normalizes a host value: strips any scheme prefix and a trailing slash.
fn clean_address(address: &str) -> String {
    let address = match address.find("://") {
        Some(idx) => &address[idx + 3..],
        None => address,
    };
    address.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_localhost() {
        let config = Config::default();
        assert_eq!(config.engine_url(), "http://localhost:8175");
        assert_eq!(config.sda_url(), "http://localhost:8176");
        assert_eq!(config.kb_data_url(), "http://localhost:3030/data");
    }

    #[test]
    fn clean_address_strips_scheme_and_trailing_slash() {
        assert_eq!(clean_address("http://engine.local/"), "engine.local");
        assert_eq!(clean_address("engine.local"), "engine.local");
        assert_eq!(clean_address("https://kb.internal"), "kb.internal");
    }
}
