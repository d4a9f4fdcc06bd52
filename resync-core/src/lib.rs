//! Core endpoint library for resource sync
//!
//! This crate provides the pieces the sync engine talks to: endpoint
//! traits and their HTTP, file and pipe implementations, document
//! formatters, and the retry policy applied to endpoint operations.

pub mod endpoint;
pub mod error;
pub mod formatter;
pub mod retry;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use endpoint::{
    Capability, Endpoint, Fetched, HttpEndpoint, HttpEndpointBuilder, PipeEndpoint,
    ResourceSink, ResourceSource, YamlFileEndpoint,
};
pub use error::{EndpointError, Result};
pub use formatter::Formatter;
pub use retry::RetryPolicy;

/// HTTP client settings shared by every HTTP endpoint of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(with = "humantime_serde", default = "default_timeout")]
    pub timeout: Duration,
    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    concat!("resource-sync/", env!("CARGO_PKG_VERSION")).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_default() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert!(config.user_agent.starts_with("resource-sync/"));
    }
}
