use crate::config::StorageConfig;
use crate::error::{BlobCliError, Result};
use reqwest::Client;
use std::time::Duration;

/// Configuration for the HTTP client the storage SDK sends requests through
pub struct NetworkConfig {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    pub accept_invalid_certs: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(300),
            user_agent: format!("blobcli/{}", env!("CARGO_PKG_VERSION")),
            accept_invalid_certs: false,
        }
    }
}

impl NetworkConfig {
    pub fn for_storage(config: &StorageConfig) -> Self {
        Self {
            accept_invalid_certs: config.skip_tls_verification(),
            ..Self::default()
        }
    }
}

/// Create a properly configured HTTP client with timeouts
pub fn create_http_client(config: &NetworkConfig) -> Result<Client> {
    if config.accept_invalid_certs {
        tracing::warn!("TLS certificate verification is disabled");
    }

    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.request_timeout)
        .user_agent(&config.user_agent)
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .build()
        .map_err(|e| BlobCliError::network(format!("Failed to create HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tls_skip_follows_storage_config() {
        let options = crate::config::StorageOptions {
            skip_tls_verification: Some(true),
            ..Default::default()
        };
        let storage =
            StorageConfig::new("https://acct.blob.core.windows.net", "acct", "a2V5", Some(options))
                .unwrap();

        let network = NetworkConfig::for_storage(&storage);
        assert!(network.accept_invalid_certs);
        assert!(network.user_agent.starts_with("blobcli/"));
        assert!(create_http_client(&network).is_ok());
    }
}
