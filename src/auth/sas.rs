//! Container-scoped Shared Access Signature issuance
//!
//! A [`SasToken`] is an immutable value: it is handed to each storage call
//! that needs it and never refreshed in place. Callers decide whether to
//! reuse a token or ask the [`TokenIssuer`] for a new one.

use crate::blob::azure::{key_credentials, storage_location};
use crate::config::StorageConfig;
use crate::error::{BlobCliError, Result};
use async_trait::async_trait;
use azure_storage::shared_access_signature::{service_sas::BlobSasPermissions, SasToken as _};
use azure_storage_blobs::prelude::ClientBuilder;
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;
use zeroize::Zeroizing;

/// A signed, time-windowed grant for one container
#[derive(Clone)]
pub struct SasToken {
    container: String,
    token: Zeroizing<String>,
    issued_at: OffsetDateTime,
    expires_at: OffsetDateTime,
}

impl SasToken {
    pub fn new(
        container: impl Into<String>,
        token: impl Into<String>,
        issued_at: OffsetDateTime,
        expires_at: OffsetDateTime,
    ) -> Self {
        Self {
            container: container.into(),
            token: Zeroizing::new(token.into()),
            issued_at,
            expires_at,
        }
    }

    /// The container this token was signed for
    pub fn container(&self) -> &str {
        &self.container
    }

    /// The signed query string. Never log this.
    pub fn secret(&self) -> &str {
        &self.token
    }

    pub fn issued_at(&self) -> OffsetDateTime {
        self.issued_at
    }

    pub fn expires_at(&self) -> OffsetDateTime {
        self.expires_at
    }

    pub fn is_expired_at(&self, at: OffsetDateTime) -> bool {
        at >= self.expires_at
    }

    pub fn is_scoped_to(&self, container: &str) -> bool {
        self.container == container
    }
}

impl fmt::Debug for SasToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SasToken")
            .field("container", &self.container)
            .field("token", &"<redacted>")
            .field("issued_at", &self.issued_at)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Source of capability tokens
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Issue a fresh token for `container`
    async fn issue(&self, container: &str) -> Result<SasToken>;
}

/// Signs container SAS tokens locally with the storage account key
pub struct SasTokenManager {
    config: Arc<StorageConfig>,
}

impl SasTokenManager {
    pub fn new(config: Arc<StorageConfig>) -> Self {
        Self { config }
    }

    /// Read, write, delete and list on the whole container
    pub fn default_permissions() -> BlobSasPermissions {
        BlobSasPermissions {
            read: true,
            write: true,
            delete: true,
            list: true,
            ..Default::default()
        }
    }
}

#[async_trait]
impl TokenIssuer for SasTokenManager {
    async fn issue(&self, container: &str) -> Result<SasToken> {
        let issued_at = OffsetDateTime::now_utc();
        let expires_at = time::Duration::try_from(self.config.sas_validity())
            .ok()
            .and_then(|validity| issued_at.checked_add(validity))
            .ok_or_else(|| {
                BlobCliError::authentication(format!(
                    "SAS validity of {} minutes is out of range",
                    self.config.sas_validity_minutes()
                ))
            })?;

        // Signing is local; no request is sent while issuing a token
        let container_client =
            ClientBuilder::with_location(storage_location(&self.config), key_credentials(&self.config))
                .container_client(container);

        let signature = container_client
            .shared_access_signature(Self::default_permissions(), expires_at)
            .await
            .map_err(|e| {
                BlobCliError::authentication(format!(
                    "Failed to create SAS policy for container '{container}': {e}"
                ))
            })?
            .start(issued_at);

        let token = signature.token().map_err(|e| {
            BlobCliError::authentication(format!(
                "Failed to sign SAS token for container '{container}': {e}"
            ))
        })?;

        debug!(
            container = container,
            expires_at = %expires_at,
            "Issued SAS token"
        );

        Ok(SasToken::new(container, token, issued_at, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = SasToken::new(
            "reports",
            "sv=2022-11-02&sig=abc",
            datetime!(2024-01-01 00:00 UTC),
            datetime!(2024-01-01 00:15 UTC),
        );
        let rendered = format!("{token:?}");
        assert!(!rendered.contains("sig=abc"));
        assert!(rendered.contains("reports"));
    }

    #[test]
    fn test_token_window_and_scope() {
        let token = SasToken::new(
            "reports",
            "sig",
            datetime!(2024-01-01 00:00 UTC),
            datetime!(2024-01-01 00:15 UTC),
        );
        assert!(!token.is_expired_at(datetime!(2024-01-01 00:14:59 UTC)));
        assert!(token.is_expired_at(datetime!(2024-01-01 00:15 UTC)));
        assert!(token.is_scoped_to("reports"));
        assert!(!token.is_scoped_to("archive"));
    }

    #[test]
    fn test_default_permissions() {
        let permissions = SasTokenManager::default_permissions();
        assert!(permissions.read && permissions.write && permissions.delete && permissions.list);
        assert!(!permissions.add && !permissions.create);
    }
}
