//! Azure Blob Storage implementation of [`BlobStore`]
//!
//! Container management and listings authenticate with the shared account
//! key; uploads and downloads run under the container SAS token passed in.

use crate::auth::{SasToken, SasTokenManager, TokenIssuer};
use crate::blob::models::*;
use crate::blob::store::{BlobStore, PageStream};
use crate::config::StorageConfig;
use crate::error::{BlobCliError, Result};
use crate::utils::network::{create_http_client, NetworkConfig};
use async_trait::async_trait;
use azure_core::TransportOptions;
use azure_storage::{CloudLocation, StorageCredentials};
use azure_storage_blobs::prelude::*;
use chrono::{DateTime, Utc};
use futures::{StreamExt, TryStreamExt};
use std::path::Path;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::debug;

/// Storage endpoint as an SDK cloud location, honouring custom URLs
/// (Azurite, sovereign clouds, private endpoints).
pub fn storage_location(config: &StorageConfig) -> CloudLocation {
    CloudLocation::Custom {
        account: config.account().to_string(),
        uri: config.url().as_str().trim_end_matches('/').to_string(),
    }
}

/// Shared-key credentials for the configured account
pub fn key_credentials(config: &StorageConfig) -> StorageCredentials {
    StorageCredentials::access_key(
        config.account().to_string(),
        config.account_key().to_string(),
    )
}

/// Convert Azure response datetime from time::OffsetDateTime to chrono::DateTime<Utc>
fn to_utc(value: OffsetDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(value.unix_timestamp(), value.nanosecond()).unwrap_or_else(Utc::now)
}

fn is_not_found(error: &azure_core::Error) -> bool {
    let msg = error.to_string().to_lowercase();
    msg.contains("404") || msg.contains("not found")
}

/// Azure-backed store
pub struct AzureBlobStore {
    config: Arc<StorageConfig>,
    http_client: Arc<reqwest::Client>,
}

impl AzureBlobStore {
    pub fn new(config: Arc<StorageConfig>) -> Result<Self> {
        let http_client = create_http_client(&NetworkConfig::for_storage(&config))?;
        Ok(Self {
            config,
            http_client: Arc::new(http_client),
        })
    }

    fn builder(&self, credentials: StorageCredentials) -> ClientBuilder {
        ClientBuilder::with_location(storage_location(&self.config), credentials)
            .transport(TransportOptions::new(self.http_client.clone()))
    }

    fn key_builder(&self) -> ClientBuilder {
        self.builder(key_credentials(&self.config))
    }

    fn sas_builder(&self, token: &SasToken) -> Result<ClientBuilder> {
        let credentials = StorageCredentials::sas_token(token.secret()).map_err(|e| {
            BlobCliError::authentication(format!(
                "Invalid SAS token for container '{}': {e}",
                token.container()
            ))
        })?;
        Ok(self.builder(credentials))
    }
}

#[async_trait]
impl BlobStore for AzureBlobStore {
    async fn create_container(&self, container: &str) -> Result<ContainerCreation> {
        let container_client = self.key_builder().container_client(container);

        if container_client.exists().await? {
            return Ok(ContainerCreation::AlreadyExists);
        }

        match container_client
            .create()
            .public_access(PublicAccess::Container)
            .await
        {
            Ok(_) => Ok(ContainerCreation::Created),
            // Lost a race with another creator
            Err(e) if e.to_string().contains("ContainerAlreadyExists") => {
                Ok(ContainerCreation::AlreadyExists)
            }
            Err(e) => Err(BlobCliError::azure_api(format!(
                "Failed to create container '{container}': {e}"
            ))),
        }
    }

    async fn delete_container(&self, container: &str) -> Result<()> {
        self.key_builder()
            .container_client(container)
            .delete()
            .await
            .map_err(|e| {
                BlobCliError::azure_api(format!("Failed to delete container '{container}': {e}"))
            })?;
        Ok(())
    }

    async fn upload_file(
        &self,
        token: &SasToken,
        blob_name: &str,
        local_path: &Path,
    ) -> Result<UploadReceipt> {
        let content = tokio::fs::read(local_path).await?;
        let size = content.len() as u64;
        let content_type = mime_guess::from_path(local_path)
            .first_or_octet_stream()
            .to_string();

        let blob_client = self
            .sas_builder(token)?
            .blob_client(token.container(), blob_name);

        let response = blob_client
            .put_block_blob(content)
            .content_type(&content_type)
            .await
            .map_err(|e| BlobCliError::transient(format!("Failed to upload blob: {e}")))?;

        debug!(blob = blob_name, size = size, "Put block blob");

        Ok(UploadReceipt {
            blob_name: blob_name.to_string(),
            etag: response.etag.to_string(),
            last_modified: to_utc(response.last_modified),
            content_type,
            size,
        })
    }

    async fn download_file(
        &self,
        token: &SasToken,
        blob_name: &str,
        local_path: &Path,
    ) -> Result<DownloadReceipt> {
        let blob_client = self
            .sas_builder(token)?
            .blob_client(token.container(), blob_name);

        let properties = blob_client.get_properties().await.map_err(|e| {
            if is_not_found(&e) {
                BlobCliError::azure_api(format!("Blob '{blob_name}' not found"))
            } else {
                BlobCliError::azure_api(format!("Failed to check if blob exists: {e}"))
            }
        })?;

        // get_content() fails with 416 Range Not Satisfiable for 0-byte blobs
        let content = if properties.blob.properties.content_length == 0 {
            Vec::new()
        } else {
            blob_client
                .get_content()
                .await
                .map_err(|e| BlobCliError::azure_api(format!("Failed to download blob: {e}")))?
        };

        tokio::fs::write(local_path, &content).await?;

        Ok(DownloadReceipt {
            blob_name: blob_name.to_string(),
            local_path: local_path.to_path_buf(),
            size: content.len() as u64,
        })
    }

    fn list_containers(&self) -> PageStream<'_, RemoteContainer> {
        self.key_builder()
            .blob_service_client()
            .list_containers()
            .into_stream()
            .map_ok(|page| {
                page.containers
                    .iter()
                    .map(|container| RemoteContainer {
                        name: container.name.clone(),
                        last_modified: to_utc(container.last_modified),
                        etag: container.e_tag.clone(),
                        lease_status: format!("{:?}", container.lease_status),
                        has_legal_hold: container.has_legal_hold,
                        public_access: format!("{:?}", container.public_access),
                    })
                    .collect()
            })
            .map_err(|e| BlobCliError::azure_api(format!("Failed to list containers: {e}")))
            .boxed()
    }

    fn list_blobs<'a>(
        &'a self,
        container: &'a str,
        prefix: Option<String>,
    ) -> PageStream<'a, RemoteBlob> {
        let mut list_builder = self.key_builder().container_client(container).list_blobs();
        if let Some(prefix) = prefix {
            list_builder = list_builder.prefix(prefix);
        }

        list_builder
            .into_stream()
            .map_ok(|page| {
                page.blobs
                    .blobs()
                    .map(|blob| RemoteBlob {
                        name: blob.name.clone(),
                        created: to_utc(blob.properties.creation_time),
                        last_modified: to_utc(blob.properties.last_modified),
                        etag: blob.properties.etag.to_string(),
                        content_type: blob.properties.content_type.clone(),
                        content_length: blob.properties.content_length,
                        lease_status: blob
                            .properties
                            .lease_status
                            .as_ref()
                            .map(|status| format!("{status:?}")),
                        blob_type: format!("{:?}", blob.properties.blob_type),
                    })
                    .collect()
            })
            .map_err(move |e| {
                BlobCliError::azure_api(format!(
                    "Failed to list blobs in container '{container}': {e}"
                ))
            })
            .boxed()
    }
}

/// Build the Azure store and token issuer from validated configuration
pub fn create_azure_backends(
    config: Arc<StorageConfig>,
) -> Result<(Arc<dyn BlobStore>, Arc<dyn TokenIssuer>)> {
    let store = Arc::new(AzureBlobStore::new(config.clone())?) as Arc<dyn BlobStore>;
    let tokens = Arc::new(SasTokenManager::new(config)) as Arc<dyn TokenIssuer>;
    Ok((store, tokens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_utc_preserves_instant() {
        let value = time::macros::datetime!(2024-05-01 08:30:15 UTC);
        let converted = to_utc(value);
        assert_eq!(converted.timestamp(), value.unix_timestamp());
    }

    #[test]
    fn test_storage_location_trims_trailing_slash() {
        let config =
            StorageConfig::new("https://acct.blob.core.windows.net/", "acct", "a2V5", None)
                .unwrap();
        match storage_location(&config) {
            CloudLocation::Custom { account, uri } => {
                assert_eq!(account, "acct");
                assert_eq!(uri, "https://acct.blob.core.windows.net");
            }
            _ => panic!("expected a custom cloud location"),
        }
    }
}
