//! Uploads and downloads
//!
//! Uploads retry on a fixed interval and ask for a fresh SAS token on every
//! attempt. Downloads make a single attempt by default and run under one token
//! per operation; a batch download keeps going past failed entries and
//! reports every outcome.

use crate::auth::{SasToken, TokenIssuer};
use crate::blob::models::*;
use crate::blob::store::BlobStore;
use crate::config::StorageConfig;
use crate::error::{is_retryable_upload_error, BlobCliError, Result};
use crate::utils::helpers::file_basename;
use crate::utils::retry::{retry_with_interval, RetryError, RetryPolicy};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct TransferManager {
    store: Arc<dyn BlobStore>,
    tokens: Arc<dyn TokenIssuer>,
    upload_policy: RetryPolicy,
    download_policy: RetryPolicy,
    manifest: Option<Vec<String>>,
}

impl TransferManager {
    pub fn new(
        store: Arc<dyn BlobStore>,
        tokens: Arc<dyn TokenIssuer>,
        config: &StorageConfig,
    ) -> Self {
        let upload_policy = RetryPolicy::from_config(config);
        let download_policy = if config.retry_downloads() {
            upload_policy
        } else {
            RetryPolicy::single_attempt()
        };

        Self {
            store,
            tokens,
            upload_policy,
            download_policy,
            manifest: None,
        }
    }

    /// Attach the list of file names `download_all` works through
    pub fn with_manifest(mut self, manifest: Option<Vec<String>>) -> Self {
        self.manifest = manifest;
        self
    }

    /// Upload `local_file` to `<blob_key>/<file name>` in `container`.
    ///
    /// Makes up to `max_retries + 1` attempts, each under a newly issued token,
    /// sleeping the configured interval between them. Token issuance failures
    /// are not retried.
    pub async fn upload(
        &self,
        container: &str,
        local_file: &Path,
        blob_key: &str,
    ) -> Result<UploadReceipt> {
        let metadata = tokio::fs::metadata(local_file).await.map_err(|e| {
            BlobCliError::invalid_argument(format!(
                "Cannot read file {}: {e}",
                local_file.display()
            ))
        })?;
        if !metadata.is_file() {
            return Err(BlobCliError::invalid_argument(format!(
                "{} is not a regular file",
                local_file.display()
            )));
        }

        let blob_name = remote_key(blob_key, &file_basename(local_file)?);
        let blob_name = blob_name.as_str();

        let result = retry_with_interval(
            self.upload_policy,
            move |attempt| self.attempt_upload(container, blob_name, local_file, attempt),
            is_retryable_upload_error,
        )
        .await;

        match result {
            Ok(receipt) => {
                info!(
                    file = %local_file.display(),
                    blob = %receipt.blob_name,
                    "Successfully uploaded file"
                );
                debug!(container = container, response = ?receipt, "Response captured");
                Ok(receipt)
            }
            Err(RetryError { attempts, error }) if is_retryable_upload_error(&error) => {
                error!(
                    file = %local_file.display(),
                    attempts = attempts,
                    "Unable to upload file after retry"
                );
                Err(BlobCliError::upload_exhausted(
                    local_file,
                    attempts,
                    error.to_string(),
                ))
            }
            Err(RetryError { error, .. }) => Err(error),
        }
    }

    async fn attempt_upload(
        &self,
        container: &str,
        blob_name: &str,
        local_file: &Path,
        attempt: u32,
    ) -> Result<UploadReceipt> {
        let token = self.tokens.issue(container).await?;

        self.store
            .upload_file(&token, blob_name, local_file)
            .await
            .map_err(|e| {
                warn!(
                    file = %local_file.display(),
                    attempt = attempt,
                    error = %e,
                    "Upload attempt failed"
                );
                e
            })
    }

    /// Download `<blob_prefix>/<file_name>` into `<local_dir>/<file_name>`
    /// under a token issued for this call.
    pub async fn download_one(
        &self,
        container: &str,
        blob_prefix: Option<&str>,
        file_name: &str,
        local_dir: &Path,
    ) -> Result<DownloadReceipt> {
        let token = self.tokens.issue(container).await?;
        let descriptor =
            TransferDescriptor::for_download(container, blob_prefix, file_name, local_dir);
        self.download_with_token(&token, &descriptor).await
    }

    /// Download one blob using a token the caller already holds.
    ///
    /// The token must be scoped to the descriptor's container. No directories
    /// are created for the destination.
    pub async fn download_with_token(
        &self,
        token: &SasToken,
        descriptor: &TransferDescriptor,
    ) -> Result<DownloadReceipt> {
        if !token.is_scoped_to(&descriptor.container) {
            return Err(BlobCliError::authentication(format!(
                "Token for container '{}' cannot be used for container '{}'",
                token.container(),
                descriptor.container
            )));
        }

        let file = file_basename(&descriptor.local_path)
            .unwrap_or_else(|_| descriptor.blob_key.clone());
        let blob_key = descriptor.blob_key.as_str();
        let local_path = descriptor.local_path.as_path();
        let store = self.store.as_ref();

        let result = retry_with_interval(
            self.download_policy,
            move |_| store.download_file(token, blob_key, local_path),
            is_retryable_upload_error,
        )
        .await;

        match result {
            Ok(receipt) => {
                info!(file = %file, "Successfully downloaded file");
                debug!(container = %descriptor.container, response = ?receipt, "Response captured");
                Ok(receipt)
            }
            Err(RetryError { attempts, error }) => {
                error!(
                    file = %file,
                    attempts = attempts,
                    error = %error,
                    "Error while downloading file"
                );
                let cause = if attempts > 1 {
                    format!("{error} (after {attempts} attempts)")
                } else {
                    error.to_string()
                };
                Err(BlobCliError::download(file, cause))
            }
        }
    }

    /// Download every manifest entry from `<blob_prefix>/` into `local_dir`.
    ///
    /// Entries are attempted in order, each exactly once (or per the download
    /// retry policy); a failure never stops the entries after it. Only a
    /// missing manifest or a token that cannot be issued fails the call.
    ///
    /// One token covers the whole batch and is not refreshed, so a batch that
    /// outlives the SAS validity window will see its later entries rejected.
    pub async fn download_all(
        &self,
        container: &str,
        blob_prefix: Option<&str>,
        local_dir: &Path,
    ) -> Result<BatchReport> {
        let manifest = match self.manifest.as_deref() {
            Some(files) if !files.is_empty() => files,
            _ => return Err(BlobCliError::config("file list not available")),
        };

        let token = self.tokens.issue(container).await?;
        let mut outcomes = Vec::with_capacity(manifest.len());

        for file_name in manifest {
            let descriptor =
                TransferDescriptor::for_download(container, blob_prefix, file_name, local_dir);

            match self.download_with_token(&token, &descriptor).await {
                Ok(receipt) => outcomes.push(TransferOutcome::succeeded(file_name, receipt)),
                Err(e) => {
                    warn!(file = %file_name, "Continuing with next file");
                    outcomes.push(TransferOutcome::failed(file_name, &e));
                }
            }
        }

        let report = BatchReport::new(container, outcomes);
        info!(
            container = container,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Reports download operation completed"
        );
        Ok(report)
    }
}
