//! The storage-service seam
//!
//! Everything the engine needs from the remote store goes through
//! [`BlobStore`]. The Azure implementation lives in [`crate::blob::azure`].

use crate::auth::SasToken;
use crate::blob::models::{
    ContainerCreation, DownloadReceipt, RemoteBlob, RemoteContainer, UploadReceipt,
};
use crate::error::Result;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::path::Path;

/// A lazy sequence of listing pages. Each item is one service page.
pub type PageStream<'a, T> = BoxStream<'a, Result<Vec<T>>>;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Create `container`, reporting rather than failing when it already exists
    async fn create_container(&self, container: &str) -> Result<ContainerCreation>;

    async fn delete_container(&self, container: &str) -> Result<()>;

    /// Single-shot overwrite of `blob_name` in the token's container
    async fn upload_file(
        &self,
        token: &SasToken,
        blob_name: &str,
        local_path: &Path,
    ) -> Result<UploadReceipt>;

    /// Fetch `blob_name` from the token's container into `local_path`
    async fn download_file(
        &self,
        token: &SasToken,
        blob_name: &str,
        local_path: &Path,
    ) -> Result<DownloadReceipt>;

    fn list_containers(&self) -> PageStream<'_, RemoteContainer>;

    fn list_blobs<'a>(&'a self, container: &'a str, prefix: Option<String>)
        -> PageStream<'a, RemoteBlob>;
}
