//! In-memory stand-ins for the storage service and the token issuer

#![allow(dead_code)]

use async_trait::async_trait;
use blobcli::auth::{SasToken, TokenIssuer};
use blobcli::blob::{
    BlobStore, ContainerCreation, DownloadReceipt, PageStream, RemoteBlob, RemoteContainer,
    UploadReceipt,
};
use blobcli::config::{StorageConfig, StorageOptions};
use blobcli::{BlobCliError, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;

pub fn storage_config(max_retries: u32, retry_downloads: bool) -> StorageConfig {
    StorageConfig::new(
        "http://127.0.0.1:10000/devstoreaccount1",
        "devstoreaccount1",
        "c2VjcmV0",
        Some(StorageOptions {
            retry_interval: Some(0),
            max_retries: Some(max_retries),
            retry_downloads: Some(retry_downloads),
            ..Default::default()
        }),
    )
    .unwrap()
}

#[derive(Default)]
pub struct FakeStore {
    containers: Mutex<BTreeSet<String>>,
    /// "container/key" -> contents
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    upload_failures: AtomicU32,
    download_failures: Mutex<HashMap<String, u32>>,
    pub upload_attempts: AtomicU32,
    pub download_attempts: AtomicU32,
    pub uploaded_keys: Mutex<Vec<String>>,
    pub tokens_used: Mutex<Vec<String>>,
    pub listed_prefixes: Mutex<Vec<Option<String>>>,
    pub pages_fetched: AtomicUsize,
    page_size: usize,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            page_size: 2,
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_container(self, container: &str) -> Self {
        self.containers.lock().unwrap().insert(container.to_string());
        self
    }

    pub fn with_blob(self, container: &str, key: &str, contents: &[u8]) -> Self {
        self.containers.lock().unwrap().insert(container.to_string());
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{container}/{key}"), contents.to_vec());
        self
    }

    /// Fail the next `count` uploads with a transient error
    pub fn failing_uploads(self, count: u32) -> Self {
        self.upload_failures.store(count, Ordering::SeqCst);
        self
    }

    /// Fail the next `count` downloads of `key` with a transient error
    pub fn failing_downloads(self, key: &str, count: u32) -> Self {
        self.download_failures
            .lock()
            .unwrap()
            .insert(key.to_string(), count);
        self
    }

    pub fn object(&self, container: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .get(&format!("{container}/{key}"))
            .cloned()
    }

    pub fn has_container(&self, container: &str) -> bool {
        self.containers.lock().unwrap().contains(container)
    }

    fn remote_blob(name: &str, size: usize) -> RemoteBlob {
        RemoteBlob {
            name: name.to_string(),
            created: Utc::now(),
            last_modified: Utc::now(),
            etag: "0x8DC0000000000".to_string(),
            content_type: "text/csv".to_string(),
            content_length: size as u64,
            lease_status: Some("unlocked".to_string()),
            blob_type: "BlockBlob".to_string(),
        }
    }

    fn paged<T: Send + 'static>(&self, items: Vec<T>) -> PageStream<'_, T> {
        let mut pages = Vec::new();
        let mut items = items.into_iter().peekable();
        while items.peek().is_some() {
            pages.push(items.by_ref().take(self.page_size).collect::<Vec<_>>());
        }

        stream::iter(pages)
            .map(move |page| {
                self.pages_fetched.fetch_add(1, Ordering::SeqCst);
                Ok(page)
            })
            .boxed()
    }
}

#[async_trait]
impl BlobStore for FakeStore {
    async fn create_container(&self, container: &str) -> Result<ContainerCreation> {
        if self.containers.lock().unwrap().insert(container.to_string()) {
            Ok(ContainerCreation::Created)
        } else {
            Ok(ContainerCreation::AlreadyExists)
        }
    }

    async fn delete_container(&self, container: &str) -> Result<()> {
        if !self.containers.lock().unwrap().remove(container) {
            return Err(BlobCliError::azure_api(format!(
                "ContainerNotFound: {container}"
            )));
        }
        let scope = format!("{container}/");
        self.objects
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(&scope));
        Ok(())
    }

    async fn upload_file(
        &self,
        token: &SasToken,
        blob_name: &str,
        local_path: &Path,
    ) -> Result<UploadReceipt> {
        self.upload_attempts.fetch_add(1, Ordering::SeqCst);
        self.tokens_used
            .lock()
            .unwrap()
            .push(token.secret().to_string());

        let remaining = self.upload_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.upload_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(BlobCliError::transient("connection reset by peer"));
        }

        let contents = tokio::fs::read(local_path).await?;
        let size = contents.len() as u64;
        self.objects
            .lock()
            .unwrap()
            .insert(format!("{}/{blob_name}", token.container()), contents);
        self.uploaded_keys
            .lock()
            .unwrap()
            .push(blob_name.to_string());

        Ok(UploadReceipt {
            blob_name: blob_name.to_string(),
            etag: "0x8DC0000000001".to_string(),
            last_modified: Utc::now(),
            content_type: "text/csv".to_string(),
            size,
        })
    }

    async fn download_file(
        &self,
        token: &SasToken,
        blob_name: &str,
        local_path: &Path,
    ) -> Result<DownloadReceipt> {
        self.download_attempts.fetch_add(1, Ordering::SeqCst);
        self.tokens_used
            .lock()
            .unwrap()
            .push(token.secret().to_string());

        {
            let mut failures = self.download_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(blob_name) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(BlobCliError::transient("operation timed out"));
                }
            }
        }

        let contents = self
            .object(token.container(), blob_name)
            .ok_or_else(|| BlobCliError::azure_api(format!("BlobNotFound: {blob_name}")))?;
        tokio::fs::write(local_path, &contents).await?;

        Ok(DownloadReceipt {
            blob_name: blob_name.to_string(),
            local_path: local_path.to_path_buf(),
            size: contents.len() as u64,
        })
    }

    fn list_containers(&self) -> PageStream<'_, RemoteContainer> {
        let containers = self
            .containers
            .lock()
            .unwrap()
            .iter()
            .map(|name| RemoteContainer {
                name: name.clone(),
                last_modified: Utc::now(),
                etag: "0x8DC".to_string(),
                lease_status: "unlocked".to_string(),
                has_legal_hold: false,
                public_access: "container".to_string(),
            })
            .collect();
        self.paged(containers)
    }

    fn list_blobs<'a>(
        &'a self,
        container: &'a str,
        prefix: Option<String>,
    ) -> PageStream<'a, RemoteBlob> {
        self.listed_prefixes.lock().unwrap().push(prefix.clone());

        let scope = format!("{container}/");
        let blobs = self
            .objects
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(key, contents)| {
                key.strip_prefix(&scope)
                    .map(|name| (name.to_string(), contents.len()))
            })
            .filter(|(name, _)| prefix.as_deref().map_or(true, |p| name.starts_with(p)))
            .map(|(name, size)| Self::remote_blob(&name, size))
            .collect();
        self.paged(blobs)
    }
}

/// Hands out numbered tokens and counts how many it issued
#[derive(Default)]
pub struct FakeIssuer {
    pub issued: AtomicU32,
    fail: bool,
}

impl FakeIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn issued(&self) -> u32 {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenIssuer for FakeIssuer {
    async fn issue(&self, container: &str) -> Result<SasToken> {
        if self.fail {
            return Err(BlobCliError::authentication("account key rejected"));
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        let now = OffsetDateTime::now_utc();
        Ok(SasToken::new(
            container,
            format!("sv=2022-11-02&sr=c&sig=token-{n}"),
            now,
            now + time::Duration::minutes(15),
        ))
    }
}

pub fn shared(store: FakeStore, issuer: FakeIssuer) -> (Arc<FakeStore>, Arc<FakeIssuer>) {
    (Arc::new(store), Arc::new(issuer))
}
