//! Three-tier listing over a flat key space
//!
//! Blob storage has no directories, only keys with a conventional "/"
//! delimiter. The resolver lists containers, derives top-level folder names
//! from keys, or lists the files under one folder.

use crate::blob::models::*;
use crate::blob::store::{BlobStore, PageStream};
use crate::error::Result;
use crate::utils::helpers::{folder_name, normalize_prefix, split_first_segment};
use futures::TryStreamExt;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info};

/// What to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListRequest {
    AllContainers,
    BlobsIn { container: String },
    BlobsWithPrefix { container: String, prefix: String },
}

impl ListRequest {
    /// Map optional command-line values onto a request. Empty strings count
    /// as absent, and a prefix without a container is ignored. The prefix is
    /// reduced to its folder name, so `daily`, `daily/` and ` daily` agree.
    pub fn from_args(container: Option<String>, prefix: Option<String>) -> Self {
        let container = container.filter(|c| !c.trim().is_empty());
        let prefix = prefix
            .map(|p| folder_name(&p).to_string())
            .filter(|p| !p.is_empty());

        match (container, prefix) {
            (None, _) => Self::AllContainers,
            (Some(container), None) => Self::BlobsIn { container },
            (Some(container), Some(prefix)) => Self::BlobsWithPrefix { container, prefix },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    /// Include etag, lease and type columns
    pub verbose: bool,
    /// Stop after this many service pages; `None` walks them all
    pub max_pages: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "tier", content = "entries", rename_all = "snake_case")]
pub enum Listing {
    Containers(Vec<ContainerEntry>),
    Folders(Vec<String>),
    Files(Vec<FileEntry>),
}

impl Listing {
    pub fn len(&self) -> usize {
        match self {
            Self::Containers(entries) => entries.len(),
            Self::Folders(entries) => entries.len(),
            Self::Files(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct ListingResolver {
    store: Arc<dyn BlobStore>,
}

impl ListingResolver {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    pub async fn resolve(&self, request: &ListRequest, options: ListOptions) -> Result<Listing> {
        match request {
            ListRequest::AllContainers => self.list_containers(options).await,
            ListRequest::BlobsIn { container } => self.list_folders(container, options).await,
            ListRequest::BlobsWithPrefix { container, prefix } => {
                self.list_files(container, prefix, options).await
            }
        }
    }

    async fn list_containers(&self, options: ListOptions) -> Result<Listing> {
        let containers = collect_pages(self.store.list_containers(), options.max_pages).await?;

        let entries = containers
            .iter()
            .map(|container| project_container(container, options.verbose))
            .collect();

        info!("Successfully listed containers");
        Ok(Listing::Containers(entries))
    }

    async fn list_folders(&self, container: &str, options: ListOptions) -> Result<Listing> {
        let blobs = collect_pages(self.store.list_blobs(container, None), options.max_pages).await?;
        let folders = derive_folders(blobs.iter().map(|blob| blob.name.as_str()));

        info!(container = container, "Successfully listed blobs in container");
        Ok(Listing::Folders(folders))
    }

    async fn list_files(&self, container: &str, prefix: &str, options: ListOptions) -> Result<Listing> {
        let folder = folder_name(prefix);
        if folder.is_empty() {
            return self.list_folders(container, options).await;
        }

        let blobs = collect_pages(
            self.store.list_blobs(container, normalize_prefix(folder)),
            options.max_pages,
        )
        .await?;

        let entries = blobs
            .iter()
            .filter_map(|blob| project_file(blob, folder, options.verbose))
            .collect();

        info!(
            container = container,
            prefix = prefix,
            "Successfully listed blobs in container with prefix"
        );
        Ok(Listing::Files(entries))
    }
}

/// Drain a page stream, following continuations until the service has no
/// more pages or `max_pages` is reached.
pub async fn collect_pages<T>(mut pages: PageStream<'_, T>, max_pages: Option<usize>) -> Result<Vec<T>> {
    let mut items = Vec::new();
    let mut fetched = 0usize;

    while max_pages.map_or(true, |max| fetched < max) {
        match pages.try_next().await? {
            Some(page) => {
                fetched += 1;
                debug!(page = fetched, entries = page.len(), "Fetched listing page");
                items.extend(page);
            }
            None => break,
        }
    }

    Ok(items)
}

/// Distinct, sorted first segments of the given keys.
///
/// Keys without a delimiter are top-level files and contribute nothing.
pub fn derive_folders<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    keys.into_iter()
        .filter_map(split_first_segment)
        .map(|(folder, _)| folder)
        .filter(|folder| !folder.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn project_container(container: &RemoteContainer, verbose: bool) -> ContainerEntry {
    ContainerEntry {
        name: container.name.clone(),
        last_modified: container.last_modified,
        details: verbose.then(|| ContainerDetails {
            etag: container.etag.clone(),
            lease_status: container.lease_status.clone(),
            legal_hold: container.has_legal_hold,
            public_access_level: container.public_access.clone(),
        }),
    }
}

/// Project a blob under `prefix` to a file entry named by the rest of its key.
///
/// The name keeps every segment after the folder: `daily/2024/c.csv` lists as
/// `2024/c.csv`, not just `2024`, so nested files under one folder stay distinct.
/// Returns `None` when the first segment is not exactly `prefix` or nothing
/// follows the delimiter.
pub fn project_file(blob: &RemoteBlob, prefix: &str, verbose: bool) -> Option<FileEntry> {
    let (folder, rest) = split_first_segment(&blob.name)?;
    if folder != prefix || rest.is_empty() {
        return None;
    }

    Some(FileEntry {
        name: rest.to_string(),
        created: blob.created,
        last_modified: blob.last_modified,
        content_type: blob.content_type.clone(),
        content_length: blob.content_length,
        details: verbose.then(|| FileDetails {
            etag: blob.etag.clone(),
            lease_status: blob.lease_status.clone(),
            blob_type: blob.blob_type.clone(),
        }),
    })
}
