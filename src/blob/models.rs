//! Data models for blob storage operations
//!
//! This module defines transfer descriptors, service response projections,
//! per-file outcomes, and the entries produced by listings.

use crate::error::BlobCliError;
use crate::utils::helpers::KEY_DELIMITER;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// One file moving between the local filesystem and a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    pub container: String,
    /// Full "/"-delimited key of the remote blob
    pub blob_key: String,
    pub local_path: PathBuf,
}

impl TransferDescriptor {
    /// `<prefix>/<file_name>` in the container, `<local_dir>/<file_name>` on disk
    pub fn for_download(
        container: &str,
        blob_prefix: Option<&str>,
        file_name: &str,
        local_dir: &Path,
    ) -> Self {
        Self {
            container: container.to_string(),
            blob_key: remote_key(blob_prefix.unwrap_or_default(), file_name),
            local_path: local_dir.join(file_name),
        }
    }
}

/// Key for `name` under `prefix`. Trailing delimiters on the prefix are
/// dropped and an empty prefix means the top level of the container.
pub fn remote_key(prefix: &str, name: &str) -> String {
    let prefix = prefix.trim_end_matches(KEY_DELIMITER);
    if prefix.is_empty() {
        name.to_string()
    } else {
        crate::utils::helpers::join_blob_key(prefix, name)
    }
}

/// What the service reported for a completed upload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub blob_name: String,
    pub etag: String,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
    pub size: u64,
}

/// A blob written to local disk
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadReceipt {
    pub blob_name: String,
    pub local_path: PathBuf,
    pub size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded(DownloadReceipt),
    Failed { error: String },
}

/// Result of one manifest entry in a batch download
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferOutcome {
    pub name: String,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl TransferOutcome {
    pub fn succeeded(name: impl Into<String>, receipt: DownloadReceipt) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Succeeded(receipt),
        }
    }

    pub fn failed(name: impl Into<String>, error: &BlobCliError) -> Self {
        Self {
            name: name.into(),
            status: OutcomeStatus::Failed {
                error: error.to_string(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, OutcomeStatus::Succeeded(_))
    }
}

/// Ordered per-entry outcomes of a batch download
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub container: String,
    pub outcomes: Vec<TransferOutcome>,
}

impl BatchReport {
    pub fn new(container: impl Into<String>, outcomes: Vec<TransferOutcome>) -> Self {
        Self {
            container: container.into(),
            outcomes,
        }
    }

    pub fn outcomes(&self) -> &[TransferOutcome] {
        &self.outcomes
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerCreation {
    Created,
    AlreadyExists,
}

/// A container as reported by the service
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteContainer {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    pub lease_status: String,
    pub has_legal_hold: bool,
    pub public_access: String,
}

/// A blob as reported by the service
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteBlob {
    pub name: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    pub content_type: String,
    pub content_length: u64,
    pub lease_status: Option<String>,
    pub blob_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerDetails {
    pub etag: String,
    pub lease_status: String,
    pub legal_hold: bool,
    pub public_access_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContainerEntry {
    pub name: String,
    pub last_modified: DateTime<Utc>,
    /// Only populated for verbose listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ContainerDetails>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDetails {
    pub etag: String,
    pub lease_status: Option<String>,
    pub blob_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileEntry {
    /// Key with the folder segment removed
    pub name: String,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub content_type: String,
    pub content_length: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<FileDetails>,
}
