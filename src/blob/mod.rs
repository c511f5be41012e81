//! Azure Blob Storage operations
//!
//! This module provides the transfer and listing engine: uploads with
//! bounded retry, single and manifest-driven downloads, container
//! management, and hierarchical listings over flat keys.

pub mod azure;
pub mod container;
pub mod listing;
pub mod models;
pub mod store;
pub mod transfer;

// Re-export commonly used types
pub use azure::{create_azure_backends, AzureBlobStore};
pub use container::ContainerManager;
pub use listing::{ListOptions, ListRequest, Listing, ListingResolver};
pub use models::*;
pub use store::{BlobStore, PageStream};
pub use transfer::TransferManager;
