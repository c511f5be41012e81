//! blobcli - Azure Blob Storage access layer
//!
//! Container management, uploads with bounded retry, single and batch
//! downloads under container-scoped SAS tokens, and hierarchical listings
//! over the flat blob key space.

pub mod auth;
pub mod blob;
pub mod cli;
pub mod config;
pub mod error;
pub mod utils;

// Re-export commonly used types
pub use error::{BlobCliError, Result};
