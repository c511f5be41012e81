//! Utility functions module
//!
//! This module contains retry logic, HTTP client setup, blob key helpers,
//! and table formatting.

pub mod format;
pub mod helpers;
pub mod network;
pub mod retry;

pub use format::*;
pub use helpers::*;
pub use network::*;
pub use retry::*;
