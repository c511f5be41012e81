//! Configuration management module
//!
//! This module handles configuration loading, validation, and environment
//! overrides for the storage connection.

pub mod settings;

pub use settings::*;
