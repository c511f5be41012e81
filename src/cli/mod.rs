//! CLI module for blobcli
//!
//! This module contains the command definitions, argument parsing, and
//! command execution.

pub mod commands;

pub use commands::*;
