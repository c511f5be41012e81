//! Capability token module
//!
//! This module issues the container-scoped SAS tokens every transfer runs under.

pub mod sas;

pub use sas::{SasToken, SasTokenManager, TokenIssuer};
