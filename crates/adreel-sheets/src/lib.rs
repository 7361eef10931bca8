//! Google Sheets record store client.
//!
//! This crate provides:
//! - Append-only record creation
//! - Scan-based lookup by preview ID
//! - Batched multi-field updates (one write per update)
//! - Service account authentication via gcp_auth
//! - Retry with exponential backoff and jitter

pub mod client;
pub mod error;
pub mod retry;
pub mod token_cache;

pub use client::{SheetsClient, SheetsConfig};
pub use error::{SheetsError, SheetsResult};
pub use retry::RetryConfig;
