//! Blob store client for preview and render assets.
//!
//! This crate provides:
//! - Byte upload/download by key
//! - Public URL construction for uploaded assets
//! - Bucket connectivity checks for readiness probes
//!
//! Assets live under `previews/{previewId}/...` and
//! `renders/{previewId}/...`; key construction helpers keep the
//! layout in one place.

pub mod client;
pub mod error;
pub mod keys;

pub use client::{BlobStore, BlobStoreConfig};
pub use error::{StorageError, StorageResult};
pub use keys::{bg_key, mp4_key, qr_key, voice_key};
