//! Video publishing to YouTube.
//!
//! Authenticates with a long-lived OAuth refresh token and uploads the
//! rendered commercial as an unlisted video via the resumable upload
//! protocol.

pub mod client;
pub mod error;

pub use client::{PublishedVideo, YouTubeClient, YouTubeConfig};
pub use error::{PublishError, PublishResult};
