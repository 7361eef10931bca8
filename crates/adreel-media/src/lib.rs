//! Media composition for commercials.
//!
//! This crate provides:
//! - A multi-input FFmpeg command builder and runner
//! - The commercial filter graph (background, QR overlay, text)
//! - QR code PNG synthesis

pub mod command;
pub mod compose;
pub mod error;
pub mod filters;
pub mod qr;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use compose::{render_commercial, CommercialAssets};
pub use error::{MediaError, MediaResult};
pub use filters::ComposeSpec;
pub use qr::qr_png;
