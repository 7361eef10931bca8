//! Gemini generation client.
//!
//! Produces the four generated assets of a commercial:
//! - script and visual headline (JSON text generation)
//! - cinematic background image (inline image data)
//! - voiceover audio (TTS, raw PCM)
//! - publish title/description/tags (JSON text generation)

pub mod client;
pub mod error;

pub use client::{GeminiClient, GeminiConfig};
pub use error::{GenError, GenResult};
