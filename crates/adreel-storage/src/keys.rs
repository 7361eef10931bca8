//! Asset key layout.
//!
//! Preview assets and the rendered artifact are namespaced by preview
//! ID so concurrent pipelines never write the same key.

/// Background image for a preview.
pub fn bg_key(preview_id: &str) -> String {
    format!("previews/{}/bg.png", preview_id)
}

/// QR code image for a preview.
pub fn qr_key(preview_id: &str) -> String {
    format!("previews/{}/qr.png", preview_id)
}

/// Raw voiceover audio for a preview.
pub fn voice_key(preview_id: &str) -> String {
    format!("previews/{}/voice.pcm", preview_id)
}

/// Rendered commercial for a preview.
pub fn mp4_key(preview_id: &str) -> String {
    format!("renders/{}/commercial.mp4", preview_id)
}
