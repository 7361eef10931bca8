//! Commercial composition.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::ComposeSpec;

/// Output duration cap in seconds.
const COMMERCIAL_DURATION_SECS: f64 = 15.0;

/// Upper bound on a single render.
const RENDER_TIMEOUT_SECS: u64 = 300;

/// Local paths of the staged preview assets.
#[derive(Debug, Clone)]
pub struct CommercialAssets {
    /// Raw voiceover audio (s16le, 24 kHz, mono)
    pub voice_pcm: PathBuf,
    /// Background image
    pub background: PathBuf,
    /// QR code image
    pub qr: PathBuf,
}

impl CommercialAssets {
    fn check_present(&self) -> MediaResult<()> {
        for path in [&self.voice_pcm, &self.background, &self.qr] {
            if !path.exists() {
                return Err(MediaError::FileNotFound(path.clone()));
            }
        }
        Ok(())
    }
}

/// Render the final commercial MP4 from staged assets.
///
/// The voiceover is raw PCM, so its format must be declared on the
/// input; the background is a still image looped for the duration of
/// the clip. Output is H.264 in yuv420p, capped at 15 seconds and cut
/// at the shortest stream.
pub async fn render_commercial(
    assets: &CommercialAssets,
    spec: &ComposeSpec,
    output: impl AsRef<Path>,
) -> MediaResult<()> {
    assets.check_present()?;

    let output = output.as_ref();
    let cmd = FfmpegCommand::new(output)
        .input_with_args(["-f", "s16le", "-ar", "24000", "-ac", "1"], &assets.voice_pcm)
        .input_with_args(["-loop", "1"], &assets.background)
        .input(&assets.qr)
        .filter_complex(spec.filter_graph())
        .video_codec("libx264")
        .duration(COMMERCIAL_DURATION_SECS)
        .pixel_format("yuv420p")
        .shortest();

    FfmpegRunner::new()
        .with_timeout(RENDER_TIMEOUT_SECS)
        .run(&cmd)
        .await?;

    info!("Rendered commercial to {}", output.display());
    Ok(())
}
