//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// How many trailing stderr lines to keep for error reporting.
const STDERR_TAIL: usize = 20;

/// Builder for multi-input FFmpeg commands.
///
/// Each input carries its own pre-`-i` arguments, which is what the
/// commercial composition needs: the raw PCM input must be described
/// with `-f s16le -ar 24000 -ac 1` and the still background needs
/// `-loop 1`, while the QR image takes no extra flags.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Inputs as (pre-input args, path) pairs, in order
    inputs: Vec<(Vec<String>, PathBuf)>,
    /// Output file path
    output: PathBuf,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level
    log_level: String,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            output: output.as_ref().to_path_buf(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: "error".to_string(),
        }
    }

    /// Add an input with its pre-input arguments.
    pub fn input_with_args<I, S>(mut self, args: I, path: impl AsRef<Path>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs.push((
            args.into_iter().map(Into::into).collect(),
            path.as_ref().to_path_buf(),
        ));
        self
    }

    /// Add an input with no extra arguments.
    pub fn input(self, path: impl AsRef<Path>) -> Self {
        self.input_with_args(Vec::<String>::new(), path)
    }

    /// Add output arguments (after all inputs).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Cap output duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Stop at the end of the shortest stream.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Set log level.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        args.push("-v".to_string());
        args.push(self.log_level.clone());

        for (input_args, path) in &self.inputs {
            args.extend(input_args.clone());
            args.push("-i".to_string());
            args.push(path.to_string_lossy().to_string());
        }

        args.extend(self.output_args.clone());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with timeout and stderr capture.
pub struct FfmpegRunner {
    timeout_secs: Option<u64>,
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Set timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Run an FFmpeg command.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let stderr_handle = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            let mut tail: Vec<String> = Vec::new();

            while let Ok(Some(line)) = reader.next_line().await {
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                debug!("ffmpeg: {}", line);
                if tail.len() == STDERR_TAIL {
                    tail.remove(0);
                }
                tail.push(line);
            }

            tail
        });

        let status = self.wait_for_completion(&mut child).await?;
        let tail = stderr_handle.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            warn!("FFmpeg failed with status {:?}", status.code());
            Err(MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some(tail.join("\n")),
                status.code(),
            ))
        }
    }

    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<std::process::ExitStatus> {
        match self.timeout_secs {
            Some(timeout_secs) => {
                let timeout = tokio::time::timeout(
                    std::time::Duration::from_secs(timeout_secs),
                    child.wait(),
                );
                match timeout.await {
                    Ok(result) => Ok(result?),
                    Err(_) => {
                        warn!("FFmpeg timed out after {} seconds, killing process", timeout_secs);
                        let _ = child.kill().await;
                        Err(MediaError::Timeout(timeout_secs))
                    }
                }
            }
            None => Ok(child.wait().await?),
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inputs_keep_their_own_args() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input_with_args(["-f", "s16le", "-ar", "24000", "-ac", "1"], "voice.pcm")
            .input_with_args(["-loop", "1"], "bg.png")
            .input("qr.png")
            .video_codec("libx264");

        let args = cmd.build_args();
        let joined = args.join(" ");

        assert!(joined.contains("-f s16le -ar 24000 -ac 1 -i voice.pcm"));
        assert!(joined.contains("-loop 1 -i bg.png"));
        assert!(joined.contains("-i qr.png"));
        // Output codec comes after every input
        let codec_pos = args.iter().position(|a| a == "-c:v").unwrap();
        let last_input_pos = args.iter().rposition(|a| a == "-i").unwrap();
        assert!(codec_pos > last_input_pos);
    }

    #[test]
    fn output_path_is_last() {
        let cmd = FfmpegCommand::new("out.mp4")
            .input("in.png")
            .duration(15.0)
            .shortest();

        let args = cmd.build_args();
        assert_eq!(args.last().unwrap(), "out.mp4");
        assert!(args.contains(&"-t".to_string()));
        assert!(args.contains(&"15.000".to_string()));
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn overwrite_and_log_level_lead() {
        let args = FfmpegCommand::new("o.mp4").input("i.png").build_args();
        assert_eq!(&args[..3], &["-y", "-v", "error"]);
    }
}
