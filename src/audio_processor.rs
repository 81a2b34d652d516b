//! Audio compression with FFmpeg.
//!
//! Reasonable bitrates: 48 kbps is the smallest that still sounds fine,
//! 96 kbps is decent, 320 kbps is premium. Lossless containers (`.wav`,
//! `.flac`) ignore the target bitrate; ffmpeg re-muxes them as-is.

use crate::error::CodecResult;
use crate::tool_runner::{ffmpeg_input_args, ToolRunner};
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// Containers ffmpeg re-muxes losslessly, ignoring `-b:a`
pub const LOSSLESS_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Handles audio compression
#[derive(Debug, Clone)]
pub struct AudioProcessor {
    runner: ToolRunner,
}

impl AudioProcessor {
    pub fn new(runner: ToolRunner) -> Self {
        Self { runner }
    }

    /// ffmpeg arguments encoding `input` into `output` at `bitrate` bits/s
    pub fn build_args(input: &Path, output: &Path, bitrate: u32) -> Vec<OsString> {
        let mut args = ffmpeg_input_args(input);
        args.push(OsString::from("-b:a"));
        args.push(OsString::from(bitrate.to_string()));
        args.push(output.as_os_str().to_os_string());
        args
    }

    /// True when the container's codec has no target bitrate
    pub fn is_lossless(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| LOSSLESS_EXTENSIONS.contains(&ext))
            .unwrap_or(false)
    }

    /// Re-encode the audio file at `path` in place
    pub async fn compress(&self, path: &Path, bitrate: u32) -> CodecResult<()> {
        if Self::is_lossless(path) {
            debug!("Re-muxing lossless audio: {} (bitrate not applied)", path.display());
        } else {
            debug!("Compressing audio: {} ({} bit/s)", path.display(), bitrate);
        }
        self.runner
            .encode_in_place(path, |output| Self::build_args(path, output, bitrate))
            .await
    }
}
