//! # Video Processing Module
//!
//! Questo modulo ricomprime i video con FFmpeg.
//!
//! ## Responsabilità:
//! - Compressione video con codec configurabile (default: libx265)
//! - Controllo qualità tramite CRF (Constant Rate Factor)
//! - Output nello stesso container del file originale (stessa estensione)
//!
//! ## Controllo qualità (CRF):
//! - 0-17: Visualmente lossless (file grandi)
//! - 18-23: Alta qualità
//! - 24-28: Buona qualità (default 28, massima compressione ragionevole)
//! - 29+: Qualità via via più bassa
//!
//! Se il container non supporta il codec scelto ffmpeg fallisce: il file
//! originale resta intatto e l'errore viene riportato per quel file.

use crate::error::CodecResult;
use crate::tool_runner::{ffmpeg_input_args, ToolRunner};
use std::ffi::OsString;
use std::path::Path;
use tracing::debug;

/// Handles video compression
#[derive(Debug, Clone)]
pub struct VideoProcessor {
    runner: ToolRunner,
    codec: String,
}

impl VideoProcessor {
    pub fn new(runner: ToolRunner, codec: impl Into<String>) -> Self {
        Self {
            runner,
            codec: codec.into(),
        }
    }

    /// ffmpeg arguments encoding `input` into `output` at the given CRF
    pub fn build_args(&self, input: &Path, output: &Path, crf: u8) -> Vec<OsString> {
        let mut args = ffmpeg_input_args(input);
        args.extend(
            ["-vcodec", self.codec.as_str(), "-crf", &crf.to_string()]
                .iter()
                .map(OsString::from),
        );
        args.push(output.as_os_str().to_os_string());
        args
    }

    /// Re-encode the video at `path` in place
    pub async fn compress(&self, path: &Path, crf: u8) -> CodecResult<()> {
        debug!(
            "🎬 Compressing video: {} (codec: {}, CRF: {})",
            path.display(),
            self.codec,
            crf
        );
        self.runner
            .encode_in_place(path, |output| self.build_args(path, output, crf))
            .await
    }
}
