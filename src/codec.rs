//! # Codec Invoker
//!
//! Punto unico di accesso ai tre encoder. Il walker dipende solo dal trait
//! `MediaCodec`, così i test possono sostituire gli encoder reali.
//!
//! Ogni operazione è atomica dal punto di vista del chiamante: o il file
//! viene completamente sostituito dall'output compresso, o resta identico.

use crate::audio_processor::AudioProcessor;
use crate::config::Config;
use crate::error::{CodecResult, CompressError};
use crate::image_processor::ImageProcessor;
use crate::platform::PlatformCommands;
use crate::tool_runner::ToolRunner;
use crate::video_processor::VideoProcessor;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One-file-at-a-time media compressor
#[allow(async_fn_in_trait)]
pub trait MediaCodec {
    async fn compress_image(&self, path: &Path, quality: u8) -> CodecResult<()>;
    async fn compress_audio(&self, path: &Path, bitrate: u32) -> CodecResult<()>;
    async fn compress_video(&self, path: &Path, crf: u8) -> CodecResult<()>;
}

/// Real encoders: `image` for pictures, ffmpeg for audio and video
#[derive(Debug, Clone)]
pub struct Codecs {
    ffmpeg: PathBuf,
    ffmpeg_found: bool,
    audio: AudioProcessor,
    video: VideoProcessor,
}

impl Codecs {
    pub fn new(config: &Config) -> Self {
        let platform = PlatformCommands::instance();
        let resolved = platform.resolve_tool("ffmpeg", config.ffmpeg_path.as_deref());
        let ffmpeg_found = resolved.is_some();
        // Unresolved: keep the bare name so each encode reports the missing tool
        let ffmpeg = resolved.unwrap_or_else(|| {
            config
                .ffmpeg_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(platform.get_command("ffmpeg")))
        });

        let runner = ToolRunner::new(&ffmpeg, config.encoder_timeout_secs.map(Duration::from_secs));

        Self {
            ffmpeg,
            ffmpeg_found,
            audio: AudioProcessor::new(runner.clone()),
            video: VideoProcessor::new(runner, config.video_codec.clone()),
        }
    }

    pub fn ffmpeg(&self) -> &Path {
        &self.ffmpeg
    }

    pub fn ffmpeg_available(&self) -> bool {
        self.ffmpeg_found
    }
}

impl MediaCodec for Codecs {
    async fn compress_image(&self, path: &Path, quality: u8) -> CodecResult<()> {
        // Decode and encode are CPU-bound
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || ImageProcessor::compress(&path, quality))
            .await
            .map_err(|e| CompressError::Io(std::io::Error::other(e)))?
    }

    async fn compress_audio(&self, path: &Path, bitrate: u32) -> CodecResult<()> {
        self.audio.compress(path, bitrate).await
    }

    async fn compress_video(&self, path: &Path, crf: u8) -> CodecResult<()> {
        self.video.compress(path, crf).await
    }
}
