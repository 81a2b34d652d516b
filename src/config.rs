//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione di una singola esecuzione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri di qualità e le opzioni della pipeline
//! - Fornisce validazione dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `image_quality`: Qualità immagini (1-100, default: 90)
//! - `audio_bitrate`: Bitrate audio in bit/s (default: 48000)
//! - `video_crf`: CRF video (0-51, default: 28, più basso = migliore qualità)
//! - `video_codec`: Codec video passato a ffmpeg (default: "libx265")
//! - `archive_extension`: Estensione degli archivi da processare (default: "epub")
//! - `keep_original`: Scrive `<nome> - Compressed.<ext>` invece di sostituire
//! - `fail_fast`: Interrompe la scansione di una directory al primo archivio fallito
//! - `ffmpeg_path`: Path esplicito di ffmpeg (default: ricerca nel PATH)
//! - `encoder_timeout_secs`: Timeout per invocazione encoder (default: nessuno)
//!
//! I parametri sono fissi per tutta l'esecuzione: nessuna variazione per file.
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     image_quality: 75,
//!     video_crf: 30,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_IMAGE_QUALITY: u8 = 90;
pub const DEFAULT_AUDIO_BITRATE: u32 = 48_000;
pub const DEFAULT_VIDEO_CRF: u8 = 28;

/// Configuration for one compression run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Image quality (1-100)
    pub image_quality: u8,
    /// Audio target bitrate in bits per second
    pub audio_bitrate: u32,
    /// Video CRF value (0-51, lower = better quality)
    pub video_crf: u8,
    /// Video codec handed to ffmpeg
    pub video_codec: String,
    /// Extension (without dot) identifying archives to process
    pub archive_extension: String,
    /// Write a ` - Compressed` sibling instead of replacing the archive
    pub keep_original: bool,
    /// Abort a directory sweep on the first failed archive
    pub fail_fast: bool,
    /// Explicit ffmpeg binary (None = resolve from PATH)
    pub ffmpeg_path: Option<PathBuf>,
    /// Kill an encoder that runs longer than this many seconds
    pub encoder_timeout_secs: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_quality: DEFAULT_IMAGE_QUALITY,
            audio_bitrate: DEFAULT_AUDIO_BITRATE,
            video_crf: DEFAULT_VIDEO_CRF,
            video_codec: "libx265".to_string(),
            archive_extension: "epub".to_string(),
            keep_original: false,
            fail_fast: false,
            ffmpeg_path: None,
            encoder_timeout_secs: None,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.image_quality == 0 || self.image_quality > 100 {
            return Err(anyhow::anyhow!("Image quality must be between 1 and 100"));
        }

        if self.audio_bitrate == 0 {
            return Err(anyhow::anyhow!("Audio bitrate must be greater than 0"));
        }

        if self.video_crf > 51 {
            return Err(anyhow::anyhow!("Video CRF must be between 0 and 51"));
        }

        if self.video_codec.trim().is_empty() {
            return Err(anyhow::anyhow!("Video codec must not be empty"));
        }

        let ext = self.archive_extension.as_str();
        if ext.is_empty() || ext.starts_with('.') || ext.contains(['/', '\\']) {
            return Err(anyhow::anyhow!(
                "Archive extension must be a bare extension like \"epub\", got {:?}",
                self.archive_extension
            ));
        }

        if self.encoder_timeout_secs == Some(0) {
            return Err(anyhow::anyhow!("Encoder timeout must be greater than 0"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
