//! # Media Walker
//!
//! Visita ricorsivamente una directory di lavoro, classifica ogni file per
//! estensione e passa i media al codec con il parametro di qualità della
//! loro classe.
//!
//! ## Garanzie:
//! - I file non riconosciuti non vengono mai aperti né modificati
//! - Un file alla volta, fino al completamento, prima del successivo
//! - Un fallimento di codec interrompe solo quel file: l'originale resta
//!   intatto, l'errore finisce nel `WalkReport` e la visita prosegue
//! - Nomi, estensioni e posizioni relative non cambiano mai

use crate::codec::MediaCodec;
use crate::config::Config;
use crate::error::{CodecResult, CompressError};
use crate::file_manager::FileManager;
use crate::media::MediaClass;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// A media file the codec could not compress
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub class: MediaClass,
    pub error: CompressError,
}

/// Outcome of one walker pass
#[derive(Debug, Default)]
pub struct WalkReport {
    pub images: usize,
    pub audio: usize,
    pub video: usize,
    pub untouched: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
    pub failures: Vec<FileFailure>,
}

impl WalkReport {
    /// Number of media files successfully replaced
    pub fn compressed(&self) -> usize {
        self.images + self.audio + self.video
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record_success(&mut self, class: MediaClass, before: u64, after: u64) {
        match class {
            MediaClass::Image => self.images += 1,
            MediaClass::Audio => self.audio += 1,
            MediaClass::Video => self.video += 1,
            MediaClass::Unclassified => return,
        }
        self.bytes_before += before;
        self.bytes_after += after;
    }
}

/// Lazily enumerate every file under `root` together with its class.
///
/// Unreadable entries are logged and skipped.
pub fn discover(root: &Path) -> impl Iterator<Item = (PathBuf, MediaClass)> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let class = MediaClass::from_path(entry.path());
            (entry.into_path(), class)
        })
}

/// Compress every media file under `root` with the run-wide quality settings
pub async fn compress_media<C: MediaCodec>(root: &Path, config: &Config, codec: &C) -> Result<WalkReport> {
    info!("Compressing {}...", root.display());

    // Materialised first: temp siblings written during encoding must not be visited
    let files: Vec<(PathBuf, MediaClass)> = discover(root).collect();
    let mut report = WalkReport::default();

    for (path, class) in files {
        if !class.is_media() {
            debug!("Leaving {} untouched", path.display());
            report.untouched += 1;
            continue;
        }

        let before = FileManager::get_file_size(&path).await?;
        match compress_one(codec, config, &path, class).await {
            Ok(()) => {
                let after = FileManager::get_file_size(&path).await?;
                debug!("Compressed {} {}: {} -> {} bytes", class, path.display(), before, after);
                report.record_success(class, before, after);
            }
            Err(error) => {
                warn!("❌ Failed to compress {} {}: {}", class, path.display(), error);
                report.failures.push(FileFailure { path, class, error });
            }
        }
    }

    Ok(report)
}

async fn compress_one<C: MediaCodec>(codec: &C, config: &Config, path: &Path, class: MediaClass) -> CodecResult<()> {
    match class {
        MediaClass::Image => codec.compress_image(path, config.image_quality).await,
        MediaClass::Audio => codec.compress_audio(path, config.audio_bitrate).await,
        MediaClass::Video => codec.compress_video(path, config.video_crf).await,
        MediaClass::Unclassified => Ok(()),
    }
}
