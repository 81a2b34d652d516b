//! # File Management Module
//!
//! Questo modulo gestisce le operazioni sui file condivise da codec e pipeline.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva degli archivi in una directory
//! - Creazione di file temporanei "fratelli" del file da sostituire
//! - Sostituzione atomica: il temporaneo rimpiazza l'originale solo a successo verificato
//! - Utilità per dimensioni e percentuali di riduzione
//!
//! ## Sostituzione transazionale:
//! 1. `sibling_temp()` crea `.compress-XXXX.<ext>` nella stessa directory
//! 2. L'encoder scrive nel temporaneo
//! 3. `commit()` verifica che l'output non sia vuoto e fa rename sull'originale
//! 4. In caso di errore il temporaneo viene eliminato al drop, l'originale resta intatto
//!
//! Il temporaneo vive nella stessa directory dell'originale, quindi il rename
//! non attraversa mai filesystem diversi.
//!
//! ## Esempio:
//! ```ignore
//! let temp = FileManager::sibling_temp(&path)?;
//! run_encoder(&path, temp.path()).await?;
//! FileManager::commit(temp, &path)?;
//! ```

use crate::error::{CodecResult, CompressError};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

const TEMP_PREFIX: &str = ".compress-";

/// Manages file operations and discovery
pub struct FileManager;

impl FileManager {
    /// Size of a file in bytes
    pub async fn get_file_size(path: &Path) -> Result<u64> {
        Ok(fs::metadata(path).await?.len())
    }

    /// Find every archive with the given extension under `root`.
    ///
    /// The match is a case-sensitive suffix on the file name. Results are
    /// sorted so a directory sweep processes archives in a stable order.
    pub fn find_archives(root: &Path, extension: &str) -> Vec<PathBuf> {
        let suffix = format!(".{}", extension);
        let mut archives: Vec<PathBuf> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                e.file_name()
                    .to_str()
                    .map(|name| name.ends_with(&suffix))
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        archives.sort();
        archives
    }

    /// Create an empty temp file next to `original`, keeping its extension
    /// so encoders that pick a muxer from the output name still work.
    pub fn sibling_temp(original: &Path) -> CodecResult<NamedTempFile> {
        let parent = match original.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let suffix = original
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(&suffix)
            .tempfile_in(parent)?;
        debug!("Created temp sibling {} for {}", temp.path().display(), original.display());
        Ok(temp)
    }

    /// Atomically replace `original` with the content of `temp`.
    ///
    /// Refuses an empty temp file: an encoder that exits cleanly without
    /// writing anything must not destroy the original.
    pub fn commit(temp: NamedTempFile, original: &Path) -> CodecResult<()> {
        let written = temp.as_file().metadata()?.len();
        if written == 0 {
            return Err(CompressError::EmptyOutput(original.to_path_buf()));
        }

        temp.persist(original).map_err(|e| CompressError::Io(e.error))?;
        debug!("Replaced {} ({} bytes)", original.display(), written);
        Ok(())
    }

    /// Remove a directory tree if present
    pub async fn remove_dir_if_exists(path: &Path) -> Result<()> {
        match fs::remove_dir_all(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction (negative when the file grew)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            ((original_size as f64 - new_size as f64) / original_size as f64) * 100.0
        }
    }
}
