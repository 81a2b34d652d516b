//! # Pipeline Orchestrator
//!
//! Questo è il modulo che orchestra l'intero processo per ogni archivio.
//!
//! ## Flusso per archivio:
//! 1. **Extracting**: estrae l'archivio in `<nome> - Compressed` (sovrascritta se esiste)
//! 2. **Compressing**: il walker ricomprime i media nella directory di lavoro
//! 3. **Packing**: ricrea l'archivio ed elimina la directory di lavoro
//! 4. **Done**
//!
//! Nessun retry: un errore interrompe l'archivio corrente, la directory di
//! lavoro viene rimossa e l'archivio originale resta intatto (l'impacchettamento
//! sostituisce la destinazione solo a scrittura completata).
//!
//! ## Modalità directory:
//! - Raccoglie prima tutti gli archivi (ricorsivamente), poi li processa in ordine
//! - Di default i fallimenti sono isolati per archivio; con `fail_fast` la
//!   scansione si interrompe al primo archivio fallito
//! - Al termine produce un `RunSummary` con archivi completati e falliti
//!
//! Esecuzioni concorrenti sugli stessi path non sono protette da lock:
//! è responsabilità del chiamante evitarle.

use crate::{
    archive::ArchiveTranscoder,
    codec::MediaCodec,
    config::Config,
    file_manager::FileManager,
    progress::{ProgressManager, RunStats},
    walker::{compress_media, WalkReport},
};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Marker appended to an archive's stem to name its working directory
pub const WORKING_DIR_SUFFIX: &str = " - Compressed";

/// Per-archive pipeline state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Extracting,
    Compressing,
    Packing,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Extracting => "extracting",
            Self::Compressing => "compressing",
            Self::Packing => "packing",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// A successfully rebuilt archive
#[derive(Debug)]
pub struct ArchiveReport {
    pub archive: PathBuf,
    pub output: PathBuf,
    pub files: usize,
    pub size_before: u64,
    pub size_after: u64,
    pub media: WalkReport,
}

/// An archive whose pipeline stopped early
#[derive(Debug)]
pub struct ArchiveFailure {
    pub archive: PathBuf,
    pub stage: Stage,
    pub error: anyhow::Error,
}

impl fmt::Display for ArchiveFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed while {}: {:#}", self.archive.display(), self.stage, self.error)
    }
}

/// Result of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub completed: Vec<ArchiveReport>,
    pub failed: Vec<ArchiveFailure>,
}

impl RunSummary {
    /// True when every archive was rebuilt and every media file compressed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.completed.iter().all(|r| r.media.is_clean())
    }

    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::new();
        for report in &self.completed {
            stats.add_archive(report);
        }
        for _ in &self.failed {
            stats.add_failed_archive();
        }
        stats
    }
}

/// Extract → compress → pack, for one archive or a directory of them
pub struct Pipeline<C> {
    config: Config,
    codec: C,
    transcoder: ArchiveTranscoder,
}

impl<C: MediaCodec> Pipeline<C> {
    pub fn new(config: Config, codec: C) -> Result<Self> {
        config.validate()?;
        let transcoder = ArchiveTranscoder::new(config.archive_extension.clone());
        Ok(Self {
            config,
            codec,
            transcoder,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// `<dir>/<stem> - Compressed` for `<dir>/<stem>.<ext>`
    pub fn working_dir_for(&self, archive: &Path) -> Result<PathBuf> {
        let stem = self.archive_stem(archive)?;
        Ok(archive.with_file_name(format!("{}{}", stem, WORKING_DIR_SUFFIX)))
    }

    /// Where the rebuilt archive goes: over the source, or beside it
    pub fn output_path_for(&self, archive: &Path) -> Result<PathBuf> {
        if !self.config.keep_original {
            return Ok(archive.to_path_buf());
        }
        let stem = self.archive_stem(archive)?;
        Ok(archive.with_file_name(format!(
            "{}{}.{}",
            stem, WORKING_DIR_SUFFIX, self.config.archive_extension
        )))
    }

    fn archive_stem(&self, archive: &Path) -> Result<String> {
        let suffix = format!(".{}", self.config.archive_extension);
        let name = archive
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| anyhow::anyhow!("Invalid archive path: {}", archive.display()))?;
        match name.strip_suffix(&suffix) {
            Some(stem) if !stem.is_empty() => Ok(stem.to_string()),
            _ => Err(anyhow::anyhow!(
                "{} is not a .{} archive",
                archive.display(),
                self.config.archive_extension
            )),
        }
    }

    /// Process a single archive file or every archive under a directory
    pub async fn run(&self, input: &Path) -> Result<RunSummary> {
        if input.is_file() {
            let mut summary = RunSummary::default();
            match self.process_archive(input).await {
                Ok(report) => summary.completed.push(report),
                Err(failure) => {
                    error!("{}", failure);
                    summary.failed.push(failure);
                }
            }
            return Ok(summary);
        }

        if input.is_dir() {
            return self.run_directory(input).await;
        }

        Err(anyhow::anyhow!("Input path does not exist: {}", input.display()))
    }

    async fn run_directory(&self, root: &Path) -> Result<RunSummary> {
        let mut archives = FileManager::find_archives(root, &self.config.archive_extension);
        if self.config.keep_original {
            // Outputs of an earlier --keep-original run are not inputs
            let output_suffix = format!("{}.{}", WORKING_DIR_SUFFIX, self.config.archive_extension);
            archives.retain(|archive| {
                let is_output = archive
                    .file_name()
                    .and_then(|n| n.to_str())
                    .map(|n| n.ends_with(&output_suffix))
                    .unwrap_or(false);
                if is_output {
                    debug!("Skipping earlier output {}", archive.display());
                }
                !is_output
            });
        }
        info!("Found {} .{} archives in {}", archives.len(), self.config.archive_extension, root.display());

        let mut summary = RunSummary::default();
        if archives.is_empty() {
            return Ok(summary);
        }

        let progress = ProgressManager::new(archives.len() as u64);
        for archive in archives {
            let name = archive.file_name().unwrap_or_default().to_string_lossy().into_owned();
            progress.set_message(&format!("📚 {}", name));

            match self.process_archive(&archive).await {
                Ok(report) => {
                    let message = if report.media.is_clean() {
                        format!(
                            "✅ {}: {:.1}% saved",
                            name,
                            FileManager::calculate_reduction(report.size_before, report.size_after)
                        )
                    } else {
                        format!("⚠️ {}: {} media errors", name, report.media.failures.len())
                    };
                    progress.update(&message);
                    summary.completed.push(report);
                }
                Err(failure) => {
                    error!("{}", failure);
                    progress.update(&format!("❌ {}: error", name));
                    if self.config.fail_fast {
                        progress.finish(&summary.stats().format_summary());
                        return Err(anyhow::anyhow!("Aborting directory sweep: {}", failure));
                    }
                    summary.failed.push(failure);
                }
            }
        }

        progress.finish(&summary.stats().format_summary());
        Ok(summary)
    }

    /// Run extract → compress → pack for one archive.
    ///
    /// The working directory never outlives the call.
    pub async fn process_archive(&self, archive: &Path) -> std::result::Result<ArchiveReport, ArchiveFailure> {
        let mut stage = Stage::Extracting;
        let working_dir = self.working_dir_for(archive).map_err(|error| ArchiveFailure {
            archive: archive.to_path_buf(),
            stage,
            error,
        })?;

        match self.run_stages(archive, &working_dir, &mut stage).await {
            Ok(report) => Ok(report),
            Err(error) => {
                if let Err(e) = FileManager::remove_dir_if_exists(&working_dir).await {
                    warn!("Failed to remove working directory {}: {}", working_dir.display(), e);
                }
                Err(ArchiveFailure {
                    archive: archive.to_path_buf(),
                    stage,
                    error,
                })
            }
        }
    }

    async fn run_stages(&self, archive: &Path, working_dir: &Path, stage: &mut Stage) -> Result<ArchiveReport> {
        let size_before = FileManager::get_file_size(archive).await?;
        let output = self.output_path_for(archive)?;

        *stage = Stage::Extracting;
        if working_dir.exists() {
            debug!("Overwriting existing working directory {}", working_dir.display());
            FileManager::remove_dir_if_exists(working_dir).await?;
        }
        let extracted = self
            .transcoder
            .extract(archive, working_dir)
            .with_context(|| format!("Failed to extract {}", archive.display()))?;

        *stage = Stage::Compressing;
        let media = compress_media(working_dir, &self.config, &self.codec).await?;

        *stage = Stage::Packing;
        let files = self
            .transcoder
            .pack_into(working_dir, &output, &extracted.modified)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        let size_after = FileManager::get_file_size(&output).await?;

        *stage = Stage::Done;
        info!(
            "📦 {}: {} files, {} media compressed, {} failed, {} -> {} ({:.1}% saved)",
            output.display(),
            files,
            media.compressed(),
            media.failures.len(),
            FileManager::format_size(size_before),
            FileManager::format_size(size_after),
            FileManager::calculate_reduction(size_before, size_after)
        );

        Ok(ArchiveReport {
            archive: archive.to_path_buf(),
            output,
            files,
            size_before,
            size_after,
            media,
        })
    }
}
