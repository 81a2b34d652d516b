//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking e le statistiche di una run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar per la scansione di una directory di archivi
//! - `RunStats`: statistiche cumulative (archivi, media, byte)
//!
//! ## Statistiche tracciate:
//! - **archives_completed** / **archives_failed**
//! - **media_compressed** / **media_failed**
//! - **bytes_before** / **bytes_after**: dimensione totale degli archivi ricostruiti
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:02:15] [========================================] 12/12 (100%) ✅ book.epub: 41.2% saved
//! ```
//!
//! La progress bar scrive su stderr e si nasconde da sola quando stderr
//! non è un terminale.

use crate::file_manager::FileManager;
use crate::pipeline::ArchiveReport;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting over a batch of archives
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    pub fn new(total_archives: u64) -> Self {
        let bar = ProgressBar::new(total_archives);

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-");
        bar.set_style(style);
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one archive and show `message`
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    pub fn set_message(&self, message: &str) {
        self.bar.set_message(message.to_string());
    }

    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics accumulated over a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub archives_completed: usize,
    pub archives_failed: usize,
    pub media_compressed: usize,
    pub media_failed: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_archive(&mut self, report: &ArchiveReport) {
        self.archives_completed += 1;
        self.media_compressed += report.media.compressed();
        self.media_failed += report.media.failures.len();
        self.bytes_before += report.size_before;
        self.bytes_after += report.size_after;
    }

    pub fn add_failed_archive(&mut self) {
        self.archives_failed += 1;
    }

    pub fn bytes_saved(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Archives: {} done, {} failed | Media: {} compressed, {} failed | {} -> {} (saved {}, {:.1}%)",
            self.archives_completed,
            self.archives_failed,
            self.media_compressed,
            self.media_failed,
            FileManager::format_size(self.bytes_before),
            FileManager::format_size(self.bytes_after),
            FileManager::format_size(self.bytes_saved()),
            FileManager::calculate_reduction(self.bytes_before, self.bytes_after)
        )
    }
}
