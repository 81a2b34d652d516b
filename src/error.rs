//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore custom usati da codec e archivi.
//!
//! ## Responsabilità:
//! - Definisce `CompressError` per categorizzare i fallimenti per singolo file
//! - Conserva exit status e stderr degli encoder esterni
//! - Integra con `thiserror` per automatic error conversion
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (permessi, disco pieno, collisioni di path)
//! - `Image`: Immagine non decodificabile o non ricodificabile
//! - `Archive`: Contenitore zip corrotto o non supportato
//! - `Encoder`: Encoder esterno terminato con exit status non zero
//! - `EmptyOutput`: Encoder terminato con successo ma senza output
//! - `Timeout`: Encoder esterno bloccato oltre il limite configurato
//! - `MissingDependency`: Tool esterno mancante (ffmpeg)
//! - `UnsafeEntry`: Entry dell'archivio con path fuori dalla directory di lavoro
//! - `Validation`: Errori di validazione input
//!
//! Gli strati superiori (pipeline, CLI) convertono in `anyhow::Error`
//! aggiungendo contesto.

use std::path::PathBuf;

/// Custom error types for media compression and archive handling
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("{tool} failed on {} ({status}): {stderr}", .path.display())]
    Encoder {
        tool: String,
        path: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("Encoder produced no output for {}", .0.display())]
    EmptyOutput(PathBuf),

    #[error("Encoder timed out after {secs}s on {}", .path.display())]
    Timeout { path: PathBuf, secs: u64 },

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("Unsafe entry path in archive: {0}")]
    UnsafeEntry(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result alias for codec and archive operations
pub type CodecResult<T> = std::result::Result<T, CompressError>;
