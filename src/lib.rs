//! # EPUB Media Compressor Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per codec e archivi
//! - `media`: Classificazione dei file per estensione
//! - `file_manager`: Discovery archivi e sostituzione atomica dei file
//! - `platform` / `tool_runner`: Risoluzione ed esecuzione di ffmpeg
//! - `image_processor` / `audio_processor` / `video_processor`: Encoder per classe
//! - `codec`: Trait `MediaCodec` e implementazione reale
//! - `walker`: Ricompressione dei media in una directory di lavoro
//! - `archive`: Estrazione e ricostruzione del contenitore zip
//! - `pipeline`: Orchestratore extract → compress → pack
//! - `progress`: Progress bar e statistiche
//! - `prompt`: Richiesta interattiva del path
//!
//! ## Utilizzo:
//! ```ignore
//! use epub_media_compressor::{Codecs, Config, Pipeline};
//!
//! let config = Config::default();
//! let pipeline = Pipeline::new(config.clone(), Codecs::new(&config))?;
//! let summary = pipeline.run(&path).await?;
//! ```

pub mod archive;
pub mod audio_processor;
pub mod codec;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod media;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod prompt;
pub mod tool_runner;
pub mod video_processor;
pub mod walker;

#[cfg(test)]
mod test_fixtures;

pub use archive::ArchiveTranscoder;
pub use codec::{Codecs, MediaCodec};
pub use config::Config;
pub use error::CompressError;
pub use media::MediaClass;
pub use pipeline::{Pipeline, RunSummary, Stage};
pub use walker::compress_media;
