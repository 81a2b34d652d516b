//! # EPUB Media Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (qualità immagini, bitrate audio, CRF video, opzioni)
//! 2. Configura il logging su stderr (INFO o DEBUG a seconda di `--verbose`)
//! 3. Carica la configurazione (file JSON opzionale) e applica gli override CLI
//! 4. Ottiene il path da processare: argomento posizionale o prompt interattivo
//! 5. Avvia la pipeline e riporta il riepilogo; exit code non zero se qualcosa è fallito
//!
//! ## Esempio di utilizzo:
//! ```bash
//! epub-compressor ~/Books --image 75 --audio 64000 --video 30
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use epub_media_compressor::{prompt, Codecs, Config, Pipeline};

#[derive(Parser)]
#[command(name = "epub-compressor")]
#[command(about = "Shrink EPUB files by re-encoding the images, audio and video inside them")]
struct Args {
    /// Archive file or directory of archives (prompted for when omitted)
    path: Option<PathBuf>,

    /// Image quality (1-100)
    #[arg(short = 'i', long = "image")]
    image: Option<u8>,

    /// Audio bitrate in bits per second (.wav and .flac are re-muxed losslessly and ignore it)
    #[arg(short = 'a', long = "audio")]
    audio: Option<u32>,

    /// Video CRF (0-51, lower = better quality)
    #[arg(short = 'v', long = "video")]
    video: Option<u8>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Stop a directory run at the first archive that fails
    #[arg(long)]
    fail_fast: bool,

    /// Write "<name> - Compressed.<ext>" instead of replacing the archive
    #[arg(long)]
    keep_original: bool,

    /// Path to the ffmpeg executable
    #[arg(long)]
    ffmpeg: Option<PathBuf>,

    /// Video codec passed to ffmpeg
    #[arg(long)]
    video_codec: Option<String>,

    /// Kill an encoder that runs longer than this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Archive extension to process, without the dot
    #[arg(long)]
    extension: Option<String>,

    /// Verbose logging
    #[arg(long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, config: &mut Config) {
        if let Some(quality) = self.image {
            config.image_quality = quality;
        }
        if let Some(bitrate) = self.audio {
            config.audio_bitrate = bitrate;
        }
        if let Some(crf) = self.video {
            config.video_crf = crf;
        }
        if let Some(ref codec) = self.video_codec {
            config.video_codec = codec.clone();
        }
        if let Some(ref ext) = self.extension {
            config.archive_extension = ext.clone();
        }
        if let Some(ref ffmpeg) = self.ffmpeg {
            config.ffmpeg_path = Some(ffmpeg.clone());
        }
        if let Some(secs) = self.timeout {
            config.encoder_timeout_secs = Some(secs);
        }
        config.fail_fast |= self.fail_fast;
        config.keep_original |= self.keep_original;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match args.config {
        Some(ref path) => Config::from_file(path)
            .await
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    args.apply(&mut config);
    config.validate()?;

    let path = match args.path {
        Some(ref path) => {
            if !path.exists() {
                return Err(anyhow::anyhow!("Path does not exist: {}", path.display()));
            }
            path.clone()
        }
        None => {
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            prompt::prompt_for_path(&mut stdin.lock(), &mut stdout.lock())?
        }
    };

    println!("Running...");

    let codecs = Codecs::new(&config);
    if !codecs.ffmpeg_available() {
        warn!(
            "⚠️ ffmpeg not found ({}): audio and video files will fail individually",
            codecs.ffmpeg().display()
        );
    }

    let pipeline = Pipeline::new(config, codecs)?;
    let summary = pipeline.run(&path).await?;
    info!("{}", summary.stats().format_summary());

    println!("Done.");

    if !summary.is_success() {
        for failure in &summary.failed {
            eprintln!("❌ {}", failure);
        }
        for report in &summary.completed {
            for file in &report.media.failures {
                eprintln!("❌ {}: {}", report.archive.display(), file.error);
            }
        }
        return Err(anyhow::anyhow!(
            "{} archives failed, {} media files could not be compressed",
            summary.failed.len(),
            summary.completed.iter().map(|r| r.media.failures.len()).sum::<usize>()
        ));
    }

    Ok(())
}
