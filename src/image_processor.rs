//! # Image Processing Module
//!
//! Questo modulo ricomprime le immagini usando il crate `image`.
//!
//! ## Pipeline di compressione:
//! 1. **Rilevamento formato**: dal contenuto del file, con fallback sull'estensione
//! 2. **Decodifica**: errore se il file non è un'immagine decodificabile
//! 3. **Ricodifica nello stesso formato**:
//!    - JPEG: qualità configurabile (`image_quality`)
//!    - PNG: compressione massima con filtro adattivo (lossless, qualità ignorata)
//!    - GIF/BMP/TIFF: riserializzazione con l'encoder di default
//! 4. **Sostituzione atomica** tramite temporaneo fratello, solo se il risultato è più piccolo
//!
//! La ricodifica scarta i metadati ancillari (EXIF, chunk testuali PNG).
//! Nome ed estensione del file non cambiano mai.

use crate::error::{CodecResult, CompressError};
use crate::file_manager::FileManager;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, DynamicImage, ImageEncoder, ImageFormat};
use std::io::{Cursor, Write};
use std::path::Path;
use tracing::debug;

/// Re-encodes raster images in their own format
pub struct ImageProcessor;

impl ImageProcessor {
    /// Re-encode the image at `path` with the given quality, in place.
    ///
    /// Fails without touching the file when it cannot be decoded. A re-encode
    /// that is not smaller than the original is discarded.
    pub fn compress(path: &Path, quality: u8) -> CodecResult<()> {
        let original_size = std::fs::metadata(path)?.len();
        let mut reader = image::io::Reader::open(path)?.with_guessed_format()?;
        let format = match reader.format() {
            Some(format) => format,
            None => {
                let format = ImageFormat::from_path(path)?;
                reader.set_format(format);
                format
            }
        };

        let img = reader.decode()?;
        debug!(
            "Decoded {} as {:?} ({}x{}, {:?})",
            path.display(),
            format,
            img.width(),
            img.height(),
            img.color()
        );

        let encoded = Self::encode(&img, format, quality)?;
        if encoded.is_empty() {
            return Err(CompressError::EmptyOutput(path.to_path_buf()));
        }
        // Palette PNGs decode to truecolor and can grow on re-encode
        if encoded.len() as u64 >= original_size {
            debug!(
                "Keeping original {}: re-encode is {} bytes, original {}",
                path.display(),
                encoded.len(),
                original_size
            );
            return Ok(());
        }

        let mut temp = FileManager::sibling_temp(path)?;
        temp.write_all(&encoded)?;
        temp.flush()?;
        FileManager::commit(temp, path)
    }

    /// Encode a decoded image into `format`
    pub fn encode(img: &DynamicImage, format: ImageFormat, quality: u8) -> CodecResult<Vec<u8>> {
        let mut buf = Cursor::new(Vec::new());

        match format {
            ImageFormat::Jpeg => {
                let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality);
                // JPEG has no alpha channel and no 16-bit mode
                if img.color() == ColorType::L8 {
                    let luma = img.to_luma8();
                    encoder.encode(luma.as_raw(), luma.width(), luma.height(), ColorType::L8)?;
                } else {
                    let rgb = img.to_rgb8();
                    encoder.encode(rgb.as_raw(), rgb.width(), rgb.height(), ColorType::Rgb8)?;
                }
            }
            ImageFormat::Png => {
                let encoder =
                    PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
                encoder.write_image(img.as_bytes(), img.width(), img.height(), img.color())?;
            }
            other => img.write_to(&mut buf, other)?,
        }

        Ok(buf.into_inner())
    }
}
