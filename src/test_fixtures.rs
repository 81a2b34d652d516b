use crate::codec::MediaCodec;
use crate::error::{CodecResult, CompressError};
use crate::media::MediaClass;
use image::codecs::jpeg::JpegEncoder;
use image::{ImageOutputFormat, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Write an executable `/bin/sh` script named `name` into `dir`
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Stand-in for ffmpeg: writes a fixed payload to its last argument
#[cfg(unix)]
pub fn fake_ffmpeg(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-ffmpeg",
        "for last; do :; done\nprintf 'encoded by fake ffmpeg' > \"$last\"",
    )
}

fn noisy_gradient() -> RgbImage {
    RgbImage::from_fn(64, 64, |x, y| {
        let noise = (x.wrapping_mul(7919) ^ y.wrapping_mul(104_729)) % 61;
        Rgb([(x * 4) as u8, (y * 4) as u8, (noise * 4) as u8])
    })
}

pub fn sample_jpeg(quality: u8) -> Vec<u8> {
    let img = noisy_gradient();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode(img.as_raw(), img.width(), img.height(), image::ColorType::Rgb8)
        .unwrap();
    buf
}

pub fn sample_png() -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(noisy_gradient())
        .write_to(&mut buf, ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

/// 256x256 PNG with a 4-colour palette at 2 bits per pixel, filled with noise.
///
/// The IDAT stream uses a single stored deflate block, so the file is the
/// raw scanlines plus framing.
pub fn sample_indexed_png() -> Vec<u8> {
    fn crc32(bytes: &[u8]) -> u32 {
        let mut crc = 0xFFFF_FFFFu32;
        for &byte in bytes {
            crc ^= byte as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0xEDB8_8320 } else { crc >> 1 };
            }
        }
        !crc
    }

    fn adler32(bytes: &[u8]) -> u32 {
        let (mut a, mut b) = (1u32, 0u32);
        for &byte in bytes {
            a = (a + byte as u32) % 65_521;
            b = (b + a) % 65_521;
        }
        (b << 16) | a
    }

    fn chunk(png: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        png.extend((data.len() as u32).to_be_bytes());
        let start = png.len();
        png.extend(kind);
        png.extend(data);
        let crc = crc32(&png[start..]);
        png.extend(crc.to_be_bytes());
    }

    const SIDE: u32 = 256;
    let mut scanlines = Vec::new();
    let mut state = 0x1234_5678u32;
    for _ in 0..SIDE {
        scanlines.push(0);
        for _ in 0..SIDE / 4 {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            scanlines.push((state >> 24) as u8);
        }
    }

    let len = scanlines.len() as u16;
    let mut zlib = vec![0x78, 0x01, 0x01];
    zlib.extend(len.to_le_bytes());
    zlib.extend((!len).to_le_bytes());
    zlib.extend(&scanlines);
    zlib.extend(adler32(&scanlines).to_be_bytes());

    let mut ihdr = Vec::new();
    ihdr.extend(SIDE.to_be_bytes());
    ihdr.extend(SIDE.to_be_bytes());
    ihdr.extend([2, 3, 0, 0, 0]);

    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    chunk(&mut png, b"IHDR", &ihdr);
    chunk(&mut png, b"PLTE", &[0, 0, 0, 255, 0, 0, 0, 255, 0, 0, 0, 255]);
    chunk(&mut png, b"IDAT", &zlib);
    chunk(&mut png, b"IEND", &[]);
    png
}

/// Build a deflated zip at `path` from `(name, content)` pairs
pub fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
    let mut writer = ZipWriter::new(File::create(path).unwrap());
    for (name, content) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap();
}

/// File entries of the zip at `path`, keyed by entry name
pub fn read_zip(path: &Path) -> BTreeMap<String, Vec<u8>> {
    let mut zip = ZipArchive::new(File::open(path).unwrap()).unwrap();
    let mut entries = BTreeMap::new();
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index).unwrap();
        if entry.is_dir() {
            continue;
        }
        let mut content = Vec::new();
        entry.read_to_end(&mut content).unwrap();
        entries.insert(entry.name().to_string(), content);
    }
    entries
}

/// Codec double that records every call and rewrites the file it is given.
///
/// Image quality and CRF are widened to `u32` in the call log.
#[derive(Debug, Clone, Default)]
pub struct RecordingCodec {
    calls: Arc<Mutex<Vec<(MediaClass, PathBuf, u32)>>>,
    fail_on: Option<String>,
}

impl RecordingCodec {
    /// Fails (leaving the file untouched) for any file named `file_name`
    pub fn failing_on(file_name: &str) -> Self {
        Self {
            fail_on: Some(file_name.to_string()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(MediaClass, PathBuf, u32)> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, class: MediaClass, path: &Path, param: u32) -> CodecResult<()> {
        self.calls.lock().unwrap().push((class, path.to_path_buf(), param));

        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if self.fail_on.as_deref() == Some(name) {
            return Err(CompressError::Encoder {
                tool: "recording".to_string(),
                path: path.to_path_buf(),
                status: "exit status: 1".to_string(),
                stderr: "refused".to_string(),
            });
        }

        let mut content = b"compressed ".to_vec();
        content.extend(std::fs::read(path)?);
        std::fs::write(path, content)?;
        Ok(())
    }
}

impl MediaCodec for RecordingCodec {
    async fn compress_image(&self, path: &Path, quality: u8) -> CodecResult<()> {
        self.record(MediaClass::Image, path, quality as u32)
    }

    async fn compress_audio(&self, path: &Path, bitrate: u32) -> CodecResult<()> {
        self.record(MediaClass::Audio, path, bitrate)
    }

    async fn compress_video(&self, path: &Path, crf: u8) -> CodecResult<()> {
        self.record(MediaClass::Video, path, crf as u32)
    }
}
