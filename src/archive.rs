//! # Archive Transcoder
//!
//! Converte un archivio (EPUB o altro contenitore zip) in una directory di
//! lavoro e viceversa.
//!
//! ## Operazioni:
//! - `extract()`: estrae tutte le entry in una directory; l'archivio sorgente
//!   viene solo letto, nome e contenuto restano invariati
//! - `pack()`: crea `<nome directory>.<ext>` accanto alla directory e la elimina
//! - `pack_into()`: come `pack()` ma con destinazione esplicita
//!
//! ## Regole di impacchettamento:
//! - `mimetype` alla radice viene scritto per primo e non compresso (requisito EPUB)
//! - Le altre entry sono deflate, in ordine di path
//! - Le directory vuote vengono conservate come entry directory
//! - L'archivio viene scritto in un temporaneo e rinominato sulla destinazione
//!   solo a scrittura completata
//!
//! - Le date di modifica delle entry estratte vengono riportate nell'archivio
//!   ricostruito; le entry nuove ricevono la data di default del formato zip
//!
//! Entry con path che escono dalla directory di destinazione vengono rifiutate.

use crate::error::{CodecResult, CompressError};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

const MIMETYPE: &str = "mimetype";

/// Last-modified stamp of each entry, keyed by `/`-joined relative path
pub type EntryTimes = BTreeMap<String, DateTime>;

/// What `extract` wrote
#[derive(Debug, Default)]
pub struct Extracted {
    pub files: usize,
    pub modified: EntryTimes,
}

/// Moves archive contents between a zip container and a working directory
#[derive(Debug, Clone)]
pub struct ArchiveTranscoder {
    extension: String,
}

impl ArchiveTranscoder {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Unpack `archive` into `dest_dir`, recording each entry's timestamp
    pub fn extract(&self, archive: &Path, dest_dir: &Path) -> CodecResult<Extracted> {
        info!("Extracting {}...", display_name(archive));

        let file = File::open(archive)?;
        let mut zip = ZipArchive::new(BufReader::new(file))?;
        fs::create_dir_all(dest_dir)?;

        let mut extracted = Extracted::default();
        for index in 0..zip.len() {
            let mut entry = zip.by_index(index)?;
            let relative = entry
                .enclosed_name()
                .ok_or_else(|| CompressError::UnsafeEntry(entry.name().to_string()))?;
            let target = dest_dir.join(&relative);
            if let Some(modified) = entry.last_modified() {
                extracted.modified.insert(entry_name(&relative)?, modified);
            }

            if entry.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(&target)?);
            io::copy(&mut entry, &mut out)?;
            out.flush()?;
            extracted.files += 1;
        }

        debug!("Extracted {} files from {}", extracted.files, archive.display());
        Ok(extracted)
    }

    /// Archive `working_dir` as `<working_dir>.<ext>` beside it, then delete it
    pub fn pack(&self, working_dir: &Path, modified: &EntryTimes) -> CodecResult<PathBuf> {
        let name = working_dir
            .file_name()
            .ok_or_else(|| CompressError::Validation(format!("Cannot pack {}", working_dir.display())))?;
        let mut file_name = name.to_os_string();
        file_name.push(".");
        file_name.push(&self.extension);
        let destination = working_dir.with_file_name(file_name);

        self.pack_into(working_dir, &destination, modified)?;
        Ok(destination)
    }

    /// Archive `working_dir` into `destination`, then delete `working_dir`.
    ///
    /// Returns the number of files stored. An existing `destination` is only
    /// replaced once the new archive is fully written. Entries found in
    /// `modified` keep that timestamp.
    pub fn pack_into(&self, working_dir: &Path, destination: &Path, modified: &EntryTimes) -> CodecResult<usize> {
        info!("Archiving {}...", display_name(destination));

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp = tempfile::Builder::new()
            .prefix(".compress-")
            .suffix(&format!(".{}", self.extension))
            .tempfile_in(parent)?;

        let files = {
            let mut writer = ZipWriter::new(BufWriter::new(temp.as_file_mut()));
            let files = write_entries(&mut writer, working_dir, modified)?;
            writer.finish()?.flush()?;
            files
        };

        temp.persist(destination).map_err(|e| CompressError::Io(e.error))?;
        fs::remove_dir_all(working_dir)?;

        debug!("Stored {} files in {}", files, destination.display());
        Ok(files)
    }
}

fn write_entries<W: Write + io::Seek>(
    writer: &mut ZipWriter<W>,
    root: &Path,
    modified: &EntryTimes,
) -> CodecResult<usize> {
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    let dated = |options: SimpleFileOptions, name: &str| match modified.get(name) {
        Some(time) => options.last_modified_time(*time),
        None => options,
    };
    let mut files = 0;

    let mimetype = root.join(MIMETYPE);
    if mimetype.is_file() {
        writer.start_file(MIMETYPE, dated(stored, MIMETYPE))?;
        io::copy(&mut File::open(&mimetype)?, writer)?;
        files += 1;
    }

    for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| CompressError::Io(e.into()))?;
        let path = entry.path();
        let relative = path.strip_prefix(root).map_err(|_| {
            CompressError::Validation(format!("{} is outside {}", path.display(), root.display()))
        })?;
        let name = entry_name(relative)?;

        if entry.file_type().is_dir() {
            if fs::read_dir(path)?.next().is_none() {
                let options = dated(deflated, &name);
                writer.add_directory(name, options)?;
            }
            continue;
        }
        if name == MIMETYPE {
            continue;
        }

        let size = entry.metadata().map_err(|e| CompressError::Io(e.into()))?.len();
        let options = dated(deflated, &name).large_file(size > u32::MAX as u64);
        writer.start_file(name, options)?;
        io::copy(&mut File::open(path)?, writer)?;
        files += 1;
    }

    Ok(files)
}

/// Zip entry name for a relative path: components joined with `/`
fn entry_name(relative: &Path) -> CodecResult<String> {
    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str()
                .to_str()
                .map(str::to_owned)
                .ok_or_else(|| CompressError::UnsafeEntry(relative.display().to_string()))
        })
        .collect::<CodecResult<Vec<String>>>()?;
    Ok(parts.join("/"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{read_zip, write_zip};
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    const BOOK: &[(&str, &[u8])] = &[
        ("mimetype", b"application/epub+zip"),
        ("META-INF/container.xml", b"<container/>"),
        ("OEBPS/images/cover.jpg", b"jpeg bytes"),
        ("OEBPS/text/chapter1.xhtml", b"<html/>"),
    ];

    #[test]
    fn test_extract_leaves_archive_untouched() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("book.epub");
        write_zip(&archive, BOOK);
        let before = std::fs::read(&archive).unwrap();

        let work = dir.path().join("book - Compressed");
        let extracted = ArchiveTranscoder::new("epub").extract(&archive, &work).unwrap();

        assert_eq!(extracted.files, 4);
        assert_eq!(std::fs::read(work.join("OEBPS/text/chapter1.xhtml")).unwrap(), b"<html/>");
        assert_eq!(std::fs::read(&archive).unwrap(), before);
    }

    #[test]
    fn test_round_trip_keeps_every_path() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("book.epub");
        write_zip(&archive, BOOK);
        let transcoder = ArchiveTranscoder::new("epub");

        let work = dir.path().join("book - Compressed");
        let extracted = transcoder.extract(&archive, &work).unwrap();
        let packed = transcoder.pack(&work, &extracted.modified).unwrap();

        assert_eq!(packed, dir.path().join("book - Compressed.epub"));
        assert!(!work.exists());
        let original: BTreeSet<String> = read_zip(&archive).into_keys().collect();
        let rebuilt = read_zip(&packed);
        assert_eq!(rebuilt.keys().cloned().collect::<BTreeSet<_>>(), original);
        for (name, content) in BOOK {
            assert_eq!(rebuilt[*name].as_slice(), *content, "{name}");
        }
    }

    #[test]
    fn test_mimetype_is_first_and_stored() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("book");
        std::fs::create_dir_all(work.join("A")).unwrap();
        std::fs::write(work.join("A/first.xhtml"), b"alphabetically first").unwrap();
        std::fs::write(work.join("mimetype"), b"application/epub+zip").unwrap();

        let packed = ArchiveTranscoder::new("epub").pack(&work, &EntryTimes::new()).unwrap();

        let mut zip = ZipArchive::new(File::open(&packed).unwrap()).unwrap();
        let first = zip.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);
        drop(first);
        assert_eq!(zip.len(), 2);
    }

    #[test]
    fn test_pack_into_replaces_destination() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("book.epub");
        write_zip(&archive, &[("old.txt", b"old")]);
        let work = dir.path().join("work");
        std::fs::create_dir_all(&work).unwrap();
        std::fs::write(work.join("new.txt"), b"new").unwrap();

        let files = ArchiveTranscoder::new("epub").pack_into(&work, &archive, &EntryTimes::new()).unwrap();

        assert_eq!(files, 1);
        let entries = read_zip(&archive);
        assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["new.txt"]);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }

    #[test]
    fn test_empty_directories_survive() {
        let dir = TempDir::new().unwrap();
        let work = dir.path().join("book");
        std::fs::create_dir_all(work.join("OEBPS/fonts")).unwrap();
        std::fs::write(work.join("OEBPS/content.opf"), b"opf").unwrap();

        let packed = ArchiveTranscoder::new("epub").pack(&work, &EntryTimes::new()).unwrap();
        let restored = dir.path().join("restored");
        ArchiveTranscoder::new("epub").extract(&packed, &restored).unwrap();

        assert!(restored.join("OEBPS/fonts").is_dir());
        assert!(restored.join("OEBPS/content.opf").is_file());
    }

    #[test]
    fn test_entry_timestamps_survive_repack() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("book.epub");
        let stamp = DateTime::from_date_and_time(2019, 6, 1, 12, 30, 0).unwrap();
        let mut writer = ZipWriter::new(File::create(&archive).unwrap());
        let options = SimpleFileOptions::default().last_modified_time(stamp);
        writer.start_file("mimetype", options).unwrap();
        writer.write_all(b"application/epub+zip").unwrap();
        writer.start_file("OEBPS/text/chapter1.xhtml", options).unwrap();
        writer.write_all(b"<html/>").unwrap();
        writer.finish().unwrap();
        let transcoder = ArchiveTranscoder::new("epub");

        let work = dir.path().join("book - Compressed");
        let extracted = transcoder.extract(&archive, &work).unwrap();
        std::fs::write(work.join("added.css"), b"body {}").unwrap();
        transcoder.pack_into(&work, &archive, &extracted.modified).unwrap();

        let mut zip = ZipArchive::new(File::open(&archive).unwrap()).unwrap();
        for name in ["mimetype", "OEBPS/text/chapter1.xhtml"] {
            let entry = zip.by_name(name).unwrap();
            assert_eq!(entry.last_modified(), Some(stamp), "{name}");
        }
        assert!(zip.by_name("added.css").is_ok());
    }

    #[test]
    fn test_corrupt_archive_is_an_error() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.epub");
        std::fs::write(&archive, b"this is not a zip file").unwrap();

        let err = ArchiveTranscoder::new("epub")
            .extract(&archive, &dir.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, CompressError::Archive(_)));
    }

    #[test]
    fn test_entry_name_uses_forward_slashes() {
        let relative = Path::new("OEBPS").join("images").join("cover.jpg");
        assert_eq!(entry_name(&relative).unwrap(), "OEBPS/images/cover.jpg");
    }
}
