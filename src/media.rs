//! Media classification by file name suffix.
//!
//! Matching is case-sensitive: `cover.JPG` is not an image. This mirrors how
//! ebook tooling treats archive entry names, which are case-sensitive paths.

use std::fmt;
use std::path::Path;

pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg", ".tiff", ".bmp", ".gif"];
pub const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".aac", ".wav", ".flac"];
pub const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".wmv", ".flv", ".avi"];

/// Kind of media a file holds, decided from its name alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaClass {
    Image,
    Audio,
    Video,
    Unclassified,
}

impl MediaClass {
    /// Classify a bare file name
    pub fn from_file_name(name: &str) -> Self {
        let has_suffix = |set: &[&str]| set.iter().any(|ext| name.ends_with(ext));

        if has_suffix(IMAGE_EXTENSIONS) {
            Self::Image
        } else if has_suffix(AUDIO_EXTENSIONS) {
            Self::Audio
        } else if has_suffix(VIDEO_EXTENSIONS) {
            Self::Video
        } else {
            Self::Unclassified
        }
    }

    /// Classify a path by its final component
    pub fn from_path(path: &Path) -> Self {
        match path.file_name().and_then(|name| name.to_str()) {
            Some(name) => Self::from_file_name(name),
            None => Self::Unclassified,
        }
    }

    pub fn is_media(&self) -> bool {
        !matches!(self, Self::Unclassified)
    }
}

impl fmt::Display for MediaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::Unclassified => "unclassified",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_image_extensions() {
        for name in ["a.png", "a.jpg", "a.jpeg", "a.tiff", "a.bmp", "a.gif"] {
            assert_eq!(MediaClass::from_file_name(name), MediaClass::Image, "{name}");
        }
    }

    #[test]
    fn test_audio_extensions() {
        for name in ["a.mp3", "a.aac", "a.wav", "a.flac"] {
            assert_eq!(MediaClass::from_file_name(name), MediaClass::Audio, "{name}");
        }
    }

    #[test]
    fn test_video_extensions() {
        for name in ["a.mp4", "a.mov", "a.wmv", "a.flv", "a.avi"] {
            assert_eq!(MediaClass::from_file_name(name), MediaClass::Video, "{name}");
        }
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        assert_eq!(MediaClass::from_file_name("COVER.JPG"), MediaClass::Unclassified);
        assert_eq!(MediaClass::from_file_name("Intro.Mp3"), MediaClass::Unclassified);
    }

    #[test]
    fn test_other_files_are_unclassified() {
        for name in ["chapter1.xhtml", "content.opf", "mimetype", "style.css", "cover.webp", "jpg"] {
            assert_eq!(MediaClass::from_file_name(name), MediaClass::Unclassified, "{name}");
        }
        assert!(!MediaClass::Unclassified.is_media());
    }

    #[test]
    fn test_from_path_uses_file_name_only() {
        let path = PathBuf::from("images.mp4/text/chapter.xhtml");
        assert_eq!(MediaClass::from_path(&path), MediaClass::Unclassified);

        let path = PathBuf::from("OEBPS/images/cover.jpg");
        assert_eq!(MediaClass::from_path(&path), MediaClass::Image);
    }
}
