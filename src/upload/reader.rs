//! File-reading capability for upload sources.
//!
//! The orchestrator only sees file contents through the [`ImageReader`]
//! trait, so tests can substitute an in-memory source.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use walkdir::WalkDir;

/// Extensions accepted when expanding a directory selection
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp"];

/// Asynchronous access to selected image files
#[allow(async_fn_in_trait)]
pub trait ImageReader {
    /// Read a file and encode its content as a base64 `data:` URL.
    async fn read_data_url(&self, path: &Path) -> Result<String>;
}

/// Reader backed by the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageReader;

impl ImageReader for FsImageReader {
    async fn read_data_url(&self, path: &Path) -> Result<String> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image file: {}", path.display()))?;
        Ok(encode_data_url(&bytes, mime_for_path(path)))
    }
}

fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

/// MIME type for the data URL, guessed from the file extension
fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand a mix of files and directories into a flat, ordered file list.
///
/// Explicitly named files are kept as-is; directories are walked recursively
/// and contribute their image files in sorted order.
pub fn collect_image_files(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|p| is_image_file(p))
                .collect();
            found.sort();
            files.extend(found);
        } else if path.is_file() {
            files.push(path.clone());
        } else {
            anyhow::bail!("No such file or directory: {}", path.display());
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_encode_data_url() {
        let url = encode_data_url(b"hello", "image/png");
        assert_eq!(url, "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_mime_for_path() {
        assert_eq!(mime_for_path(Path::new("a.png")), "image/png");
        assert_eq!(mime_for_path(Path::new("a.JPG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.tiff")), "image/tiff");
        assert_eq!(mime_for_path(Path::new("a.txt")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_fs_reader_produces_data_url() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("img.png");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"not really a png").unwrap();

        let reader = FsImageReader;
        let url = reader.read_data_url(&path).await.unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[tokio::test]
    async fn test_fs_reader_missing_file() {
        let reader = FsImageReader;
        let err = reader
            .read_data_url(Path::new("/nonexistent/img.png"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read image file"));
    }

    #[test]
    fn test_collect_image_files_expands_directories() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            File::create(temp_dir.path().join(name)).unwrap();
        }
        let direct = temp_dir.path().join("direct.tiff");
        File::create(&direct).unwrap();

        let files =
            collect_image_files(&[temp_dir.path().to_path_buf(), direct.clone()]).unwrap();

        // Directory contributes its image files sorted; the explicit file
        // follows in argument order (it also matched the directory walk).
        assert!(files.contains(&temp_dir.path().join("a.jpg")));
        assert!(files.contains(&temp_dir.path().join("b.png")));
        assert!(!files.contains(&temp_dir.path().join("notes.txt")));
        assert_eq!(files.last(), Some(&direct));
    }

    #[test]
    fn test_collect_image_files_missing_path() {
        let err = collect_image_files(&[PathBuf::from("/nonexistent/dir")]).unwrap_err();
        assert!(err.to_string().contains("No such file or directory"));
    }
}
