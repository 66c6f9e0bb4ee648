use actix_multipart::Multipart;
use futures::{StreamExt, TryStreamExt};
use log::warn;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Extensions accepted for upload, matched case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("No file provided")]
    NoFileProvided,
    #[error("No file selected")]
    EmptyFilename,
    #[error("Invalid file type")]
    UnsupportedType,
    #[error("File exceeds the upload limit of {0} bytes")]
    TooLarge(usize),
    #[error("Malformed upload payload: {0}")]
    Multipart(String),
    #[error("Upload I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl UploadError {
    /// Everything except filesystem failures is the client's fault.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, UploadError::Io(_))
    }
}

/// A validated file pulled out of the multipart body, not yet on disk.
pub struct IncomingFile {
    pub filename: String,
    pub data: Vec<u8>,
}

/// Drains the multipart stream looking for the `file` field, validating the
/// filename and extension and enforcing the byte cap while streaming.
pub async fn read_upload(
    payload: &mut Multipart,
    max_bytes: usize,
) -> Result<IncomingFile, UploadError> {
    while let Ok(Some(mut field)) = payload.try_next().await {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .unwrap_or_default()
            .to_string();
        if filename.is_empty() {
            return Err(UploadError::EmptyFilename);
        }
        if !allowed_file(&filename) {
            return Err(UploadError::UnsupportedType);
        }

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| UploadError::Multipart(e.to_string()))?;
            if data.len() + chunk.len() > max_bytes {
                return Err(UploadError::TooLarge(max_bytes));
            }
            data.extend_from_slice(&chunk);
        }
        return Ok(IncomingFile { filename, data });
    }

    Err(UploadError::NoFileProvided)
}

pub fn allowed_file(filename: &str) -> bool {
    filename
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ALLOWED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Reduces a client-supplied filename to a safe basename: last path
/// component only, everything outside `[A-Za-z0-9._-]` mapped to `_`, and
/// no leading dots.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Writes validated uploads into the scratch directory and removes them
/// once the prediction attempt is over.
#[derive(Clone)]
pub struct UploadHandler {
    dir: PathBuf,
    max_bytes: usize,
}

impl UploadHandler {
    pub fn new(dir: PathBuf, max_bytes: usize) -> Self {
        Self { dir, max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn save(&self, filename: &str, data: &[u8]) -> Result<PathBuf, UploadError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(sanitize_filename(filename));
        let mut file = fs::File::create(&path)?;
        file.write_all(data)?;
        Ok(path)
    }

    /// Best-effort removal; a leftover file under a crashed process is an
    /// accepted gap.
    pub fn cleanup(&self, path: &Path) {
        if !path.exists() {
            return;
        }
        if let Err(e) = fs::remove_file(path) {
            warn!("Failed to remove uploaded file {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("guava-upload-{}-{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn every_allowed_extension_is_accepted() {
        for ext in ALLOWED_EXTENSIONS {
            assert!(allowed_file(&format!("leaf.{ext}")), "rejected .{ext}");
        }
        assert!(allowed_file("LEAF.JPG"));
        assert!(allowed_file(".png"));
    }

    #[test]
    fn other_extensions_are_rejected() {
        assert!(!allowed_file("leaf.tiff"));
        assert!(!allowed_file("leaf.exe"));
        assert!(!allowed_file("noextension"));
        assert!(!allowed_file(""));
    }

    #[test]
    fn sanitize_strips_path_components_and_unsafe_characters() {
        assert_eq!(sanitize_filename("leaf.png"), "leaf.png");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("..\\..\\boot.ini"), "boot.ini");
        assert_eq!(sanitize_filename("my leaf (1).jpg"), "my_leaf__1_.jpg");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
        assert_eq!(sanitize_filename("dir/"), "upload");
    }

    #[test]
    fn save_then_cleanup_round_trip() {
        let dir = scratch_dir("roundtrip");
        let handler = UploadHandler::new(dir.clone(), 1024);
        let path = handler.save("leaf.png", b"not really a png").unwrap();
        assert!(path.exists());
        assert_eq!(path, dir.join("leaf.png"));
        handler.cleanup(&path);
        assert!(!path.exists());
        // Removing an already-missing file stays silent.
        handler.cleanup(&path);
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn save_creates_missing_upload_directory() {
        let dir = scratch_dir("create").join("nested");
        let handler = UploadHandler::new(dir.clone(), 1024);
        let path = handler.save("leaf.bmp", b"data").unwrap();
        assert!(path.exists());
        fs::remove_dir_all(dir.parent().unwrap()).ok();
    }
}
