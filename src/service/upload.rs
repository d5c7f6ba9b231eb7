use std::path::{Path, PathBuf};
use thiserror::Error;

/// 500 MiB
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Extensions offered by the file picker; the MIME check is authoritative
pub const ACCEPTED_EXTENSIONS: [&str; 5] = ["mp4", "mov", "avi", "mkv", "webm"];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please select a video file")]
    NotAVideo { mime: String },

    #[error("File size must be less than 500MB")]
    TooLarge { size: u64, max: u64 },

    #[error("File is empty")]
    Empty,

    #[error("Cannot read file: {0}")]
    Io(String),
}

/// A local file that passed the client-side checks and may be sent
#[derive(Debug, Clone)]
pub struct VideoUpload {
    path: PathBuf,
    file_name: String,
    mime: String,
    size: u64,
}

impl VideoUpload {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path).map_err(|e| UploadError::Io(e.to_string()))?;
        if !metadata.is_file() {
            return Err(UploadError::Io(format!("{} is not a file", path.display())));
        }

        let mime = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());

        Self::validate(&mime, metadata.len())?;

        tracing::info!("Upload accepted: {} ({}, {} bytes)", file_name, mime, metadata.len());

        Ok(Self {
            path: path.to_path_buf(),
            file_name,
            mime,
            size: metadata.len(),
        })
    }

    /// Checks applied before any request is issued
    pub fn validate(mime: &str, size: u64) -> Result<(), UploadError> {
        if size > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                size,
                max: MAX_UPLOAD_BYTES,
            });
        }
        if !mime.starts_with("video/") {
            return Err(UploadError::NotAVideo {
                mime: mime.to_string(),
            });
        }
        if size == 0 {
            return Err(UploadError::Empty);
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}
