//! Application error types

use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Recoverable Errors (scoped to one viewer, continue) =====
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Malformed asset path {path:?}: {reason}")]
    MalformedAssetPath { path: String, reason: String },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image decode error: {0}")]
    ImageDecode(String),

    #[error("Fullscreen request rejected: {0}")]
    FullscreenRejected(String),

    // ===== Recoverable (internal recovery attempt) =====
    #[error("GPU device lost")]
    GpuLost,

    // ===== Fatal Errors (start-up only) =====
    #[error("System resource exhaustion: {0}")]
    SystemResource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Initialization failed: {0}")]
    Init(String),
}

impl AppError {
    /// Is this error recoverable?
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Io(_)
                | AppError::FileNotFound(_)
                | AppError::MalformedAssetPath { .. }
                | AppError::UnsupportedFormat(_)
                | AppError::ImageDecode(_)
                | AppError::FullscreenRejected(_)
                | AppError::GpuLost
        )
    }

    /// Is this a fatal error?
    pub fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Get a user-friendly message
    pub fn user_message(&self) -> String {
        match self {
            AppError::FileNotFound(path) => format!("Image not found: {}", path),
            AppError::MalformedAssetPath { path, .. } => format!("Unrecognised asset path: {}", path),
            AppError::UnsupportedFormat(ext) => format!("Unsupported format: {}", ext),
            AppError::ImageDecode(msg) => format!("Cannot load image: {}", msg),
            AppError::FullscreenRejected(_) => "Fullscreen is not available right now".to_string(),
            AppError::GpuLost => "Display device reset. Reloading...".to_string(),
            _ => self.to_string(),
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        AppError::MalformedAssetPath {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<image::ImageError> for AppError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::Unsupported(u) => AppError::UnsupportedFormat(u.to_string()),
            image::ImageError::IoError(io) => AppError::Io(io),
            other => AppError::ImageDecode(other.to_string()),
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(e: toml::de::Error) -> Self {
        AppError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(AppError::FileNotFound("/x.jpg".into()).is_recoverable());
        assert!(AppError::malformed("/a/b", "missing date").is_recoverable());
        assert!(AppError::FullscreenRejected("busy".into()).is_recoverable());
        assert!(AppError::Config("bad".into()).is_fatal());
        assert!(AppError::Init("no gpu".into()).is_fatal());
    }

    #[test]
    fn test_user_message() {
        let e = AppError::FileNotFound("/Images/panoramas/20241007/room02.jpg".into());
        assert_eq!(e.user_message(), "Image not found: /Images/panoramas/20241007/room02.jpg");
    }
}
