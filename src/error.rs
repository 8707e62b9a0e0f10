use std::path::PathBuf;

/// error type for treeclone operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported file type with mode {mode:o} for {path}")]
    UnsupportedFileType { path: PathBuf, mode: u32 },

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("xattr error on {path}: {message}")]
    Xattr { path: PathBuf, message: String },

    #[error("invalid digest hex: {0}")]
    InvalidDigestHex(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
