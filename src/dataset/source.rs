//! Dataset sources.
//!
//! A source returns the full textual content of the reference dataset.
//! The cache decides when to call it; the source never caches.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// The dataset path is missing or unreadable.
    #[error("Cannot read dataset {path}: {source}")]
    FileAccess {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The dataset is not valid UTF-8 text.
    #[error("Dataset {path} is not valid UTF-8")]
    Encoding { path: String },
}

/// Anything that can produce the dataset text.
pub trait DatasetSource: Send + Sync + std::fmt::Debug {
    /// Read the full dataset content.
    fn load(&self) -> Result<String, DatasetError>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

/// Reads the dataset from a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DatasetSource for FileSource {
    fn load(&self) -> Result<String, DatasetError> {
        let bytes = fs::read(&self.path).map_err(|source| DatasetError::FileAccess {
            path: self.path.display().to_string(),
            source,
        })?;

        String::from_utf8(bytes).map_err(|_| DatasetError::Encoding {
            path: self.path.display().to_string(),
        })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_file_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "This is a test file.\nLine 2.\nLine 3.").unwrap();

        let source = FileSource::new(file.path());
        assert_eq!(source.load().unwrap(), "This is a test file.\nLine 2.\nLine 3.");
    }

    #[test]
    fn missing_file_is_file_access_error() {
        let source = FileSource::new("/nonexistent/dataset.txt");
        let err = source.load().unwrap_err();
        assert!(matches!(err, DatasetError::FileAccess { .. }));
        assert!(err.to_string().contains("/nonexistent/dataset.txt"));
    }

    #[test]
    fn binary_file_is_encoding_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0xff, 0xfe, 0x00]).unwrap();

        let err = FileSource::new(file.path()).load().unwrap_err();
        assert!(matches!(err, DatasetError::Encoding { .. }));
    }
}
