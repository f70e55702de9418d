use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The backing table is missing, unreadable, or lacks required columns.
    #[error("content table {}: {reason}", path.display())]
    DataSource { path: PathBuf, reason: String },
}

impl Error {
    #[must_use]
    pub fn data_source(path: &Path, reason: impl std::fmt::Display) -> Self {
        Self::DataSource {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
