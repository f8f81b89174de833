// SPDX-License-Identifier: AGPL-3.0-or-later
//! Editor error type

use std::path::PathBuf;

use folio_core::ConversionError;

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    #[error("Selection {start}..{end} is not valid in a buffer of {len} bytes")]
    InvalidSelection { start: usize, end: usize, len: usize },
}

impl EditorError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, EditorError>;
