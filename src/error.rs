//! Error types for encoding and decoding.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors that can occur while compressing a byte stream.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("failed to read source: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write destination: {0}")]
    Write(#[source] io::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EncodeError {
    /// Attach the failing path to a stream-level I/O error.
    pub fn at(self, source_path: &Path, destination_path: &Path) -> Self {
        match self {
            EncodeError::Read(source) => EncodeError::Io {
                path: source_path.to_path_buf(),
                source,
            },
            EncodeError::Write(source) => EncodeError::Io {
                path: destination_path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

/// Errors that can occur while decompressing a byte stream.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("failed to read source: {0}")]
    Read(#[source] io::Error),

    #[error("failed to write destination: {0}")]
    Write(#[source] io::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt header: {0}")]
    CorruptHeader(String),

    #[error("corrupt payload: {0}")]
    CorruptPayload(String),
}

impl DecodeError {
    /// Attach the failing path to a stream-level I/O error.
    pub fn at(self, source_path: &Path, destination_path: &Path) -> Self {
        match self {
            DecodeError::Read(source) => DecodeError::Io {
                path: source_path.to_path_buf(),
                source,
            },
            DecodeError::Write(source) => DecodeError::Io {
                path: destination_path.to_path_buf(),
                source,
            },
            other => other,
        }
    }
}

pub type EncodeResult<T> = Result<T, EncodeError>;
pub type DecodeResult<T> = Result<T, DecodeError>;
