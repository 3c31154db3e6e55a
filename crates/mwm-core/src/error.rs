//! Error types for the mwm-core library.
//!
//! Structural problems (bad section bounds, record cursor mismatches, EOF in
//! the middle of a field) and unrecognised schemas are hard failures. Unknown
//! codes inside otherwise valid data never reach this module: they are
//! represented by fallback values where they are decoded.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mwm operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying file could not be read
    Io,
    /// Directory or section bounds are invalid, or a record does not end
    /// where it declares
    MalformedContainer,
    /// A metadata, feature-section or id-map sub-format is not recognised
    UnsupportedSchema,
    /// The stream ended in the middle of a field
    TruncatedRecord,
}

/// Comprehensive error type for all mwm operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to open or read an input file
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure on an already opened reader
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A directory entry points outside of the file
    #[error("section '{name}' at {offset}+{size} exceeds file length {file_len}")]
    SectionOutOfBounds {
        /// Section name
        name: String,
        /// Declared start offset
        offset: u64,
        /// Declared length
        size: u64,
        /// Actual file length
        file_len: u64,
    },

    /// Structurally invalid container data
    #[error("malformed container at offset {offset}: {details}")]
    MalformedContainer {
        /// Absolute byte offset where the problem was detected
        offset: u64,
        /// Detailed description of the issue
        details: String,
    },

    /// A feature record consumed more bytes than its declared length
    #[error("feature record {index} overran its end at {declared_end} (cursor at {position})")]
    RecordOverrun {
        /// Index of the feature within the stream
        index: u32,
        /// Absolute offset where the record should have ended
        declared_end: u64,
        /// Absolute offset the decoder reached
        position: u64,
    },

    /// End of data in the middle of a fixed-size field
    #[error("truncated record at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedRecord {
        /// Absolute byte offset of the field
        offset: u64,
        /// Bytes the field requires
        needed: usize,
        /// Bytes left in the section
        available: usize,
    },

    /// Unrecognised on-disk sub-format
    #[error("unsupported {what} schema (format {format})")]
    UnsupportedSchema {
        /// Which structure could not be decoded
        what: &'static str,
        /// The discriminating format or version number
        format: u32,
    },

    /// A string field is not valid UTF-8
    #[error("invalid UTF-8 text at offset {offset}")]
    InvalidText {
        /// Absolute byte offset of the string payload
        offset: u64,
    },

    /// The version section stores an impossible calendar date
    #[error("invalid build date {value}")]
    InvalidDate {
        /// Raw stored value
        value: u64,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new malformed container error
    pub fn malformed(offset: u64, details: impl Into<String>) -> Self {
        Self::MalformedContainer {
            offset,
            details: details.into(),
        }
    }

    /// Creates a new truncated record error
    pub fn truncated(offset: u64, needed: usize, available: usize) -> Self {
        Self::TruncatedRecord {
            offset,
            needed,
            available,
        }
    }

    /// Creates a new unsupported schema error
    pub fn unsupported(what: &'static str, format: u32) -> Self {
        Self::UnsupportedSchema { what, format }
    }

    /// Returns the taxonomy bucket this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileRead { .. } | Self::Io(_) => ErrorKind::Io,
            Self::SectionOutOfBounds { .. }
            | Self::MalformedContainer { .. }
            | Self::RecordOverrun { .. }
            | Self::InvalidText { .. }
            | Self::InvalidDate { .. } => ErrorKind::MalformedContainer,
            Self::UnsupportedSchema { .. } => ErrorKind::UnsupportedSchema,
            Self::TruncatedRecord { .. } => ErrorKind::TruncatedRecord,
        }
    }

    /// Returns true if the error indicates corrupted bytes rather than
    /// an I/O failure or an unknown schema
    pub fn is_corruption(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::MalformedContainer | ErrorKind::TruncatedRecord
        )
    }
}
