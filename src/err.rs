use std::path::PathBuf;

use thiserror::Error;

use crate::qst_structure::Tag;

pub type Result<T> = std::result::Result<T, QstError>;
pub type DeserializationResult<T> = std::result::Result<T, DeserializationError>;

/// Errors raised while decoding the contents of a single section.
///
/// Apart from [`DeserializationError::UnknownTileFormat`], these never escape
/// [`crate::QstParser::parse`]; they are attached to the section they occurred in.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeserializationError {
    #[error("buffer too small for {what} at offset {offset} (need {need} bytes, have {have})")]
    Truncated {
        what: &'static str,
        offset: u64,
        need: usize,
        have: usize,
    },

    #[error("did not find {what} after offset {offset}")]
    NotFound { what: &'static str, offset: u64 },

    #[error("unexpected tile format {format} for tile {index} at offset {offset}")]
    UnknownTileFormat { format: u8, index: usize, offset: u64 },

    #[error("{what} is not supported for section revision {revision}")]
    UnsupportedLayout { what: &'static str, revision: u16 },

    #[error("invalid value {value} for {what} at offset {offset}")]
    InvalidValue {
        what: &'static str,
        value: u64,
        offset: u64,
    },
}

impl DeserializationError {
    /// Whether this error aborts the whole decode instead of only its section.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DeserializationError::UnknownTileFormat { .. })
    }
}

#[derive(Debug, Error)]
pub enum QstError {
    #[error("unrecognized preamble `{preamble}`")]
    UnrecognizedPreamble { preamble: String },

    #[error("quest files of the `{preamble}` family are not supported")]
    UnsupportedPreamble { preamble: String },

    #[error("corrupt container: no valid section header at or after offset {offset}")]
    CorruptContainer { offset: u64 },

    #[error("failed to decode section `{tag}`, caused by: {source}")]
    FatalSection {
        tag: Tag,
        #[source]
        source: DeserializationError,
    },

    #[error("failed to open file {}: {source}", path.display())]
    FailedToOpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
