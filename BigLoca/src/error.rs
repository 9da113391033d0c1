//! Error types for `BigLoca`

use std::path::PathBuf;

use thiserror::Error;

/// The error type for `BigLoca` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Archive Errors ====================
    /// The archive index file does not exist.
    #[error("archive index not found: {path}")]
    IndexMissing {
        /// The expected path to the index file.
        path: PathBuf,
    },

    /// The index ended in the middle of its preamble or of a record.
    #[error("index truncated at byte {offset}: read {read} of {expected} bytes")]
    IndexTruncated {
        /// Byte offset in the index where the short read started.
        offset: u64,
        /// Number of bytes actually available.
        read: usize,
        /// Number of bytes the structure requires.
        expected: usize,
    },

    /// A record references a volume that is not present in the archive directory.
    #[error("volume {index} not found (referenced by record {record_id})")]
    VolumeMissing {
        /// The volume number.
        index: u32,
        /// The record that referenced it.
        record_id: u32,
    },

    /// A record's byte range runs past the end of its volume.
    #[error(
        "record {record_id} truncated: volume {volume} holds {available} of {size} bytes at offset {offset}"
    )]
    RecordTruncated {
        /// The record id from the index.
        record_id: u32,
        /// The volume number.
        volume: u32,
        /// Start of the record inside the volume.
        offset: u32,
        /// Declared record size.
        size: u32,
        /// Bytes actually read before the volume ended.
        available: usize,
    },

    // ==================== Localization Format Errors ====================
    /// The buffer does not contain the `LOCALIZ_` magic token.
    #[error("missing LOCALIZ_ magic token")]
    MissingMagicToken,

    /// The container header carries a variant code other than 5 or 6.
    #[error("unknown container variant: {0} (expected 5 or 6)")]
    UnknownVariant(u32),

    /// The declared container size disagrees with the buffer length.
    #[error("container size mismatch: declared {declared}, buffer implies {expected}")]
    SizeMismatch {
        /// Size stored in the header.
        declared: u32,
        /// Size derived from the buffer length.
        expected: usize,
    },

    /// A language block did not start with the `01 03 00 00` tag.
    #[error("bad language tag at offset {offset}: found {found:02X?}")]
    BadLanguageTag {
        /// Offset of the expected tag.
        offset: usize,
        /// The bytes found instead (up to 4).
        found: Vec<u8>,
    },

    /// A multi-key pointer value started with a byte other than 0 or 1.
    #[error("unknown pointer tag {tag:#04x} at offset {offset}")]
    UnknownPointerTag {
        /// Offset of the pointer value.
        offset: usize,
        /// The leading byte.
        tag: u8,
    },

    /// A length field would read past the end of the buffer.
    #[error("{field} at offset {offset} needs {needed} bytes, only {available} remain")]
    KeyLengthOverflow {
        /// What was being read.
        field: &'static str,
        /// Cursor offset of the read.
        offset: usize,
        /// Bytes required.
        needed: usize,
        /// Bytes remaining in the buffer.
        available: usize,
    },

    /// Key or locale bytes are not ASCII.
    #[error("{field} at offset {offset} is not ASCII")]
    InvalidAscii {
        /// What was being decoded.
        field: &'static str,
        /// Offset of the bytes.
        offset: usize,
    },

    /// Text bytes are not valid UTF-16.
    #[error("invalid UTF-16 text at offset {offset}: {reason}")]
    InvalidText {
        /// Offset of the text bytes.
        offset: usize,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A container failed to decode; wraps the violated invariant.
    #[error("container {record_id}_{flag} (type {type_tag}): {source}")]
    Container {
        /// Record id from the index.
        record_id: u32,
        /// Flag word from the index.
        flag: u32,
        /// Record type tag.
        type_tag: u32,
        /// The underlying format error.
        #[source]
        source: Box<Error>,
    },

    // ==================== Output / Search Errors ====================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Directory traversal error.
    #[error("directory walk error: {0}")]
    WalkDirError(String),

    /// Invalid search or scan parameters.
    #[error("invalid search: {0}")]
    InvalidSearch(String),

    /// An option value could not be parsed.
    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl Error {
    /// Whether this error is a structural violation inside one container,
    /// as opposed to an I/O or archive-level failure.
    #[must_use]
    pub fn is_format_error(&self) -> bool {
        match self {
            Error::MissingMagicToken
            | Error::UnknownVariant(_)
            | Error::SizeMismatch { .. }
            | Error::BadLanguageTag { .. }
            | Error::UnknownPointerTag { .. }
            | Error::KeyLengthOverflow { .. }
            | Error::InvalidAscii { .. }
            | Error::InvalidText { .. } => true,
            Error::Container { source, .. } => source.is_format_error(),
            _ => false,
        }
    }
}

// Add conversion from walkdir::Error
impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Error::WalkDirError(err.to_string())
    }
}

/// A specialized Result type for `BigLoca` operations.
pub type Result<T> = std::result::Result<T, Error>;
