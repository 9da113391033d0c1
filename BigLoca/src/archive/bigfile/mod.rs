//! `BigFile` index + volume format
//!
//! The index (`<stem>.idx`) is a 105-byte preamble followed by 28-byte
//! big-endian records. Each record names a byte range inside one numbered
//! volume: volume 0 is `<stem>.dat`, volume N is `<stem>.dNN`.

mod reader;
mod types;

pub use reader::{IndexReader, VolumeSet};
pub use types::*;

/// Default file stem of the archive
pub const DEFAULT_STEM: &str = "BigFile_PC";

/// Index file extension
pub const INDEX_EXTENSION: &str = "idx";

/// Extension of volume 0
pub const FIRST_VOLUME_EXTENSION: &str = "dat";

/// Bytes before the first index record
pub const INDEX_PREAMBLE_SIZE: usize = 105;

/// Size of one index record
pub const INDEX_RECORD_SIZE: usize = 28;
