//! `BigFile` archive access
//!
//! Locates the index and volumes of an archive directory, iterates index
//! records and reads their raw bytes.

pub mod bigfile;
mod discovery;
mod operations;
mod scan;

use std::io::{self, Read};

pub use bigfile::{
    ArchiveRecord, DEFAULT_STEM, ExtractPhase, ExtractProgress, IndexReader, ProgressCallback,
    TypeSummary, VolumeSet, record_type_name,
};
pub use discovery::{index_path, list_volumes, volume_path};
pub use operations::{Archive, ArchiveOperations};
pub use scan::{
    DEFAULT_SCAN_BUFFER_SIZE, ScanHit, encode_needle, find_offsets, scan_reader, scan_volumes,
};

/// Read until `buf` is full or the reader is exhausted, returning the count
pub(crate) fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
