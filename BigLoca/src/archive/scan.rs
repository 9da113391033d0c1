//! Raw byte search over volume files
//!
//! Finds where a key or text value is stored without decoding anything.
//! Keys are stored as ASCII, text as UTF-16LE.

use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use rayon::prelude::*;

use super::operations::Archive;
use super::read_full;
use crate::error::{Error, Result};

/// Default read chunk size
pub const DEFAULT_SCAN_BUFFER_SIZE: usize = 64 * 1024;

/// Offsets of a needle inside one volume file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanHit {
    pub volume: u32,
    pub path: PathBuf,
    /// Absolute byte offsets, ascending and distinct
    pub offsets: Vec<u64>,
}

/// Encode a search value the way the archive stores it
#[must_use]
pub fn encode_needle(value: &str, in_keys: bool) -> Vec<u8> {
    if in_keys {
        value.as_bytes().to_vec()
    } else {
        value.encode_utf16().flat_map(u16::to_le_bytes).collect()
    }
}

/// All start offsets of `needle` in `haystack`
#[must_use]
pub fn find_offsets(haystack: &[u8], needle: &[u8]) -> Vec<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return Vec::new();
    }
    haystack
        .windows(needle.len())
        .enumerate()
        .filter(|(_, window)| *window == needle)
        .map(|(pos, _)| pos)
        .collect()
}

fn check_scan_parameters(needle: &[u8], buffer_size: usize) -> Result<()> {
    if needle.is_empty() {
        return Err(Error::InvalidSearch("the search value is empty".to_string()));
    }
    if buffer_size <= needle.len() {
        return Err(Error::InvalidSearch(format!(
            "buffer size {buffer_size} must be bigger than the value length {}",
            needle.len()
        )));
    }
    Ok(())
}

/// Search a stream in `buffer_size` chunks.
///
/// Consecutive chunks overlap by `needle.len() - 1` bytes so a match split
/// across a chunk boundary is still found.
///
/// # Errors
/// Returns [`Error::InvalidSearch`] for an empty needle or a buffer not bigger
/// than the needle, and [`Error::Io`] on read failure.
pub fn scan_reader<R: Read>(mut reader: R, needle: &[u8], buffer_size: usize) -> Result<Vec<u64>> {
    check_scan_parameters(needle, buffer_size)?;

    let overlap = needle.len() - 1;
    let mut buffer = vec![0u8; buffer_size];
    let mut offsets = Vec::new();
    let mut carried = 0;
    let mut base: u64 = 0;

    loop {
        let wanted = buffer_size - carried;
        let read = read_full(&mut reader, &mut buffer[carried..])?;
        let filled = carried + read;

        offsets.extend(
            find_offsets(&buffer[..filled], needle)
                .into_iter()
                .map(|pos| base + pos as u64),
        );

        if read < wanted {
            break;
        }

        let keep = overlap.min(filled);
        buffer.copy_within(filled - keep..filled, 0);
        base += (filled - keep) as u64;
        carried = keep;
    }

    offsets.sort_unstable();
    offsets.dedup();
    Ok(offsets)
}

/// Search every volume of `archive` for `needle`.
///
/// Volumes are scanned in parallel; hits are returned in volume order, and
/// only volumes containing the needle are listed.
///
/// # Errors
/// Returns [`Error::InvalidSearch`] for bad parameters and [`Error::Io`] if a
/// volume cannot be read.
pub fn scan_volumes(archive: &Archive, needle: &[u8], buffer_size: usize) -> Result<Vec<ScanHit>> {
    check_scan_parameters(needle, buffer_size)?;

    let volumes: Vec<(u32, PathBuf)> = archive
        .list_volumes()
        .iter()
        .map(|(&index, path)| (index, path.clone()))
        .collect();
    tracing::info!(
        "scanning {} volumes for {} bytes",
        volumes.len(),
        needle.len()
    );

    let hits = volumes
        .into_par_iter()
        .map(|(volume, path)| -> Result<ScanHit> {
            let offsets = scan_reader(File::open(&path)?, needle, buffer_size)?;
            Ok(ScanHit {
                volume,
                path,
                offsets,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(hits.into_iter().filter(|hit| !hit.offsets.is_empty()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_find_offsets() {
        assert_eq!(find_offsets(b"abcabcab", b"ab"), vec![0, 3, 6]);
        assert_eq!(find_offsets(b"aaaa", b"aa"), vec![0, 1, 2]);
        assert!(find_offsets(b"ab", b"abc").is_empty());
    }

    #[test]
    fn test_match_across_chunk_boundary() {
        // With a 6-byte buffer "KEY" straddles the first two chunks
        let data = b"xxxxKEYxxxxKEY".to_vec();
        let offsets = scan_reader(Cursor::new(data), b"KEY", 6).unwrap();
        assert_eq!(offsets, vec![4, 11]);
    }

    #[test]
    fn test_chunked_matches_whole_buffer() {
        let data: Vec<u8> = (0..500u32).map(|i| (i % 7) as u8).collect();
        let needle = [3u8, 4, 5];
        let expected: Vec<u64> = find_offsets(&data, &needle)
            .into_iter()
            .map(|p| p as u64)
            .collect();
        for buffer_size in [4, 5, 16, 100, 1000] {
            let offsets = scan_reader(Cursor::new(data.clone()), &needle, buffer_size).unwrap();
            assert_eq!(offsets, expected, "buffer size {buffer_size}");
        }
    }

    #[test]
    fn test_rejects_bad_parameters() {
        assert!(matches!(
            scan_reader(Cursor::new(vec![0u8; 8]), b"", 8),
            Err(Error::InvalidSearch(_))
        ));
        assert!(matches!(
            scan_reader(Cursor::new(vec![0u8; 8]), b"abcd", 4),
            Err(Error::InvalidSearch(_))
        ));
    }

    #[test]
    fn test_text_needle_is_utf16() {
        assert_eq!(encode_needle("hi", false), vec![b'h', 0, b'i', 0]);
        assert_eq!(encode_needle("hi", true), b"hi".to_vec());
    }
}
