//! Index iteration and volume reads

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::path::PathBuf;

use super::{ArchiveRecord, INDEX_PREAMBLE_SIZE, INDEX_RECORD_SIZE};
use crate::archive::read_full;
use crate::error::{Error, Result};

/// Lazy iterator over the records of an index file.
///
/// Ends cleanly when a read at a record boundary returns no bytes. A partial
/// record yields one [`Error::IndexTruncated`] and then ends.
pub struct IndexReader<R: Read> {
    reader: R,
    position: u64,
    finished: bool,
}

impl<R: Read> IndexReader<R> {
    /// Skip the preamble and position at the first record
    ///
    /// # Errors
    /// Returns [`Error::IndexTruncated`] if the preamble is incomplete.
    pub fn new(mut reader: R) -> Result<Self> {
        let mut preamble = [0u8; INDEX_PREAMBLE_SIZE];
        let read = read_full(&mut reader, &mut preamble)?;
        if read < INDEX_PREAMBLE_SIZE {
            return Err(Error::IndexTruncated {
                offset: 0,
                read,
                expected: INDEX_PREAMBLE_SIZE,
            });
        }

        Ok(Self {
            reader,
            position: INDEX_PREAMBLE_SIZE as u64,
            finished: false,
        })
    }

    fn read_record(&mut self) -> Result<Option<ArchiveRecord>> {
        let mut bytes = [0u8; INDEX_RECORD_SIZE];
        let read = read_full(&mut self.reader, &mut bytes)?;
        match read {
            0 => Ok(None),
            INDEX_RECORD_SIZE => {
                self.position += INDEX_RECORD_SIZE as u64;
                Ok(Some(ArchiveRecord::parse(&bytes)))
            }
            partial => Err(Error::IndexTruncated {
                offset: self.position,
                read: partial,
                expected: INDEX_RECORD_SIZE,
            }),
        }
    }
}

impl<R: Read> Iterator for IndexReader<R> {
    type Item = Result<ArchiveRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for IndexReader<R> {}

/// Open volume handles for one pass over the index.
///
/// Handles are released when the set is dropped, including on early return.
pub struct VolumeSet<R: Read + Seek> {
    volumes: BTreeMap<u32, R>,
}

impl VolumeSet<BufReader<File>> {
    /// Open every discovered volume file
    ///
    /// # Errors
    /// Returns [`Error::Io`] if a volume cannot be opened.
    pub fn open(paths: &BTreeMap<u32, PathBuf>) -> Result<Self> {
        let mut volumes = BTreeMap::new();
        for (&index, path) in paths {
            volumes.insert(index, BufReader::new(File::open(path)?));
        }
        tracing::debug!("opened {} volumes", volumes.len());
        Ok(Self { volumes })
    }
}

impl<R: Read + Seek> VolumeSet<R> {
    /// Build a set from already open readers keyed by volume number
    pub fn from_readers(readers: impl IntoIterator<Item = (u32, R)>) -> Self {
        Self {
            volumes: readers.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }

    #[must_use]
    pub fn contains(&self, index: u32) -> bool {
        self.volumes.contains_key(&index)
    }

    /// Read the byte range of `record`
    ///
    /// # Errors
    /// Returns [`Error::VolumeMissing`] if the record's volume is not in the set,
    /// [`Error::RecordTruncated`] if the range runs past the end of the volume.
    pub fn read(&mut self, record: &ArchiveRecord) -> Result<Vec<u8>> {
        let volume = self
            .volumes
            .get_mut(&record.volume_index)
            .ok_or(Error::VolumeMissing {
                index: record.volume_index,
                record_id: record.record_id,
            })?;

        let end = volume.seek(SeekFrom::End(0))?;
        let available = end.saturating_sub(u64::from(record.offset));
        if u64::from(record.size) > available {
            return Err(Error::RecordTruncated {
                record_id: record.record_id,
                volume: record.volume_index,
                offset: record.offset,
                size: record.size,
                available: usize::try_from(available).unwrap_or(usize::MAX),
            });
        }

        volume.seek(SeekFrom::Start(u64::from(record.offset)))?;
        let mut data = vec![0u8; record.size as usize];
        volume.read_exact(&mut data)?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn record_bytes(words: [u32; 7]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    fn index_with(records: &[[u32; 7]]) -> Vec<u8> {
        let mut data = vec![0u8; INDEX_PREAMBLE_SIZE];
        for r in records {
            data.extend(record_bytes(*r));
        }
        data
    }

    #[test]
    fn test_iterates_records_then_ends() {
        let data = index_with(&[[1016, 1, 1, 0, 4, 0, 0], [29, 1, 2, 4, 8, 1, 1]]);
        let records: Vec<_> = IndexReader::new(Cursor::new(data))
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].type_tag, 29);
        assert_eq!(records[1].volume_index, 1);
    }

    #[test]
    fn test_empty_index_after_preamble() {
        let mut reader = IndexReader::new(Cursor::new(vec![0u8; INDEX_PREAMBLE_SIZE])).unwrap();
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_short_preamble() {
        assert!(matches!(
            IndexReader::new(Cursor::new(vec![0u8; 40])),
            Err(Error::IndexTruncated { offset: 0, read: 40, expected: 105 })
        ));
    }

    #[test]
    fn test_partial_record_is_truncation() {
        let mut data = index_with(&[[1016, 1, 1, 0, 4, 0, 0]]);
        data.extend([0u8; 10]);
        let mut reader = IndexReader::new(Cursor::new(data)).unwrap();
        assert!(reader.next().unwrap().is_ok());
        assert!(matches!(
            reader.next(),
            Some(Err(Error::IndexTruncated { offset: 133, read: 10, expected: 28 }))
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_volume_read() {
        let mut volumes = VolumeSet::from_readers([(0, Cursor::new(b"abcdefgh".to_vec()))]);
        let record = ArchiveRecord::parse(&record_bytes([1016, 1, 7, 2, 3, 0, 0]).try_into().unwrap());
        assert_eq!(volumes.read(&record).unwrap(), b"cde");
    }

    #[test]
    fn test_oversized_record_is_truncated() {
        let mut volumes = VolumeSet::from_readers([(0, Cursor::new(vec![0u8; 16]))]);
        let record = ArchiveRecord::parse(&record_bytes([1016, 1, 9, 10, 32, 0, 0]).try_into().unwrap());
        assert!(matches!(
            volumes.read(&record),
            Err(Error::RecordTruncated { record_id: 9, available: 6, .. })
        ));
    }

    #[test]
    fn test_missing_volume() {
        let mut volumes = VolumeSet::from_readers([(0, Cursor::new(vec![0u8; 16]))]);
        let record = ArchiveRecord::parse(&record_bytes([1016, 1, 5, 0, 1, 0, 3]).try_into().unwrap());
        assert!(matches!(
            volumes.read(&record),
            Err(Error::VolumeMissing { index: 3, record_id: 5 })
        ));
    }
}
