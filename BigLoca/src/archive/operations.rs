//! High-level archive operations

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use super::bigfile::{
    ArchiveRecord, DEFAULT_STEM, ExtractPhase, ExtractProgress, INDEX_PREAMBLE_SIZE,
    INDEX_RECORD_SIZE, IndexReader, ProgressCallback, TypeSummary, VolumeSet, record_type_name,
};
use super::discovery::{index_path, list_volumes};
use crate::error::{Error, Result};

/// An archive directory: one index file and its numbered volumes
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
    stem: String,
    index_path: PathBuf,
    volumes: BTreeMap<u32, PathBuf>,
}

impl Archive {
    /// Open the archive in `dir` with the default `BigFile_PC` stem
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`] if the index file does not exist.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        Self::with_stem(dir, DEFAULT_STEM)
    }

    /// Open the archive in `dir` whose files are named `<stem>.*`
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`] if the index file does not exist, or
    /// [`Error::WalkDirError`] if the directory cannot be listed.
    pub fn with_stem<P: AsRef<Path>>(dir: P, stem: &str) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let index_path = index_path(&dir, stem);
        if !index_path.is_file() {
            return Err(Error::IndexMissing { path: index_path });
        }
        let volumes = list_volumes(&dir, stem)?;

        Ok(Self {
            dir,
            stem: stem.to_string(),
            index_path,
            volumes,
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn stem(&self) -> &str {
        &self.stem
    }

    #[must_use]
    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    /// Discovered volume files keyed by volume number
    #[must_use]
    pub fn list_volumes(&self) -> &BTreeMap<u32, PathBuf> {
        &self.volumes
    }

    /// Number of records the index holds, from its file size
    ///
    /// # Errors
    /// Returns [`Error::Io`] if the index metadata cannot be read.
    pub fn record_count(&self) -> Result<usize> {
        let len = usize::try_from(fs::metadata(&self.index_path)?.len()).unwrap_or(usize::MAX);
        Ok(len.saturating_sub(INDEX_PREAMBLE_SIZE) / INDEX_RECORD_SIZE)
    }

    /// Iterate the index lazily
    ///
    /// # Errors
    /// Returns [`Error::Io`] or [`Error::IndexTruncated`] if the preamble
    /// cannot be read.
    pub fn records(&self) -> Result<IndexReader<BufReader<File>>> {
        IndexReader::new(BufReader::new(File::open(&self.index_path)?))
    }

    /// Open every volume for one pass
    ///
    /// # Errors
    /// Returns [`Error::Io`] if a volume cannot be opened.
    pub fn open_volumes(&self) -> Result<VolumeSet<BufReader<File>>> {
        VolumeSet::open(&self.volumes)
    }

    /// Visit the records matching `type_filter` with their bytes.
    ///
    /// Index errors end the pass. A failed volume read is handed to `visit`,
    /// which decides whether to continue. Volumes stay open for the whole pass
    /// and are closed on every exit path.
    ///
    /// # Errors
    /// Returns index errors, and any error returned by `visit`.
    pub fn visit_records<F>(
        &self,
        type_filter: Option<u32>,
        progress: ProgressCallback,
        mut visit: F,
    ) -> Result<usize>
    where
        F: FnMut(ArchiveRecord, Result<Vec<u8>>) -> Result<()>,
    {
        let total = self.record_count()?;
        let mut volumes = self.open_volumes()?;
        let mut visited = 0;

        tracing::info!(
            "reading index {} ({} records, {} volumes)",
            self.index_path.display(),
            total,
            volumes.len()
        );

        for (i, record) in self.records()?.enumerate() {
            let record = record?;
            if type_filter.is_some_and(|tag| tag != record.type_tag) {
                continue;
            }
            progress(&ExtractProgress::with_item(
                ExtractPhase::ReadingIndex,
                i + 1,
                total,
                record.file_name(),
            ));
            let data = volumes.read(&record);
            visit(record, data)?;
            visited += 1;
        }

        tracing::debug!("visited {visited} records");
        Ok(visited)
    }

    /// All index records, in index order
    ///
    /// # Errors
    /// Returns index read errors.
    pub fn list(&self) -> Result<Vec<ArchiveRecord>> {
        self.records()?.collect()
    }

    /// Record counts and byte totals per type tag, ordered by tag
    ///
    /// # Errors
    /// Returns index read errors.
    pub fn summarize(&self) -> Result<Vec<TypeSummary>> {
        let mut by_type: BTreeMap<u32, TypeSummary> = BTreeMap::new();
        for record in self.records()? {
            let record = record?;
            let summary = by_type.entry(record.type_tag).or_insert_with(|| TypeSummary {
                type_tag: record.type_tag,
                name: record_type_name(record.type_tag),
                ..TypeSummary::default()
            });
            summary.count += 1;
            summary.total_size += u64::from(record.size);
        }
        Ok(by_type.into_values().collect())
    }

    /// Read every record of `type_tag`, failing on the first bad record
    ///
    /// # Errors
    /// Returns index errors, [`Error::VolumeMissing`] or [`Error::RecordTruncated`].
    pub fn read_records(
        &self,
        type_tag: u32,
        progress: ProgressCallback,
    ) -> Result<Vec<(ArchiveRecord, Vec<u8>)>> {
        let mut out = Vec::new();
        self.visit_records(Some(type_tag), progress, |record, data| {
            out.push((record, data?));
            Ok(())
        })?;
        Ok(out)
    }

    /// Write records verbatim to `<dest>/<type_tag>/<record_id>_<flag_byte>`
    ///
    /// Returns the number of files written.
    ///
    /// # Errors
    /// Returns read errors, or [`Error::Io`] if a file cannot be written.
    pub fn dump<P: AsRef<Path>>(
        &self,
        dest: P,
        type_filter: Option<u32>,
        progress: ProgressCallback,
    ) -> Result<usize> {
        let dest = dest.as_ref();
        fs::create_dir_all(dest)?;

        let written = self.visit_records(type_filter, progress, |record, data| {
            let data = data?;
            let type_dir = dest.join(record.type_tag.to_string());
            fs::create_dir_all(&type_dir)?;
            fs::write(type_dir.join(record.file_name()), data)?;
            Ok(())
        })?;

        progress(&ExtractProgress::new(ExtractPhase::Complete, written, written));
        tracing::info!("dumped {written} records to {}", dest.display());
        Ok(written)
    }
}

/// High-level archive operations over the default `BigFile_PC` stem.
pub struct ArchiveOperations;

impl ArchiveOperations {
    /// List every record of the archive in `dir`
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`] or index read errors.
    pub fn list<P: AsRef<Path>>(dir: P) -> Result<Vec<ArchiveRecord>> {
        Archive::open(dir)?.list()
    }

    /// Count records and bytes per type tag
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`] or index read errors.
    pub fn summarize<P: AsRef<Path>>(dir: P) -> Result<Vec<TypeSummary>> {
        Archive::open(dir)?.summarize()
    }

    /// Read every record of `type_tag` with its bytes
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`], index errors or volume read errors.
    pub fn read_records<P: AsRef<Path>>(
        dir: P,
        type_tag: u32,
    ) -> Result<Vec<(ArchiveRecord, Vec<u8>)>> {
        Archive::open(dir)?.read_records(type_tag, &|_| {})
    }

    /// Unpack records verbatim into `dest`
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`], read errors or write errors.
    pub fn dump<P: AsRef<Path>, Q: AsRef<Path>>(
        dir: P,
        dest: Q,
        type_filter: Option<u32>,
    ) -> Result<usize> {
        Self::dump_with_progress(dir, dest, type_filter, &|_| {})
    }

    /// Unpack records verbatim into `dest` with progress callback
    ///
    /// # Errors
    /// Returns [`Error::IndexMissing`], read errors or write errors.
    pub fn dump_with_progress<P: AsRef<Path>, Q: AsRef<Path>>(
        dir: P,
        dest: Q,
        type_filter: Option<u32>,
        progress: ProgressCallback,
    ) -> Result<usize> {
        Archive::open(dir)?.dump(dest, type_filter, progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_archive(dir: &Path, records: &[[u32; 7]], volume: &[u8]) {
        let mut index = vec![0u8; INDEX_PREAMBLE_SIZE];
        for r in records {
            index.extend(r.iter().flat_map(|w| w.to_be_bytes()));
        }
        fs::write(dir.join("BigFile_PC.idx"), index).unwrap();
        fs::write(dir.join("BigFile_PC.dat"), volume).unwrap();
    }

    #[test]
    fn test_missing_index() {
        let temp = tempfile::tempdir().unwrap();
        assert!(matches!(
            Archive::open(temp.path()),
            Err(Error::IndexMissing { .. })
        ));
    }

    #[test]
    fn test_summarize_groups_by_type() {
        let temp = tempfile::tempdir().unwrap();
        write_archive(
            temp.path(),
            &[
                [1016, 1, 1, 0, 4, 0, 0],
                [29, 1, 2, 4, 2, 0, 0],
                [1016, 1, 3, 6, 2, 0, 0],
            ],
            b"abcdefgh",
        );

        let summary = ArchiveOperations::summarize(temp.path()).unwrap();
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].type_tag, 29);
        assert_eq!(summary[0].name, Some("DATA_CONTAINER"));
        assert_eq!(summary[1].count, 2);
        assert_eq!(summary[1].total_size, 6);
    }

    #[test]
    fn test_record_count_from_index_size() {
        let temp = tempfile::tempdir().unwrap();
        write_archive(
            temp.path(),
            &[[1016, 1, 1, 0, 4, 0, 0], [29, 1, 2, 4, 4, 0, 0]],
            b"abcdefgh",
        );
        let archive = Archive::open(temp.path()).unwrap();
        assert_eq!(archive.record_count().unwrap(), 2);

        // a trailing partial record is not counted
        let mut index = fs::read(archive.index_path()).unwrap();
        index.extend([0u8; 10]);
        fs::write(archive.index_path(), index).unwrap();
        assert_eq!(archive.record_count().unwrap(), 2);
    }

    #[test]
    fn test_read_records_filters_type() {
        let temp = tempfile::tempdir().unwrap();
        write_archive(
            temp.path(),
            &[[1016, 1, 1, 0, 4, 0, 0], [29, 1, 2, 4, 4, 0, 0]],
            b"abcdefgh",
        );

        let records = ArchiveOperations::read_records(temp.path(), 29).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0.record_id, 2);
        assert_eq!(records[0].1, b"efgh");
    }

    #[test]
    fn test_dump_layout() {
        let temp = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_archive(
            temp.path(),
            &[[1016, 1, 7, 0, 3, 2, 0], [29, 1, 8, 3, 5, 0, 0]],
            b"abcdefgh",
        );

        let written = ArchiveOperations::dump(temp.path(), out.path(), None).unwrap();
        assert_eq!(written, 2);
        assert_eq!(fs::read(out.path().join("1016").join("7_2")).unwrap(), b"abc");
        assert_eq!(fs::read(out.path().join("29").join("8_0")).unwrap(), b"defgh");
    }
}
