//! Archive file discovery
//!
//! Finds the index and numbered volumes of an archive directory.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::bigfile::{FIRST_VOLUME_EXTENSION, INDEX_EXTENSION};
use crate::error::Result;

/// Path of the index file for `stem` in `dir`
#[must_use]
pub fn index_path(dir: &Path, stem: &str) -> PathBuf {
    dir.join(format!("{stem}.{INDEX_EXTENSION}"))
}

/// Path of volume `index` for `stem` in `dir`
///
/// Volume 0 is `<stem>.dat`, volume N is `<stem>.dNN`.
#[must_use]
pub fn volume_path(dir: &Path, stem: &str, index: u32) -> PathBuf {
    if index == 0 {
        dir.join(format!("{stem}.{FIRST_VOLUME_EXTENSION}"))
    } else {
        dir.join(format!("{stem}.d{index:02}"))
    }
}

/// Volume number encoded in a file extension, if it names a volume
fn volume_number(extension: &str) -> Option<u32> {
    if extension.eq_ignore_ascii_case(FIRST_VOLUME_EXTENSION) {
        return Some(0);
    }
    let digits = extension
        .strip_prefix('d')
        .or_else(|| extension.strip_prefix('D'))?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().filter(|&n| n > 0)
}

/// Find the volume files of `stem` in `dir`, keyed by volume number
///
/// Gaps are allowed; a record pointing at a missing volume fails when it is
/// read.
///
/// # Errors
/// Returns [`crate::Error::WalkDirError`] if the directory cannot be read.
pub fn list_volumes<P: AsRef<Path>>(dir: P, stem: &str) -> Result<BTreeMap<u32, PathBuf>> {
    let mut volumes = BTreeMap::new();

    for entry in WalkDir::new(dir.as_ref())
        .follow_links(true)
        .min_depth(1)
        .max_depth(1)
    {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || path.file_stem().and_then(|s| s.to_str()) != Some(stem) {
            continue;
        }
        if let Some(index) = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(volume_number)
        {
            volumes.insert(index, path.to_path_buf());
        }
    }

    tracing::debug!(
        "found {} volumes for {stem} in {}",
        volumes.len(),
        dir.as_ref().display()
    );
    Ok(volumes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_volume_paths() {
        let dir = Path::new("game");
        assert_eq!(volume_path(dir, "BigFile_PC", 0), dir.join("BigFile_PC.dat"));
        assert_eq!(volume_path(dir, "BigFile_PC", 3), dir.join("BigFile_PC.d03"));
        assert_eq!(volume_path(dir, "BigFile_PC", 12), dir.join("BigFile_PC.d12"));
        assert_eq!(index_path(dir, "BigFile_PC"), dir.join("BigFile_PC.idx"));
    }

    #[test]
    fn test_volume_number() {
        assert_eq!(volume_number("dat"), Some(0));
        assert_eq!(volume_number("d01"), Some(1));
        assert_eq!(volume_number("d29"), Some(29));
        assert_eq!(volume_number("d00"), None);
        assert_eq!(volume_number("idx"), None);
        assert_eq!(volume_number("dxx"), None);
    }

    #[test]
    fn test_list_volumes() {
        let temp = tempfile::tempdir().unwrap();
        for name in ["BigFile_PC.idx", "BigFile_PC.dat", "BigFile_PC.d02", "Other.d01", "readme.txt"] {
            fs::write(temp.path().join(name), b"").unwrap();
        }

        let volumes = list_volumes(temp.path(), "BigFile_PC").unwrap();
        assert_eq!(volumes.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(volumes[&2], temp.path().join("BigFile_PC.d02"));
    }
}
