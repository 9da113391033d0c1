//! Writing extracted records
//!
//! Three layouts are supported:
//!
//! - flat JSON: one array of `{"l": locale, "k": key, "t": text}` objects in
//!   extraction order;
//! - per-language JSON: one `<locale>.json` object per locale mapping key to
//!   text, keys in first-seen order;
//! - TSV for spreadsheets:
//!
//! ```tsv
//! Locale\tKey\tText
//! ENG\tMENU_START\tStart
//! FRE\tMENU_START\tCommencer
//! ```

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::formats::localiz::LocalizationRecord;

/// Output layout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// One JSON array of all records
    #[default]
    Json,
    /// One JSON object per locale, written into a directory
    Languages,
    /// Tab-separated values
    Tsv,
}

impl ExportFormat {
    /// Get the file extension for this format (`None` for directory output)
    #[must_use]
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Self::Json => Some("json"),
            Self::Languages => None,
            Self::Tsv => Some("tsv"),
        }
    }

    /// Default output path when none is given
    #[must_use]
    pub fn default_output(&self) -> PathBuf {
        match self {
            Self::Json => PathBuf::from("unpacked_localization_text.json"),
            Self::Languages => PathBuf::from("localization"),
            Self::Tsv => PathBuf::from("unpacked_localization_text.tsv"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "languages" | "per-language" => Ok(Self::Languages),
            "tsv" => Ok(Self::Tsv),
            other => Err(Error::InvalidOption(format!("unknown export format: {other}"))),
        }
    }
}

/// Records grouped by locale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageTables {
    /// Locale → (key → text), both in first-seen order
    pub tables: IndexMap<String, IndexMap<String, String>>,
    /// Repeated keys whose text differed from the kept value
    pub conflicts: usize,
}

/// Group records by locale. The first text of a repeated key is kept.
#[must_use]
pub fn group_by_language(records: &[LocalizationRecord]) -> LanguageTables {
    let mut grouped = LanguageTables::default();

    for record in records {
        let table = grouped.tables.entry(record.locale.clone()).or_default();
        match table.get(&record.key) {
            None => {
                table.insert(record.key.clone(), record.text.clone());
            }
            Some(kept) if kept != &record.text && !record.text.trim().is_empty() => {
                tracing::warn!(
                    "{}: key {} repeated with different text, keeping the first",
                    record.locale,
                    record.key
                );
                grouped.conflicts += 1;
            }
            Some(_) => {}
        }
    }

    grouped
}

/// Write all records as one JSON array
///
/// # Errors
/// Returns [`Error::Io`] or [`Error::JsonError`] if the file cannot be written.
pub fn write_json<P: AsRef<Path>>(records: &[LocalizationRecord], path: P) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.flush()?;
    Ok(())
}

/// Write one `<locale>.json` file per locale into `dir`
///
/// Returns the written paths in locale order.
///
/// # Errors
/// Returns [`Error::Io`] or [`Error::JsonError`] if a file cannot be written.
pub fn write_per_language<P: AsRef<Path>>(
    records: &[LocalizationRecord],
    dir: P,
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;

    let grouped = group_by_language(records);
    if grouped.conflicts > 0 {
        tracing::warn!("{} conflicting duplicate keys", grouped.conflicts);
    }

    let mut written = Vec::with_capacity(grouped.tables.len());
    for (locale, table) in &grouped.tables {
        let path = dir.join(format!("{}.json", locale.to_lowercase()));
        let mut writer = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(&mut writer, table)?;
        writer.flush()?;
        written.push(path);
    }
    Ok(written)
}

/// Write records as `Locale\tKey\tText` rows
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be written.
pub fn write_tsv<P: AsRef<Path>>(records: &[LocalizationRecord], path: P) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "Locale\tKey\tText")?;
    for record in records {
        writeln!(
            writer,
            "{}\t{}\t{}",
            record.locale,
            escape_for_delimited(&record.key, '\t'),
            escape_for_delimited(&record.text, '\t')
        )?;
    }
    writer.flush()?;
    Ok(records.len())
}

/// Write `records` to `path` in `format`
///
/// Returns the files written.
///
/// # Errors
/// Returns the writer's error.
pub fn export<P: AsRef<Path>>(
    records: &[LocalizationRecord],
    format: ExportFormat,
    path: P,
) -> Result<Vec<PathBuf>> {
    let path = path.as_ref();
    match format {
        ExportFormat::Json => {
            write_json(records, path)?;
            Ok(vec![path.to_path_buf()])
        }
        ExportFormat::Languages => write_per_language(records, path),
        ExportFormat::Tsv => {
            write_tsv(records, path)?;
            Ok(vec![path.to_path_buf()])
        }
    }
}

/// Quote a field containing the delimiter, a line break or a quote
fn escape_for_delimited(text: &str, delimiter: char) -> String {
    if text.contains(delimiter) || text.contains('\n') || text.contains('\r') || text.contains('"')
    {
        let escaped = text.replace('"', "\"\"");
        format!("\"{escaped}\"")
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Vec<LocalizationRecord> {
        vec![
            LocalizationRecord::new("ENG", "START", "Start"),
            LocalizationRecord::new("FRE", "START", "Commencer"),
            LocalizationRecord::new("ENG", "QUIT", "Quit"),
            LocalizationRecord::new("ENG", "START", "Begin"),
            LocalizationRecord::new("ENG", "QUIT", " "),
        ]
    }

    #[test]
    fn test_group_keeps_first_value() {
        let grouped = group_by_language(&sample());
        assert_eq!(
            grouped.tables.keys().collect::<Vec<_>>(),
            vec!["ENG", "FRE"]
        );
        let eng = &grouped.tables["ENG"];
        assert_eq!(eng.keys().collect::<Vec<_>>(), vec!["START", "QUIT"]);
        assert_eq!(eng["START"], "Start");
        assert_eq!(eng["QUIT"], "Quit");
        // blank duplicates are not conflicts
        assert_eq!(grouped.conflicts, 1);
    }

    #[test]
    fn test_write_json_uses_short_names() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.json");
        write_json(&sample()[..1], &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{ "l": "ENG", "k": "START", "t": "Start" }])
        );
    }

    #[test]
    fn test_write_per_language() {
        let temp = tempfile::tempdir().unwrap();
        let written = write_per_language(&sample(), temp.path()).unwrap();
        assert_eq!(
            written,
            vec![temp.path().join("eng.json"), temp.path().join("fre.json")]
        );

        let fre = fs::read_to_string(temp.path().join("fre.json")).unwrap();
        let table: IndexMap<String, String> = serde_json::from_str(&fre).unwrap();
        assert_eq!(table["START"], "Commencer");
    }

    #[test]
    fn test_write_tsv_escapes() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("out.tsv");
        let records = vec![LocalizationRecord::new("ENG", "K", "line one\nsaid \"hi\"")];
        assert_eq!(write_tsv(&records, &path).unwrap(), 1);

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "Locale\tKey\tText\nENG\tK\t\"line one\nsaid \"\"hi\"\"\"\n"
        );
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("JSON".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert_eq!("languages".parse::<ExportFormat>().unwrap(), ExportFormat::Languages);
        assert!("xml".parse::<ExportFormat>().is_err());
    }
}
