//! Localization extraction
//!
//! Reads every localization record of an archive, decodes the containers and
//! flattens them into one ordered list of records: container order, then
//! language order, then block order.
//!
//! # Example
//!
//! ```no_run
//! use bigloca::archive::Archive;
//! use bigloca::extract::{ExtractionOptions, extract_localization};
//!
//! let archive = Archive::open("/games/detroit")?;
//! let options = ExtractionOptions::new().with_clean_text(true);
//! let report = extract_localization(&archive, &options, &|_| {})?;
//! println!("{} records", report.records.len());
//! # Ok::<(), bigloca::Error>(())
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

use crate::archive::{Archive, ArchiveRecord, ExtractPhase, ExtractProgress, ProgressCallback};
use crate::error::{Error, Result};
use crate::formats::localiz::{
    DecodeOptions, LOCALIZATION_TYPE, LocalizationContainer, LocalizationRecord, Variant,
    clean_text, decode_container, read_localiz_file,
};

/// What to do when one container fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Stop and return the first failure
    Abort,
    /// Log the failure, record it in the report and continue
    #[default]
    Skip,
}

/// Options for localization extraction.
///
/// # Example
///
/// ```
/// use bigloca::extract::{ErrorPolicy, ExtractionOptions};
///
/// let options = ExtractionOptions::new()
///     .with_error_policy(ErrorPolicy::Abort)
///     .with_token_length_limit(512)
///     .with_parallel(false);
/// assert_eq!(options.decode.token_length_limit, 512);
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionOptions {
    /// Record type to decode
    /// Default: 1016 (`LOCALIZ_`)
    pub type_tag: u32,

    /// Decoder tuning
    pub decode: DecodeOptions,

    /// Default: skip failed containers
    pub error_policy: ErrorPolicy,

    /// Clean display markup out of the text
    /// Default: false (text as stored)
    pub clean_text: bool,

    /// Decode containers on the rayon thread pool
    /// Default: true
    pub parallel: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            type_tag: LOCALIZATION_TYPE,
            decode: DecodeOptions::default(),
            error_policy: ErrorPolicy::default(),
            clean_text: false,
            parallel: true,
        }
    }
}

impl ExtractionOptions {
    /// Create options with the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record type to decode.
    #[must_use]
    pub fn with_type_tag(mut self, type_tag: u32) -> Self {
        self.type_tag = type_tag;
        self
    }

    /// Set the multi-key threshold.
    #[must_use]
    pub fn with_token_length_limit(mut self, limit: u32) -> Self {
        self.decode = self.decode.with_token_length_limit(limit);
        self
    }

    #[must_use]
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    /// Set whether to clean display markup.
    #[must_use]
    pub fn with_clean_text(mut self, clean: bool) -> Self {
        self.clean_text = clean;
        self
    }

    /// Set whether to decode in parallel.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// A container that could not be read or decoded
#[derive(Debug)]
pub struct ContainerFailure {
    pub record: ArchiveRecord,
    pub error: Error,
}

impl ContainerFailure {
    /// The error wrapped with the failing record's identity
    #[must_use]
    pub fn into_error(self) -> Error {
        Error::Container {
            record_id: self.record.record_id,
            flag: self.record.flag_byte,
            type_tag: self.record.type_tag,
            source: Box::new(self.error),
        }
    }
}

impl std::fmt::Display for ContainerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (type {}): {}",
            self.record.file_name(),
            self.record.type_tag,
            self.error
        )
    }
}

/// Result of an extraction pass
#[derive(Debug, Default)]
pub struct ExtractionReport {
    /// All records in output order
    pub records: Vec<LocalizationRecord>,
    /// Containers decoded with text
    pub containers_decoded: usize,
    /// Partial-variant containers recognized but not extracted
    pub containers_partial: usize,
    /// Skipped containers, in index order
    pub failures: Vec<ContainerFailure>,
}

impl ExtractionReport {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Locale codes in first-seen order
    #[must_use]
    pub fn locales(&self) -> Vec<&str> {
        let mut locales: Vec<&str> = Vec::new();
        for record in &self.records {
            if !locales.contains(&record.locale.as_str()) {
                locales.push(&record.locale);
            }
        }
        locales
    }
}

/// Apply [`clean_text`] to every record
pub fn clean_records(records: &mut [LocalizationRecord]) {
    for record in records {
        record.text = clean_text(&record.text);
    }
}

/// Extract every localization record of `archive`.
///
/// Containers are decoded independently and merged in index order, so the
/// output is the same with or without `parallel`.
///
/// # Errors
/// Returns index errors. With [`ErrorPolicy::Abort`], also returns the first
/// failed container (in index order) as [`Error::Container`].
pub fn extract_localization(
    archive: &Archive,
    options: &ExtractionOptions,
    progress: ProgressCallback,
) -> Result<ExtractionReport> {
    let mut payloads: Vec<(ArchiveRecord, Result<Vec<u8>>)> = Vec::new();
    archive.visit_records(Some(options.type_tag), progress, |record, data| {
        payloads.push((record, data));
        Ok(())
    })?;

    let total = payloads.len();
    tracing::info!("decoding {total} containers of type {}", options.type_tag);

    let decoded = AtomicUsize::new(0);
    let decode_one = |(record, data): (ArchiveRecord, Result<Vec<u8>>)| {
        let result = data.and_then(|bytes| decode_container(&bytes, &options.decode));
        let current = decoded.fetch_add(1, Ordering::SeqCst) + 1;
        progress(&ExtractProgress::with_item(
            ExtractPhase::DecodingContainers,
            current,
            total,
            record.file_name(),
        ));
        (record, result)
    };

    let results: Vec<(ArchiveRecord, Result<LocalizationContainer>)> = if options.parallel {
        payloads.into_par_iter().map(decode_one).collect()
    } else {
        payloads.into_iter().map(decode_one).collect()
    };

    let mut report = ExtractionReport::default();
    for (record, result) in results {
        match result {
            Ok(container) => {
                if container.header.variant == Variant::Partial {
                    report.containers_partial += 1;
                } else {
                    report.containers_decoded += 1;
                }
                report.records.extend(container.into_records());
            }
            Err(error) => {
                let failure = ContainerFailure { record, error };
                match options.error_policy {
                    ErrorPolicy::Abort => return Err(failure.into_error()),
                    ErrorPolicy::Skip => {
                        tracing::warn!("skipping container {failure}");
                        report.failures.push(failure);
                    }
                }
            }
        }
    }

    if options.clean_text {
        clean_records(&mut report.records);
    }

    progress(&ExtractProgress::new(ExtractPhase::Complete, total, total));
    tracing::info!(
        "extracted {} records from {} containers ({} partial, {} failed)",
        report.records.len(),
        report.containers_decoded,
        report.containers_partial,
        report.failures.len()
    );
    Ok(report)
}

/// Decode a single raw container file, such as one written by a dump
///
/// # Errors
/// Returns [`Error::Io`] if the file cannot be read, or the decode error.
pub fn decode_file<P: AsRef<Path>>(
    path: P,
    options: &ExtractionOptions,
) -> Result<Vec<LocalizationRecord>> {
    let mut records = read_localiz_file(path, &options.decode)?.into_records();
    if options.clean_text {
        clean_records(&mut records);
    }
    Ok(records)
}
