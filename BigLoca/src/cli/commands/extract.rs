//! CLI command for localization extraction

use std::path::Path;
use std::time::Instant;

use crate::archive::ExtractPhase;
use crate::cli::progress::{DISK, LOOKING_GLASS, print_done, print_step, simple_bar};
use crate::export::{ExportFormat, export};
use crate::extract::{ErrorPolicy, ExtractionOptions, extract_localization};

/// Extraction flags from the command line
#[derive(Debug, Clone)]
pub struct ExtractCliOptions {
    /// Strip display markup (--clean)
    pub clean: bool,
    /// Abort on the first failed container (--strict)
    pub strict: bool,
    /// Decode on one thread (--sequential)
    pub sequential: bool,
    /// Record type to decode (--type-tag)
    pub type_tag: u32,
    /// Multi-key threshold (--token-limit)
    pub token_limit: u32,
    /// Archive file name stem (--stem)
    pub stem: String,
}

impl ExtractCliOptions {
    fn to_extraction_options(&self) -> ExtractionOptions {
        let policy = if self.strict {
            ErrorPolicy::Abort
        } else {
            ErrorPolicy::Skip
        };
        ExtractionOptions::new()
            .with_type_tag(self.type_tag)
            .with_token_length_limit(self.token_limit)
            .with_error_policy(policy)
            .with_clean_text(self.clean)
            .with_parallel(!self.sequential)
    }
}

pub fn execute(
    source: &Path,
    output: Option<&Path>,
    format: &str,
    cli_options: &ExtractCliOptions,
    progress: bool,
) -> anyhow::Result<()> {
    let started = Instant::now();
    let format: ExportFormat = format.parse()?;
    let output = output.map_or_else(|| format.default_output(), Path::to_path_buf);
    let archive = super::open_archive(source, &cli_options.stem)?;
    let options = cli_options.to_extraction_options();

    let report = if progress {
        print_step(
            1,
            2,
            LOOKING_GLASS,
            &format!("Reading {}...", archive.index_path().display()),
        );
        let pb = simple_bar(archive.record_count()? as u64, "Reading");
        let report = extract_localization(&archive, &options, &|update| {
            match update.phase {
                ExtractPhase::ReadingIndex => {
                    pb.set_position(update.current as u64);
                }
                ExtractPhase::DecodingContainers => {
                    if update.current == 1 {
                        pb.set_message("Decoding");
                        pb.set_length(update.total as u64);
                    }
                    // Parallel decoding can report out of order
                    pb.set_position((update.current as u64).max(pb.position()));
                }
                ExtractPhase::WritingOutput | ExtractPhase::Complete => {}
            }
        })?;
        pb.finish_with_message("done");
        report
    } else {
        extract_localization(&archive, &options, &|_| {})?
    };

    if report.has_failures() {
        println!("Skipped {} containers:", report.failures.len());
        for failure in &report.failures {
            println!("  {failure}");
        }
    }

    if progress {
        print_step(
            2,
            2,
            DISK,
            &format!("Writing {}...", output.display()),
        );
    }
    let written = export(&report.records, format, &output)?;

    println!(
        "Extracted {} records in {} locales from {} containers",
        report.records.len(),
        report.locales().len(),
        report.containers_decoded
    );
    if report.containers_partial > 0 {
        println!(
            "{} containers hold no text of their own",
            report.containers_partial
        );
    }
    for path in &written {
        println!("  {}", path.display());
    }

    if progress {
        print_done(started.elapsed());
    }
    Ok(())
}
