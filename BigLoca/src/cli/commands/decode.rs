//! CLI command for decoding one container file

use std::path::Path;

use crate::export::write_json;
use crate::extract::{ExtractionOptions, decode_file};

pub fn execute(
    file: &Path,
    output: Option<&Path>,
    clean: bool,
    token_limit: u32,
) -> anyhow::Result<()> {
    let options = ExtractionOptions::new()
        .with_clean_text(clean)
        .with_token_length_limit(token_limit);
    let records = decode_file(file, &options)?;

    if let Some(output) = output {
        write_json(&records, output)?;
        println!("Wrote {} records to {}", records.len(), output.display());
        return Ok(());
    }

    for record in &records {
        println!("{}\t{}\t{}", record.locale, record.key, record.text);
    }
    println!("\n{} records", records.len());
    Ok(())
}
