//! CLI command for raw volume scans

use std::path::Path;

use crate::archive::{encode_needle, scan_volumes};
use crate::cli::progress::simple_spinner;

pub fn execute(
    source: &Path,
    stem: &str,
    value: &str,
    key: bool,
    buffer_size: usize,
) -> anyhow::Result<()> {
    let archive = super::open_archive(source, stem)?;
    let needle = encode_needle(value, key);

    let spinner = simple_spinner(&format!(
        "Scanning {} volumes...",
        archive.list_volumes().len()
    ));
    let hits = scan_volumes(&archive, &needle, buffer_size)?;
    spinner.finish_and_clear();

    if hits.is_empty() {
        println!("Value not found.");
        return Ok(());
    }

    for hit in &hits {
        let offsets: Vec<String> = hit.offsets.iter().map(|o| format!("{o:#x}")).collect();
        println!(
            "Found in {} at offsets {}",
            hit.path.display(),
            offsets.join(", ")
        );
    }
    Ok(())
}
