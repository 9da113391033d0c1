//! CLI command for listing index records

use std::path::Path;

use crate::cli::progress::format_size;

pub fn execute(
    source: &Path,
    stem: &str,
    type_tag: Option<u32>,
    summary: bool,
    count: bool,
) -> anyhow::Result<()> {
    let archive = super::open_archive(source, stem)?;

    if summary {
        let summaries = archive.summarize()?;
        println!("{:>6}  {:<10}  {:>8}  {:>12}", "TYPE", "NAME", "RECORDS", "SIZE");
        for entry in &summaries {
            if type_tag.is_some_and(|tag| tag != entry.type_tag) {
                continue;
            }
            println!(
                "{:>6}  {:<10}  {:>8}  {:>12}",
                entry.type_tag,
                entry.name.unwrap_or("?"),
                entry.count,
                format_size(entry.total_size)
            );
        }
        let records: usize = summaries.iter().map(|s| s.count).sum();
        println!(
            "\n{} records of {} types in {} volumes",
            records,
            summaries.len(),
            archive.list_volumes().len()
        );
        return Ok(());
    }

    let records: Vec<_> = archive
        .list()?
        .into_iter()
        .filter(|record| type_tag.is_none_or(|tag| tag == record.type_tag))
        .collect();

    if count {
        println!("{}", records.len());
        return Ok(());
    }

    println!(
        "{:>6}  {:<10}  {:<14}  {:>6}  {:>10}  {:>10}",
        "TYPE", "NAME", "FILE", "VOLUME", "OFFSET", "SIZE"
    );
    for record in &records {
        println!(
            "{:>6}  {:<10}  {:<14}  {:>6}  {:>10}  {:>10}",
            record.type_tag,
            record.type_name().unwrap_or("?"),
            record.file_name(),
            record.volume_index,
            record.offset,
            format_size(u64::from(record.size))
        );
    }
    println!("\n{} records", records.len());

    Ok(())
}
