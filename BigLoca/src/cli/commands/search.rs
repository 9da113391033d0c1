//! CLI command for searching extracted text

use std::path::Path;

use crate::cli::progress::simple_spinner;
use crate::extract::{ExtractionOptions, extract_localization};
use crate::search::{SearchField, SearchQuery, search_records};

pub fn execute(
    source: &Path,
    stem: &str,
    query: &str,
    key: bool,
    case_sensitive: bool,
    locale: Option<&str>,
    limit: usize,
) -> anyhow::Result<()> {
    let archive = super::open_archive(source, stem)?;

    let spinner = simple_spinner("Extracting text...");
    let report = extract_localization(&archive, &ExtractionOptions::new(), &|_| {})?;
    spinner.finish_and_clear();

    let field = if key { SearchField::Key } else { SearchField::Text };
    let search = SearchQuery::new(query)
        .with_field(field)
        .with_case_sensitive(case_sensitive)
        .with_locale(locale.map(str::to_string))
        .with_limit(Some(limit));
    let hits = search_records(&report.records, &search)?;

    if hits.is_empty() {
        println!("No matches for \"{query}\"");
        return Ok(());
    }

    for record in &hits {
        println!("[{}] {}", record.locale, record.key);
        println!("    {}", record.text);
    }

    if hits.len() == limit {
        println!("\nShowing the first {limit} matches (use --limit for more)");
    } else {
        println!("\n{} matches", hits.len());
    }
    Ok(())
}
