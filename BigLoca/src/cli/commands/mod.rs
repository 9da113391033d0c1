use clap::Subcommand;
use std::path::{Path, PathBuf};

use crate::archive::{Archive, DEFAULT_SCAN_BUFFER_SIZE, DEFAULT_STEM};
use crate::formats::localiz::{DEFAULT_TOKEN_LENGTH_LIMIT, LOCALIZATION_TYPE};

pub mod decode;
pub mod dump;
pub mod extract;
pub mod list;
pub mod scan;
pub mod search;

#[derive(Subcommand)]
pub enum Commands {
    /// Extract all localized text from an archive
    Extract {
        /// Directory holding the index and volume files
        source: PathBuf,

        /// Output file (directory for the `languages` format)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "json", value_parser = ["json", "languages", "tsv"])]
        format: String,

        /// Strip display markup from the text
        #[arg(long)]
        clean: bool,

        /// Stop at the first container that fails to decode
        #[arg(long)]
        strict: bool,

        /// Decode containers on a single thread
        #[arg(long)]
        sequential: bool,

        /// Record type holding localization containers
        #[arg(long, default_value_t = LOCALIZATION_TYPE)]
        type_tag: u32,

        /// A key block is read as a multi-key list when the word after its key count is below this value
        #[arg(long, default_value_t = DEFAULT_TOKEN_LENGTH_LIMIT)]
        token_limit: u32,

        /// Archive file name stem
        #[arg(long, default_value = DEFAULT_STEM)]
        stem: String,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// List index records
    List {
        /// Directory holding the index and volume files
        source: PathBuf,

        /// Only list records of this type
        #[arg(long)]
        type_tag: Option<u32>,

        /// Show per-type totals instead of records
        #[arg(short, long)]
        summary: bool,

        /// Only show the number of matching records
        #[arg(short, long)]
        count: bool,

        /// Archive file name stem
        #[arg(long, default_value = DEFAULT_STEM)]
        stem: String,
    },

    /// Write records verbatim to `<DEST>/<type>/<id>_<flag>`
    Dump {
        /// Directory holding the index and volume files
        source: PathBuf,

        /// Output directory
        destination: PathBuf,

        /// Only dump records of this type
        #[arg(long)]
        type_tag: Option<u32>,

        /// Archive file name stem
        #[arg(long, default_value = DEFAULT_STEM)]
        stem: String,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Decode a single dumped localization container
    Decode {
        /// Container file
        file: PathBuf,

        /// Write the records as JSON instead of printing them
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Strip display markup from the text
        #[arg(long)]
        clean: bool,

        /// A key block is read as a multi-key list when the word after its key count is below this value
        #[arg(long, default_value_t = DEFAULT_TOKEN_LENGTH_LIMIT)]
        token_limit: u32,
    },

    /// Search extracted text or keys
    Search {
        /// Directory holding the index and volume files
        source: PathBuf,

        /// Value to look for
        query: String,

        /// Match keys instead of text
        #[arg(short, long)]
        key: bool,

        /// Match case exactly
        #[arg(long)]
        case_sensitive: bool,

        /// Only search this locale
        #[arg(short, long)]
        locale: Option<String>,

        /// Maximum number of results
        #[arg(long, default_value_t = 50)]
        limit: usize,

        /// Archive file name stem
        #[arg(long, default_value = DEFAULT_STEM)]
        stem: String,
    },

    /// Find the raw byte offsets of a key or text value in the volumes
    Scan {
        /// Directory holding the index and volume files
        source: PathBuf,

        /// Value to look for
        value: String,

        /// Search for a key (stored as ASCII) instead of text (UTF-16)
        #[arg(short, long)]
        key: bool,

        /// Read chunk size in bytes
        #[arg(long, default_value_t = DEFAULT_SCAN_BUFFER_SIZE)]
        buffer_size: usize,

        /// Archive file name stem
        #[arg(long, default_value = DEFAULT_STEM)]
        stem: String,
    },
}

impl Commands {
    /// Whether the command asked for quiet output
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        match self {
            Commands::Extract { quiet, .. } | Commands::Dump { quiet, .. } => *quiet,
            _ => false,
        }
    }

    pub fn execute(&self) -> anyhow::Result<()> {
        match self {
            Commands::Extract {
                source,
                output,
                format,
                clean,
                strict,
                sequential,
                type_tag,
                token_limit,
                stem,
                quiet,
            } => extract::execute(
                source,
                output.as_deref(),
                format,
                &extract::ExtractCliOptions {
                    clean: *clean,
                    strict: *strict,
                    sequential: *sequential,
                    type_tag: *type_tag,
                    token_limit: *token_limit,
                    stem: stem.clone(),
                },
                !*quiet,
            ),
            Commands::List {
                source,
                type_tag,
                summary,
                count,
                stem,
            } => list::execute(source, stem, *type_tag, *summary, *count),
            Commands::Dump {
                source,
                destination,
                type_tag,
                stem,
                quiet,
            } => dump::execute(source, destination, stem, *type_tag, !*quiet),
            Commands::Decode {
                file,
                output,
                clean,
                token_limit,
            } => decode::execute(file, output.as_deref(), *clean, *token_limit),
            Commands::Search {
                source,
                query,
                key,
                case_sensitive,
                locale,
                limit,
                stem,
            } => search::execute(
                source,
                stem,
                query,
                *key,
                *case_sensitive,
                locale.as_deref(),
                *limit,
            ),
            Commands::Scan {
                source,
                value,
                key,
                buffer_size,
                stem,
            } => scan::execute(source, stem, value, *key, *buffer_size),
        }
    }
}

/// Open the archive in `source`, naming the index path on failure
fn open_archive(source: &Path, stem: &str) -> anyhow::Result<Archive> {
    use anyhow::Context;

    Archive::with_stem(source, stem).with_context(|| {
        format!(
            "cannot open archive {}",
            source.join(format!("{stem}.idx")).display()
        )
    })
}
