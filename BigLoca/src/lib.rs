//! # BigLoca
//!
//! A pure-Rust library for reading `BigFile` game archives and extracting
//! their localized text.
//!
//! An archive is an index file (`BigFile_PC.idx`) plus numbered data volumes
//! (`BigFile_PC.dat`, `BigFile_PC.d01`, ...). Records of type 1016 hold
//! `LOCALIZ_` containers with per-language key/text pairs.
//!
//! ## Quick Start
//!
//! ### Extracting localized text
//!
//! ```no_run
//! use bigloca::archive::Archive;
//! use bigloca::export::write_json;
//! use bigloca::extract::{ExtractionOptions, extract_localization};
//!
//! let archive = Archive::open("/games/detroit")?;
//! let report = extract_localization(&archive, &ExtractionOptions::new(), &|_| {})?;
//! write_json(&report.records, "unpacked_localization_text.json")?;
//! # Ok::<(), bigloca::Error>(())
//! ```
//!
//! ### Working with the archive
//!
//! ```no_run
//! use bigloca::archive::ArchiveOperations;
//!
//! for summary in ArchiveOperations::summarize("/games/detroit")? {
//!     println!("{} {:?}: {}", summary.type_tag, summary.name, summary.count);
//! }
//!
//! // Unpack every record verbatim
//! ArchiveOperations::dump("/games/detroit", "unpacked/", None)?;
//! # Ok::<(), bigloca::Error>(())
//! ```
//!
//! ### Decoding one container
//!
//! ```no_run
//! use bigloca::formats::localiz::decode;
//!
//! let data = std::fs::read("unpacked/1016/568_0")?;
//! for record in decode(&data)? {
//!     println!("{} {} {}", record.locale, record.key, record.text);
//! }
//! # Ok::<(), bigloca::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` - Enables the `bigloca` command-line binary

pub mod archive;
pub mod error;
pub mod export;
pub mod extract;
pub mod formats;
pub mod search;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::error::{Error, Result};

    // Archive access
    pub use crate::archive::{
        Archive, ArchiveOperations, ArchiveRecord, ExtractPhase, ExtractProgress, TypeSummary,
        scan_volumes,
    };

    // Localization format
    pub use crate::formats::localiz::{
        DecodeOptions, LocalizationContainer, LocalizationRecord, decode, decode_container,
    };

    pub use crate::export::{ExportFormat, export};
    pub use crate::extract::{
        ErrorPolicy, ExtractionOptions, ExtractionReport, decode_file, extract_localization,
    };
    pub use crate::search::{SearchField, SearchQuery, search_records};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// CLI module (feature-gated)
#[cfg(feature = "cli")]
pub mod cli;
