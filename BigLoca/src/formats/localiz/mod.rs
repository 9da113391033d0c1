//! `LOCALIZ_` localization container format
//!
//! A localization container is the payload of one archive record with type tag
//! [`LOCALIZATION_TYPE`]. It starts with an auxiliary `COM_CONT` block, followed by
//! the `LOCALIZ_` magic, a small header and one block per language. Each
//! language block is a run of key blocks that are either a single key/text
//! pair or a list of keys with opaque pointer values. The two shapes are not
//! tagged in the data; see [`key_block`] for how they are told apart.
//!
//! All multi-byte fields are little-endian.

pub mod cursor;
pub mod header;
pub mod key_block;
mod reader;
pub mod text;

pub use cursor::ByteCursor;
pub use header::{AuxPointerTable, ContainerHeader, Variant, find_magic};
pub use key_block::{KeyBlock, KeyBlockShape, KeyPointer, MultiKeyEntry, classify};
pub use reader::{decode, decode_container, decode_language, read_localiz_file};
pub use text::{clean_text, decode_utf16};

use serde::{Deserialize, Serialize};

/// Archive type tag of localization records
pub const LOCALIZATION_TYPE: u32 = 1016;

/// Magic token preceding the container header
pub const MAGIC: &[u8; 8] = b"LOCALIZ_";

/// Tag of the auxiliary block preceding the magic
pub const COM_CONT_TAG: &[u8; 8] = b"COM_CONT";

/// Tag opening every language block
pub const LANGUAGE_TAG: [u8; 4] = [0x01, 0x03, 0x00, 0x00];

/// Size of the language block header (tag, padding byte, 3-byte locale)
pub const LANGUAGE_HEADER_SIZE: usize = 8;

/// Bytes after the header start not covered by the declared size
pub const TRAILER_ALLOWANCE: usize = 8;

/// Default bound under which a u32 is read as a key-token length
pub const DEFAULT_TOKEN_LENGTH_LIMIT: u32 = 256;

/// Locale codes observed in localization containers.
///
/// Used for sanity reporting only, never for branching. `JPN` sometimes
/// appears as `JAP`.
pub const KNOWN_LOCALES: [&str; 25] = [
    "FRE", "ENG", "GER", "ITA", "SPA", "DUT", "POR", "SWE", "DAN", "NOR", "FIN", "RUS", "POL",
    "JPN", "KOR", "CHI", "GRE", "CZE", "HUN", "CRO", "MEX", "BRA", "TUR", "ARA", "SCH",
];

/// Whether `locale` is one of the [`KNOWN_LOCALES`] (or the `JAP` alias)
#[must_use]
pub fn is_known_locale(locale: &str) -> bool {
    locale == "JAP" || KNOWN_LOCALES.contains(&locale)
}

/// Decoder tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// A key block whose next u32 is below this value is read as a multi-key
    /// list. Empirical: no observed key token is 256 bytes or longer.
    pub token_length_limit: u32,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            token_length_limit: DEFAULT_TOKEN_LENGTH_LIMIT,
        }
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the multi-key threshold.
    #[must_use]
    pub fn with_token_length_limit(mut self, limit: u32) -> Self {
        self.token_length_limit = limit;
        self
    }
}

/// One localized string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationRecord {
    /// Three-letter locale code (e.g. `ENG`)
    #[serde(rename = "l")]
    pub locale: String,
    /// ASCII key naming the string
    #[serde(rename = "k")]
    pub key: String,
    /// Localized text
    #[serde(rename = "t")]
    pub text: String,
}

impl LocalizationRecord {
    pub fn new(
        locale: impl Into<String>,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            locale: locale.into(),
            key: key.into(),
            text: text.into(),
        }
    }
}

/// The records of one language inside a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageBlock {
    /// Locale code from the language header
    pub locale: String,
    /// Key/text records in block order
    pub records: Vec<LocalizationRecord>,
    /// Multi-key lists consumed while reading the block
    pub key_lists: Vec<MultiKeyEntry>,
}

/// A decoded container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizationContainer {
    /// Parsed header
    pub header: ContainerHeader,
    /// Number of slots in the auxiliary pointer table
    pub aux_slots: usize,
    /// Language blocks in container order (empty for the partial variant)
    pub languages: Vec<LanguageBlock>,
}

impl LocalizationContainer {
    /// Total number of key/text records
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.languages.iter().map(|l| l.records.len()).sum()
    }

    /// Flatten into records, language order then block order
    #[must_use]
    pub fn into_records(self) -> Vec<LocalizationRecord> {
        self.languages
            .into_iter()
            .flat_map(|language| language.records)
            .collect()
    }
}
