//! Types for `BigFile` archive handling

use byteorder::{BigEndian, ByteOrder};
use serde::Serialize;

use super::INDEX_RECORD_SIZE;

/// One entry of the archive index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchiveRecord {
    /// Resource type (1016 for localization containers)
    pub type_tag: u32,
    /// Second index word; always observed as 1, carried through uninterpreted
    pub reserved: u32,
    pub record_id: u32,
    /// Start of the record inside its volume
    pub offset: u32,
    pub size: u32,
    /// Opaque word used to tell apart records sharing an id
    pub flag_byte: u32,
    /// Which numbered volume holds the bytes
    pub volume_index: u32,
}

impl ArchiveRecord {
    /// Parse a 28-byte big-endian index entry
    #[must_use]
    pub fn parse(bytes: &[u8; INDEX_RECORD_SIZE]) -> Self {
        let word = |i: usize| BigEndian::read_u32(&bytes[i * 4..i * 4 + 4]);
        Self {
            type_tag: word(0),
            reserved: word(1),
            record_id: word(2),
            offset: word(3),
            size: word(4),
            flag_byte: word(5),
            volume_index: word(6),
        }
    }

    /// Name used when dumping: `<record_id>_<flag_byte>`
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}_{}", self.record_id, self.flag_byte)
    }

    /// Known name of this record's type, if any
    #[must_use]
    pub fn type_name(&self) -> Option<&'static str> {
        record_type_name(self.type_tag)
    }
}

/// Names of observed record types
const RECORD_TYPES: &[(u32, &str)] = &[
    (3, "CATALOG"),
    (29, "DATA_CONTAINER"),
    (42, "VCCI_CHK"),
    (1016, "LOCALIZ_"),
    (1022, "CSNDBNK_"),
    (1023, "CSNDEVNT"),
    (1025, "CSNDRTPC"),
    (1026, "CSNDSWTC"),
    (1027, "CSNDSTAT"),
    (1030, "CSNDAXBS"),
    (1031, "CSNDEVNT"),
    (1033, "CSNDDATA"),
    (2033, "ANIMDATA"),
    (2094, "FONT____"),
    (2132, "SHADCOLO"),
    (2137, "FILETEXT"),
    (2142, "PHSCMTRL"),
    (2172, "LOADZONE"),
    (2212, "EVENTS__"),
    (2226, "FINALIZE"),
    (2229, "ETF_RAW_"),
    (2230, "ETF_RAWL"),
    (4077, "SINT_SEC"),
    (4091, "HEADER__"),
    (4137, "SINT_SEC"),
    (4234, "GMK_ANIM"),
    (4241, "GMK_COMG"),
    (4254, "CSB_CHK_"),
    (4288, "SCRIPT"),
    (4333, "SCPTBANK"),
    (14000, "NAVM____"),
    (14003, "PTGRAPH_"),
    (14014, "MOGRAEMU"),
    (15000, "MG_DATA_"),
    (18002, "MENU_RES"),
    (19000, "NOCHK___"),
    (19001, "GOGCCHK_"),
];

/// Look up the name of a record type tag
#[must_use]
pub fn record_type_name(type_tag: u32) -> Option<&'static str> {
    RECORD_TYPES
        .iter()
        .find(|(tag, _)| *tag == type_tag)
        .map(|(_, name)| *name)
}

/// Per-type totals of an index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeSummary {
    pub type_tag: u32,
    pub name: Option<&'static str>,
    pub count: usize,
    pub total_size: u64,
}

/// Progress callback type
pub type ProgressCallback<'a> = &'a (dyn Fn(&ExtractProgress) + Sync + Send);

/// Progress update for archive and extraction operations
#[derive(Debug, Clone)]
pub struct ExtractProgress {
    /// Current operation phase
    pub phase: ExtractPhase,
    /// Current item number (1-indexed)
    pub current: usize,
    /// Total number of items
    pub total: usize,
    /// Current record or file being processed (if applicable)
    pub current_item: Option<String>,
}

impl ExtractProgress {
    /// Create a new progress update
    #[must_use]
    pub fn new(phase: ExtractPhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_item: None,
        }
    }

    /// Create a progress update with an item name
    #[must_use]
    pub fn with_item(
        phase: ExtractPhase,
        current: usize,
        total: usize,
        item: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_item: Some(item.into()),
        }
    }

    /// Get the progress percentage (0.0 - 1.0)
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Operation phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractPhase {
    /// Walking the index and reading record bytes
    ReadingIndex,
    /// Decoding localization containers
    DecodingContainers,
    /// Writing files to disk
    WritingOutput,
    /// Operation complete
    Complete,
}

impl ExtractPhase {
    /// Get a human-readable description of this phase
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadingIndex => "Reading index",
            Self::DecodingContainers => "Decoding containers",
            Self::WritingOutput => "Writing output",
            Self::Complete => "Complete",
        }
    }
}
