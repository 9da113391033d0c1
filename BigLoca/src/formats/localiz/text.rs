//! UTF-16 text decoding and display cleanup

use crate::error::{Error, Result};

/// Formatting tags replaced by a space when cleaning text
const QD_TAGS: [&str; 3] = ["<QD_BR>", "<QD_THIN>", "<QD_NORMAL>"];

/// Marker preceding the spoken part of dialogue strings
const DIALOGUE_MARKER: &str = "{S}";

/// Decode UTF-16 text bytes.
///
/// A leading byte-order mark selects the byte order and is dropped;
/// without one the bytes are little-endian.
///
/// # Errors
/// Returns [`Error::InvalidText`] for an odd byte count or an unpaired surrogate.
pub fn decode_utf16(bytes: &[u8], offset: usize) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::InvalidText {
            offset,
            reason: "odd byte count",
        });
    }

    let (body, big_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };

    let units = body.chunks_exact(2).map(|pair| {
        if big_endian {
            u16::from_be_bytes([pair[0], pair[1]])
        } else {
            u16::from_le_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|_| Error::InvalidText {
            offset,
            reason: "unpaired surrogate",
        })
}

/// Strip in-game formatting from a localized string.
///
/// Drops everything up to and including the `{S}` dialogue marker, replaces
/// `QD_*` layout tags with spaces, collapses whitespace runs and trims.
#[must_use]
pub fn clean_text(text: &str) -> String {
    let spoken = match text.find(DIALOGUE_MARKER) {
        Some(start) => &text[start + DIALOGUE_MARKER.len()..],
        None => text,
    };

    let mut value = spoken.to_string();
    for tag in QD_TAGS {
        value = value.replace(tag, " ");
    }

    let mut result = String::with_capacity(value.len());
    let mut run = 0usize;
    let mut pending = None;
    for c in value.chars() {
        if c.is_whitespace() {
            run += 1;
            pending = Some(if run == 1 { c } else { ' ' });
        } else {
            if let Some(ws) = pending.take() {
                result.push(ws);
            }
            run = 0;
            result.push(c);
        }
    }

    result.trim().to_string()
}
