//! Key-block disambiguation
//!
//! Each key block starts with two u32 words: an opaque header count and a
//! length. The block that follows is one of:
//!
//! - a terminator, when the length is 0;
//! - a multi-key list of `length` entries `{u32 key_len, key, pointer}`;
//! - a single key of `length` ASCII bytes followed by `{u32 text_len, UTF-16 text}`.
//!
//! The data carries no tag for the last two shapes. A block is read as a
//! multi-key list when the auxiliary pointer table has at least `length`
//! slots and the next u32 is below the token length limit (a plausible key
//! length). The limit comes from the observed corpus, not the format.

use super::cursor::ByteCursor;
use super::header::AuxPointerTable;
use super::text::decode_utf16;
use super::{DecodeOptions, LocalizationRecord};
use crate::error::{Error, Result};

/// Width of a pointer value tagged `1`
const WIDE_POINTER_SIZE: usize = 10;

/// Width of a pointer value tagged `0`
const NARROW_POINTER_SIZE: usize = 1;

/// Classification of the next key block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyBlockShape {
    EndOfBlock,
    SingleKey,
    MultiKeyList,
}

/// One key of a multi-key list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPointer {
    pub key: String,
    /// Raw pointer value including its tag byte
    pub pointer: Vec<u8>,
}

/// A consumed multi-key list. Only kept to advance the cursor correctly;
/// the pointer bytes are not interpreted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiKeyEntry {
    /// Opaque first word of the key block
    pub header_count: u32,
    pub keys: Vec<KeyPointer>,
}

/// A decoded key block
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyBlock {
    /// Zero-length key: the language block is over
    EndOfBlock,
    /// A key/text pair, tagged with the current locale
    Single(LocalizationRecord),
    MultiKey(MultiKeyEntry),
}

/// Whether the aux table is large enough for `count` keys
fn aux_table_covers(aux_slots: usize, count: u32) -> bool {
    aux_slots >= count as usize
}

/// Whether `word` reads as a key token length
fn looks_like_token_length(word: u32, limit: u32) -> bool {
    word < limit
}

/// Classify a key block from its length word.
///
/// `next_word` is the u32 following the block header; it is only consulted
/// when the aux table covers `key_len`.
#[must_use]
pub fn classify(key_len: u32, aux_slots: usize, next_word: u32, limit: u32) -> KeyBlockShape {
    if key_len == 0 {
        KeyBlockShape::EndOfBlock
    } else if aux_table_covers(aux_slots, key_len) && looks_like_token_length(next_word, limit) {
        KeyBlockShape::MultiKeyList
    } else {
        KeyBlockShape::SingleKey
    }
}

/// Read the key block at `cursor` and return it with the advanced cursor.
///
/// # Errors
/// Returns [`Error::KeyLengthOverflow`] if any length runs past the buffer,
/// [`Error::UnknownPointerTag`] for a pointer tag other than 0 or 1, and
/// [`Error::InvalidAscii`]/[`Error::InvalidText`] for undecodable keys or text.
pub fn read_key_block<'a>(
    cursor: ByteCursor<'a>,
    locale: &str,
    aux: &AuxPointerTable<'_>,
    options: &DecodeOptions,
) -> Result<(KeyBlock, ByteCursor<'a>)> {
    let (header_count, cursor) = cursor.read_u32("key block header")?;
    let (key_len, cursor) = cursor.read_u32("key length")?;

    if key_len == 0 {
        return Ok((KeyBlock::EndOfBlock, cursor));
    }

    let next_word = if aux_table_covers(aux.len(), key_len) {
        match cursor.peek_u32() {
            Some(word) => word,
            None => {
                return Err(Error::KeyLengthOverflow {
                    field: "key token length",
                    offset: cursor.position(),
                    needed: 4,
                    available: cursor.remaining().len(),
                });
            }
        }
    } else {
        u32::MAX
    };

    match classify(key_len, aux.len(), next_word, options.token_length_limit) {
        KeyBlockShape::EndOfBlock => Ok((KeyBlock::EndOfBlock, cursor)),
        KeyBlockShape::MultiKeyList => {
            let (entry, cursor) = read_multi_key(cursor, header_count, key_len)?;
            Ok((KeyBlock::MultiKey(entry), cursor))
        }
        KeyBlockShape::SingleKey => {
            let (key, cursor) = cursor.read_ascii(key_len as usize, "key")?;
            let (text_len, cursor) = cursor.read_u32("text length")?;
            let text_offset = cursor.position();
            let (text_bytes, cursor) = cursor.take(text_len as usize, "text")?;
            let text = decode_utf16(text_bytes, text_offset)?;
            Ok((
                KeyBlock::Single(LocalizationRecord::new(locale, key, text)),
                cursor,
            ))
        }
    }
}

/// Read `count` `{key_len, key, pointer}` entries
fn read_multi_key<'a>(
    mut cursor: ByteCursor<'a>,
    header_count: u32,
    count: u32,
) -> Result<(MultiKeyEntry, ByteCursor<'a>)> {
    let mut keys = Vec::with_capacity((count as usize).min(cursor.remaining().len() / 5));

    for _ in 0..count {
        let (len, next) = cursor.read_u32("listed key length")?;
        let (key, next) = next.read_ascii(len as usize, "listed key")?;
        let (pointer, next) = read_pointer(next)?;
        keys.push(KeyPointer {
            key,
            pointer: pointer.to_vec(),
        });
        cursor = next;
    }

    Ok((MultiKeyEntry { header_count, keys }, cursor))
}

/// Read a variable-width pointer value: tag `1` spans 10 bytes, tag `0` one byte.
fn read_pointer(cursor: ByteCursor<'_>) -> Result<(&[u8], ByteCursor<'_>)> {
    let offset = cursor.position();
    let (tag, _) = cursor.read_u8("pointer tag")?;
    match tag {
        1 => cursor.take(WIDE_POINTER_SIZE, "pointer"),
        0 => cursor.take(NARROW_POINTER_SIZE, "pointer"),
        other => Err(Error::UnknownPointerTag { offset, tag: other }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn words(values: &[u32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    fn aux_with(slots: usize) -> AuxPointerTable<'static> {
        AuxPointerTable {
            kind: 0,
            opaque_header: &[],
            slots: vec![&[0u8; 5][..]; slots],
            slot_count: slots,
        }
    }

    #[test]
    fn test_classify_threshold() {
        assert_eq!(classify(2, 2, 255, 256), KeyBlockShape::MultiKeyList);
        assert_eq!(classify(2, 2, 256, 256), KeyBlockShape::SingleKey);
        assert_eq!(classify(3, 2, 1, 256), KeyBlockShape::SingleKey);
        assert_eq!(classify(0, 2, 1, 256), KeyBlockShape::EndOfBlock);
    }

    #[test]
    fn test_classify_limit_is_tunable() {
        assert_eq!(classify(2, 2, 300, 512), KeyBlockShape::MultiKeyList);
    }

    #[test]
    fn test_zero_key_length_ends_block() {
        let data = words(&[1, 0]);
        let (block, cursor) =
            read_key_block(ByteCursor::new(&data, 0), "ENG", &aux_with(0), &DecodeOptions::default())
                .unwrap();
        assert_eq!(block, KeyBlock::EndOfBlock);
        assert_eq!(cursor.position(), 8);
    }

    #[test]
    fn test_multi_key_at_255() {
        // key_len 2, first listed key is 255 bytes long
        let mut data = words(&[1, 2, 255]);
        data.extend(vec![b'A'; 255]);
        data.push(0);
        data.extend(words(&[1]));
        data.push(b'B');
        data.push(1);
        data.extend([9u8; 9]);

        let (block, cursor) =
            read_key_block(ByteCursor::new(&data, 0), "ENG", &aux_with(2), &DecodeOptions::default())
                .unwrap();
        let KeyBlock::MultiKey(entry) = block else {
            panic!("expected multi-key list, got {block:?}");
        };
        assert_eq!(entry.header_count, 1);
        assert_eq!(entry.keys.len(), 2);
        assert_eq!(entry.keys[0].key.len(), 255);
        assert_eq!(entry.keys[0].pointer, vec![0]);
        assert_eq!(entry.keys[1].key, "B");
        assert_eq!(entry.keys[1].pointer.len(), 10);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_single_key_at_256() {
        // Next word 256 is not a token length: the two key bytes are 00 01
        // and the text length is the zero word that follows.
        let mut data = words(&[1, 2, 256]);
        data.extend([0, 0]);
        let (block, cursor) =
            read_key_block(ByteCursor::new(&data, 0), "ENG", &aux_with(2), &DecodeOptions::default())
                .unwrap();
        assert_eq!(block, KeyBlock::Single(LocalizationRecord::new("ENG", "\0\u{1}", "")));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_single_key_without_aux_slots() {
        let mut data = words(&[1, 2]);
        data.extend([b'K', b'Y']);
        data.extend(words(&[4]));
        data.extend([b'h', 0, b'i', 0]);
        let (block, cursor) =
            read_key_block(ByteCursor::new(&data, 0), "FRE", &aux_with(0), &DecodeOptions::default())
                .unwrap();
        assert_eq!(block, KeyBlock::Single(LocalizationRecord::new("FRE", "KY", "hi")));
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_pointer_widths() {
        let narrow = [0u8, 0xAA];
        let (pointer, cursor) = read_pointer(ByteCursor::new(&narrow, 0)).unwrap();
        assert_eq!(pointer, &[0]);
        assert_eq!(cursor.position(), 1);

        let wide = [1u8, 2, 3, 4, 5, 6, 7, 8, 9, 10, 0xAA];
        let (pointer, cursor) = read_pointer(ByteCursor::new(&wide, 0)).unwrap();
        assert_eq!(pointer.len(), 10);
        assert_eq!(cursor.position(), 10);

        let bad = [2u8, 0, 0];
        assert!(matches!(
            read_pointer(ByteCursor::new(&bad, 0)),
            Err(Error::UnknownPointerTag { offset: 0, tag: 2 })
        ));
    }

    #[test]
    fn test_text_length_overflow() {
        let mut data = words(&[1, 1]);
        data.push(b'K');
        data.extend(words(&[100]));
        data.extend([b'h', 0]);
        let err = read_key_block(
            ByteCursor::new(&data, 0),
            "ENG",
            &aux_with(0),
            &DecodeOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::KeyLengthOverflow { field: "text", needed: 100, available: 2, .. }
        ));
    }
}
