//! Localization container decoding

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::cursor::ByteCursor;
use super::header::{AuxPointerTable, ContainerHeader, Variant, find_magic};
use super::key_block::{KeyBlock, read_key_block};
use super::{
    DecodeOptions, LANGUAGE_HEADER_SIZE, LANGUAGE_TAG, LanguageBlock, LocalizationContainer,
    LocalizationRecord, MAGIC, is_known_locale,
};
use crate::error::{Error, Result};

/// Length of the ASCII locale code closing a language header
const LOCALE_LEN: usize = 3;

/// Read a raw container file from disk and decode it
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be read, or any decode error of
/// [`decode_container`].
pub fn read_localiz_file<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
) -> Result<LocalizationContainer> {
    let mut file = File::open(path)?;
    let mut buffer = Vec::new();
    file.read_to_end(&mut buffer)?;
    decode_container(&buffer, options)
}

/// Decode a container buffer into its flattened records
///
/// # Errors
///
/// See [`decode_container`].
pub fn decode(data: &[u8]) -> Result<Vec<LocalizationRecord>> {
    decode_container(data, &DecodeOptions::default()).map(LocalizationContainer::into_records)
}

/// Decode a container buffer.
///
/// Any structural violation aborts the whole container: every offset after a
/// misread field is wrong, so there is no partial output.
///
/// # Errors
///
/// Returns [`Error::MissingMagicToken`], [`Error::UnknownVariant`],
/// [`Error::SizeMismatch`], [`Error::BadLanguageTag`],
/// [`Error::UnknownPointerTag`] or [`Error::KeyLengthOverflow`].
pub fn decode_container(data: &[u8], options: &DecodeOptions) -> Result<LocalizationContainer> {
    let header_start = find_magic(data)?;
    let aux = AuxPointerTable::parse(data, header_start - MAGIC.len());
    let header = ContainerHeader::parse(data, header_start)?;

    let mut languages = Vec::new();
    match header.variant {
        Variant::Full => {
            let mut cursor = ByteCursor::new(data, header.data_start);
            for _ in 0..header.language_count {
                let (block, next) = decode_language(cursor, &aux, options)?;
                languages.push(block);
                cursor = next;
            }
        }
        Variant::Partial => {
            tracing::debug!(
                "partial container with {} languages, text not extracted",
                header.language_count
            );
        }
    }

    let container = LocalizationContainer {
        header,
        aux_slots: aux.len(),
        languages,
    };
    tracing::debug!(
        "decoded {} records in {} languages ({} aux slots)",
        container.record_count(),
        container.languages.len(),
        container.aux_slots
    );
    Ok(container)
}

/// Decode one language block starting at its language tag.
///
/// The block ends at a zero-length key, at the next language tag, or when
/// the buffer runs out.
///
/// # Errors
///
/// Returns [`Error::BadLanguageTag`] if the cursor is not at a language tag,
/// and any key-block error.
pub fn decode_language<'a>(
    cursor: ByteCursor<'a>,
    aux: &AuxPointerTable<'_>,
    options: &DecodeOptions,
) -> Result<(LanguageBlock, ByteCursor<'a>)> {
    if !cursor.starts_with(&LANGUAGE_TAG) {
        let rest = cursor.remaining();
        return Err(Error::BadLanguageTag {
            offset: cursor.position(),
            found: rest[..rest.len().min(LANGUAGE_TAG.len())].to_vec(),
        });
    }

    // Tag, one opaque byte, then the locale
    let cursor = cursor.skip(LANGUAGE_HEADER_SIZE - LOCALE_LEN, "language header")?;
    let (locale, mut cursor) = cursor.read_ascii(LOCALE_LEN, "locale")?;
    if !is_known_locale(&locale) {
        tracing::warn!("unrecognized locale code {locale:?}");
    }

    let mut block = LanguageBlock {
        locale,
        ..LanguageBlock::default()
    };

    while !cursor.is_empty() {
        let (key_block, next) = read_key_block(cursor, &block.locale, aux, options)?;
        cursor = next;
        match key_block {
            KeyBlock::EndOfBlock => break,
            KeyBlock::Single(record) => block.records.push(record),
            KeyBlock::MultiKey(entry) => block.key_lists.push(entry),
        }
        if cursor.starts_with(&LANGUAGE_TAG) {
            break;
        }
    }

    Ok((block, cursor))
}
