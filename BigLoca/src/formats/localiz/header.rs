//! Container header and auxiliary pointer table

use byteorder::{ByteOrder, LittleEndian};

use super::cursor::ByteCursor;
use super::{COM_CONT_TAG, MAGIC, TRAILER_ALLOWANCE};
use crate::error::{Error, Result};

/// Stride between pointer slots in the `COM_CONT` data
const AUX_SLOT_STRIDE: usize = 9;

/// Bytes kept from each slot
const AUX_SLOT_WIDTH: usize = 5;

/// Offset of the first slot after the opaque 4-byte block header
const AUX_FIRST_SLOT: usize = 4;

/// Header shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    /// Code 5: header carries a padding byte and a second language count;
    /// text is not extracted.
    Partial,
    /// Code 6: complete per-language text
    Full,
}

impl Variant {
    /// Map a raw variant code
    ///
    /// # Errors
    /// Returns [`Error::UnknownVariant`] for any code other than 5 or 6.
    pub fn from_code(code: u32) -> Result<Self> {
        match code {
            5 => Ok(Self::Partial),
            6 => Ok(Self::Full),
            other => Err(Error::UnknownVariant(other)),
        }
    }

    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::Partial => 5,
            Self::Full => 6,
        }
    }
}

/// Parsed `LOCALIZ_` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub variant: Variant,
    /// Size field; must equal `len - header_start - 8`
    pub declared_size: u32,
    /// Number of language blocks
    pub language_count: u32,
    /// Offset right after the magic token
    pub header_start: usize,
    /// Offset of the first language block
    pub data_start: usize,
}

/// Find the `LOCALIZ_` token and return the offset just past it.
///
/// # Errors
/// Returns [`Error::MissingMagicToken`] if the token does not occur.
pub fn find_magic(data: &[u8]) -> Result<usize> {
    data.windows(MAGIC.len())
        .position(|window| window == MAGIC)
        .map(|pos| pos + MAGIC.len())
        .ok_or(Error::MissingMagicToken)
}

impl ContainerHeader {
    /// Parse the header at `header_start` and validate the declared size.
    ///
    /// # Errors
    /// Returns [`Error::UnknownVariant`], [`Error::SizeMismatch`], or
    /// [`Error::KeyLengthOverflow`] if the header itself is truncated.
    pub fn parse(data: &[u8], header_start: usize) -> Result<Self> {
        let cursor = ByteCursor::new(data, header_start);
        let (code, cursor) = cursor.read_u32("variant code")?;
        let (declared_size, cursor) = cursor.read_u32("declared size")?;
        let (language_count, cursor) = cursor.read_u32("language count")?;

        let variant = Variant::from_code(code)?;

        let expected = data
            .len()
            .checked_sub(header_start + TRAILER_ALLOWANCE)
            .ok_or(Error::SizeMismatch {
                declared: declared_size,
                expected: 0,
            })?;
        if declared_size as usize != expected {
            return Err(Error::SizeMismatch {
                declared: declared_size,
                expected,
            });
        }

        match variant {
            Variant::Full => Ok(Self {
                variant,
                declared_size,
                language_count,
                header_start,
                data_start: cursor.position(),
            }),
            Variant::Partial => {
                // One padding byte sits inside the first count, the real
                // count follows at +9.
                let (language_count, cursor) = ByteCursor::new(data, header_start + 9)
                    .read_u32("partial language count")?;
                Ok(Self {
                    variant,
                    declared_size,
                    language_count,
                    header_start,
                    data_start: cursor.position(),
                })
            }
        }
    }
}

/// Fixed-stride slots of the `COM_CONT` block.
///
/// Only the number of slots is used, as a bound when deciding whether a key
/// block is a multi-key list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuxPointerTable<'a> {
    /// Opaque kind word of the block
    pub kind: u32,
    /// Opaque first 4 bytes of the block data
    pub opaque_header: &'a [u8],
    /// Slot bytes present in the buffer; a slot at the end of the block may
    /// be shorter than 5 bytes
    pub slots: Vec<&'a [u8]>,
    /// Number of slots the block length declares
    pub slot_count: usize,
}

impl<'a> AuxPointerTable<'a> {
    /// Locate the `COM_CONT` block before `limit` and slice its slots.
    ///
    /// Layout: 8-byte tag, u32 kind, u32 length, then `length` bytes of data
    /// whose first 4 bytes are opaque. A missing block yields an empty table.
    #[must_use]
    pub fn parse(data: &'a [u8], limit: usize) -> Self {
        let search = &data[..limit.min(data.len())];
        let Some(tag_pos) = search
            .windows(COM_CONT_TAG.len())
            .position(|window| window == COM_CONT_TAG)
        else {
            tracing::debug!("no COM_CONT block before offset {limit}");
            return Self::default();
        };

        let fields = tag_pos + COM_CONT_TAG.len();
        if data.len() < fields + 8 {
            return Self::default();
        }
        let kind = LittleEndian::read_u32(&data[fields..]);
        let length = LittleEndian::read_u32(&data[fields + 4..]) as usize;

        let block_start = fields + 8;
        let block = &data[block_start..block_start.saturating_add(length).min(data.len())];
        let opaque_header = &block[..block.len().min(4)];
        let body = &block[opaque_header.len()..];

        let slot_count = length.saturating_sub(AUX_FIRST_SLOT).div_ceil(AUX_SLOT_STRIDE);
        let slots: Vec<&[u8]> = (AUX_FIRST_SLOT..length.min(body.len()))
            .step_by(AUX_SLOT_STRIDE)
            .map(|offset| &body[offset..(offset + AUX_SLOT_WIDTH).min(body.len())])
            .collect();
        if slots.len() < slot_count {
            tracing::debug!(
                "COM_CONT declares {slot_count} slots, {} present in the buffer",
                slots.len()
            );
        }

        Self {
            kind,
            opaque_header,
            slots,
            slot_count,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slot_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slot_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(fields: &[u32]) -> Vec<u8> {
        fields.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    #[test]
    fn test_find_magic() {
        let mut data = b"COM_CONT\0\0\0\0".to_vec();
        data.extend_from_slice(MAGIC);
        data.extend_from_slice(&[1, 2, 3]);
        assert_eq!(find_magic(&data).unwrap(), 20);
        assert!(matches!(
            find_magic(b"nothing here"),
            Err(Error::MissingMagicToken)
        ));
    }

    #[test]
    fn test_full_header() {
        let mut data = MAGIC.to_vec();
        let total = 8 + 12 + 20;
        data.extend(header_bytes(&[6, (total - 16) as u32, 3]));
        data.resize(total, 0);

        let header = ContainerHeader::parse(&data, 8).unwrap();
        assert_eq!(header.variant, Variant::Full);
        assert_eq!(header.language_count, 3);
        assert_eq!(header.data_start, 20);
    }

    #[test]
    fn test_partial_header_rereads_count() {
        let mut data = MAGIC.to_vec();
        data.extend(header_bytes(&[5, 0]));
        // Padding byte, then the real count at header_start + 9
        data.push(0);
        data.extend(header_bytes(&[2]));
        data.resize(40, 0);
        let size = (data.len() - 16) as u32;
        data[12..16].copy_from_slice(&size.to_le_bytes());

        let header = ContainerHeader::parse(&data, 8).unwrap();
        assert_eq!(header.variant, Variant::Partial);
        assert_eq!(header.data_start, 8 + 13);
        assert_eq!(header.language_count, 2);
    }

    #[test]
    fn test_unknown_variant() {
        let mut data = MAGIC.to_vec();
        data.extend(header_bytes(&[7, 0, 0]));
        assert!(matches!(
            ContainerHeader::parse(&data, 8),
            Err(Error::UnknownVariant(7))
        ));
    }

    #[test]
    fn test_wrong_size_is_mismatch() {
        let mut data = MAGIC.to_vec();
        data.extend(header_bytes(&[6, 999, 1]));
        data.resize(64, 0);
        match ContainerHeader::parse(&data, 8) {
            Err(Error::SizeMismatch { declared, expected }) => {
                assert_eq!(declared, 999);
                assert_eq!(expected, 64 - 16);
            }
            other => panic!("expected size mismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_aux_table_slot_count() {
        // length 4 + 2 * 9 = 22 -> slots at 4 and 13 within a 22-byte range
        let mut data = COM_CONT_TAG.to_vec();
        data.extend(header_bytes(&[0xAB, 22]));
        data.extend([0xEE; 4]);
        data.extend((0..18).map(|i| i as u8));
        data.extend_from_slice(MAGIC);

        let table = AuxPointerTable::parse(&data, data.len() - 8);
        assert_eq!(table.kind, 0xAB);
        assert_eq!(table.opaque_header, &[0xEE; 4]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.slots[0], &[4, 5, 6, 7, 8]);
        assert_eq!(table.slots[1], &[13, 14, 15, 16, 17]);
    }

    #[test]
    fn test_aux_table_length_past_buffer() {
        let mut data = COM_CONT_TAG.to_vec();
        data.extend(header_bytes(&[0, u32::MAX]));
        data.extend([0xEE; 4]);
        data.extend([1, 2, 3, 4, 5, 6]);
        data.extend_from_slice(MAGIC);

        let table = AuxPointerTable::parse(&data, data.len() - 8);
        assert_eq!(table.len(), (u32::MAX as usize - 4).div_ceil(9));
        // 14 bytes remain after the opaque header: slots at 4 and 13
        assert_eq!(table.slots.len(), 2);
        assert_eq!(table.slots[0], &[5, 6, b'L', b'O', b'C']);
        assert_eq!(table.slots[1].len(), 1);
    }

    #[test]
    fn test_aux_table_absent() {
        let data = MAGIC.to_vec();
        assert!(AuxPointerTable::parse(&data, 0).is_empty());
    }
}
