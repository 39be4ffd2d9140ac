use crate::{CodecError, CodecResult};

pub const MO_MAGIC: u32 = 0x9504_12de;
pub const MO_MAGIC_SWAPPED: u32 = 0xde12_0495;

pub(crate) const HEADER_LEN: usize = 7 * 4;
pub(crate) const RECORD_LEN: usize = 2 * 4;
pub(crate) const CONTEXT_SEPARATOR: u8 = 0x04;
pub(crate) const PLURAL_SEPARATOR: u8 = 0x00;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub fn magic(self) -> u32 {
        match self {
            ByteOrder::Little => MO_MAGIC,
            ByteOrder::Big => MO_MAGIC_SWAPPED,
        }
    }

    pub(crate) fn decode_u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            ByteOrder::Little => u32::from_le_bytes(bytes),
            ByteOrder::Big => u32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn encode_u32(self, value: u32) -> [u8; 4] {
        match self {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MoHeader {
    pub byte_order: ByteOrder,
    pub revision: u32,
    pub string_count: usize,
    pub originals_offset: usize,
    pub translations_offset: usize,
    pub hash_size: usize,
    pub hash_offset: usize,
}

/// Reads the fixed 28-byte header. The magic number is checked before the
/// length so that any buffer with a foreign first word is rejected as such.
pub fn parse_mo_header(input: &[u8]) -> CodecResult<MoHeader> {
    let mut cursor = 0usize;
    let magic = read_u32(input, &mut cursor, ByteOrder::Little)?;
    let byte_order = match magic {
        MO_MAGIC => ByteOrder::Little,
        MO_MAGIC_SWAPPED => ByteOrder::Big,
        other => return Err(CodecError::InvalidMagicNumber(other)),
    };
    if input.len() < HEADER_LEN {
        return Err(CodecError::TruncatedBuffer {
            needed: HEADER_LEN,
            available: input.len(),
        });
    }
    let revision = read_u32(input, &mut cursor, byte_order)?;
    let string_count = read_u32(input, &mut cursor, byte_order)? as usize;
    let originals_offset = read_u32(input, &mut cursor, byte_order)? as usize;
    let translations_offset = read_u32(input, &mut cursor, byte_order)? as usize;
    let hash_size = read_u32(input, &mut cursor, byte_order)? as usize;
    let hash_offset = read_u32(input, &mut cursor, byte_order)? as usize;
    Ok(MoHeader {
        byte_order,
        revision,
        string_count,
        originals_offset,
        translations_offset,
        hash_size,
        hash_offset,
    })
}

pub(crate) fn read_u32(input: &[u8], cursor: &mut usize, order: ByteOrder) -> CodecResult<u32> {
    let end = cursor.saturating_add(4);
    if end > input.len() {
        return Err(CodecError::TruncatedBuffer {
            needed: end,
            available: input.len(),
        });
    }
    let value = order.decode_u32([
        input[*cursor],
        input[*cursor + 1],
        input[*cursor + 2],
        input[*cursor + 3],
    ]);
    *cursor = end;
    Ok(value)
}

pub(crate) fn hash_string(key: &[u8]) -> u32 {
    let mut hash = 0u32;
    for &byte in key.iter().take_while(|&&byte| byte != 0) {
        hash = (hash << 4).wrapping_add(u32::from(byte));
        let high = hash & 0xf000_0000;
        if high != 0 {
            hash ^= high >> 24;
            hash ^= high;
        }
    }
    hash
}

pub(crate) fn hash_table_size(count: usize) -> usize {
    next_prime((count * 4 / 3).max(3))
}

fn next_prime(mut candidate: usize) -> usize {
    while !is_prime(candidate) {
        candidate += 1;
    }
    candidate
}

fn is_prime(value: usize) -> bool {
    if value < 2 {
        return false;
    }
    let mut divisor = 2;
    while divisor * divisor <= value {
        if value % divisor == 0 {
            return false;
        }
        divisor += 1;
    }
    true
}
