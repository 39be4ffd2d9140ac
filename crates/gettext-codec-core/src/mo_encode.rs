use crate::charset::{BuiltinConverter, CharsetConverter, is_passthrough};
use crate::header::generate_header_block;
use crate::mo::{
    ByteOrder, CONTEXT_SEPARATOR, HEADER_LEN, PLURAL_SEPARATOR, RECORD_LEN, hash_string,
    hash_table_size,
};
use crate::table::{Entry, TranslationTable};
use crate::{CodecError, CodecResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MoCompileOptions {
    pub hash_table: bool,
    pub big_endian: bool,
    pub strict_plurals: bool,
}

pub struct MoCompiler<'a> {
    options: MoCompileOptions,
    converter: &'a dyn CharsetConverter,
}

impl Default for MoCompiler<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl MoCompiler<'static> {
    pub fn new() -> Self {
        Self::with_converter(&BuiltinConverter)
    }
}

impl<'a> MoCompiler<'a> {
    pub fn with_converter(converter: &'a dyn CharsetConverter) -> Self {
        Self {
            options: MoCompileOptions::default(),
            converter,
        }
    }

    pub fn with_options(mut self, options: MoCompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compile(&self, table: &TranslationTable) -> CodecResult<Vec<u8>> {
        table.check_plural_arity(self.options.strict_plurals)?;
        let (charset, headers) = table.resolved_headers();

        let mut pairs = Vec::with_capacity(table.len() + 1);
        pairs.push((Vec::new(), self.encode(&generate_header_block(&headers), &charset)?));
        for entry in table.entries() {
            check_separators(entry)?;
            pairs.push((self.original_key(entry, &charset)?, self.translation(entry, &charset)?));
        }
        pairs.sort_by(|a, b| a.0.cmp(&b.0));

        let order = if self.options.big_endian {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        };
        let bytes = build_mo_bytes(&pairs, order, self.options.hash_table);
        tracing::debug!(
            strings = pairs.len(),
            %charset,
            byte_order = ?order,
            hash_table = self.options.hash_table,
            bytes = bytes.len(),
            "compiled mo catalog"
        );
        Ok(bytes)
    }

    fn original_key(&self, entry: &Entry, charset: &str) -> CodecResult<Vec<u8>> {
        let mut key = Vec::new();
        if let Some(msgctxt) = &entry.msgctxt {
            key.extend(self.encode(msgctxt, charset)?);
            key.push(CONTEXT_SEPARATOR);
        }
        key.extend(self.encode(&entry.msgid, charset)?);
        if let Some(plural) = &entry.msgid_plural {
            key.push(PLURAL_SEPARATOR);
            key.extend(self.encode(plural, charset)?);
        }
        Ok(key)
    }

    fn translation(&self, entry: &Entry, charset: &str) -> CodecResult<Vec<u8>> {
        if !entry.is_plural() {
            let value = entry.msgstr.first().map(String::as_str).unwrap_or("");
            return self.encode(value, charset);
        }
        let mut value = Vec::new();
        for (index, form) in entry.msgstr.iter().enumerate() {
            if index > 0 {
                value.push(PLURAL_SEPARATOR);
            }
            value.extend(self.encode(form, charset)?);
        }
        Ok(value)
    }

    fn encode(&self, text: &str, charset: &str) -> CodecResult<Vec<u8>> {
        if is_passthrough(charset) {
            return Ok(text.as_bytes().to_vec());
        }
        self.converter.encode(text, charset)
    }
}

/// EOT and NUL delimit context, msgid and plural forms inside MO strings.
fn check_separators(entry: &Entry) -> CodecResult<()> {
    let separators = [CONTEXT_SEPARATOR as char, PLURAL_SEPARATOR as char];
    let mut keys = entry
        .msgctxt
        .iter()
        .chain([&entry.msgid])
        .chain(entry.msgid_plural.iter());
    let mut clash = keys.any(|key| key.contains(separators));
    if entry.is_plural() {
        clash |= entry.msgstr.iter().any(|form| form.contains(PLURAL_SEPARATOR as char));
    }
    if clash {
        return Err(CodecError::ReservedByte {
            msgid: entry.msgid.clone(),
        });
    }
    Ok(())
}

pub fn compile_mo(table: &TranslationTable) -> CodecResult<Vec<u8>> {
    MoCompiler::new().compile(table)
}

fn build_mo_bytes(pairs: &[(Vec<u8>, Vec<u8>)], order: ByteOrder, with_hash: bool) -> Vec<u8> {
    let count = pairs.len();
    let originals_offset = HEADER_LEN;
    let translations_offset = originals_offset + count * RECORD_LEN;
    let hash_offset = translations_offset + count * RECORD_LEN;
    let hash_size = if with_hash { hash_table_size(count) } else { 0 };
    let pool_offset = hash_offset + hash_size * 4;

    let mut bytes = Vec::new();
    for word in [
        order.magic(),
        0,
        count as u32,
        originals_offset as u32,
        translations_offset as u32,
        hash_size as u32,
        hash_offset as u32,
    ] {
        bytes.extend_from_slice(&order.encode_u32(word));
    }

    let mut pool = Vec::new();
    let originals = pairs.iter().map(|(original, _)| original);
    let translations = pairs.iter().map(|(_, translation)| translation);
    for value in originals.chain(translations) {
        bytes.extend_from_slice(&order.encode_u32(value.len() as u32));
        bytes.extend_from_slice(&order.encode_u32((pool_offset + pool.len()) as u32));
        pool.extend_from_slice(value);
        pool.push(0);
    }

    if with_hash {
        for slot in build_hash_table(pairs, hash_size) {
            bytes.extend_from_slice(&order.encode_u32(slot));
        }
    }
    bytes.extend_from_slice(&pool);
    bytes
}

/// Open addressing with gettext's double-hash step; slots hold the string
/// index plus one, zero meaning empty.
fn build_hash_table(pairs: &[(Vec<u8>, Vec<u8>)], size: usize) -> Vec<u32> {
    let mut slots = vec![0u32; size];
    for (index, (original, _)) in pairs.iter().enumerate() {
        let hash = hash_string(original) as usize;
        let step = 1 + hash % (size - 2);
        let mut slot = hash % size;
        while slots[slot] != 0 {
            slot = if slot >= size - step {
                slot - (size - step)
            } else {
                slot + step
            };
        }
        slots[slot] = index as u32 + 1;
    }
    slots
}
