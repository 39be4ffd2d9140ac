use crate::charset::{BuiltinConverter, CharsetConverter, DEFAULT_CHARSET, is_passthrough};
use crate::mo::{CONTEXT_SEPARATOR, MoHeader, PLURAL_SEPARATOR, RECORD_LEN, parse_mo_header, read_u32};
use crate::table::{Entry, TranslationTable};
use crate::{CodecError, CodecResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoParseOptions {
    pub default_charset: String,
}

impl Default for MoParseOptions {
    fn default() -> Self {
        Self {
            default_charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

pub struct MoParser<'a> {
    options: MoParseOptions,
    converter: &'a dyn CharsetConverter,
}

impl Default for MoParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl MoParser<'static> {
    pub fn new() -> Self {
        Self::with_converter(&BuiltinConverter)
    }
}

impl<'a> MoParser<'a> {
    pub fn with_converter(converter: &'a dyn CharsetConverter) -> Self {
        Self {
            options: MoParseOptions::default(),
            converter,
        }
    }

    pub fn with_options(mut self, options: MoParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn parse(&self, input: &[u8]) -> CodecResult<TranslationTable> {
        let header = parse_mo_header(input)?;
        let originals = read_records(input, &header, header.originals_offset)?;
        let translations = read_records(input, &header, header.translations_offset)?;
        let pairs = originals
            .into_iter()
            .zip(translations)
            .enumerate()
            .map(|(index, (original, translation))| {
                Ok((
                    string_at(input, index, original)?,
                    string_at(input, index, translation)?,
                ))
            })
            .collect::<CodecResult<Vec<(&[u8], &[u8])>>>()?;

        let header_block = pairs
            .iter()
            .find(|(original, _)| original.is_empty())
            .map(|(_, translation)| *translation)
            .unwrap_or_default();
        let declared =
            TranslationTable::from_header_block(&String::from_utf8_lossy(header_block), &self.options.default_charset);
        let charset = declared.charset;
        let block = self.decode(header_block, &charset)?;
        let mut table = TranslationTable::from_header_block(&block, &charset);

        for (original, translation) in pairs {
            if original.is_empty() {
                continue;
            }
            let entry = self.decode_entry(original, translation, &charset)?;
            table.insert(entry);
        }
        tracing::debug!(
            entries = table.len(),
            charset = %table.charset,
            byte_order = ?header.byte_order,
            revision = header.revision,
            "parsed mo catalog"
        );
        Ok(table)
    }

    fn decode_entry(&self, original: &[u8], translation: &[u8], charset: &str) -> CodecResult<Entry> {
        let (msgctxt, key) = match original.iter().position(|&byte| byte == CONTEXT_SEPARATOR) {
            Some(split) => (Some(&original[..split]), &original[split + 1..]),
            None => (None, original),
        };
        let (msgid, msgid_plural) = match key.iter().position(|&byte| byte == PLURAL_SEPARATOR) {
            Some(split) => (&key[..split], Some(&key[split + 1..])),
            None => (key, None),
        };
        let msgstr = if msgid_plural.is_some() {
            translation
                .split(|&byte| byte == PLURAL_SEPARATOR)
                .map(|form| self.decode(form, charset))
                .collect::<CodecResult<Vec<_>>>()?
        } else {
            vec![self.decode(translation, charset)?]
        };
        Ok(Entry {
            msgctxt: msgctxt.map(|ctx| self.decode(ctx, charset)).transpose()?,
            msgid: self.decode(msgid, charset)?,
            msgid_plural: msgid_plural.map(|plural| self.decode(plural, charset)).transpose()?,
            msgstr,
            ..Entry::default()
        })
    }

    fn decode(&self, bytes: &[u8], charset: &str) -> CodecResult<String> {
        if is_passthrough(charset) {
            return String::from_utf8(bytes.to_vec()).map_err(|_| CodecError::InvalidEncoding {
                charset: charset.to_string(),
            });
        }
        self.converter.decode(bytes, charset)
    }
}

pub fn parse_mo(input: &[u8]) -> CodecResult<TranslationTable> {
    MoParser::new().parse(input)
}

#[derive(Clone, Copy, Debug)]
struct Record {
    length: usize,
    offset: usize,
}

fn read_records(input: &[u8], header: &MoHeader, start: usize) -> CodecResult<Vec<Record>> {
    let end = header
        .string_count
        .checked_mul(RECORD_LEN)
        .and_then(|len| len.checked_add(start))
        .unwrap_or(usize::MAX);
    if end > input.len() {
        return Err(CodecError::TruncatedBuffer {
            needed: end,
            available: input.len(),
        });
    }
    let mut cursor = start;
    let mut records = Vec::with_capacity(header.string_count);
    for _ in 0..header.string_count {
        let length = read_u32(input, &mut cursor, header.byte_order)? as usize;
        let offset = read_u32(input, &mut cursor, header.byte_order)? as usize;
        records.push(Record { length, offset });
    }
    Ok(records)
}

fn string_at(input: &[u8], index: usize, record: Record) -> CodecResult<&[u8]> {
    record
        .offset
        .checked_add(record.length)
        .and_then(|end| input.get(record.offset..end))
        .ok_or(CodecError::CorruptStringTable {
            index,
            offset: record.offset,
            length: record.length,
        })
}
