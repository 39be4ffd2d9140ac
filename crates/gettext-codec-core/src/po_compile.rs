use std::cmp::Ordering;

use crate::charset::{BuiltinConverter, CharsetConverter, is_passthrough};
use crate::escape::escape;
use crate::fold::fold_line;
use crate::header::generate_header_block;
use crate::table::{CommentKind, Entry, TranslationTable};
use crate::CodecResult;

pub const DEFAULT_FOLD_LENGTH: usize = 76;

pub type EntryComparator = fn(&Entry, &Entry) -> Ordering;

#[derive(Clone, Copy, Debug, Default)]
pub enum SortOrder {
    #[default]
    Insertion,
    ByMsgid,
    Custom(EntryComparator),
}

impl SortOrder {
    fn apply(self, entries: &mut [&Entry]) {
        match self {
            SortOrder::Insertion => {}
            SortOrder::ByMsgid => entries.sort_by(|a, b| a.msgid.cmp(&b.msgid)),
            SortOrder::Custom(compare) => entries.sort_by(|a, b| compare(a, b)),
        }
    }
}

impl From<bool> for SortOrder {
    fn from(sort: bool) -> Self {
        if sort {
            SortOrder::ByMsgid
        } else {
            SortOrder::Insertion
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct PoCompileOptions {
    /// Escaped values longer than this are folded; `0` disables folding.
    pub fold_length: usize,
    pub sort: SortOrder,
    pub strict_plurals: bool,
}

impl Default for PoCompileOptions {
    fn default() -> Self {
        Self {
            fold_length: DEFAULT_FOLD_LENGTH,
            sort: SortOrder::Insertion,
            strict_plurals: false,
        }
    }
}

pub struct PoCompiler<'a> {
    options: PoCompileOptions,
    converter: &'a dyn CharsetConverter,
}

impl Default for PoCompiler<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl PoCompiler<'static> {
    pub fn new() -> Self {
        Self::with_converter(&BuiltinConverter)
    }
}

impl<'a> PoCompiler<'a> {
    pub fn with_converter(converter: &'a dyn CharsetConverter) -> Self {
        Self {
            options: PoCompileOptions::default(),
            converter,
        }
    }

    pub fn with_options(mut self, options: PoCompileOptions) -> Self {
        self.options = options;
        self
    }

    pub fn compile(&self, table: &TranslationTable) -> CodecResult<Vec<u8>> {
        let text = self.render(table)?;
        let (charset, _) = table.resolved_headers();
        if is_passthrough(&charset) {
            return Ok(text.into_bytes());
        }
        self.converter.encode(&text, &charset)
    }

    pub fn render(&self, table: &TranslationTable) -> CodecResult<String> {
        table.check_plural_arity(self.options.strict_plurals)?;
        let (charset, headers) = table.resolved_headers();
        let fold_length = self.options.fold_length;

        let header = Entry {
            comments: table
                .header_entry()
                .map(|entry| entry.comments.clone())
                .unwrap_or_default(),
            ..Entry::new("", generate_header_block(&headers))
        };
        let mut blocks = vec![render_entry(&header, fold_length, false, true)];

        let mut entries: Vec<&Entry> = table.entries().collect();
        self.options.sort.apply(&mut entries);
        blocks.extend(entries.iter().map(|entry| render_entry(entry, fold_length, false, false)));

        let mut obsolete: Vec<&Entry> = table.obsolete_entries().collect();
        self.options.sort.apply(&mut obsolete);
        blocks.extend(obsolete.iter().map(|entry| render_entry(entry, fold_length, true, false)));

        tracing::debug!(
            entries = entries.len(),
            obsolete = obsolete.len(),
            %charset,
            "compiled po catalog"
        );
        let mut out = blocks.join("\n\n");
        out.push('\n');
        Ok(out)
    }
}

pub fn compile_po(table: &TranslationTable) -> CodecResult<Vec<u8>> {
    PoCompiler::new().compile(table)
}

fn render_entry(entry: &Entry, fold_length: usize, obsolete: bool, header: bool) -> String {
    let mut lines = Vec::new();
    for kind in CommentKind::ALL {
        let Some(text) = entry.comments.get(kind) else {
            continue;
        };
        for line in text.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                lines.push(kind.prefix().trim_end().to_string());
            } else {
                lines.push(format!("{}{line}", kind.prefix()));
            }
        }
    }

    let mut fields = Vec::new();
    if let Some(msgctxt) = &entry.msgctxt {
        fields.extend(render_string("msgctxt", msgctxt, fold_length, false));
    }
    fields.extend(render_string("msgid", &entry.msgid, fold_length, false));
    match &entry.msgid_plural {
        Some(plural) => {
            fields.extend(render_string("msgid_plural", plural, fold_length, false));
            if entry.msgstr.is_empty() {
                fields.extend(render_string("msgstr[0]", "", fold_length, false));
            }
            for (index, value) in entry.msgstr.iter().enumerate() {
                fields.extend(render_string(&format!("msgstr[{index}]"), value, fold_length, false));
            }
        }
        None => {
            let value = entry.msgstr.first().map(String::as_str).unwrap_or("");
            fields.extend(render_string("msgstr", value, fold_length, header));
        }
    }
    if obsolete {
        lines.extend(fields.into_iter().map(|field| format!("#~ {field}")));
    } else {
        lines.extend(fields);
    }
    lines.join("\n")
}

fn render_string(keyword: &str, value: &str, fold_length: usize, multiline: bool) -> Vec<String> {
    let escaped = escape(value);
    let fits = fold_length == 0 || escaped.chars().count() <= fold_length;
    if fits && !multiline {
        return vec![format!("{keyword} \"{escaped}\"")];
    }
    let width = if fold_length == 0 { usize::MAX } else { fold_length };
    let pieces = fold_line(&escaped, width);
    if pieces.len() < 2 && !multiline {
        return vec![format!("{keyword} \"{escaped}\"")];
    }
    let mut lines = Vec::with_capacity(pieces.len() + 1);
    lines.push(format!("{keyword} \"\""));
    lines.extend(pieces.into_iter().map(|piece| format!("\"{piece}\"")));
    lines
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use indexmap::IndexMap;

    use super::{PoCompileOptions, PoCompiler, SortOrder, compile_po};
    use crate::charset::charset_from_content_type;
    use crate::po_parse::parse_po;
    use crate::table::{Entry, TranslationTable};
    use crate::CodecError;

    fn render(table: &TranslationTable, options: PoCompileOptions) -> String {
        PoCompiler::new()
            .with_options(options)
            .render(table)
            .expect("render")
    }

    fn sample_table() -> TranslationTable {
        let mut headers = IndexMap::new();
        headers.insert("language".to_string(), "de".to_string());
        let mut table = TranslationTable::new(None, headers);
        table.insert(Entry::new("zebra", "Zebra"));
        table.insert(Entry::new("apple", "Apfel"));
        table.insert(Entry::new("mango", "Mango"));
        table
    }

    fn msgid_order(text: &str) -> Vec<String> {
        text.lines()
            .filter_map(|line| line.strip_prefix("msgid \""))
            .map(|rest| rest.trim_end_matches('"').to_string())
            .filter(|msgid| !msgid.is_empty())
            .collect()
    }

    #[test]
    fn renders_plural_entry() {
        let mut table = TranslationTable::default();
        table.insert(Entry::plural(
            "cat",
            "cats",
            vec!["1 cat".to_string(), "%d cats".to_string()],
        ));
        let text = render(&table, PoCompileOptions::default());
        assert!(text.contains(
            "msgid \"cat\"\nmsgid_plural \"cats\"\nmsgstr[0] \"1 cat\"\nmsgstr[1] \"%d cats\""
        ));
    }

    #[test]
    fn renders_header_first_with_content_type() {
        let text = render(&sample_table(), PoCompileOptions::default());
        assert!(text.starts_with(
            "msgid \"\"\nmsgstr \"\"\n\"Language: de\\n\"\n\"Content-Type: text/plain; charset=utf-8\\n\"\n\n"
        ));
        assert!(text.ends_with("msgid \"mango\"\nmsgstr \"Mango\"\n"));
    }

    #[test]
    fn insertion_order_is_default() {
        let text = render(&sample_table(), PoCompileOptions::default());
        assert_eq!(msgid_order(&text), vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn sorts_by_msgid_when_requested() {
        let options = PoCompileOptions {
            sort: SortOrder::from(true),
            ..PoCompileOptions::default()
        };
        let text = render(&sample_table(), options);
        assert_eq!(msgid_order(&text), vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn sorts_with_custom_comparator() {
        fn descending(a: &Entry, b: &Entry) -> Ordering {
            b.msgid.cmp(&a.msgid)
        }
        let options = PoCompileOptions {
            sort: SortOrder::Custom(descending),
            ..PoCompileOptions::default()
        };
        let text = render(&sample_table(), options);
        assert_eq!(msgid_order(&text), vec!["zebra", "mango", "apple"]);
    }

    #[test]
    fn renders_comments_in_fixed_order() {
        let mut table = TranslationTable::default();
        let mut entry = Entry::new("Open", "Öffnen").with_context("menu");
        entry.comments.flag = Some("fuzzy".to_string());
        entry.comments.reference = Some("a.rs:1\nb.rs:2".to_string());
        entry.comments.translator = Some("check tone".to_string());
        table.insert(entry);
        let text = render(&table, PoCompileOptions::default());
        assert!(text.contains(
            "# check tone\n#: a.rs:1\n#: b.rs:2\n#, fuzzy\nmsgctxt \"menu\"\nmsgid \"Open\"\nmsgstr \"Öffnen\""
        ));
    }

    #[test]
    fn folds_long_values_only() {
        let long = "word ".repeat(30);
        let mut table = TranslationTable::default();
        table.insert(Entry::new("long", long.as_str()));
        table.insert(Entry::new("esc", "line one\nline two\t\"quoted\""));
        let text = render(&table, PoCompileOptions::default());
        assert!(text.contains("msgstr \"line one\\nline two\\t\\\"quoted\\\"\""));
        assert!(text.contains("msgid \"long\"\nmsgstr \"\"\n\"word word"));
        for line in text.lines() {
            assert!(line.chars().count() <= 76 + "msgstr \"\"".len());
        }

        let unfolded = render(
            &table,
            PoCompileOptions {
                fold_length: 0,
                ..PoCompileOptions::default()
            },
        );
        assert!(unfolded.contains(&format!("msgstr \"{long}\"")));
    }

    #[test]
    fn renders_obsolete_entries_last() {
        let mut table = sample_table();
        table.insert_obsolete(Entry::new("old", "alt"));
        let text = render(&table, PoCompileOptions::default());
        assert!(text.ends_with("msgstr \"Mango\"\n\n#~ msgid \"old\"\n#~ msgstr \"alt\"\n"));
    }

    #[test]
    fn header_charset_matches_table_charset() {
        let mut table = sample_table();
        table.charset = "latin1".to_string();
        let bytes = compile_po(&table).expect("compile");
        let reparsed = parse_po(&bytes);
        assert_eq!(reparsed.charset, "iso-8859-1");
        let content_type = &reparsed.headers["content-type"];
        assert_eq!(
            charset_from_content_type(content_type).as_deref(),
            Some("iso-8859-1")
        );
    }

    #[test]
    fn encodes_non_utf8_output() {
        let mut table = TranslationTable::new(Some("iso-8859-1"), IndexMap::new());
        table.insert(Entry::new("cafe", "café"));
        let bytes = compile_po(&table).expect("compile");
        assert!(bytes.windows(5).any(|window| window == b"caf\xe9\""));
    }

    #[test]
    fn reports_unsupported_output_charset() {
        let table = TranslationTable::new(Some("koi8-r"), IndexMap::new());
        let err = compile_po(&table).expect_err("unsupported");
        assert_eq!(err, CodecError::UnsupportedCharset("koi8-r".to_string()));
    }

    #[test]
    fn strict_plurals_reject_arity_mismatch() {
        let mut headers = IndexMap::new();
        headers.insert(
            "plural-forms".to_string(),
            "nplurals=2; plural=(n != 1);".to_string(),
        );
        let mut table = TranslationTable::new(None, headers);
        table.insert(Entry::plural("cat", "cats", vec!["Katze".to_string()]));
        assert!(compile_po(&table).is_ok());
        let strict = PoCompiler::new().with_options(PoCompileOptions {
            strict_plurals: true,
            ..PoCompileOptions::default()
        });
        assert!(matches!(
            strict.compile(&table),
            Err(CodecError::PluralArityMismatch { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn keeps_comment_whitespace() {
        let mut table = TranslationTable::default();
        let mut entry = Entry::new("hi", "hallo");
        entry.comments.translator = Some("  indented\n\ntrailing ".to_string());
        entry.comments.extracted = Some(" x".to_string());
        table.insert(entry);
        let text = render(&table, PoCompileOptions::default());
        assert!(text.contains("#   indented\n#\n# trailing \n#.  x\nmsgid \"hi\""));
        assert_eq!(parse_po(text.as_bytes()), table);
    }

    #[test]
    fn empty_header_slot_survives_round_trip() {
        let mut table = TranslationTable::default();
        table.insert(Entry::new("", ""));
        table.insert(Entry::new("hello", "hallo"));
        let bytes = compile_po(&table).expect("compile");
        assert_eq!(parse_po(&bytes), table);
    }

    #[test]
    fn round_trips_through_text() {
        let mut headers = IndexMap::new();
        headers.insert("project-id-version".to_string(), "demo".to_string());
        headers.insert(
            "plural-forms".to_string(),
            "nplurals=2; plural=(n != 1);".to_string(),
        );
        let mut table = TranslationTable::new(None, headers);
        let mut header = Entry::new("", "");
        header.comments.translator = Some("catalog notes\nsecond line".to_string());
        table.insert(header);
        let mut open = Entry::new("Open", "Öffnen \"jetzt\"\n").with_context("menu");
        open.comments.reference = Some("src/menu.rs:4".to_string());
        open.comments.flag = Some("c-format".to_string());
        open.comments.previous = Some("msgid \"Opn\"".to_string());
        open.comments.extracted = Some("toolbar".to_string());
        table.insert(open);
        table.insert(Entry::plural(
            "file",
            "files",
            vec!["Datei".to_string(), "Dateien".to_string()],
        ));
        table.insert(Entry::new("long", "lorem ipsum dolor ".repeat(12)));
        table.insert(Entry::new("empty", ""));
        table.insert(Entry::new("", "ctx only").with_context("k"));
        table.insert_obsolete(Entry::new("gone", "weg"));

        let bytes = compile_po(&table).expect("compile");
        let reparsed = parse_po(&bytes);
        assert_eq!(reparsed, table);
    }
}
