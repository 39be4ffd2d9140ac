use std::borrow::Cow;
use std::collections::BTreeMap;

use crate::charset::{BuiltinConverter, CharsetConverter, DEFAULT_CHARSET, is_passthrough};
use crate::diagnostic::{Diagnostic, DiagnosticCode};
use crate::po_lexer::{Keyword, Lexer, Token, TokenKind};
use crate::table::{Comments, Entry, TranslationTable};

const UTF8_BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoParseOptions {
    pub default_charset: String,
}

impl Default for PoParseOptions {
    fn default() -> Self {
        Self {
            default_charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoParseOutput {
    pub table: TranslationTable,
    pub diagnostics: Vec<Diagnostic>,
}

pub struct PoParser<'a> {
    options: PoParseOptions,
    converter: &'a dyn CharsetConverter,
}

impl Default for PoParser<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl PoParser<'static> {
    pub fn new() -> Self {
        Self::with_converter(&BuiltinConverter)
    }
}

impl<'a> PoParser<'a> {
    pub fn with_converter(converter: &'a dyn CharsetConverter) -> Self {
        Self {
            options: PoParseOptions::default(),
            converter,
        }
    }

    pub fn with_options(mut self, options: PoParseOptions) -> Self {
        self.options = options;
        self
    }

    pub fn parse(&self, input: &[u8]) -> TranslationTable {
        self.parse_with_diagnostics(input).table
    }

    pub fn parse_with_diagnostics(&self, input: &[u8]) -> PoParseOutput {
        let bytes = input.strip_prefix(UTF8_BOM).unwrap_or(input);
        let text = String::from_utf8_lossy(bytes);
        let lossy = matches!(text, Cow::Owned(_));
        let mut output = parse_text(&text, &self.options.default_charset);
        let charset = output.table.charset.clone();
        if is_passthrough(&charset) {
            if lossy {
                push_lossy(&mut output, format!("input is not valid {charset}"));
            }
            return output;
        }
        match self.converter.decode(bytes, &charset) {
            Ok(decoded) => {
                let mut reparsed = parse_text(&decoded, &charset);
                reparsed.table.charset = charset;
                reparsed.table.sync_charset();
                reparsed
            }
            Err(err) => {
                push_lossy(&mut output, format!("falling back to utf-8: {err}"));
                output
            }
        }
    }
}

pub fn parse_po(input: &[u8]) -> TranslationTable {
    PoParser::new().parse(input)
}

fn push_lossy(output: &mut PoParseOutput, message: String) {
    tracing::warn!(charset = %output.table.charset, "{message}");
    output
        .diagnostics
        .push(Diagnostic::new(DiagnosticCode::LossyDecoding, message));
}

fn parse_text(text: &str, default_charset: &str) -> PoParseOutput {
    let mut builder = Builder::default();
    for result in Lexer::new(text) {
        match result {
            Ok(token) => builder.accept(token),
            Err(err) => {
                tracing::warn!(line = err.line, text = %err.text, "skipping po line: {}", err.message);
                builder.diagnostics.push(
                    Diagnostic::new(DiagnosticCode::UnexpectedToken, err.message)
                        .with_line(err.line),
                );
            }
        }
    }
    builder.finish_entry();
    builder.into_output(default_charset)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Start,
    InComment,
    InKeywordString(Keyword),
    InContinuationString(Keyword),
}

#[derive(Debug, Default)]
struct PendingEntry {
    comments: Comments,
    msgctxt: Option<String>,
    msgid: Option<String>,
    msgid_plural: Option<String>,
    msgstr: BTreeMap<usize, String>,
    obsolete: bool,
    line: u32,
}

impl PendingEntry {
    fn has_keyword(&self) -> bool {
        self.msgctxt.is_some() || self.msgid.is_some()
    }

    fn field_mut(&mut self, keyword: Keyword) -> &mut String {
        match keyword {
            Keyword::Msgctxt => self.msgctxt.get_or_insert_with(String::new),
            Keyword::Msgid => self.msgid.get_or_insert_with(String::new),
            Keyword::MsgidPlural => self.msgid_plural.get_or_insert_with(String::new),
            Keyword::Msgstr(index) => self.msgstr.entry(index).or_default(),
        }
    }
}

struct Builder {
    state: State,
    pending: PendingEntry,
    header_block: Option<String>,
    entries: Vec<(Entry, bool, u32)>,
    diagnostics: Vec<Diagnostic>,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            state: State::Start,
            pending: PendingEntry::default(),
            header_block: None,
            entries: Vec::new(),
            diagnostics: Vec::new(),
        }
    }
}

impl Builder {
    fn accept(&mut self, token: Token) {
        match token.kind {
            TokenKind::Blank => {
                self.finish_entry();
                self.state = State::Start;
            }
            TokenKind::Comment { kind, text } => {
                if self.pending.has_keyword() {
                    self.finish_entry();
                }
                self.mark_start(token.line);
                self.pending.comments.push_line(kind, &text);
                self.state = State::InComment;
            }
            TokenKind::Keyword { keyword, value } => {
                self.accept_keyword(keyword, value, token.obsolete, token.line)
            }
            TokenKind::Continuation(value) => match self.state {
                State::InKeywordString(keyword) | State::InContinuationString(keyword) => {
                    self.pending.field_mut(keyword).push_str(&value);
                    self.state = State::InContinuationString(keyword);
                }
                State::Start | State::InComment => {
                    self.unexpected(token.line, "string without keyword");
                }
            },
        }
    }

    fn accept_keyword(&mut self, keyword: Keyword, value: String, obsolete: bool, line: u32) {
        if self.pending.has_keyword() && self.pending.obsolete != obsolete {
            self.finish_entry();
        }
        let starts_entry = match keyword {
            Keyword::Msgctxt => self.pending.has_keyword(),
            Keyword::Msgid => self.pending.msgid.is_some(),
            Keyword::MsgidPlural | Keyword::Msgstr(_) => {
                if self.pending.msgid.is_none() {
                    self.unexpected(line, "msgid_plural or msgstr before msgid");
                    self.state = State::Start;
                    return;
                }
                false
            }
        };
        if starts_entry {
            self.finish_entry();
        }
        if !self.pending.has_keyword() {
            self.pending.obsolete = obsolete;
        }
        self.mark_start(line);
        *self.pending.field_mut(keyword) = value;
        self.state = State::InKeywordString(keyword);
    }

    fn mark_start(&mut self, line: u32) {
        if self.pending.line == 0 {
            self.pending.line = line;
        }
    }

    fn unexpected(&mut self, line: u32, message: &str) {
        tracing::warn!(line, "skipping po line: {message}");
        self.diagnostics.push(
            Diagnostic::new(DiagnosticCode::UnexpectedToken, message).with_line(line),
        );
    }

    fn finish_entry(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let line = pending.line;
        let Some(msgid) = pending.msgid else {
            if pending.msgctxt.is_some() {
                self.unexpected(line, "msgctxt without msgid");
            } else if !pending.comments.is_empty() {
                self.unexpected(line, "comment without entry");
            }
            return;
        };
        let msgstr = match pending.msgstr.keys().next_back() {
            Some(last) => {
                let mut forms = vec![String::new(); last + 1];
                for (index, value) in pending.msgstr {
                    forms[index] = value;
                }
                forms
            }
            None => Vec::new(),
        };
        let entry = Entry {
            msgctxt: pending.msgctxt,
            msgid,
            msgid_plural: pending.msgid_plural,
            msgstr,
            comments: pending.comments,
        };
        if entry.is_header() && !pending.obsolete {
            if self.header_block.is_some() {
                self.diagnostics.push(
                    Diagnostic::new(DiagnosticCode::DuplicateEntry, "duplicate header entry")
                        .with_line(line),
                );
                return;
            }
            self.header_block = Some(entry.msgstr.first().cloned().unwrap_or_default());
            if !entry.comments.is_empty() {
                let placeholder = Entry {
                    comments: entry.comments,
                    ..Entry::new("", "")
                };
                self.entries.push((placeholder, false, line));
            }
            return;
        }
        self.entries.push((entry, pending.obsolete, line));
    }

    fn into_output(self, default_charset: &str) -> PoParseOutput {
        let header_block = self.header_block.unwrap_or_default();
        let mut table = TranslationTable::from_header_block(&header_block, default_charset);
        let mut diagnostics = self.diagnostics;
        for (entry, obsolete, line) in self.entries {
            let msgid = entry.msgid.clone();
            let replaced = if obsolete {
                table.insert_obsolete(entry)
            } else {
                table.insert(entry)
            };
            if replaced.is_some() {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::DuplicateEntry,
                        format!("duplicate msgid {msgid:?}"),
                    )
                    .with_line(line),
                );
            }
        }
        tracing::debug!(
            entries = table.len(),
            charset = %table.charset,
            diagnostics = diagnostics.len(),
            "parsed po catalog"
        );
        PoParseOutput { table, diagnostics }
    }
}

#[cfg(test)]
mod tests {
    use super::{PoParseOptions, PoParser, parse_po};
    use crate::diagnostic::DiagnosticCode;

    const SAMPLE: &str = r#"# Translators: see wiki
msgid ""
msgstr ""
"Project-Id-Version: demo 1.0\n"
"Content-Type: text/plain; charset=UTF-8\n"
"Plural-Forms: nplurals=2; plural=(n != 1);\n"

#. shown on the toolbar
#: src/toolbar.rs:12
#: src/menu.rs:40
#, fuzzy
msgctxt "menu"
msgid "Open"
msgstr "Öffnen"

msgid "cat"
msgid_plural "cats"
msgstr[0] "Katze"
msgstr[1] "Katzen"

msgid ""
"long text "
"continued"
msgstr "langer Text"
"#;

    #[test]
    fn parses_header_and_entries() {
        let table = parse_po(SAMPLE.as_bytes());
        assert_eq!(table.charset, "utf-8");
        assert_eq!(table.headers["project-id-version"], "demo 1.0");
        assert_eq!(table.headers["content-type"], "text/plain; charset=utf-8");
        assert_eq!(table.len(), 3);

        let open = table.get(Some("menu"), "Open").expect("open");
        assert_eq!(open.msgstr, vec!["Öffnen".to_string()]);
        assert_eq!(open.comments.extracted.as_deref(), Some("shown on the toolbar"));
        assert_eq!(
            open.comments.reference.as_deref(),
            Some("src/toolbar.rs:12\nsrc/menu.rs:40")
        );
        assert!(open.comments.has_flag("fuzzy"));

        let cat = table.get(None, "cat").expect("cat");
        assert_eq!(cat.msgid_plural.as_deref(), Some("cats"));
        assert_eq!(cat.msgstr, vec!["Katze".to_string(), "Katzen".to_string()]);

        let long = table.get(None, "long text continued").expect("long");
        assert_eq!(long.msgstr[0], "langer Text");
    }

    #[test]
    fn keeps_header_comments_on_placeholder() {
        let table = parse_po(SAMPLE.as_bytes());
        let header = table.header_entry().expect("placeholder");
        assert_eq!(header.comments.translator.as_deref(), Some("Translators: see wiki"));
        assert_eq!(header.msgstr, vec![String::new()]);
        assert!(table.entries().all(|entry| !entry.msgid.is_empty()));
    }

    #[test]
    fn unescapes_string_values() {
        let input = "msgid \"esc\"\nmsgstr \"line one\\nline two\\t\\\"quoted\\\"\"\n";
        let table = parse_po(input.as_bytes());
        let entry = table.get(None, "esc").expect("entry");
        assert_eq!(entry.msgstr[0], "line one\nline two\t\"quoted\"");
    }

    #[test]
    fn entries_without_blank_lines_are_split_on_msgid() {
        let input = "msgid \"a\"\nmsgstr \"A\"\nmsgid \"b\"\nmsgstr \"B\"\n#: ref\nmsgid \"c\"\nmsgstr \"C\"";
        let table = parse_po(input.as_bytes());
        let ids: Vec<&str> = table.entries().map(|entry| entry.msgid.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(
            table.get(None, "c").expect("c").comments.reference.as_deref(),
            Some("ref")
        );
    }

    #[test]
    fn tolerates_malformed_lines() {
        let input = "garbage here\nmsgid \"ok\"\nmsgstr \"fine\"\n\"orphan?\"\n\nmsgstr \"lost\"\n\"dangling\"\nmsgid \"unterminated\n";
        let output = PoParser::new().parse_with_diagnostics(input.as_bytes());
        assert_eq!(output.table.len(), 1);
        assert_eq!(output.table.get(None, "ok").expect("ok").msgstr[0], "fineorphan?");
        let codes: Vec<_> = output.diagnostics.iter().map(|d| (d.code, d.line)).collect();
        assert_eq!(
            codes,
            vec![
                (DiagnosticCode::UnexpectedToken, Some(1)),
                (DiagnosticCode::UnexpectedToken, Some(6)),
                (DiagnosticCode::UnexpectedToken, Some(7)),
                (DiagnosticCode::UnexpectedToken, Some(8)),
            ]
        );
    }

    #[test]
    fn reports_comments_detached_from_entries() {
        let input = "msgid \"a\"\nmsgstr \"A\"\n\n# orphan note\n#: lost.rs:1\n\nmsgid \"b\"\nmsgstr \"B\"\n# trailing";
        let output = PoParser::new().parse_with_diagnostics(input.as_bytes());
        assert_eq!(output.table.len(), 2);
        assert!(output.table.entries().all(|entry| entry.comments.is_empty()));
        let found: Vec<_> = output
            .diagnostics
            .iter()
            .map(|d| (d.code, d.line, d.message.as_str()))
            .collect();
        assert_eq!(
            found,
            vec![
                (DiagnosticCode::UnexpectedToken, Some(4), "comment without entry"),
                (DiagnosticCode::UnexpectedToken, Some(9), "comment without entry"),
            ]
        );
    }

    #[test]
    fn parses_obsolete_entries_separately() {
        let input = "msgid \"live\"\nmsgstr \"L\"\n\n#, fuzzy\n#~ msgid \"gone\"\n#~ msgstr \"\"\n#~ \"weg\"\n";
        let table = parse_po(input.as_bytes());
        assert_eq!(table.len(), 1);
        let gone: Vec<_> = table.obsolete_entries().collect();
        assert_eq!(gone.len(), 1);
        assert_eq!(gone[0].msgstr[0], "weg");
        assert!(gone[0].comments.has_flag("fuzzy"));
    }

    #[test]
    fn reports_duplicates_and_keeps_last() {
        let input = "msgid \"x\"\nmsgstr \"1\"\n\nmsgid \"x\"\nmsgstr \"2\"\n";
        let output = PoParser::new().parse_with_diagnostics(input.as_bytes());
        assert_eq!(output.table.get(None, "x").expect("x").msgstr[0], "2");
        assert_eq!(output.diagnostics[0].code, DiagnosticCode::DuplicateEntry);
        assert_eq!(output.diagnostics[0].line, Some(4));
    }

    #[test]
    fn decodes_declared_latin1() {
        let mut input = b"msgid \"\"\nmsgstr \"Content-Type: text/plain; charset=ISO-8859-1\\n\"\n\nmsgid \"cafe\"\nmsgstr \"caf".to_vec();
        input.push(0xe9);
        input.extend_from_slice(b"\"\n");
        let output = PoParser::new().parse_with_diagnostics(&input);
        assert!(output.diagnostics.is_empty());
        assert_eq!(output.table.charset, "iso-8859-1");
        assert_eq!(output.table.get(None, "cafe").expect("cafe").msgstr[0], "café");
    }

    #[test]
    fn missing_charset_uses_default_option() {
        let table = PoParser::new()
            .with_options(PoParseOptions {
                default_charset: "latin1".to_string(),
            })
            .parse(b"msgid \"a\"\nmsgstr \"b\"\n");
        assert_eq!(table.charset, "iso-8859-1");
        assert_eq!(parse_po(b"msgid \"a\"\nmsgstr \"b\"\n").charset, "utf-8");
    }

    #[test]
    fn strips_bom_and_flags_invalid_utf8() {
        let mut input = b"\xef\xbb\xbfmsgid \"a\"\nmsgstr \"b".to_vec();
        input.push(0xff);
        input.extend_from_slice(b"\"\n");
        let output = PoParser::new().parse_with_diagnostics(&input);
        assert_eq!(output.table.get(None, "a").expect("a").msgstr[0], "b\u{fffd}");
        assert_eq!(output.diagnostics[0].code, DiagnosticCode::LossyDecoding);
    }
}
