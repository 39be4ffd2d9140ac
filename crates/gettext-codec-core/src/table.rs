use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::charset::{
    DEFAULT_CHARSET, charset_from_content_type, normalize_charset_name, with_content_type_charset,
};
use crate::header::{PluralForms, parse_header_block, parse_plural_forms};
use crate::{CodecError, CodecResult};

pub const CONTENT_TYPE: &str = "content-type";
pub const PLURAL_FORMS: &str = "plural-forms";

pub type Translations = IndexMap<String, IndexMap<String, Entry>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentKind {
    Translator,
    Reference,
    Extracted,
    Flag,
    Previous,
}

impl CommentKind {
    pub const ALL: [CommentKind; 5] = [
        CommentKind::Translator,
        CommentKind::Reference,
        CommentKind::Extracted,
        CommentKind::Flag,
        CommentKind::Previous,
    ];

    pub fn from_marker(marker: Option<char>) -> Self {
        match marker {
            Some(':') => CommentKind::Reference,
            Some('.') => CommentKind::Extracted,
            Some(',') => CommentKind::Flag,
            Some('|') => CommentKind::Previous,
            _ => CommentKind::Translator,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            CommentKind::Translator => "# ",
            CommentKind::Reference => "#: ",
            CommentKind::Extracted => "#. ",
            CommentKind::Flag => "#, ",
            CommentKind::Previous => "#| ",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extracted: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous: Option<String>,
}

impl Comments {
    pub fn is_empty(&self) -> bool {
        CommentKind::ALL.iter().all(|kind| self.get(*kind).is_none())
    }

    pub fn get(&self, kind: CommentKind) -> Option<&str> {
        self.slot(kind).as_deref()
    }

    pub fn push_line(&mut self, kind: CommentKind, line: &str) {
        let slot = self.slot_mut(kind);
        match slot {
            Some(existing) => {
                existing.push('\n');
                existing.push_str(line);
            }
            None => *slot = Some(line.to_string()),
        }
    }

    pub fn has_flag(&self, flag: &str) -> bool {
        self.flag
            .as_deref()
            .map(|flags| flags.split([',', '\n']).any(|item| item.trim() == flag))
            .unwrap_or(false)
    }

    fn slot(&self, kind: CommentKind) -> &Option<String> {
        match kind {
            CommentKind::Translator => &self.translator,
            CommentKind::Reference => &self.reference,
            CommentKind::Extracted => &self.extracted,
            CommentKind::Flag => &self.flag,
            CommentKind::Previous => &self.previous,
        }
    }

    fn slot_mut(&mut self, kind: CommentKind) -> &mut Option<String> {
        match kind {
            CommentKind::Translator => &mut self.translator,
            CommentKind::Reference => &mut self.reference,
            CommentKind::Extracted => &mut self.extracted,
            CommentKind::Flag => &mut self.flag,
            CommentKind::Previous => &mut self.previous,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgctxt: Option<String>,
    pub msgid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msgid_plural: Option<String>,
    #[serde(default)]
    pub msgstr: Vec<String>,
    #[serde(default, skip_serializing_if = "Comments::is_empty")]
    pub comments: Comments,
}

impl Entry {
    pub fn new(msgid: impl Into<String>, msgstr: impl Into<String>) -> Self {
        Self {
            msgid: msgid.into(),
            msgstr: vec![msgstr.into()],
            ..Self::default()
        }
    }

    pub fn plural(
        msgid: impl Into<String>,
        msgid_plural: impl Into<String>,
        msgstr: Vec<String>,
    ) -> Self {
        Self {
            msgid: msgid.into(),
            msgid_plural: Some(msgid_plural.into()),
            msgstr,
            ..Self::default()
        }
    }

    pub fn with_context(mut self, msgctxt: impl Into<String>) -> Self {
        self.msgctxt = Some(msgctxt.into());
        self
    }

    pub fn context(&self) -> &str {
        self.msgctxt.as_deref().unwrap_or("")
    }

    pub fn is_plural(&self) -> bool {
        self.msgid_plural.is_some()
    }

    pub fn is_header(&self) -> bool {
        self.msgid.is_empty() && self.context().is_empty()
    }

    fn normalize(&mut self) {
        if self.msgstr.is_empty() {
            self.msgstr.push(String::new());
        }
        if !self.is_plural() && self.msgstr.len() > 1 {
            tracing::warn!(msgid = %self.msgid, forms = self.msgstr.len(), "dropping extra msgstr forms of singular entry");
            self.msgstr.truncate(1);
        }
    }
}

/// In-memory catalog shared by the PO and MO codecs.
///
/// `charset` and the `charset=` parameter of the `content-type` header are
/// kept equal by [`TranslationTable::sync_charset`], which every
/// constructor and compiler runs. The `("", "")` slot of `translations`
/// holds the header entry and is skipped by [`TranslationTable::entries`].
/// Only its comments take part in equality; its `msgstr` is rebuilt from
/// `headers` on every compile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationTable {
    #[serde(default)]
    pub charset: String,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub translations: Translations,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub obsolete: Translations,
}

impl PartialEq for TranslationTable {
    fn eq(&self, other: &Self) -> bool {
        self.charset == other.charset
            && self.headers == other.headers
            && self.header_comments() == other.header_comments()
            && same_entries(&self.translations, &other.translations)
            && same_entries(&self.obsolete, &other.obsolete)
    }
}

impl Eq for TranslationTable {}

impl Default for TranslationTable {
    fn default() -> Self {
        Self::new(None, IndexMap::new())
    }
}

impl TranslationTable {
    pub fn new(charset: Option<&str>, headers: IndexMap<String, String>) -> Self {
        let mut table = Self {
            charset: charset.unwrap_or_default().to_string(),
            headers,
            translations: IndexMap::new(),
            obsolete: IndexMap::new(),
        };
        table.sync_charset();
        table
    }

    pub fn from_header_block(block: &str, default_charset: &str) -> Self {
        let headers = parse_header_block(block);
        let declared = headers
            .get(CONTENT_TYPE)
            .and_then(|value| charset_from_content_type(value));
        let charset = declared.unwrap_or_else(|| normalize_charset_name(default_charset));
        Self::new(Some(&charset), headers)
    }

    /// Lower-cases header keys and brings `charset` and `content-type` into
    /// agreement. An empty `charset` defers to the header.
    pub fn sync_charset(&mut self) {
        if self.headers.keys().any(|key| key.chars().any(|ch| ch.is_ascii_uppercase())) {
            self.headers = std::mem::take(&mut self.headers)
                .into_iter()
                .map(|(key, value)| (key.to_ascii_lowercase(), value))
                .collect();
        }
        let content_type = self.headers.get(CONTENT_TYPE).cloned().unwrap_or_default();
        let charset = if self.charset.trim().is_empty() {
            charset_from_content_type(&content_type).unwrap_or_else(|| DEFAULT_CHARSET.to_string())
        } else {
            normalize_charset_name(&self.charset)
        };
        let content_type = with_content_type_charset(&content_type, &charset);
        self.headers.insert(CONTENT_TYPE.to_string(), content_type);
        self.charset = charset;
    }

    pub fn resolved_headers(&self) -> (String, IndexMap<String, String>) {
        let explicit = Some(self.charset.as_str()).filter(|charset| !charset.trim().is_empty());
        let resolved = Self::new(explicit, self.headers.clone());
        (resolved.charset, resolved.headers)
    }

    pub fn plural_forms(&self) -> Option<CodecResult<PluralForms>> {
        self.headers.get(PLURAL_FORMS).map(|value| parse_plural_forms(value))
    }

    pub fn check_plural_arity(&self, strict: bool) -> CodecResult<()> {
        let forms = match self.plural_forms() {
            None => return Ok(()),
            Some(Ok(forms)) => forms,
            Some(Err(err)) if strict => return Err(err),
            Some(Err(err)) => {
                tracing::warn!("{err}");
                return Ok(());
            }
        };
        for entry in self.entries().filter(|entry| entry.is_plural()) {
            if entry.msgstr.len() == forms.count {
                continue;
            }
            let err = CodecError::PluralArityMismatch {
                msgid: entry.msgid.clone(),
                expected: forms.count,
                found: entry.msgstr.len(),
            };
            if strict {
                return Err(err);
            }
            tracing::warn!("{err}");
        }
        Ok(())
    }

    pub fn insert(&mut self, entry: Entry) -> Option<Entry> {
        insert_into(&mut self.translations, entry)
    }

    pub fn insert_obsolete(&mut self, entry: Entry) -> Option<Entry> {
        insert_into(&mut self.obsolete, entry)
    }

    pub fn get(&self, msgctxt: Option<&str>, msgid: &str) -> Option<&Entry> {
        self.translations
            .get(msgctxt.unwrap_or(""))
            .and_then(|entries| entries.get(msgid))
    }

    pub fn header_entry(&self) -> Option<&Entry> {
        self.get(None, "")
    }

    fn header_comments(&self) -> Option<&Comments> {
        self.header_entry()
            .map(|entry| &entry.comments)
            .filter(|comments| !comments.is_empty())
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        iter_entries(&self.translations)
    }

    pub fn obsolete_entries(&self) -> impl Iterator<Item = &Entry> {
        iter_entries(&self.obsolete)
    }

    pub fn len(&self) -> usize {
        self.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

fn insert_into(translations: &mut Translations, mut entry: Entry) -> Option<Entry> {
    entry.normalize();
    translations
        .entry(entry.context().to_string())
        .or_default()
        .insert(entry.msgid.clone(), entry)
}

fn same_entries(left: &Translations, right: &Translations) -> bool {
    iter_entries(left).count() == iter_entries(right).count()
        && iter_entries(left).all(|entry| {
            right
                .get(entry.context())
                .and_then(|entries| entries.get(&entry.msgid))
                .is_some_and(|other| other == entry)
        })
}

fn iter_entries(translations: &Translations) -> impl Iterator<Item = &Entry> {
    translations
        .values()
        .flat_map(|entries| entries.values())
        .filter(|entry| !entry.is_header())
}
