use indexmap::IndexMap;

use crate::{CodecError, CodecResult};

const CANONICAL_KEYS: &[(&str, &str)] = &[
    ("project-id-version", "Project-Id-Version"),
    ("report-msgid-bugs-to", "Report-Msgid-Bugs-To"),
    ("pot-creation-date", "POT-Creation-Date"),
    ("po-revision-date", "PO-Revision-Date"),
    ("last-translator", "Last-Translator"),
    ("language-team", "Language-Team"),
    ("language", "Language"),
    ("mime-version", "MIME-Version"),
    ("content-type", "Content-Type"),
    ("content-transfer-encoding", "Content-Transfer-Encoding"),
    ("plural-forms", "Plural-Forms"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralForms {
    pub count: usize,
    pub expression: String,
}

pub fn generate_header_block(headers: &IndexMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in headers {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        out.push_str(&canonical_header_name(key));
        out.push_str(": ");
        out.push_str(&single_line(key, value));
        out.push('\n');
    }
    out
}

fn single_line(key: &str, value: &str) -> String {
    let value = value.trim();
    if !value.contains(['\n', '\r']) {
        return value.to_string();
    }
    tracing::warn!(header = key, "joining line breaks in header value");
    value
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn parse_header_block(block: &str) -> IndexMap<String, String> {
    let mut headers = IndexMap::new();
    for line in block.lines() {
        let line = line.trim();
        let (key, value) = line.split_once(':').unwrap_or((line, ""));
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        headers.insert(key, value.trim().to_string());
    }
    headers
}

pub fn canonical_header_name(key: &str) -> String {
    let lower = key.to_ascii_lowercase();
    if let Some((_, canonical)) = CANONICAL_KEYS.iter().find(|(known, _)| *known == lower) {
        return (*canonical).to_string();
    }
    lower
        .split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

pub fn parse_plural_forms(value: &str) -> CodecResult<PluralForms> {
    let mut count = None;
    let mut expression = String::new();
    for param in value.split(';') {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        match key.trim().to_ascii_lowercase().as_str() {
            "nplurals" => count = Some(raw.trim()),
            "plural" => expression = raw.trim().to_string(),
            _ => {}
        }
    }
    let raw_count = count.ok_or_else(|| CodecError::MalformedPluralForms(value.to_string()))?;
    let count = raw_count
        .parse::<usize>()
        .ok()
        .filter(|count| *count > 0)
        .ok_or_else(|| CodecError::MalformedPluralForms(value.to_string()))?;
    Ok(PluralForms { count, expression })
}
