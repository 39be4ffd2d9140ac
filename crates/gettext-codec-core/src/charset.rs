use crate::{CodecError, CodecResult};

pub const DEFAULT_CHARSET: &str = "utf-8";

const DEFAULT_CONTENT_TYPE: &str = "text/plain";

pub fn normalize_charset_name(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    if let Some(digits) = strip_numbered(&lower, &["utf"]) {
        return format!("utf-{digits}");
    }
    if let Some(digits) = strip_numbered(&lower, &["windows", "win", "cp"]) {
        return format!("windows-{digits}");
    }
    if let Some(digits) = strip_numbered(&lower, &["latin"]) {
        if let Some(part) = latin_to_iso_part(digits) {
            return format!("iso-8859-{part}");
        }
    }
    match lower.as_str() {
        "ascii" | "us-ascii" | "us_ascii" | "usascii" => "ascii".to_string(),
        "charset" => DEFAULT_CHARSET.to_string(),
        _ => lower,
    }
}

pub fn is_passthrough(charset: &str) -> bool {
    matches!(charset, "utf-8" | "ascii")
}

fn strip_numbered<'a>(value: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    for prefix in prefixes {
        let Some(rest) = value.strip_prefix(prefix) else {
            continue;
        };
        let rest = rest
            .strip_prefix('-')
            .or_else(|| rest.strip_prefix('_'))
            .unwrap_or(rest);
        if !rest.is_empty() && rest.bytes().all(|byte| byte.is_ascii_digit()) {
            return Some(rest);
        }
    }
    None
}

fn latin_to_iso_part(digits: &str) -> Option<u8> {
    let part = match digits.parse::<u8>().ok()? {
        n @ 1..=4 => n,
        5 => 9,
        6 => 10,
        7 => 13,
        8 => 14,
        9 => 15,
        10 => 16,
        _ => return None,
    };
    Some(part)
}

pub fn charset_from_content_type(value: &str) -> Option<String> {
    value.split(';').skip(1).find_map(|param| {
        let (key, raw) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let raw = raw.trim().trim_matches('"').trim();
        if raw.is_empty() {
            None
        } else {
            Some(normalize_charset_name(raw))
        }
    })
}

pub fn with_content_type_charset(value: &str, charset: &str) -> String {
    let mut parts = value.split(';');
    let media_type = parts
        .next()
        .map(str::trim)
        .filter(|media| !media.is_empty())
        .unwrap_or(DEFAULT_CONTENT_TYPE);
    let mut params: Vec<(String, String)> = Vec::new();
    let mut replaced = false;
    for param in parts {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        if key == "charset" {
            if !replaced {
                params.push((key, charset.to_string()));
                replaced = true;
            }
        } else {
            params.push((key, raw.trim().to_string()));
        }
    }
    if !replaced {
        params.push(("charset".to_string(), charset.to_string()));
    }
    let mut out = String::from(media_type);
    for (key, raw) in params {
        out.push_str("; ");
        out.push_str(&key);
        out.push('=');
        out.push_str(&raw);
    }
    out
}

/// Byte conversion between Unicode text and a named catalog charset.
///
/// Both codecs go through this seam for any charset other than utf-8 or
/// ascii. Implementations must be deterministic for a given input.
pub trait CharsetConverter {
    fn decode(&self, bytes: &[u8], charset: &str) -> CodecResult<String>;

    fn encode(&self, text: &str, charset: &str) -> CodecResult<Vec<u8>>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinConverter;

impl CharsetConverter for BuiltinConverter {
    fn decode(&self, bytes: &[u8], charset: &str) -> CodecResult<String> {
        match charset {
            "utf-8" | "ascii" => String::from_utf8(bytes.to_vec()).map_err(|_| {
                CodecError::InvalidEncoding {
                    charset: charset.to_string(),
                }
            }),
            "iso-8859-1" => Ok(bytes.iter().map(|&byte| char::from(byte)).collect()),
            other => Err(CodecError::UnsupportedCharset(other.to_string())),
        }
    }

    fn encode(&self, text: &str, charset: &str) -> CodecResult<Vec<u8>> {
        match charset {
            "utf-8" | "ascii" => Ok(text.as_bytes().to_vec()),
            "iso-8859-1" => text
                .chars()
                .map(|ch| {
                    u8::try_from(u32::from(ch)).map_err(|_| CodecError::InvalidEncoding {
                        charset: charset.to_string(),
                    })
                })
                .collect(),
            other => Err(CodecError::UnsupportedCharset(other.to_string())),
        }
    }
}
