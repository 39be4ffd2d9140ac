use crate::escape::unescape;
use crate::table::CommentKind;

pub const MAX_PLURAL_INDEX: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Msgctxt,
    Msgid,
    MsgidPlural,
    Msgstr(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Blank,
    Comment { kind: CommentKind, text: String },
    Keyword { keyword: Keyword, value: String },
    Continuation(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub obsolete: bool,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub message: String,
    pub line: u32,
    pub text: String,
}

pub struct Lexer<'a> {
    lines: std::str::Lines<'a>,
    line: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            lines: input.lines(),
            line: 0,
        }
    }

    fn lex_line(&self, raw: &str) -> Result<Token, LexError> {
        let trimmed = raw.trim_start();
        let (body, obsolete) = match trimmed.strip_prefix("#~") {
            Some(rest) => (rest.trim_start(), true),
            None => (trimmed, false),
        };
        let kind = if body.trim_end().is_empty() {
            if obsolete {
                return Err(self.error("empty obsolete line", raw));
            }
            TokenKind::Blank
        } else if obsolete && body.starts_with('|') {
            self.lex_comment(&format!("#{body}"), raw)?
        } else if body.starts_with('#') {
            if obsolete {
                return Err(self.error("comment inside obsolete line", raw));
            }
            self.lex_comment(body, raw)?
        } else if body.starts_with('"') {
            TokenKind::Continuation(self.lex_strings(body, raw)?)
        } else {
            self.lex_keyword(body, raw)?
        };
        Ok(Token {
            kind,
            obsolete,
            line: self.line,
        })
    }

    fn lex_comment(&self, body: &str, raw: &str) -> Result<TokenKind, LexError> {
        let rest = &body[1..];
        let marker = rest.chars().next();
        // One separator after the marker is syntax; the rest is text.
        let text = match marker {
            None => "",
            Some(ch) if ch.is_whitespace() => &rest[ch.len_utf8()..],
            Some(':' | '.' | ',' | '|') => {
                let after = &rest[1..];
                after.strip_prefix([' ', '\t']).unwrap_or(after)
            }
            Some(_) => return Err(self.error("unknown comment marker", raw)),
        };
        let kind = CommentKind::from_marker(marker);
        let text = if kind == CommentKind::Reference {
            text.trim_end()
        } else {
            text
        };
        Ok(TokenKind::Comment {
            kind,
            text: text.to_string(),
        })
    }

    fn lex_keyword(&self, body: &str, raw: &str) -> Result<TokenKind, LexError> {
        let split = body
            .find(|ch: char| ch.is_whitespace() || ch == '"')
            .unwrap_or(body.len());
        let (word, rest) = body.split_at(split);
        let keyword = match word {
            "msgctxt" => Keyword::Msgctxt,
            "msgid" => Keyword::Msgid,
            "msgid_plural" => Keyword::MsgidPlural,
            "msgstr" => Keyword::Msgstr(0),
            _ => {
                let index = word
                    .strip_prefix("msgstr[")
                    .and_then(|tail| tail.strip_suffix(']'))
                    .and_then(|digits| digits.trim().parse::<usize>().ok())
                    .filter(|index| *index <= MAX_PLURAL_INDEX)
                    .ok_or_else(|| self.error("unexpected keyword", raw))?;
                Keyword::Msgstr(index)
            }
        };
        let rest = rest.trim_start();
        if !rest.starts_with('"') {
            return Err(self.error("keyword without quoted string", raw));
        }
        let value = self.lex_strings(rest, raw)?;
        Ok(TokenKind::Keyword { keyword, value })
    }

    fn lex_strings(&self, mut rest: &str, raw: &str) -> Result<String, LexError> {
        let mut value = String::new();
        while let Some(after_quote) = rest.strip_prefix('"') {
            let end = closing_quote(after_quote)
                .ok_or_else(|| self.error("unterminated string", raw))?;
            value.push_str(&unescape(&after_quote[..end]));
            rest = after_quote[end + 1..].trim_start();
        }
        if !rest.is_empty() && !rest.starts_with('#') {
            return Err(self.error("trailing characters after string", raw));
        }
        Ok(value)
    }

    fn error(&self, message: &str, raw: &str) -> LexError {
        LexError {
            message: message.to_string(),
            line: self.line,
            text: raw.to_string(),
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = self.lines.next()?;
        self.line += 1;
        Some(self.lex_line(raw))
    }
}

fn closing_quote(input: &str) -> Option<usize> {
    let mut escaped = false;
    for (idx, byte) in input.bytes().enumerate() {
        match byte {
            _ if escaped => escaped = false,
            b'\\' => escaped = true,
            b'"' => return Some(idx),
            _ => {}
        }
    }
    None
}
