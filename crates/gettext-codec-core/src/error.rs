use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid mo magic number: {0:#010x}")]
    InvalidMagicNumber(u32),
    #[error("truncated buffer: needed {needed} bytes, got {available}")]
    TruncatedBuffer { needed: usize, available: usize },
    #[error("corrupt string table: record {index} points at {offset}+{length}")]
    CorruptStringTable {
        index: usize,
        offset: usize,
        length: usize,
    },
    #[error("malformed plural-forms header: {0}")]
    MalformedPluralForms(String),
    #[error("plural arity mismatch for {msgid:?}: expected {expected} forms, found {found}")]
    PluralArityMismatch {
        msgid: String,
        expected: usize,
        found: usize,
    },
    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),
    #[error("{msgid:?} contains a byte reserved by the mo format")]
    ReservedByte { msgid: String },
    #[error("input is not valid {charset}")]
    InvalidEncoding { charset: String },
}

pub type CodecResult<T> = Result<T, CodecError>;
