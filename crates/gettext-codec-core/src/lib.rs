#![forbid(unsafe_code)]

mod charset;
mod diagnostic;
mod error;
mod escape;
mod fold;
mod header;
mod mo;
mod mo_decode;
mod mo_encode;
mod po_compile;
mod po_lexer;
mod po_parse;
mod table;

pub use charset::{
    BuiltinConverter, CharsetConverter, DEFAULT_CHARSET, charset_from_content_type,
    normalize_charset_name,
};
pub use diagnostic::{Diagnostic, DiagnosticCode};
pub use error::{CodecError, CodecResult};
pub use escape::{escape, unescape};
pub use fold::fold_line;
pub use header::{PluralForms, generate_header_block, parse_header_block, parse_plural_forms};
pub use mo::{ByteOrder, MO_MAGIC, MO_MAGIC_SWAPPED, MoHeader, parse_mo_header};
pub use mo_decode::{MoParseOptions, MoParser, parse_mo};
pub use mo_encode::{MoCompileOptions, MoCompiler, compile_mo};
pub use po_compile::{
    DEFAULT_FOLD_LENGTH, EntryComparator, PoCompileOptions, PoCompiler, SortOrder, compile_po,
};
pub use po_parse::{PoParseOptions, PoParseOutput, PoParser, parse_po};
pub use table::{CommentKind, Comments, Entry, TranslationTable, Translations};
