use std::fs;
use std::path::PathBuf;

use gettext_codec_core::{CodecError, TranslationTable};
use thiserror::Error;

use crate::catalog_io::{CatalogFormat, EncodeSettings, WriteReport, encode_catalog, write_output};
use crate::config::load_config_or_default;

#[derive(Debug, Error)]
pub enum CompileCommandError {
    #[error("config error: {0}")]
    Config(#[from] crate::error::CliError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid table json: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone)]
pub struct CompileOptions {
    pub input_path: PathBuf,
    pub format: CatalogFormat,
    pub out_path: PathBuf,
    pub fold_length: Option<usize>,
    pub sort: bool,
    pub hash_table: bool,
    pub big_endian: bool,
    pub strict_plurals: bool,
    pub config_path: PathBuf,
}

pub fn run_compile(options: &CompileOptions) -> Result<WriteReport, CompileCommandError> {
    let config = load_config_or_default(&options.config_path)?;
    let contents = fs::read(&options.input_path)?;
    let mut table: TranslationTable = serde_json::from_slice(&contents)?;
    table.sync_charset();

    let mut settings = EncodeSettings::from_config(&config);
    if let Some(fold_length) = options.fold_length {
        settings.fold_length = fold_length;
    }
    settings.sort |= options.sort;
    settings.hash_table |= options.hash_table;
    settings.big_endian = options.big_endian;
    settings.strict_plurals = options.strict_plurals;

    let bytes = encode_catalog(&table, options.format, settings)?;
    let report = write_output(&options.out_path, &bytes)?;
    tracing::debug!(
        format = options.format.as_str(),
        entries = table.len(),
        digest = %report.digest,
        "compiled catalog"
    );
    Ok(report)
}
