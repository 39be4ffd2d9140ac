use std::fs;
use std::path::PathBuf;

use gettext_codec_core::CodecError;
use thiserror::Error;

use crate::catalog_io::{
    CatalogFormat, EncodeSettings, WriteReport, decode_catalog, encode_catalog, write_output,
};
use crate::config::load_config_or_default;

#[derive(Debug, Error)]
pub enum ConvertCommandError {
    #[error("config error: {0}")]
    Config(#[from] crate::error::CliError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot infer catalog format of {0} (expected .po or .mo)")]
    UnknownFormat(PathBuf),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub input_path: PathBuf,
    pub out_path: PathBuf,
    pub strict_plurals: bool,
    pub config_path: PathBuf,
}

pub fn run_convert(options: &ConvertOptions) -> Result<WriteReport, ConvertCommandError> {
    let input_format = CatalogFormat::from_path(&options.input_path)
        .ok_or_else(|| ConvertCommandError::UnknownFormat(options.input_path.clone()))?;
    let output_format = CatalogFormat::from_path(&options.out_path)
        .ok_or_else(|| ConvertCommandError::UnknownFormat(options.out_path.clone()))?;
    let config = load_config_or_default(&options.config_path)?;

    let bytes = fs::read(&options.input_path)?;
    let table = decode_catalog(&options.input_path, &bytes, input_format)?;
    let mut settings = EncodeSettings::from_config(&config);
    settings.strict_plurals = options.strict_plurals;
    let encoded = encode_catalog(&table, output_format, settings)?;
    let report = write_output(&options.out_path, &encoded)?;
    tracing::debug!(
        from = input_format.as_str(),
        to = output_format.as_str(),
        entries = table.len(),
        "converted catalog"
    );
    Ok(report)
}
