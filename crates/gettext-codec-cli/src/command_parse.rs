use std::fs;
use std::path::PathBuf;

use gettext_codec_core::{CodecError, TranslationTable};
use thiserror::Error;

use crate::catalog_io::{CatalogFormat, decode_catalog};
use crate::config::load_config_or_default;

#[derive(Debug, Error)]
pub enum ParseCommandError {
    #[error("config error: {0}")]
    Config(#[from] crate::error::CliError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to parse {path}: {source}")]
    Codec { path: PathBuf, source: CodecError },
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    pub input_path: PathBuf,
    pub format: CatalogFormat,
    pub out_path: Option<PathBuf>,
    pub pretty: bool,
    pub config_path: PathBuf,
}

pub fn run_parse(options: &ParseOptions) -> Result<(), ParseCommandError> {
    let config = load_config_or_default(&options.config_path)?;
    let bytes = fs::read(&options.input_path)?;
    let table = decode_catalog(&options.input_path, &bytes, options.format).map_err(|source| {
        ParseCommandError::Codec {
            path: options.input_path.clone(),
            source,
        }
    })?;
    let json = render_json(&table, options.pretty || config.pretty)?;
    match &options.out_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}

fn render_json(table: &TranslationTable, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(table)
    } else {
        serde_json::to_string(table)
    }
}
