use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use gettext_codec_core::{
    CodecResult, MoCompileOptions, MoCompiler, PoCompileOptions, PoCompiler, PoParser,
    SortOrder, TranslationTable, parse_mo,
};

use crate::config::CliConfig;
use crate::digest::sha256_hex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CatalogFormat {
    Po,
    Mo,
}

impl CatalogFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "po" | "pot" => Some(CatalogFormat::Po),
            "mo" | "gmo" => Some(CatalogFormat::Mo),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CatalogFormat::Po => "po",
            CatalogFormat::Mo => "mo",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodeSettings {
    pub fold_length: usize,
    pub sort: bool,
    pub hash_table: bool,
    pub big_endian: bool,
    pub strict_plurals: bool,
}

impl EncodeSettings {
    pub fn from_config(config: &CliConfig) -> Self {
        Self {
            fold_length: config.fold_length,
            sort: config.sort,
            hash_table: config.mo_hash_table,
            big_endian: false,
            strict_plurals: false,
        }
    }
}

pub fn decode_catalog(path: &Path, bytes: &[u8], format: CatalogFormat) -> CodecResult<TranslationTable> {
    match format {
        CatalogFormat::Po => {
            let output = PoParser::new().parse_with_diagnostics(bytes);
            if !output.diagnostics.is_empty() {
                tracing::info!(
                    path = %path.display(),
                    diagnostics = output.diagnostics.len(),
                    "po catalog parsed with recoverable problems"
                );
            }
            Ok(output.table)
        }
        CatalogFormat::Mo => parse_mo(bytes),
    }
}

pub fn encode_catalog(
    table: &TranslationTable,
    format: CatalogFormat,
    settings: EncodeSettings,
) -> CodecResult<Vec<u8>> {
    match format {
        CatalogFormat::Po => PoCompiler::new()
            .with_options(PoCompileOptions {
                fold_length: settings.fold_length,
                sort: SortOrder::from(settings.sort),
                strict_plurals: settings.strict_plurals,
            })
            .compile(table),
        CatalogFormat::Mo => MoCompiler::new()
            .with_options(MoCompileOptions {
                hash_table: settings.hash_table,
                big_endian: settings.big_endian,
                strict_plurals: settings.strict_plurals,
            })
            .compile(table),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteReport {
    pub path: PathBuf,
    pub size: usize,
    pub digest: String,
}

impl fmt::Display for WriteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "wrote {} bytes to {} ({})",
            self.size,
            self.path.display(),
            self.digest
        )
    }
}

pub fn write_output(path: &Path, bytes: &[u8]) -> std::io::Result<WriteReport> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(WriteReport {
        path: path.to_path_buf(),
        size: bytes.len(),
        digest: sha256_hex(bytes),
    })
}
