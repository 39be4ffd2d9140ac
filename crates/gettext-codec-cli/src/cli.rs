use std::path::PathBuf;

use thiserror::Error;

use crate::catalog_io::CatalogFormat;
use crate::command_compile::{CompileCommandError, CompileOptions, run_compile};
use crate::command_convert::{ConvertCommandError, ConvertOptions, run_convert};
use crate::command_parse::{ParseCommandError, ParseOptions, run_parse};
use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Debug, Error)]
pub enum CliAppError {
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Parse(#[from] ParseCommandError),
    #[error(transparent)]
    Compile(#[from] CompileCommandError),
    #[error(transparent)]
    Convert(#[from] ConvertCommandError),
}

pub fn run(mut args: impl Iterator<Item = String>) -> Result<(), CliAppError> {
    let command = args.next().ok_or_else(|| CliAppError::Usage(usage()))?;
    match command.as_str() {
        "parse-po" => {
            let options = parse_parse_options(CatalogFormat::Po, args.collect())?;
            run_parse(&options)?;
            Ok(())
        }
        "parse-mo" => {
            let options = parse_parse_options(CatalogFormat::Mo, args.collect())?;
            run_parse(&options)?;
            Ok(())
        }
        "compile-po" => {
            let options = parse_compile_options(CatalogFormat::Po, args.collect())?;
            let report = run_compile(&options)?;
            println!("{report}");
            Ok(())
        }
        "compile-mo" => {
            let options = parse_compile_options(CatalogFormat::Mo, args.collect())?;
            let report = run_compile(&options)?;
            println!("{report}");
            Ok(())
        }
        "convert" => {
            let options = parse_convert_options(args.collect())?;
            let report = run_convert(&options)?;
            println!("{report}");
            Ok(())
        }
        _ => Err(CliAppError::Usage(usage())),
    }
}

fn parse_parse_options(format: CatalogFormat, args: Vec<String>) -> Result<ParseOptions, CliAppError> {
    let mut input_path = None;
    let mut out_path = None;
    let mut pretty = false;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => out_path = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            "--pretty" => pretty = true,
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            "--help" | "-h" => return Err(CliAppError::Usage(usage())),
            _ => set_input(&mut input_path, arg)?,
        }
    }
    let input_path = input_path.ok_or_else(|| CliAppError::Usage(usage()))?;
    Ok(ParseOptions {
        input_path,
        format,
        out_path,
        pretty,
        config_path,
    })
}

fn parse_compile_options(
    format: CatalogFormat,
    args: Vec<String>,
) -> Result<CompileOptions, CliAppError> {
    let mut input_path = None;
    let mut out_path = None;
    let mut fold_length = None;
    let mut sort = false;
    let mut hash_table = false;
    let mut big_endian = false;
    let mut strict_plurals = false;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match (arg.as_str(), format) {
            ("--out", _) => out_path = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            ("--fold-length", CatalogFormat::Po) => {
                let raw = next_value("--fold-length", &mut iter)?;
                let value = raw.parse::<usize>().map_err(|_| {
                    CliAppError::Usage(format!("--fold-length expects a number, got {raw:?}"))
                })?;
                fold_length = Some(value);
            }
            ("--sort", CatalogFormat::Po) => sort = true,
            ("--hash-table", CatalogFormat::Mo) => hash_table = true,
            ("--big-endian", CatalogFormat::Mo) => big_endian = true,
            ("--strict", _) => strict_plurals = true,
            ("--config", _) => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            ("--help" | "-h", _) => return Err(CliAppError::Usage(usage())),
            _ => set_input(&mut input_path, arg)?,
        }
    }
    let input_path = input_path.ok_or_else(|| CliAppError::Usage(usage()))?;
    let out_path = out_path.ok_or_else(|| CliAppError::Usage(usage()))?;
    Ok(CompileOptions {
        input_path,
        format,
        out_path,
        fold_length,
        sort,
        hash_table,
        big_endian,
        strict_plurals,
        config_path,
    })
}

fn parse_convert_options(args: Vec<String>) -> Result<ConvertOptions, CliAppError> {
    let mut input_path = None;
    let mut out_path = None;
    let mut strict_plurals = false;
    let mut config_path = PathBuf::from(DEFAULT_CONFIG_PATH);
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--out" => out_path = Some(PathBuf::from(next_value("--out", &mut iter)?)),
            "--strict" => strict_plurals = true,
            "--config" => config_path = PathBuf::from(next_value("--config", &mut iter)?),
            "--help" | "-h" => return Err(CliAppError::Usage(usage())),
            _ => set_input(&mut input_path, arg)?,
        }
    }
    let input_path = input_path.ok_or_else(|| CliAppError::Usage(usage()))?;
    let out_path = out_path.ok_or_else(|| CliAppError::Usage(usage()))?;
    Ok(ConvertOptions {
        input_path,
        out_path,
        strict_plurals,
        config_path,
    })
}

fn set_input(slot: &mut Option<PathBuf>, arg: String) -> Result<(), CliAppError> {
    if arg.starts_with('-') || slot.is_some() {
        return Err(CliAppError::Usage(usage()));
    }
    *slot = Some(PathBuf::from(arg));
    Ok(())
}

fn next_value(flag: &str, iter: &mut impl Iterator<Item = String>) -> Result<String, CliAppError> {
    iter.next()
        .ok_or_else(|| CliAppError::Usage(format!("{flag} requires a value\n\n{}", usage())))
}

fn usage() -> String {
    "usage: gettext-codec parse-po <file.po> [--out <path>] [--pretty] [--config <path>]\n       gettext-codec parse-mo <file.mo> [--out <path>] [--pretty] [--config <path>]\n       gettext-codec compile-po <table.json> --out <path> [--fold-length <n>] [--sort] [--strict] [--config <path>]\n       gettext-codec compile-mo <table.json> --out <path> [--hash-table] [--big-endian] [--strict] [--config <path>]\n       gettext-codec convert <input.po|input.mo> --out <output.po|output.mo> [--strict] [--config <path>]".to_string()
}
