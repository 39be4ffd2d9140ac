#![forbid(unsafe_code)]

mod catalog_io;
mod cli;
mod command_compile;
mod command_convert;
mod command_parse;
mod config;
mod digest;
mod error;

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "GETTEXT_CODEC_LOG";

fn main() -> ExitCode {
    init_tracing();
    match cli::run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
