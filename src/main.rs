use std::process::ExitCode;

use clap::Parser;
use cli::Cli;
use moq::{
    config::Config,
    driver::{self, Mocker, Output},
};
use tracing_subscriber::EnvFilter;

// executable-specific modules
mod cli;

pub fn interface() -> driver::Result {
    let Cli {
        out,
        pkg,
        config,
        destination,
        interfaces,
    } = Cli::parse();

    let config = match config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&destination)?,
    };

    let names = interfaces.iter().map(String::as_str).collect::<Vec<_>>();
    let mocker = Mocker::new(&destination, pkg.as_deref(), &config)?;
    let text = mocker.mock(&names)?;

    let output = match out {
        Some(path) => Output::File(path.into()),
        None => Output::Stdout,
    };

    output.emit(&text, &names)
}

fn main() -> ExitCode {
    if let Ok(filter) = EnvFilter::try_from_env("MOQ_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }

    match interface() {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("moq: {error}");
            ExitCode::FAILURE
        }
    }
}
