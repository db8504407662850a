//! CLI definitions.

use std::path::PathBuf;

use clap::Parser;

/// Generates mocks for Go interfaces.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output file (default stdout)
    #[arg(short = 'o', long)]
    pub out: Option<PathBuf>,
    /// Package name (default will infer)
    #[arg(short = 'p', long)]
    pub pkg: Option<String>,
    /// Configuration file (default moq.toml in the destination)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// The directory containing the interfaces
    pub destination: PathBuf,
    /// The interfaces to mock
    pub interfaces: Vec<String>,
}
