use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "searchable-mapper")]
#[command(about = "Build search index mappings from domain class descriptors")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, value_name = "FILTER", global = true)]
    pub log: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Build mappings and print them; fails on the first invalid class.
    Map {
        /// Descriptor file or directory of descriptors
        input: PathBuf,

        #[arg(short = 'c', long, value_name = "CLASS")]
        class: Option<String>,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Build every class, report failures per class and keep going.
    Check {
        input: PathBuf,
    },
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
