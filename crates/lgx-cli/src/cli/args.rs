//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "lgx",
    version,
    about = "LGX package manager: create, inspect and verify multi-variant .lgx packages"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new empty package
    Create(CreateArgs),
    /// Add or replace a variant in a package
    Add(AddArgs),
    /// Remove a variant from a package
    Remove(RemoveArgs),
    /// Extract one or all variants
    Extract(ExtractArgs),
    /// Verify package invariants
    Verify(VerifyArgs),
    /// Sign a package (reserved)
    Sign(SignArgs),
    /// Publish a package to a registry (reserved)
    Publish(PublishArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CreateArgs {
    /// Package name; the output file is <name>.lgx in the current directory
    pub name: String,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    /// Package file (.lgx)
    pub package: PathBuf,

    /// Variant name (case-insensitive, stored lowercased)
    #[arg(long, short = 'v')]
    pub variant: String,

    /// File or directory to ingest into the variant
    #[arg(long, short = 'f')]
    pub files: PathBuf,

    /// Entry-point path relative to the variant root; required when --files
    /// is a directory, defaults to the file name otherwise
    #[arg(long, short = 'm')]
    pub main: Option<String>,

    /// Skip confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    /// Package file (.lgx)
    pub package: PathBuf,

    /// Variant name (case-insensitive)
    #[arg(long, short = 'v')]
    pub variant: String,

    /// Skip confirmation prompts
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Package file (.lgx)
    pub package: PathBuf,

    /// Extract only this variant; all variants when omitted
    #[arg(long, short = 'v')]
    pub variant: Option<String>,

    /// Output directory
    #[arg(long, short = 'o', default_value = ".")]
    pub output: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct VerifyArgs {
    /// Package file (.lgx)
    pub package: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SignArgs {
    /// Package file (.lgx)
    pub package: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PublishArgs {
    /// Package file (.lgx)
    pub package: Option<PathBuf>,
}
