use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cairn",
    about = "Inspect and edit cairn YAML stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store file to operate on
    #[arg(short, long, global = true, default_value = "store.yml")]
    pub file: PathBuf,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// How a value on the command line maps to a stored type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ValueKind {
    /// Stored as-is on read; inferred (bool, int, else string) on write
    Raw,
    Bool,
    Int,
    Long,
    Double,
    String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create the store file if it does not exist
    Init(InitArgs),
    /// Read a value
    Get(GetArgs),
    /// Write a value and save
    Set(SetArgs),
    /// Remove a value or subtree and save
    Rm(RmArgs),
    /// List the immediate children of a path
    Keys(KeysArgs),
    /// Print every value beneath a path
    Dump(DumpArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Comment header written at the top of a new file
    #[arg(long)]
    pub header: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub path: String,
    #[arg(short = 't', long = "type", default_value = "raw")]
    pub kind: ValueKind,
    /// Returned when the path holds nothing
    #[arg(short, long)]
    pub default: Option<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub path: String,
    pub value: String,
    #[arg(short = 't', long = "type", default_value = "string")]
    pub kind: ValueKind,
}

#[derive(Args)]
pub struct RmArgs {
    pub path: String,
}

#[derive(Args)]
pub struct KeysArgs {
    pub path: Option<String>,
    /// Only numbered children, in numeric order
    #[arg(long)]
    pub numeric: bool,
}

#[derive(Args)]
pub struct DumpArgs {
    pub path: Option<String>,
}
