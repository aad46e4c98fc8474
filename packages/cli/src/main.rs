mod commands;
mod resolver;

use clap::{Parser, Subcommand};
use commands::{check, fmt, schema, CheckArgs, FmtArgs, SchemaArgs};

/// uiml - tooling for the .ui interface markup language
#[derive(Parser, Debug)]
#[command(name = "uiml")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse files and report diagnostics
    Check(CheckArgs),

    /// Reformat a file through the canonical exporter
    Fmt(FmtArgs),

    /// Aggregate element/property schema statistics across a directory
    Schema(SchemaArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Check(args) => check(args),
        Command::Fmt(args) => fmt(args),
        Command::Schema(args) => schema(args),
    }
}
