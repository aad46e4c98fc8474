use crate::resolver::FsResolver;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use uiml_discovery::SchemaAccumulator;
use uiml_evaluator::{resolve_at_path, EvalWarning};
use uiml_parser::serializer::{export, FormatterConfig};
use uiml_parser::parse_with_path;
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// .ui files to check
    pub files: Vec<PathBuf>,

    /// Also resolve references and report evaluation warnings
    #[arg(long)]
    pub resolve: bool,
}

#[derive(Args, Debug)]
pub struct FmtArgs {
    /// File to format
    pub file: PathBuf,

    /// Rewrite the file in place instead of printing to stdout
    #[arg(short, long)]
    pub write: bool,

    /// Indent width in spaces
    #[arg(long, default_value_t = 4)]
    pub indent: usize,

    /// Indent with tabs
    #[arg(long)]
    pub tabs: bool,
}

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Directory to scan recursively for .ui files
    pub dir: PathBuf,

    /// Emit the aggregated statistics as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn check(args: CheckArgs) -> Result<()> {
    if args.files.is_empty() {
        bail!("no files given");
    }

    let mut failed = 0usize;
    for file in &args.files {
        let path = file.display().to_string();
        let source = std::fs::read_to_string(file)
            .with_context(|| format!("failed to read {}", path))?;

        match parse_with_path(&source, &path) {
            Ok(document) => {
                println!("{} {}", "ok".green().bold(), path);
                if args.resolve {
                    let mut warnings: Vec<EvalWarning> = Vec::new();
                    resolve_at_path(&document, &path, &FsResolver, &mut warnings);
                    for warning in &warnings {
                        println!("  {} {}", "warning:".yellow(), warning.message);
                    }
                }
            }
            Err(errors) => {
                failed += 1;
                println!("{} {}", "error".red().bold(), path);
                for error in &errors {
                    println!("  {}:{}: {}", error.line, error.column, error.message);
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} files failed to parse", failed, args.files.len());
    }
    Ok(())
}

pub fn fmt(args: FmtArgs) -> Result<()> {
    let path = args.file.display().to_string();
    let source =
        std::fs::read_to_string(&args.file).with_context(|| format!("failed to read {}", path))?;

    let document = match parse_with_path(&source, &path) {
        Ok(document) => document,
        Err(errors) => {
            for error in &errors {
                eprintln!("{}:{}:{}: {}", path, error.line, error.column, error.message);
            }
            bail!("{} has {} parse errors", path, errors.len());
        }
    };

    let config = FormatterConfig {
        indent_width: args.indent,
        use_tabs: args.tabs,
        ..FormatterConfig::default()
    };
    let formatted = export(&document, &config)?;

    if args.write {
        std::fs::write(&args.file, &formatted)
            .with_context(|| format!("failed to write {}", path))?;
        println!("{} {}", "formatted".green().bold(), path);
    } else {
        print!("{}", formatted);
    }
    Ok(())
}

pub fn schema(args: SchemaArgs) -> Result<()> {
    let mut accumulator = SchemaAccumulator::new();

    for entry in WalkDir::new(&args.dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().map(|x| x == "ui").unwrap_or(false))
    {
        let path = entry.path().display().to_string();
        match std::fs::read_to_string(entry.path()) {
            Ok(source) => accumulator.scan_source(&path, &source),
            Err(e) => eprintln!("{} {}: {}", "skipped".yellow(), path, e),
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&accumulator)?);
        return Ok(());
    }

    println!(
        "{} files scanned, {} with parse errors, {} style definitions",
        accumulator.files_scanned.to_string().bold(),
        accumulator.files_with_errors,
        accumulator.style_definitions
    );
    for (type_name, stats) in &accumulator.types {
        println!(
            "{} {} ({} occurrences)",
            "type".blue().bold(),
            type_name,
            stats.occurrences
        );
        for (property, stat) in &stats.properties {
            let kinds: Vec<&str> = stat.kinds.iter().map(|s| s.as_str()).collect();
            println!("    {}: {} [{}]", property, stat.occurrences, kinds.join(", "));
        }
    }
    Ok(())
}
