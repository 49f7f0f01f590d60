use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use clearscript_core::{CoreError, compile};
use log::LevelFilter;
use walkdir::WalkDir;

const SOURCE_EXTENSION: &str = "cst";
const LISTING_EXTENSION: &str = "ss";

/// Compile ClearScript sources into StateScript listings.
#[derive(Parser, Debug)]
#[command(name = "clearscript", version, about, long_about = None)]
struct Cli {
    /// Log more (-v for debug, -vv for trace). Without it RUST_LOG applies.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a .cst file, or every .cst file under a directory
    Compile(CompileArgs),
    /// Print the compiler version
    Version,
}

#[derive(Args, Debug)]
struct CompileArgs {
    /// Source file or directory
    input: PathBuf,

    /// Output file (defaults to the input path with a .ss extension)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Print the listing to stdout instead of writing a file
    #[arg(long, conflicts_with = "output")]
    stdout: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.format_timestamp(None).init();
}

fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Version => {
            println!("clearscript {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Command::Compile(args) if args.input.is_dir() => {
            if args.output.is_some() || args.stdout {
                bail!("--output and --stdout need a single input file, not a directory");
            }
            compile_directory(&args.input)
        }
        Command::Compile(args) => {
            let output = if args.stdout {
                None
            } else {
                Some(args.output.unwrap_or_else(|| listing_path(&args.input)))
            };
            if compile_file(&args.input, output.as_deref())? {
                Ok(())
            } else {
                bail!("compilation of {} failed", args.input.display())
            }
        }
    }
}

/// Compiles every source file under `root`, continuing past failures.
fn compile_directory(root: &Path) -> Result<()> {
    let mut failed = 0usize;
    let mut compiled = 0usize;
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        let path = entry.path();
        let is_source = entry.file_type().is_file()
            && path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION);
        if !is_source {
            continue;
        }
        if compile_file(path, Some(&listing_path(path)))? {
            compiled += 1;
        } else {
            failed += 1;
        }
    }
    log::debug!("compiled {compiled} file(s) under {}", root.display());
    if failed > 0 {
        bail!("{failed} file(s) under {} failed to compile", root.display());
    }
    Ok(())
}

/// Returns `Ok(false)` when the source has errors; those are printed.
/// `output == None` prints the listing to stdout.
fn compile_file(input: &Path, output: Option<&Path>) -> Result<bool> {
    let source = fs::read_to_string(input)
        .with_context(|| format!("failed to read input file {}", input.display()))?;

    let listing = match compile(&source) {
        Ok(listing) => listing,
        Err(err) => {
            report(input, &err);
            return Ok(false);
        }
    };

    match output {
        Some(output) => {
            write_output(output, &listing)?;
            println!("compiled {} -> {}", input.display(), output.display());
        }
        None => print!("{listing}"),
    }
    Ok(true)
}

fn report(input: &Path, err: &CoreError) {
    for diagnostic in err.diagnostics() {
        eprintln!(
            "{}:{}:{}: {}: {}",
            input.display(),
            diagnostic.line(),
            diagnostic.column(),
            diagnostic.severity,
            diagnostic.message
        );
    }
}

fn listing_path(input: &Path) -> PathBuf {
    input.with_extension(LISTING_EXTENSION)
}

fn write_output(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    fs::write(path, text)
        .with_context(|| format!("failed to write output file {}", path.display()))?;
    Ok(())
}
