//! Tabula Command-Line Interface
//!
//! Runs statements against a directory of text-file tables.
//!
//! # Usage
//!
//! ```bash
//! # Start interactive REPL
//! tabula -r ./data
//!
//! # Execute a single statement
//! tabula -r ./data -c "USE shop; SELECT * FROM product;"
//!
//! # Execute a script
//! tabula -r ./data -f setup.sql
//!
//! # Pipe a script
//! tabula -r ./data < setup.sql
//! ```

use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tabula_common::LockBackend;
use tabula_engine::{Database, Session};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tabula_cli::config::CliConfig;
use tabula_cli::formatter::OutputFormat;
use tabula_cli::repl::Repl;
use tabula_cli::script::{self, Flow};

/// Tabula command-line interface
#[derive(Parser, Debug)]
#[command(
    name = "tabula",
    version,
    about = "Command-line shell for Tabula",
    long_about = "A command-line shell for Tabula, a small relational store that keeps\n\
                  every database in a directory and every table in a text file."
)]
struct Args {
    /// Directory holding the databases
    #[arg(short = 'r', long, value_name = "DIR", env = "TABULA_ROOT")]
    root: Option<PathBuf>,

    /// How table locks are kept
    #[arg(long, value_enum)]
    lock_backend: Option<LockBackendArg>,

    /// Execute statements and exit
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Execute a script file and exit
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum)]
    output: Option<OutputFormatArg>,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Suppress banner and closing message
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Lock backend argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LockBackendArg {
    /// Marker files next to each table
    File,
    /// In-process lock set
    Memory,
}

impl From<LockBackendArg> for LockBackend {
    fn from(arg: LockBackendArg) -> Self {
        match arg {
            LockBackendArg::File => LockBackend::File,
            LockBackendArg::Memory => LockBackend::Memory,
        }
    }
}

/// Output format argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormatArg {
    /// Pipe-separated values, one row per line
    Raw,
    /// Display results in a formatted table
    Table,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Raw => OutputFormat::Raw,
            OutputFormatArg::Table => OutputFormat::Table,
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose);

    let config = load_config(&args)?;
    let format = match args.output {
        Some(arg) => arg.into(),
        None => config
            .output_format
            .parse::<OutputFormat>()
            .map_err(anyhow::Error::msg)?,
    };

    let database = Database::open(config.engine.clone())
        .with_context(|| format!("failed to open {}", config.engine.root_dir.display()))?;
    let session = database.session();

    if let Some(command) = &args.command {
        execute_command(session, command, format)
    } else if let Some(file) = &args.file {
        execute_file(session, file, format, args.quiet)
    } else if !io::stdin().is_terminal() {
        execute_stdin(session, format, args.quiet)
    } else {
        run_repl(session, &config, format, args.quiet)
    }
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("tabula=debug")
        } else {
            EnvFilter::new("tabula=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn load_config(args: &Args) -> Result<CliConfig> {
    let mut config = if let Some(path) = &args.config {
        CliConfig::from_file(path)?
    } else {
        CliConfig::load_default()?
    };

    if let Some(root) = &args.root {
        config.engine.root_dir = root.clone();
    }
    if let Some(backend) = args.lock_backend {
        config.engine.lock_backend = backend.into();
    }

    Ok(config)
}

fn execute_command(mut session: Session, sql: &str, mut format: OutputFormat) -> Result<()> {
    info!("Executing command: {}", sql);

    let mut out = io::stdout().lock();
    script::run_script(&mut session, sql, &mut format, &mut out)?;
    Ok(())
}

fn execute_file(
    session: Session,
    path: &Path,
    format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    info!("Executing file: {}", path.display());

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    execute_content(session, &content, format, quiet)
}

fn execute_stdin(session: Session, format: OutputFormat, quiet: bool) -> Result<()> {
    let mut content = String::new();
    io::stdin()
        .read_to_string(&mut content)
        .context("failed to read standard input")?;
    execute_content(session, &content, format, quiet)
}

fn execute_content(
    mut session: Session,
    content: &str,
    mut format: OutputFormat,
    quiet: bool,
) -> Result<()> {
    let mut out = io::stdout().lock();
    if script::run_script(&mut session, content, &mut format, &mut out)? == Flow::Exit {
        info!("script stopped at .exit");
    }
    if !quiet {
        writeln!(out, "All Done.")?;
    }
    Ok(())
}

fn run_repl(session: Session, config: &CliConfig, format: OutputFormat, quiet: bool) -> Result<()> {
    let mut repl = Repl::new(session, config, format)?;

    if !quiet {
        repl.print_banner();
    }

    repl.run()
}
