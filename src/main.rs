//! MiniLisp CLI
//!
//! Main entry point for the `minilisp` command.

use clap::{Parser, Subcommand};
use miette::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use minilisp::repl::{HELP, Mode, Session};
use minilisp::{InterpreterConfig, Verbosity};

#[derive(Parser)]
#[command(name = "minilisp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A tree-walking interpreter for MiniLisp", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Program to run when no subcommand is given
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Increase verbosity (-v echoes values, -vv dumps scopes)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Abort evaluation nested deeper than this
    #[arg(long, value_name = "N", global = true)]
    max_depth: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a MiniLisp source file
    Run {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// Start the interactive REPL
    Repl,

    /// Show the forms read from a source file
    Parse {
        /// Input file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print the forms as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show information about the interpreter
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over -v
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = InterpreterConfig {
        verbosity: Verbosity::from_occurrences(cli.verbose),
        max_depth: cli.max_depth,
        capture_output: false,
    };

    match (cli.command, cli.file) {
        (Some(Commands::Run { input }), _) | (None, Some(input)) => run(&input, config),
        (Some(Commands::Repl), _) | (None, None) => repl(config),
        (Some(Commands::Parse { input, json }), _) => parse(&input, json),
        (Some(Commands::Info), _) => info(),
    }
}

fn read_source(input: &Path) -> Result<String> {
    std::fs::read_to_string(input)
        .map_err(|e| miette::miette!("Failed to read input file {}: {}", input.display(), e))
}

fn run(input: &Path, config: InterpreterConfig) -> Result<()> {
    tracing::info!("Running {:?}", input);

    let source = read_source(input)?;
    let mut session =
        Session::new(Mode::Batch, config).with_source_name(input.to_string_lossy().to_string());
    let summary = session.run(&source);

    tracing::info!(
        "Ran {} statements, {} failed",
        summary.statements,
        summary.errors
    );
    Ok(())
}

fn repl(config: InterpreterConfig) -> Result<()> {
    println!("MiniLisp REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut rl =
        DefaultEditor::new().map_err(|e| miette::miette!("Failed to start line editor: {}", e))?;
    let mut session =
        Session::new(Mode::Interactive, config).with_colour(std::io::stdout().is_terminal());
    let mut buffer = String::new();

    loop {
        let prompt = if buffer.is_empty() { "MiniLisp> " } else { "...> " };
        let line = match rl.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) if !buffer.is_empty() => {
                buffer.clear();
                continue;
            }
            Err(ReadlineError::Eof) | Err(ReadlineError::Interrupted) => break,
            Err(e) => return Err(miette::miette!("Failed to read input: {}", e)),
        };

        if buffer.is_empty() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let _ = rl.add_history_entry(trimmed);

            match trimmed {
                ":quit" | ":q" => break,
                ":help" | ":h" => {
                    println!("{}", HELP);
                    continue;
                }
                ":env" => {
                    for line in session.environment_listing() {
                        println!("{}", line);
                    }
                    continue;
                }
                _ => {}
            }
        } else {
            let _ = rl.add_history_entry(line.trim());
        }

        buffer.push_str(&line);
        buffer.push('\n');
        if Session::needs_more_input(&buffer) {
            continue;
        }

        session.run(&buffer);
        buffer.clear();
    }

    println!("Goodbye!");
    Ok(())
}

fn parse(input: &Path, json: bool) -> Result<()> {
    let source = read_source(input)?;
    let file = minilisp::SourceFile::new(input.to_string_lossy().to_string(), source.clone());
    let forms = minilisp::parse(&source).map_err(|e| file.report(e))?;
    tracing::debug!("Parsed {} forms", forms.len());

    if json {
        let json = serde_json::to_string_pretty(&forms)
            .map_err(|e| miette::miette!("Failed to serialize forms: {}", e))?;
        println!("{}", json);
    } else {
        for form in &forms {
            println!("{}", form);
        }
    }
    Ok(())
}

fn info() -> Result<()> {
    println!("MiniLisp interpreter");
    println!("Version: {}", minilisp::VERSION);
    println!();
    println!("Special forms:");
    println!("  define, fun, if");
    println!();
    println!("Builtins:");
    let names: Vec<&str> = minilisp::interp::builtins::builtin_names().collect();
    println!("  {}", names.join(" "));
    Ok(())
}
