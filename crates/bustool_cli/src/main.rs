//! bustool CLI: generates SystemVerilog from bus description documents.
//!
//! Reads a JSON or TOML description, elaborates every bus template,
//! crossbar and multiplexer in it, and writes the selected entities as
//! SystemVerilog (or as a JSON dump of the generated declarations).

#![warn(missing_docs)]

mod pipeline;
mod report;

use std::io::IsTerminal;
use std::process;

use clap::{Parser, ValueEnum};

/// bustool: bus protocol descriptions to SystemVerilog.
#[derive(Parser, Debug)]
#[command(name = "bustool", version, about = "Bus protocol to SystemVerilog generator")]
pub struct Cli {
    /// Description document (`.json` or `.toml`), or `-` for standard input.
    pub input: String,

    /// Output path, or `-` for standard output.
    #[arg(short, long, default_value = "-")]
    pub output: String,

    /// Entity ids to emit. Repeat the flag to select several.
    #[arg(short, long = "entity")]
    pub entities: Vec<String>,

    /// What to emit for the selected entities.
    #[arg(long, value_enum, default_value_t = EmitKind::Sv)]
    pub emit: EmitKind,

    /// Output format for diagnostics.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub format: ReportFormat,

    /// Path to a custom `bustool.toml` configuration file.
    #[arg(long)]
    pub config: Option<String>,

    /// Suppress all output except errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Control colored output.
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// Output produced for the selected entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EmitKind {
    /// SystemVerilog source text.
    Sv,
    /// The generated entity declarations as JSON.
    Ir,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Diagnostic output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    match pipeline::run(&cli, color) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Installs the logger. `RUST_LOG` takes precedence over the flags.
fn init_logging(cli: &Cli) {
    let level = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}
