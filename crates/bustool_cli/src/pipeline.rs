//! The generation pipeline behind `bustool`.
//!
//! 1. Load `bustool.toml` (from `--config`, or the working directory)
//! 2. Read the description document (file or standard input)
//! 3. Register every entity and resolve the selection
//! 4. Analyze the whole registry, then generate the selected entities
//! 5. Render SystemVerilog or dump the declarations as JSON
//! 6. Report diagnostics and write the output when there were no errors

use std::io::{self, Read, Write};
use std::path::Path;

use bustool_common::{load_document, load_document_from_str, DocumentError, DocumentFormat, Node};
use bustool_config::{GeneratorConfig, CONFIG_FILE_NAME};
use bustool_diagnostics::DiagnosticSink;
use bustool_elaborate::{elaborate, Registry};

use crate::report::{counts, format_report};
use crate::{Cli, EmitKind, ReportFormat};

/// First line of every SystemVerilog output when the banner is enabled.
const BANNER: &str = "// Generated by bustool";

/// Runs the pipeline for one invocation.
///
/// Returns exit code 0 on success and 1 when any error diagnostic was
/// raised. Documents that do not parse are reported like any other
/// diagnostic; only I/O failures are returned as errors.
pub fn run(cli: &Cli, color: bool) -> Result<i32, Box<dyn std::error::Error>> {
    let config = resolve_config(cli.config.as_deref())?;
    let sink = DiagnosticSink::new();

    let output = match read_document(&cli.input) {
        Ok(document) => generate(cli, &config, &document, &sink)?,
        Err(DocumentError::IoError(e)) => return Err(e.into()),
        Err(e) => {
            sink.emit(e.to_diagnostic());
            None
        }
    };

    let diagnostics = sink.diagnostics();
    let origin = (cli.input != "-").then_some(cli.input.as_str());
    eprint!("{}", format_report(&diagnostics, cli.format, color, origin));

    let (errors, warnings) = counts(&diagnostics);
    if !cli.quiet && cli.format == ReportFormat::Text {
        eprintln!("   Result: {errors} error(s), {warnings} warning(s)");
    }

    match output {
        Some(text) if !sink.has_errors() => {
            write_output(&cli.output, &text)?;
            Ok(0)
        }
        _ => Ok(1),
    }
}

/// Elaborates `document` and renders the selected entities.
///
/// Structured failures are pushed into `sink` as diagnostics and yield
/// `None`. Only configuration mistakes are returned as errors.
fn generate(
    cli: &Cli,
    config: &GeneratorConfig,
    document: &Node,
    sink: &DiagnosticSink,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let registry = match Registry::from_document(document) {
        Ok(registry) => registry,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(None);
        }
    };

    let selection = if cli.entities.is_empty() {
        config.build.check_entities(|id| registry.contains(id))?;
        config.build.entities.clone()
    } else {
        cli.entities.clone()
    };

    if !cli.quiet {
        let count = if selection.is_empty() {
            registry.len()
        } else {
            selection.len()
        };
        eprintln!("   Generating {count} entities from {}", cli.input);
    }

    let decls = match elaborate(&registry, &selection, sink) {
        Ok(decls) => decls,
        Err(e) => {
            sink.emit(e.to_diagnostic());
            return Ok(None);
        }
    };

    match cli.emit {
        EmitKind::Ir => Ok(Some(serde_json::to_string_pretty(&decls)? + "\n")),
        EmitKind::Sv => {
            let le = config.output.line_ending.as_str();
            match bustool_sv::render_all(&decls, &config.output.indent, le) {
                Ok(entities) => {
                    let mut parts = Vec::with_capacity(entities.len() + 1);
                    if config.output.banner {
                        parts.push(format!("{BANNER}{le}"));
                    }
                    parts.extend(entities);
                    Ok(Some(parts.join(le)))
                }
                Err(e) => {
                    sink.emit(e.to_diagnostic());
                    Ok(None)
                }
            }
        }
    }
}

/// Loads the explicit config file, else `./bustool.toml` when present, else
/// the defaults.
fn resolve_config(path: Option<&str>) -> Result<GeneratorConfig, bustool_config::ConfigError> {
    match path {
        Some(path) => bustool_config::load_config(Path::new(path)),
        None => {
            let local = Path::new(CONFIG_FILE_NAME);
            if local.is_file() {
                bustool_config::load_config(local)
            } else {
                Ok(GeneratorConfig::default())
            }
        }
    }
}

/// Reads the document at `input`, or standard input for `-`.
fn read_document(input: &str) -> Result<Node, DocumentError> {
    if input == "-" {
        let mut text = String::new();
        io::stdin().read_to_string(&mut text)?;
        load_document_from_str(&text, DocumentFormat::detect(&text))
    } else {
        load_document(Path::new(input))
    }
}

fn write_output(output: &str, text: &str) -> io::Result<()> {
    if output == "-" {
        let mut stdout = io::stdout().lock();
        stdout.write_all(text.as_bytes())?;
        stdout.flush()
    } else {
        std::fs::write(output, text)
    }
}
