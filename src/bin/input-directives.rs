//! Input Directives CLI
//!
//! Command-line interface for compiling, inspecting and linting annotated
//! GraphQL schemas.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use input_directives::{
    compile, lint, load_schema_auto, print_document, read_text, AnnotationRegistry,
    Compilation, CompileError, CompileOptions, FileStatus, LintOptions, RequestContext, Severity,
};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter (e.g. `debug`, `input_directives=trace`).
const LOG_ENV: &str = "INPUT_DIRECTIVES_LOG";

#[derive(Parser)]
#[command(name = "input-directives")]
#[command(about = "Compile and check annotations on GraphQL input types")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a schema and print it with consumed annotations removed
    Strip {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Fail on annotations that nothing handles
        #[arg(long)]
        strict: bool,
    },

    /// Print the compiled input records as JSON
    Inspect {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Fail on annotations that nothing handles
        #[arg(long)]
        strict: bool,
    },

    /// Run an input record's compiled transform over a JSON payload
    Validate {
        /// Schema source: file path or URL (http:// or https://)
        schema: String,

        /// Input type to run the payload through
        #[arg(long)]
        input: String,

        /// Payload file (JSON)
        payload: PathBuf,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Lint schema files for errors (syntax, malformed annotations, unknown types)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Annotations registered by the application (repeatable or comma separated)
        #[arg(long, value_name = "NAME", action = ArgAction::Append, value_delimiter = ',')]
        known: Vec<String>,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Strip {
            schema,
            output,
            strict,
        } => run_strip(&schema, output, strict),

        Commands::Inspect {
            schema,
            pretty,
            strict,
        } => run_inspect(&schema, pretty, strict),

        Commands::Validate {
            schema,
            input,
            payload,
            json,
        } => run_validate(&schema, &input, &payload, json),

        Commands::Lint {
            path,
            format,
            strict,
            known,
            quiet,
        } => run_lint(&path, &format, LintOptions::new().strict(strict).known(known), quiet),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn compile_source(schema_source: &str, strict: bool) -> Result<Compilation, CompileError> {
    let document = load_schema_auto(schema_source)?;
    compile(
        document,
        &AnnotationRegistry::new(),
        &CompileOptions::new().strict(strict),
    )
}

fn exit_code(e: &CompileError) -> u8 {
    e.exit_code() as u8
}

fn run_strip(schema_source: &str, output: Option<PathBuf>, strict: bool) -> Result<(), u8> {
    let compilation = compile_source(schema_source, strict).map_err(|e| {
        eprintln!("Error: {}", e);
        exit_code(&e)
    })?;

    let sdl = print_document(&compilation.document);

    match output {
        Some(path) => {
            std::fs::write(&path, &sdl).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            print!("{}", sdl);
        }
    }

    Ok(())
}

fn run_inspect(schema_source: &str, pretty: bool, strict: bool) -> Result<(), u8> {
    let compilation = compile_source(schema_source, strict).map_err(|e| {
        eprintln!("Error: {}", e);
        exit_code(&e)
    })?;

    let report = json!({
        "inputs": compilation.inputs,
        "warnings": compilation.warnings,
    });
    let json_output = if pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    println!("{}", json_output);
    Ok(())
}

fn run_validate(schema_source: &str, input: &str, payload_path: &Path, json_output: bool) -> Result<(), u8> {
    let compilation = compile_source(schema_source, false).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        exit_code(&e)
    })?;

    if !compilation.inputs.contains(input) {
        report_error(json_output, &format!("unknown input type: {}", input));
        return Err(2);
    }

    let content = read_text(payload_path).map_err(|e| {
        report_error(json_output, &format!("loading payload: {}", e));
        e.exit_code() as u8
    })?;
    let payload: Value = serde_json::from_str(&content).map_err(|e| {
        report_error(json_output, &format!("invalid payload JSON: {}", e));
        2u8
    })?;

    match compilation
        .inputs
        .transform(input, payload, &RequestContext::detached())
    {
        Ok(value) => {
            if json_output {
                println!("{}", json!({ "valid": true, "value": value }));
            } else {
                println!("{}", value);
            }
            Ok(())
        }
        Err(e) => {
            if json_output {
                println!("{}", json!({ "valid": false, "errors": [e.to_string()] }));
            } else {
                eprintln!("Validation failed:");
                eprintln!("  {}", e);
            }
            Err(1)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({ "valid": false, "error": msg }));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_lint(path: &Path, format: &str, options: LintOptions, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(3);
    }

    let result = lint(path, &options);
    let passed = result.is_ok() && (!options.strict || result.warnings == 0);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if passed {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if passed {
        Ok(())
    } else {
        Err(1)
    }
}
