use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use tracing::{debug, info, warn, Level};

use fbsc_common::manifest::{self, FbscManifest, ManifestError};
use fbsc_common::Diagnostic;
use fbsc_compiler::lexer::Lexer;
use fbsc_compiler::semantic;

/// FlatBuffers schema front end.
///
/// Parses .fbs schemas, validates every table and struct field, and writes
/// the resolved field definitions as JSON.
#[derive(Parser)]
#[command(
    name = "fbsc",
    version,
    about,
    long_about = "FlatBuffers schema front end.\n\nParses .fbs schemas, validates field declarations and their attributes,\nand writes the resolved definitions to <name>.fields.json.\n\nExamples:\n  fbsc monster.fbs                 Write monster.fields.json\n  fbsc monster.fbs -o generated    Write into generated/\n  fbsc monster.fbs --check         Check for errors only\n  fbsc                             Compile the schemas listed in Fbsc.toml"
)]
struct Cli {
    /// Input .fbs schema files (default: [project] schemas from Fbsc.toml).
    inputs: Vec<PathBuf>,

    /// Output directory (default: next to each schema).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Check for errors without writing output.
    #[arg(long)]
    check: bool,

    /// Print the field definitions JSON to stdout instead of writing files.
    #[arg(long = "emit-json")]
    emit_json: bool,

    /// Emit token stream to stdout (debug).
    #[arg(long = "emit-tokens")]
    emit_tokens: bool,

    /// Emit AST to stdout (debug).
    #[arg(long = "emit-ast")]
    emit_ast: bool,

    /// Suppress warning output.
    #[arg(short, long)]
    quiet: bool,

    /// Treat warnings as errors.
    #[arg(long = "deny-warnings")]
    deny_warnings: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, thiserror::Error)]
enum DriverError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error("no input schemas (pass files or list them under [project] schemas in Fbsc.toml)")]
    NoInputs,
    #[error("could not read '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize field definitions: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Effective settings after merging the manifest with CLI flags.
struct Settings {
    inputs: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    pretty: bool,
    deny_warnings: bool,
}

impl Settings {
    fn resolve(cli: &Cli, manifest: Option<&FbscManifest>) -> Result<Self, DriverError> {
        let inputs = if cli.inputs.is_empty() {
            manifest.map(FbscManifest::schema_paths).unwrap_or_default()
        } else {
            cli.inputs.clone()
        };
        if inputs.is_empty() {
            return Err(DriverError::NoInputs);
        }

        Ok(Settings {
            inputs,
            output_dir: cli
                .output
                .clone()
                .or_else(|| manifest.and_then(FbscManifest::output_dir)),
            pretty: manifest.map_or(true, |m| m.output.pretty),
            deny_warnings: cli.deny_warnings
                || manifest.is_some_and(|m| m.diagnostics.deny_warnings),
        })
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("error: {}", e);
            process::exit(1);
        }
    }
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

fn init_logging(verbose: u8) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Returns `Ok(false)` when any schema had errors.
fn run(cli: &Cli) -> Result<bool, DriverError> {
    // === Manifest ===
    // Walk up from the first input's directory, or the working directory.
    let start_dir = match cli.inputs.first() {
        Some(input) => {
            let abs = fs::canonicalize(input).unwrap_or_else(|_| input.clone());
            abs.parent().map(Path::to_path_buf).unwrap_or_default()
        }
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let manifest = match manifest::find_and_load_manifest(&start_dir) {
        Ok(m) => {
            debug!(project = %m.project.name, root = %m.root_dir.display(), "loaded manifest");
            Some(m)
        }
        Err(ManifestError::NotFound(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let settings = Settings::resolve(cli, manifest.as_ref())?;

    let mut ok = true;
    for input in &settings.inputs {
        ok &= compile_schema(input, cli, &settings)?;
    }
    Ok(ok)
}

fn compile_schema(input: &Path, cli: &Cli, settings: &Settings) -> Result<bool, DriverError> {
    let source = fs::read_to_string(input).map_err(|source| DriverError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let file_name = input.display().to_string();

    // === Lexer ===
    if cli.emit_tokens {
        let (tokens, lex_diags) = Lexer::new(&source, &file_name).tokenize();
        for token in &tokens {
            println!(
                "{:>4}:{:<3} {:?} {:?}",
                token.span.start.line, token.span.start.column, token.kind, token.lexeme,
            );
        }
        for diag in lex_diags.diagnostics() {
            print_diagnostic(diag, &source, &file_name);
        }
        return Ok(!lex_diags.has_errors());
    }

    // === Parser ===
    let (schema, mut diagnostics) = fbsc_compiler::parse_source(&source, &file_name);

    if diagnostics.has_errors() {
        for diag in diagnostics.diagnostics() {
            print_diagnostic(diag, &source, &file_name);
        }
        return Ok(false);
    }

    if cli.emit_ast {
        println!("{:#?}", schema);
        return Ok(true);
    }

    // === Semantic Analysis ===
    let (definition, sem_diags) = semantic::analyze(&schema);
    diagnostics.absorb(sem_diags);

    for diag in diagnostics.diagnostics() {
        if diag.is_error() || !cli.quiet {
            print_diagnostic(diag, &source, &file_name);
        }
    }

    if diagnostics.has_errors() {
        return Ok(false);
    }
    if settings.deny_warnings && diagnostics.has_warnings() {
        eprintln!("error: {}: warnings are denied", file_name);
        return Ok(false);
    }

    if cli.check {
        println!("{}: no errors found.", file_name);
        return Ok(true);
    }

    let json = definition.to_json(settings.pretty)?;

    // --emit-json: print JSON to stdout
    if cli.emit_json {
        println!("{}", json);
        return Ok(true);
    }

    let output_path = output_path(input, settings.output_dir.as_deref());
    if let Some(dir) = output_path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| DriverError::Write {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(&output_path, &json).map_err(|source| DriverError::Write {
        path: output_path.clone(),
        source,
    })?;

    info!(types = definition.types.len(), "wrote {}", output_path.display());
    println!(
        "Compiled {} -> {} ({} bytes)",
        input.display(),
        output_path.display(),
        json.len()
    );
    Ok(true)
}

/// `<dir>/<stem>.fields.json`, where `dir` defaults to the schema's directory.
fn output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();
    let dir = match output_dir {
        Some(dir) => dir.to_path_buf(),
        None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    dir.join(format!("{}.fields.json", stem))
}

fn print_diagnostic(diag: &Diagnostic, source: &str, file_name: &str) {
    let kind = if diag.is_error() {
        ReportKind::Error
    } else {
        ReportKind::Warning
    };
    let message = if diag.scope.is_empty() {
        diag.message.clone()
    } else {
        format!("{}: {}", diag.scope_path(), diag.message)
    };

    if let Some(ref span) = diag.span {
        let range = span.byte_range();
        let color = if diag.is_error() {
            Color::Red
        } else {
            Color::Yellow
        };

        let mut report = Report::build(kind, file_name, range.start)
            .with_message(&message)
            .with_label(
                Label::new((file_name, range))
                    .with_message(&diag.message)
                    .with_color(color),
            );

        for related in &diag.related {
            report = report.with_label(
                Label::new((file_name, related.span.byte_range()))
                    .with_message(&related.message)
                    .with_color(Color::Blue),
            );
        }

        if let Some(ref suggestion) = diag.suggestion {
            report = report.with_help(suggestion);
        }

        if let Err(e) = report
            .finish()
            .eprint((file_name, Source::from(source)))
        {
            warn!("failed to render diagnostic: {}", e);
        }
    } else {
        let prefix = if diag.is_error() { "error" } else { "warning" };
        eprintln!("{}: {}", prefix, message);
        if let Some(ref suggestion) = diag.suggestion {
            eprintln!("   = help: {}", suggestion);
        }
        eprintln!();
    }
}
