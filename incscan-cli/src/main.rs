use clap::{Args, Parser, Subcommand, ValueEnum};
use incscan_core::{
    DirectiveTarget, IoError, Project, ProjectBuilder, ScanConfig, SourceFile,
    io::{load_config, scan_path, scan_path_with},
};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const CONFIG_FILE: &str = "incscan.yml";

#[derive(Parser)]
#[command(name = "incscan")]
#[command(
    about = "Find include/require directives outside comments and strings",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter incscan.yml in the current directory
    Init,

    /// List directives and diagnostics per file
    Scan {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Show every lexical region of each file
    Regions {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print comment text line by line
    Comments {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Fuzzy search directive arguments
    Search {
        /// Search query
        query: String,

        #[command(flatten)]
        input: InputArgs,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Source files to scan
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Path to a config file (defaults to ./incscan.yml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use this dialect for every file instead of picking by extension
    #[arg(short, long)]
    dialect: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    }
}

/// Install a stderr subscriber, only when `RUST_LOG` is set.
fn init_tracing() {
    if std::env::var("RUST_LOG").is_err() {
        return;
    }
    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true),
        )
        .with(EnvFilter::from_default_env())
        .try_init();
}

#[derive(Debug)]
enum CliError {
    Io(std::io::Error),
    Config(String),
    Json(serde_json::Error),
    /// At least one file produced an error diagnostic.
    Diagnostics(usize),
    InvalidArgs(String),
}

impl CliError {
    fn exit_code(&self) -> ExitCode {
        match self {
            CliError::Io(_) => ExitCode::from(2),
            CliError::Config(_) => ExitCode::from(1),
            CliError::Json(_) => ExitCode::from(1),
            CliError::Diagnostics(_) => ExitCode::from(1),
            CliError::InvalidArgs(_) => ExitCode::from(1),
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Io(e) => write!(f, "IO error: {e}"),
            CliError::Config(msg) => write!(f, "Config error: {msg}"),
            CliError::Json(e) => write!(f, "JSON error: {e}"),
            CliError::Diagnostics(n) => write!(f, "{n} file(s) have errors"),
            CliError::InvalidArgs(msg) => write!(f, "{msg}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}

impl From<IoError> for CliError {
    fn from(e: IoError) -> Self {
        match e {
            IoError::ReadFile(e) => CliError::Io(e),
            other => CliError::Config(other.to_string()),
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Init => cmd_init(Path::new(CONFIG_FILE)),
        Commands::Scan { input } => cmd_scan(&input),
        Commands::Regions { input } => cmd_regions(&input),
        Commands::Comments { input } => cmd_comments(&input),
        Commands::Search { query, input } => cmd_search(&query, &input),
    }
}

fn cmd_init(path: &Path) -> Result<(), CliError> {
    if path.exists() {
        return Err(CliError::InvalidArgs(format!(
            "File '{}' already exists",
            path.display()
        )));
    }

    fs::write(path, ScanConfig::default_yaml())?;
    println!("Created config: {}", path.display());
    Ok(())
}

fn load_scan_config(explicit: Option<&Path>) -> Result<ScanConfig, CliError> {
    match explicit {
        Some(path) => Ok(load_config(path)?),
        None => {
            let default = Path::new(CONFIG_FILE);
            if default.exists() {
                tracing::debug!(path = CONFIG_FILE, "using config from current directory");
                Ok(load_config(default)?)
            } else {
                Ok(ScanConfig::default())
            }
        }
    }
}

/// Scan every input file. Files without a known dialect are reported and skipped.
fn load_project(input: &InputArgs) -> Result<Project, CliError> {
    let config = load_scan_config(input.config.as_deref())?;

    let forced = match &input.dialect {
        Some(name) => Some(config.dialect(name).ok_or_else(|| {
            CliError::InvalidArgs(format!("Unknown dialect '{name}'"))
        })?),
        None => None,
    };

    let mut builder = ProjectBuilder::new();
    for path in &input.files {
        let scanned = match forced {
            Some(dialect) => scan_path_with(path, dialect),
            None => scan_path(path, &config),
        };
        match scanned {
            Ok(file) => builder = builder.add_file(file),
            Err(IoError::UnsupportedFile(name)) => {
                eprintln!("Skipping {name}: no dialect for this file type");
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(builder.build())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn target_label(target: &DirectiveTarget) -> &'static str {
    match target {
        DirectiveTarget::Static { .. } => "static",
        DirectiveTarget::Remote { .. } => "remote",
        DirectiveTarget::Dynamic { .. } => "dynamic",
        DirectiveTarget::Unparsable { .. } => "unparsable",
    }
}

fn fail_on_errors(project: &Project) -> Result<(), CliError> {
    let failing = project.files().filter(|f| f.result.has_errors()).count();
    if failing > 0 {
        return Err(CliError::Diagnostics(failing));
    }
    Ok(())
}

fn cmd_scan(input: &InputArgs) -> Result<(), CliError> {
    let project = load_project(input)?;

    match input.format {
        OutputFormat::Text => {
            for file in project.files() {
                print_scan_text(file);
            }
            println!("\nTotal: {} directives", project.directives().count());
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "files": project.files().map(|f| serde_json::json!({
                    "path": f.path,
                    "dialect": f.dialect,
                    "directives": f.result.directives.iter().map(|d| serde_json::json!({
                        "directive": d,
                        "target": d.target(),
                    })).collect::<Vec<_>>(),
                    "diagnostics": f.result.diagnostics,
                })).collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
    }

    fail_on_errors(&project)
}

fn print_scan_text(file: &SourceFile) {
    println!("{} ({}):", file.path, file.dialect);
    if file.result.directives.is_empty() {
        println!("  no directives");
    }
    for d in &file.result.directives {
        println!(
            "  {}:{}  {}  {}  [{}]",
            d.span.line,
            d.span.column,
            d.kind,
            d.argument,
            target_label(&d.target())
        );
    }
    for diag in &file.result.diagnostics {
        println!("  {diag}");
    }
}

fn cmd_regions(input: &InputArgs) -> Result<(), CliError> {
    let project = load_project(input)?;

    match input.format {
        OutputFormat::Text => {
            for file in project.files() {
                println!("{} ({} regions):", file.path, file.result.regions.len());
                for region in &file.result.regions {
                    println!(
                        "  {:>5}:{:<4} {:<14} {:?}",
                        region.span.line,
                        region.span.column,
                        region.kind.as_str(),
                        region.span.text(&file.source)
                    );
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "files": project.files().map(|f| serde_json::json!({
                    "path": f.path,
                    "regions": f.result.regions,
                })).collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
    }

    fail_on_errors(&project)
}

fn cmd_comments(input: &InputArgs) -> Result<(), CliError> {
    let project = load_project(input)?;

    match input.format {
        OutputFormat::Text => {
            for file in project.files() {
                for line in file.result.comment_lines(&file.source) {
                    println!("{}:{}: {}", file.path, line.line, line.text);
                }
            }
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "files": project.files().map(|f| serde_json::json!({
                    "path": f.path,
                    "comments": f.result.comment_lines(&f.source),
                })).collect::<Vec<_>>(),
            });
            print_json(&output)?;
        }
    }

    Ok(())
}

fn cmd_search(query: &str, input: &InputArgs) -> Result<(), CliError> {
    let project = load_project(input)?;
    let results = project.search_directives(query);

    match input.format {
        OutputFormat::Text => {
            for r in &results {
                println!(
                    "{}:{}:{}  {}  {}  (score {})",
                    r.path, r.line, r.column, r.kind, r.argument, r.score
                );
            }
            println!("\nTotal: {} matches", results.len());
        }
        OutputFormat::Json => print_json(&results)?,
    }

    Ok(())
}
