use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use restyle_core::{RestyleConfig, StaticInterpreter, StyleSession};
use restyle_dom::MemoryTree;
use restyle_schema::{RawStyles, StyleValidator, SCHEMA};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "restyle", version, about = "Live style mutation with reversible history")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Apply a mutation request to selected elements of a document
    Apply {
        /// Document fixture (JSON)
        #[arg(long)]
        document: PathBuf,
        /// Selector of an element to target (repeatable)
        #[arg(long = "select", required = true)]
        selectors: Vec<String>,
        /// Interpreter response to replay (JSON or free text)
        #[arg(long)]
        request: PathBuf,
        /// Command text recorded in history
        #[arg(long, default_value = "apply request")]
        command: String,
        /// Configuration file (TOML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Undo the change again after printing the changelog
        #[arg(long)]
        undo: bool,
    },
    /// Normalize and validate a style map
    Validate {
        /// Style map as JSON
        #[arg(long)]
        styles: String,
    },
    /// List the recognized properties
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Apply {
            document,
            selectors,
            request,
            command,
            config,
            undo,
        } => apply(document, &selectors, request, &command, config, undo).await,
        Command::Validate { styles } => validate(&styles),
        Command::Schema { json } => schema(json),
    }
}

async fn apply(
    document: PathBuf,
    selectors: &[String],
    request: PathBuf,
    command: &str,
    config: Option<PathBuf>,
    undo: bool,
) -> Result<ExitCode> {
    let config = match config {
        Some(path) => RestyleConfig::load(&path)?,
        None => RestyleConfig::default(),
    };
    let document = std::fs::read_to_string(&document)
        .with_context(|| format!("reading document {}", document.display()))?;
    let tree = MemoryTree::from_json(&document).context("loading document")?;
    let response = std::fs::read_to_string(&request)
        .with_context(|| format!("reading request {}", request.display()))?;

    let mut session = StyleSession::new(tree, StaticInterpreter::new(response), &config);
    let selected = session.select_paths(selectors);
    if selected.is_empty() {
        bail!("no element matches {}", selectors.join(", "));
    }

    let outcome = session.process_command(command).await;
    println!("{}", outcome.message);
    for diagnostic in &outcome.diagnostics {
        println!("  ! {diagnostic}");
    }
    for suggestion in &outcome.suggestions {
        println!("  - {suggestion}");
    }
    println!();
    print!("{}", session.history_changelog());

    if undo && outcome.success {
        let reverted = session.undo();
        println!();
        println!("{}", reverted.message);
    }

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn validate(styles: &str) -> Result<ExitCode> {
    let raw: RawStyles = serde_json::from_str(styles).context("parsing --styles")?;
    let report = StyleValidator.normalize_and_validate(&raw);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn schema(json: bool) -> Result<ExitCode> {
    if json {
        let specs: Vec<_> = SCHEMA.iter().collect();
        println!("{}", serde_json::to_string_pretty(&specs)?);
    } else {
        for spec in SCHEMA.iter() {
            println!("{:<28} {:<12} {:?}", spec.name, format!("{:?}", spec.category), spec.kind);
        }
    }
    Ok(ExitCode::SUCCESS)
}
