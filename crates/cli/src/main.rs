use std::path::{Path, PathBuf};
use std::sync::Arc;

use allcomplete_buffer::{TextBuffer, WordSource};
use allcomplete_engine::{CompletionEngine, Settings, SettingsStore};
use allcomplete_protocol::{
    response_schema, serialize_json, serialize_json_pretty, CompletionQuery,
};
use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "allcomplete")]
#[command(about = "Word completion gathered from every open document", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete the word under the cursor of a file
    Complete(CompleteArgs),

    /// Print the effective settings as JSON
    Settings(SettingsArgs),

    /// Print the JSON Schema of the `complete` output
    Schema,
}

#[derive(Args)]
struct CompleteArgs {
    /// Active document
    #[arg(long)]
    file: PathBuf,

    /// Cursor position in characters from the start of the file
    #[arg(long)]
    cursor: usize,

    /// Typed prefix (defaults to the word characters before the cursor)
    #[arg(long)]
    prefix: Option<String>,

    /// Other open documents, visited in the given order
    #[arg(long = "open", value_name = "PATH")]
    open: Vec<PathBuf>,

    /// Settings file (JSON or TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Pretty-print the response
    #[arg(long)]
    pretty: bool,
}

#[derive(Args)]
struct SettingsArgs {
    /// Settings file (JSON or TOML)
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Complete(args) => run_complete(args),
        Commands::Settings(args) => run_settings(args),
        Commands::Schema => {
            println!("{}", serialize_json_pretty(&response_schema()?)?);
            Ok(())
        }
    }
}

fn load_store(path: Option<&Path>) -> Result<SettingsStore> {
    match path {
        Some(path) => SettingsStore::from_file(path),
        None => Ok(SettingsStore::new(Settings::default())),
    }
}

fn run_complete(args: CompleteArgs) -> Result<()> {
    let store = load_store(args.settings.as_deref())?;
    let engine = CompletionEngine::with_store(Arc::new(store));

    let active = TextBuffer::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let len = active.len_chars();
    if args.cursor > len {
        bail!(
            "cursor {} is past the end of {} ({len} chars)",
            args.cursor,
            args.file.display()
        );
    }

    let mut buffers = Vec::with_capacity(args.open.len());
    for path in &args.open {
        match TextBuffer::open(path) {
            Ok(buffer) => buffers.push(buffer),
            Err(err) => log::warn!("Skipping {}: {err}", path.display()),
        }
    }
    // Earlier --open entries count as more recently active
    let count = buffers.len() as u64;
    let buffers: Vec<TextBuffer> = buffers
        .into_iter()
        .enumerate()
        .map(|(idx, buffer)| buffer.with_activation_rank(count - idx as u64))
        .collect();
    let others: Vec<&dyn WordSource> = buffers.iter().map(|b| b as &dyn WordSource).collect();

    let prefix = args
        .prefix
        .unwrap_or_else(|| word_before(active.text(), args.cursor));
    let query = CompletionQuery::new(prefix, vec![args.cursor]);
    log::debug!(
        "Completing {:?} at {} with {} other documents",
        query.prefix,
        args.cursor,
        others.len()
    );

    let response = engine.complete(&query, &active, &others);
    let json = if args.pretty {
        serialize_json_pretty(&response)?
    } else {
        serialize_json(&response)?
    };
    println!("{json}");
    Ok(())
}

fn run_settings(args: SettingsArgs) -> Result<()> {
    let store = load_store(args.settings.as_deref())?;
    if let Some(source) = store.source() {
        log::debug!("Effective settings from {}", source.display());
    }
    let value = store.snapshot().to_json()?;
    println!("{}", serialize_json_pretty(&value)?);
    Ok(())
}

/// Word characters immediately before `cursor` (a character offset)
fn word_before(text: &str, cursor: usize) -> String {
    let before: Vec<char> = text.chars().take(cursor).collect();
    let start = before
        .iter()
        .rposition(|ch| !(ch.is_alphanumeric() || *ch == '_'))
        .map_or(0, |idx| idx + 1);
    before[start..].iter().collect()
}
