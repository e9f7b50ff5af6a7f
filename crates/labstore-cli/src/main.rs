//! labstore CLI: replay recorded sessions, query and export saved snapshots.

use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use comfy_table::{presets::UTF8_FULL, Table};
use tracing::info;
use tracing_subscriber::EnvFilter;

use labstore_core::export::render_cell;
use labstore_core::{storage, Selector, SenderFilter, Store, StoreConfig};

mod ops;

#[derive(Parser)]
#[command(
    name = "labstore",
    about = "Replay, query and export experiment data sessions",
    version,
    author
)]
struct Cli {
    /// Store settings (YAML); defaults apply when omitted or missing
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay an operation log (JSONL) into a fresh store and save the snapshot
    Ingest {
        /// Operation log, one {"op": ...} object per line
        ops: PathBuf,
        /// Where to write the resulting snapshot
        #[arg(long, short)]
        output: PathBuf,
    },
    /// List the columns of a snapshot in canonical order
    Keys {
        snapshot: PathBuf,
        /// Also include columns only present in the state
        #[arg(long)]
        include_state: bool,
        /// Comma-separated columns to move to the front (default: configured priority)
        #[arg(long, value_delimiter = ',')]
        priority: Option<Vec<String>>,
    },
    /// Project rows onto a subset of columns, printed as JSONL
    Select {
        snapshot: PathBuf,
        /// Column, comma-separated columns, or /regex/ over column names
        #[arg(long, short)]
        columns: String,
        /// Keep only rows whose sender is exactly this
        #[arg(long, conflicts_with = "sender_pattern")]
        sender: Option<String>,
        /// Keep only rows whose sender matches this regular expression
        #[arg(long)]
        sender_pattern: Option<String>,
    },
    /// Export a snapshot to CSV, JSON or JSONL
    Export {
        snapshot: PathBuf,
        /// Output format: csv, json or jsonl
        #[arg(long, short, default_value = "csv")]
        format: String,
        /// Keep underscore-prefixed columns
        #[arg(long)]
        raw: bool,
        /// CSV column separator (default: configured separator)
        #[arg(long)]
        separator: Option<String>,
        /// Output file (default: stdout)
        #[arg(long, short, conflicts_with = "save_dir")]
        output: Option<PathBuf>,
        /// Write into this directory under a suggested filename
        #[arg(long)]
        save_dir: Option<PathBuf>,
    },
    /// Render a snapshot as a table
    Show { snapshot: PathBuf },
}

fn main() -> Result<()> {
    // Logs go to stderr; keep them quiet unless asked so stdout stays pipeable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => storage::load_config(path)?,
        None => StoreConfig::default(),
    };

    match cli.command {
        Commands::Ingest { ops, output } => cmd_ingest(config, ops, output)?,
        Commands::Keys {
            snapshot,
            include_state,
            priority,
        } => cmd_keys(config, snapshot, include_state, priority)?,
        Commands::Select {
            snapshot,
            columns,
            sender,
            sender_pattern,
        } => cmd_select(config, snapshot, columns, sender, sender_pattern)?,
        Commands::Export {
            snapshot,
            format,
            raw,
            separator,
            output,
            save_dir,
        } => {
            let config = match separator {
                Some(sep) => config.with_csv_separator(sep),
                None => config,
            };
            cmd_export(config, snapshot, format, !raw, output, save_dir)?
        }
        Commands::Show { snapshot } => cmd_show(config, snapshot)?,
    }

    Ok(())
}

fn open_store(config: StoreConfig, snapshot: &Path) -> Result<Store> {
    let mut store = Store::with_config(config);
    store.hydrate(storage::load_snapshot(snapshot)?);
    Ok(store)
}

// ─── Command implementations ──────────────────────────────────────────────────

fn cmd_ingest(config: StoreConfig, ops_path: PathBuf, output: PathBuf) -> Result<()> {
    let ops = ops::read_ops(&ops_path)?;
    let mut store = Store::with_config(config);
    let summary = ops::apply(&mut store, ops)?;

    if !store.staging().is_empty() {
        info!(
            columns = store.staging().len(),
            "staging row was never committed and is not part of the snapshot"
        );
    }
    storage::save_snapshot(&output, &store.snapshot())?;

    println!(
        "Replayed {} operation(s): {} commit(s), {} clear(s), {} row(s) in {}",
        summary.operations,
        summary.commits,
        summary.clears,
        store.len(),
        output.display()
    );
    Ok(())
}

fn cmd_keys(
    config: StoreConfig,
    snapshot: PathBuf,
    include_state: bool,
    priority: Option<Vec<String>>,
) -> Result<()> {
    let store = open_store(config, &snapshot)?;
    let priority = priority.unwrap_or_else(|| store.config().priority_columns.clone());
    for key in store.keys_with(include_state, &priority) {
        println!("{}", key);
    }
    Ok(())
}

fn cmd_select(
    config: StoreConfig,
    snapshot: PathBuf,
    columns: String,
    sender: Option<String>,
    sender_pattern: Option<String>,
) -> Result<()> {
    let store = open_store(config, &snapshot)?;
    let selector = Selector::parse(&columns)?;
    let filter = match (sender, sender_pattern) {
        (Some(sender), _) => SenderFilter::Exact(sender),
        (None, Some(pattern)) => SenderFilter::pattern(&pattern)?,
        (None, None) => SenderFilter::Any,
    };

    for row in store.select(selector, filter) {
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}

fn cmd_export(
    config: StoreConfig,
    snapshot: PathBuf,
    format: String,
    clean: bool,
    output: Option<PathBuf>,
    save_dir: Option<PathBuf>,
) -> Result<()> {
    let store = open_store(config, &snapshot)?;
    let blob = store.export_blob_str(&format, clean)?;

    let target = match (output, save_dir) {
        (Some(path), _) => Some(path),
        (None, Some(dir)) => {
            let name = store.make_filename(&store.config().filename_prefix, Some(format.as_str()));
            let mut components = Path::new(&name).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => Some(dir.join(&name)),
                _ => bail!("suggested filename '{}' is not a plain file name", name),
            }
        }
        (None, None) => None,
    };

    match target {
        Some(path) => {
            storage::write_blob(&path, &blob)?;
            println!(
                "Exported {} rows to {} ({})",
                store.len(),
                path.display(),
                blob.mime
            );
        }
        None => print!("{}", String::from_utf8_lossy(&blob.bytes)),
    }

    Ok(())
}

fn cmd_show(config: StoreConfig, snapshot: PathBuf) -> Result<()> {
    let store = open_store(config, &snapshot)?;
    if store.is_empty() {
        println!("No rows in '{}'", snapshot.display());
        return Ok(());
    }

    let columns = store.keys();
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(&columns);
    for row in store.data() {
        table.add_row(
            columns
                .iter()
                .map(|c| row.get(c).map(render_cell).unwrap_or_default()),
        );
    }

    println!("{} row(s), {} column(s)", store.len(), columns.len());
    println!("{}", table);
    Ok(())
}
