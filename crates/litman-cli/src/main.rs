//! LitMan CLI
//!
//! Command-line interface for LitMan - literature reference management.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use litman_core::{
    Config, MarkFlags, ReferenceEdit, ReferenceFields, ReferenceKind, StorageError, Store,
};

mod args;
mod commands;
mod editor;
mod output;

use args::{DetailArgs, FilterArgs};
use output::{ListStyle, Output, OutputFormat};

#[derive(Parser)]
#[command(name = "litman")]
#[command(about = "LitMan - Literature reference management")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Don't ask for confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    /// Load the library file directly, ignoring the cache
    #[arg(long, global = true)]
    no_cache: bool,

    /// Path to config file
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a reference
    Add {
        /// Reference type: article, conference, thesis, book or note
        kind: ReferenceKind,
        #[arg(short = 'T', long)]
        title: String,
        /// Authors, "First Last"
        #[arg(short, long = "author", num_args = 1.., value_name = "AUTHOR")]
        authors: Vec<String>,
        #[arg(long)]
        year: i32,
        #[arg(short, long)]
        category: String,
        /// Extra tags
        #[arg(short, long = "tag", num_args = 1.., value_name = "TAG")]
        tags: Vec<String>,
        #[command(flatten)]
        details: DetailArgs,
        /// Document to copy into the library
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Remember where the document was copied from
        #[arg(long)]
        keep_original: bool,
    },
    /// Edit a reference
    Edit {
        label: String,
        #[arg(short = 'T', long)]
        title: Option<String>,
        /// Replace the author list
        #[arg(short, long = "author", num_args = 1.., value_name = "AUTHOR")]
        authors: Option<Vec<String>>,
        #[arg(long)]
        year: Option<i32>,
        #[arg(short, long)]
        category: Option<String>,
        #[command(flatten)]
        details: DetailArgs,
        #[arg(long = "add-tag", value_name = "TAG")]
        add_tags: Vec<String>,
        #[arg(long = "rm-tag", value_name = "TAG")]
        rm_tags: Vec<String>,
        /// Remove the note at this index
        #[arg(long, value_name = "INDEX")]
        rm_note: Option<usize>,
    },
    /// Record that one reference cites another
    Link {
        /// The citing reference
        reference: String,
        /// The cited reference
        cited: String,
    },
    /// Remove a citation link
    #[command(group(ArgGroup::new("edge").required(true).args(["reference", "citation"])))]
    Unlink {
        label: String,
        /// Index into the label's references
        #[arg(long, value_name = "INDEX")]
        reference: Option<usize>,
        /// Index into the label's citations
        #[arg(long, value_name = "INDEX")]
        citation: Option<usize>,
    },
    /// Set status flags
    Mark {
        label: String,
        #[arg(long)]
        important: bool,
        #[arg(long)]
        printed: bool,
        #[arg(long)]
        to_read: bool,
        #[arg(long)]
        read: bool,
    },
    /// Add notes (opens editor if none given)
    Note {
        label: String,
        notes: Vec<String>,
    },
    /// Remove a reference
    #[command(alias = "rm")]
    Remove { label: String },
    /// List references
    #[command(alias = "ls")]
    List {
        #[command(flatten)]
        filters: FilterArgs,
        /// Leave out tags and notes
        #[arg(long)]
        compact: bool,
        /// Show citations and references
        #[arg(long)]
        links: bool,
    },
    /// Open the documents of matching references
    Open {
        #[command(flatten)]
        filters: FilterArgs,
        /// Open every match instead of the first
        #[arg(long)]
        all: bool,
    },
    /// List all tags
    Tags,
    /// Show library counts
    Summary,
    /// Rebuild the cache from the library file
    Cache,
    /// Back up the library file
    Backup,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, categories, keep_original, archive_removed, use_cache, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            if let Some(hint) = recovery_hint(&e) {
                eprintln!("Hint: {}", hint);
            }
            ExitCode::FAILURE
        }
    }
}

/// Suggestion for the first storage failure in the error chain
fn recovery_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StorageError>())
        .and_then(StorageError::recovery_suggestion)
}

fn execute(cli: Cli) -> Result<()> {
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet)).assume_yes(cli.yes);

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command {
            Some(ConfigCommands::Show) | None => {
                commands::config::show(cli.config.as_ref(), &output)
            }
            Some(ConfigCommands::Set { key, value }) => commands::config::set(
                key.clone(),
                value.clone(),
                cli.config.as_ref(),
                &output,
            ),
        };
    }

    let mut config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    if cli.no_cache {
        config.use_cache = false;
    }
    init_logging(&config);

    let mut store = Store::open_with_config(config)?;
    debug!("Loaded {} reference(s)", store.library().len());

    run(cli.command, &mut store, &output)
}

fn run(command: Commands, store: &mut Store, output: &Output) -> Result<()> {
    match command {
        Commands::Add {
            kind,
            title,
            authors,
            year,
            category,
            tags,
            details,
            file,
            keep_original,
        } => {
            let fields = ReferenceFields {
                title: Some(title),
                authors,
                year: Some(year),
                category: Some(category),
                tags,
                details: details.into(),
            };
            commands::reference::add(store, kind, fields, file, keep_original, output)
        }
        Commands::Edit {
            label,
            title,
            authors,
            year,
            category,
            details,
            add_tags,
            rm_tags,
            rm_note,
        } => {
            let edit = ReferenceEdit {
                title,
                authors,
                year,
                category,
                details: details.into(),
                add_tags,
                remove_tags: rm_tags,
                remove_note: rm_note,
            };
            commands::reference::edit(store, label, edit, output)
        }
        Commands::Link { reference, cited } => {
            commands::graph::link(store, reference, cited, output)
        }
        Commands::Unlink {
            label,
            reference,
            citation,
        } => commands::graph::unlink(store, label, reference, citation, output),
        Commands::Mark {
            label,
            important,
            printed,
            to_read,
            read,
        } => {
            let flags = MarkFlags {
                important,
                printed,
                to_read,
                read,
            };
            commands::reference::mark(store, label, flags, output)
        }
        Commands::Note { label, notes } => commands::reference::note(store, label, notes, output),
        Commands::Remove { label } => commands::reference::remove(store, label, output),
        Commands::List {
            filters,
            compact,
            links,
        } => commands::query::list(
            store,
            filters.into(),
            ListStyle { compact, links },
            output,
        ),
        Commands::Open { filters, all } => {
            commands::query::open(store, filters.into(), all, output)
        }
        Commands::Tags => commands::tag::list(store, output),
        Commands::Summary => commands::query::summary(store, output),
        Commands::Cache => commands::maintenance::cache(store, output),
        Commands::Backup => commands::maintenance::backup(store, output),
        Commands::Config { .. } => unreachable!(), // Handled in main
    }
}

/// Initialize logging
///
/// Only initializes if LITMAN_LOG environment variable is set.
/// Logs to config.log_file when set, otherwise to stderr.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("LITMAN_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!(
        "litman_core={},litman_cli={}",
        log_level, log_level
    ));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
