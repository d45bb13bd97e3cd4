mod app;
mod commands;
mod render;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "lingo", about = "Offline flashcards for language learning", version)]
struct Cli {
    /// Data directory (default: platform data dir, or LINGO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Card selection shared by `list`, `export` and `study`
#[derive(clap::Args, Debug, Clone)]
pub struct FilterArgs {
    /// Comma-separated tags (any must match)
    #[arg(long)]
    tags: Option<String>,
    /// Require all tags instead of any
    #[arg(long)]
    all_tags: bool,
    /// Text to search for in words and contexts
    #[arg(long)]
    search: Option<String>,
    /// Only cards flagged for revisit
    #[arg(long)]
    revisit: bool,
    /// Only cards answered wrong at least this many times
    #[arg(long)]
    min_wrong: Option<u32>,
    /// Ignore the configured language pair
    #[arg(long)]
    all_languages: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Add a flashcard in the configured language pair
    Add {
        /// Word or phrase in the known language
        known: String,
        /// Word or phrase in the learning language
        learning: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
        /// Example sentences in the known language, separated by '|'
        #[arg(long)]
        context_known: Option<String>,
        /// Example sentences in the learning language, separated by '|'
        #[arg(long)]
        context_learning: Option<String>,
    },

    /// List flashcards
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Delete a flashcard by id (or unique id prefix)
    Delete {
        id: String,
    },

    /// Merge duplicate flashcards into the first one given
    Merge {
        #[arg(num_args = 2.., required = true)]
        ids: Vec<String>,
    },

    /// Show groups of duplicate flashcards
    Duplicates {
        /// Merge every group
        #[arg(long)]
        merge: bool,
    },

    /// Import flashcards from a CSV file
    Import {
        file: PathBuf,
    },

    /// Export flashcards to a CSV file ("-" for stdout)
    Export {
        file: String,
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show or change settings
    #[command(subcommand)]
    Settings(SettingsCommand),

    /// Start a study session
    Study {
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print current settings
    Show,

    /// Update settings
    Set {
        #[arg(long)]
        known_language: Option<String>,
        #[arg(long)]
        learning_language: Option<String>,
        /// Show the learning side first when studying
        #[arg(long)]
        learning_first: Option<bool>,
        #[arg(long)]
        restore_delay_ms: Option<u64>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && std::io::stdout().is_terminal();
    let mut app = app::App::new(cli.data_dir.as_deref())?;

    match cli.command {
        Command::Add {
            known,
            learning,
            tags,
            context_known,
            context_learning,
        } => {
            commands::cards::run_add(
                &app,
                &known,
                &learning,
                tags.as_deref(),
                context_known.as_deref(),
                context_learning.as_deref(),
                &cli.format,
            )?;
        }
        Command::List { filter } => {
            commands::cards::run_list(&app, &filter, &cli.format, use_color)?;
        }
        Command::Delete { id } => {
            commands::cards::run_delete(&app, &id)?;
        }
        Command::Merge { ids } => {
            commands::cards::run_merge(&app, &ids, &cli.format)?;
        }
        Command::Duplicates { merge } => {
            commands::cards::run_duplicates(&app, merge, &cli.format)?;
        }
        Command::Import { file } => {
            commands::transfer::run_import(&app, &file)?;
        }
        Command::Export { file, filter } => {
            commands::transfer::run_export(&app, &file, &filter)?;
        }
        Command::Settings(SettingsCommand::Show) => {
            commands::settings::run_show(&app, &cli.format)?;
        }
        Command::Settings(SettingsCommand::Set {
            known_language,
            learning_language,
            learning_first,
            restore_delay_ms,
        }) => {
            commands::settings::run_set(
                &mut app,
                known_language,
                learning_language,
                learning_first,
                restore_delay_ms,
            )?;
        }
        Command::Study { filter } => {
            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(commands::study::run(&app, &filter, use_color))?;
        }
    }

    Ok(())
}
