//! Binary entry point for the subtitle ledger.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use subledger_core::classify::{LyricFilter, LyricWindows};
use subledger_core::key::{normalize_episode_id, translation_key};
use subledger_core::library::Library;
use subledger_core::store::{JsonFileStore, KvStore, MemoryStore};
use subledger_core::time::{format_time, parse_time};
use subledger_core::{decode::decode, parse_with};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Command line options for the binary.
#[derive(Parser)]
#[command(version, about = "Browse anime subtitles and keep line-by-line translations")]
struct Cli {
    /// Directory holding one sub-directory per anime.
    #[arg(long, env = "SUBLEDGER_ROOT", default_value = "res")]
    root: PathBuf,

    /// JSON file translations are kept in. Without it they only live for
    /// this process.
    #[arg(long, env = "SUBLEDGER_STORE")]
    store: Option<PathBuf>,

    /// Enable verbose debug and trace logs.
    #[arg(long)]
    debug: bool,

    /// Start of the opening-song window, in seconds.
    #[arg(long, default_value_t = LyricWindows::default().opening_start)]
    op_start: f64,

    /// End of the opening-song window, in seconds.
    #[arg(long, default_value_t = LyricWindows::default().opening_end)]
    op_end: f64,

    /// Start of the ending-song window, in seconds.
    #[arg(long, default_value_t = LyricWindows::default().ending_start)]
    ed_start: f64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List anime and episodes found under the root.
    List,
    /// Parse a single subtitle file and print its dialogue.
    Parse { file: PathBuf },
    /// Show an episode's dialogue and saved translations.
    Show { episode_id: String },
    /// Save a translation for one dialogue line.
    Translate {
        episode_id: String,
        subtitle_id: String,
        text: String,
    },
    /// Delete the translation of one dialogue line.
    Untranslate {
        episode_id: String,
        subtitle_id: String,
    },
    /// Mark a dialogue line as studied by a user.
    Complete {
        user_id: String,
        episode_id: String,
        subtitle_id: String,
    },
    /// Print a user's study totals.
    Stats { user_id: String },
    /// Dump everything in the store.
    StoreInfo,
    /// Remove everything from the store.
    Clear,
    /// Print the storage key of a translation.
    Key {
        episode_id: String,
        subtitle_id: String,
    },
    /// Print the canonical form of an episode id.
    Normalize { episode_id: String },
    /// Convert `H:MM:SS.CC` to seconds, or seconds to `HH:MM:SS.CC`.
    Time { value: String },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(path: Option<&PathBuf>) -> Arc<dyn KvStore> {
    match path {
        Some(path) => {
            debug!("using JSON store at {}", path.display());
            Arc::new(JsonFileStore::new(path))
        }
        None => {
            debug!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
    }
}

/// Application entry point which parses CLI args and performs actions.
/// Logging goes to stderr so stdout stays machine-readable.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.debug {
        EnvFilter::default()
            .add_directive("subledger=trace".parse()?)
            .add_directive("subledger_core=trace".parse()?)
            .add_directive("info".parse()?)
    } else {
        EnvFilter::default()
            .add_directive("subledger=info".parse()?)
            .add_directive("subledger_core=info".parse()?)
            .add_directive("warn".parse()?)
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let lyrics = LyricFilter::new(LyricWindows {
        opening_start: cli.op_start,
        opening_end: cli.op_end,
        ending_start: cli.ed_start,
    });
    let store = open_store(cli.store.as_ref());
    let library = Library::new(&cli.root, Arc::clone(&store)).with_filter(lyrics);

    match cli.command {
        Command::List => print_json(&library.list())?,
        Command::Parse { file } => {
            let bytes =
                std::fs::read(&file).with_context(|| format!("reading {}", file.display()))?;
            print_json(&parse_with(&decode(&bytes), &lyrics))?;
        }
        Command::Show { episode_id } => print_json(&library.load_episode(&episode_id).await?)?,
        Command::Translate {
            episode_id,
            subtitle_id,
            text,
        } => {
            let saved = library
                .submit_translation(&episode_id, &subtitle_id, &text)
                .await?;
            info!("saved translation {}", saved.id);
            print_json(&saved)?;
        }
        Command::Untranslate {
            episode_id,
            subtitle_id,
        } => {
            library.remove_translation(&episode_id, &subtitle_id).await?;
            info!("deleted translation of {subtitle_id}");
        }
        Command::Complete {
            user_id,
            episode_id,
            subtitle_id,
        } => {
            let progress = library
                .service()
                .mark_subtitle_completed(&user_id, &episode_id, &subtitle_id)
                .await?;
            print_json(&progress)?;
        }
        Command::Stats { user_id } => print_json(&library.service().study_stats(&user_id).await?)?,
        Command::StoreInfo => print_json(&store.stats().await?)?,
        Command::Clear => {
            store.clear().await?;
            info!("store cleared");
        }
        Command::Key {
            episode_id,
            subtitle_id,
        } => println!("{}", translation_key(&episode_id, &subtitle_id)),
        Command::Normalize { episode_id } => println!("{}", normalize_episode_id(&episode_id)),
        Command::Time { value } => println!("{}", convert_time(&value)?),
    }
    Ok(())
}

/// Timestamps contain `:`; anything else is read as seconds.
fn convert_time(value: &str) -> Result<String> {
    if value.contains(':') {
        Ok(parse_time(value).to_string())
    } else {
        let seconds: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("not a timestamp or number of seconds: {value}"))?;
        Ok(format_time(seconds))
    }
}
