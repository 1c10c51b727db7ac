//! StudyForge CLI: learning-conversation analysis with an MCP server.
//!
//! Usage:
//!   studyforge analyze <file|->            [--config path] [--db path]
//!   studyforge quiz <file|-> [--count N]
//!   studyforge save --topic T <file|->
//!   studyforge notes [--limit N]
//!   studyforge mcp [--transport stdio]

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use studyforge::{
    Config, NotesStore, OpenStore, SqliteNotesStore, StudyForgeApi, TracingSink,
};

#[derive(Parser)]
#[command(
    name = "studyforge",
    version,
    about = "Turn learning conversations into study material"
)]
struct Cli {
    /// Path to a YAML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a conversation and print the aggregate as JSON
    Analyze {
        /// Transcript file, or '-' for stdin
        input: PathBuf,
    },
    /// Generate quiz topics from a conversation
    Quiz {
        /// Transcript file, or '-' for stdin
        input: PathBuf,
        /// Number of topics to request
        #[arg(long)]
        count: Option<u32>,
    },
    /// Save study notes
    Save {
        /// Topic name (blank means "Untitled Analysis")
        #[arg(long, default_value = "")]
        topic: String,
        /// Notes file, or '-' for stdin
        input: PathBuf,
    },
    /// List saved notes, most recent first
    Notes {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Start the MCP (Model Context Protocol) server
    Mcp {
        /// Transport type (currently only stdio)
        #[arg(long, default_value = "stdio")]
        transport: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("studyforge=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &Path) -> Result<String, String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .map_err(|e| format!("cannot read stdin: {}", e))?;
        return Ok(text);
    }
    std::fs::read_to_string(path).map_err(|e| format!("cannot read '{}': {}", path.display(), e))
}

fn print_json<T: Serialize>(value: &T) -> i32 {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            0
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    }
}

fn open_store(db: Option<&Path>, config: &Config) -> Result<Arc<dyn NotesStore>, String> {
    let path = db.map(Path::to_path_buf).unwrap_or_else(|| config.db_path());
    let store = SqliteNotesStore::open(&path)
        .map_err(|e| format!("Failed to open database at {}: {}", path.display(), e))?;
    Ok(Arc::new(store))
}

/// Analysis commands never touch the notes database
fn in_memory_store() -> Result<Arc<dyn NotesStore>, String> {
    let store = SqliteNotesStore::open_in_memory().map_err(|e| e.to_string())?;
    Ok(Arc::new(store))
}

fn build_api(config: &Config, store: Arc<dyn NotesStore>) -> StudyForgeApi {
    StudyForgeApi::new(config.build_client(), store, Arc::new(TracingSink), config)
}

fn run(cli: Cli, config: Config) -> Result<i32, String> {
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| format!("failed to create tokio runtime: {}", e))?;

    match cli.command {
        Commands::Analyze { input } => {
            let text = read_input(&input)?;
            let api = build_api(&config, in_memory_store()?);
            let aggregate = rt
                .block_on(api.process_conversation(&text))
                .map_err(|e| e.to_string())?;
            Ok(print_json(&aggregate))
        }
        Commands::Quiz { input, count } => {
            let text = read_input(&input)?;
            let api = build_api(&config, in_memory_store()?);
            let result = rt
                .block_on(api.generate_quiz_topics(&text, count))
                .map_err(|e| e.to_string())?;
            Ok(print_json(&result))
        }
        Commands::Save { topic, input } => {
            let content = read_input(&input)?;
            let api = build_api(&config, open_store(cli.db.as_deref(), &config)?);
            let outcome = rt
                .block_on(api.save_notes(&topic, Some(&content)))
                .map_err(|e| e.to_string())?;
            let code = print_json(&outcome);
            Ok(if outcome.success { code } else { 1 })
        }
        Commands::Notes { limit } => {
            let api = build_api(&config, open_store(cli.db.as_deref(), &config)?);
            let notes = rt
                .block_on(api.list_notes(limit))
                .map_err(|e| e.to_string())?;
            if notes.is_empty() {
                println!("No notes saved.");
                return Ok(0);
            }
            println!("{:<36}  {:<24}  {:<20}", "ID", "TOPIC", "SAVED");
            println!("{}", "-".repeat(84));
            for note in notes {
                println!(
                    "{:<36}  {:<24}  {:<20}",
                    note.id,
                    note.topic_name,
                    note.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
            Ok(0)
        }
        Commands::Mcp { transport } => {
            if transport != "stdio" {
                return Err("only 'stdio' transport is currently supported".to_string());
            }
            drop(rt);
            let db_path = cli.db.clone().unwrap_or_else(|| config.db_path());
            Ok(studyforge::mcp::run_mcp_server(config, &db_path))
        }
    }
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let code = match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };
    std::process::exit(code);
}
