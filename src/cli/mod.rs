pub mod commands;
pub mod utils;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::storage::FileStore;

#[derive(Parser)]
#[command(name = "clubsite")]
#[command(about = "Clubsite CLI - inspect and maintain the content collection files")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        env = "CLUBSITE_DATA_DIR",
        help = "Directory holding the collection files (defaults to the server's data dir)"
    )]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Read and reorder records in one collection")]
    Content {
        #[command(subcommand)]
        cmd: commands::content::ContentCommands,
    },

    #[command(about = "Validate every record in the collection files")]
    Check {
        #[arg(help = "Collection to check (all when omitted)")]
        collection: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| crate::config::config().storage.data_dir.clone());
    let store = FileStore::new(data_dir);

    match cli.command {
        Commands::Content { cmd } => commands::content::handle(cmd, &store, output_format).await,
        Commands::Check { collection } => {
            commands::check::handle(collection.as_deref(), &store, output_format).await
        }
    }
}
