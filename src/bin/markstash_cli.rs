use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use markstash::client::attachment::upload_file;
use markstash::client::export::{DEFAULT_TITLE, export_bookmarks};
use markstash::client::import::{import_bookmarks, parse_bookmarks};
use markstash::client::view_state::ViewState;
use markstash::client::{ApiClient, BookmarkApi, UploadClient};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "markstash-cli")]
#[command(about = "Manage markstash bookmarks from the terminal")]
struct Cli {
    #[arg(long, env = "MARKSTASH_API_URL")]
    api_url: String,
    #[arg(long, env = "MARKSTASH_TOKEN", hide_env_values = true)]
    token: String,
    #[arg(short, long)]
    pretty: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List categories
    Categories,
    /// List bookmarks, optionally only those in the given categories
    Bookmarks {
        #[arg(short, long = "category")]
        categories: Vec<String>,
    },
    /// Import a browser bookmark export
    Import {
        file: PathBuf,
        /// Only import bookmarks under these folder names
        #[arg(long)]
        only: Vec<String>,
    },
    /// Export bookmarks as a browser bookmark file
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short, long = "category")]
        categories: Vec<String>,
        #[arg(long, default_value = DEFAULT_TITLE)]
        title: String,
    },
    /// Upload a file as a bookmark's attachment
    Attach { bookmark_id: String, file: PathBuf },
    /// Remove a bookmark's attachment
    Detach { bookmark_id: String },
}

fn print<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{}", json);
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let api = ApiClient::new(&cli.api_url, &cli.token);
    let mut state = ViewState::default();

    match cli.command {
        Command::Categories => {
            state.refresh(&api).await?;
            print(&state.categories.get(), cli.pretty)?;
        }
        Command::Bookmarks { categories } => {
            state.refresh(&api).await?;
            print(&state.bookmarks_in(&categories), cli.pretty)?;
        }
        Command::Import { file, only } => {
            let html = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let rows = parse_bookmarks(&html)?;
            state.refresh(&api).await?;

            let only = (!only.is_empty()).then_some(only);
            let summary = import_bookmarks(&api, state.categories.items(), &rows, only.as_deref()).await?;
            println!(
                "imported {} bookmarks ({} new categories, {} reused)",
                summary.bookmarks_created, summary.categories_created, summary.categories_reused
            );
        }
        Command::Export {
            output,
            categories,
            title,
        } => {
            state.refresh(&api).await?;
            let html = export_bookmarks(&state.bookmarks_in(&categories), state.categories.items(), &title);
            match output {
                Some(path) => tokio::fs::write(&path, html)
                    .await
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => print!("{}", html),
            }
        }
        Command::Attach { bookmark_id, file } => {
            upload_file(&api, &UploadClient::new(), &bookmark_id, &file).await?;
            println!("uploaded {} to bookmark {}", file.display(), bookmark_id);
        }
        Command::Detach { bookmark_id } => {
            api.delete_attachment(&bookmark_id).await?;
            println!("removed attachment from bookmark {}", bookmark_id);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}
