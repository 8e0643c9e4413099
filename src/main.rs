//! Tubelift - paste video links, pick a resolution, download
//!
//! `tubelift serve` runs the metadata and download relay endpoints on top of
//! yt-dlp; `tubelift fetch` is the matching command-line client.

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use futures::future::join_all;
use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tubelift::backend;
use tubelift::client::{clipboard, ApiClient, DownloadState, Session, StateUpdate};
use tubelift::extractor::{Extractor, YtDlpExtractor};
use tubelift::utils::AppSettings;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Fetch info for pasted URLs and optionally download them
    Fetch(FetchArgs),
}

#[derive(Args)]
struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "TUBELIFT_BIND")]
    bind: Option<SocketAddr>,

    /// Path to the yt-dlp binary
    #[arg(long, env = "TUBELIFT_YTDLP")]
    ytdlp: Option<PathBuf>,

    /// Maximum number of streams relayed at once
    #[arg(long, env = "TUBELIFT_MAX_RELAYS")]
    max_relays: Option<usize>,
}

#[derive(Args)]
struct FetchArgs {
    /// Text containing one or more video URLs
    input: Vec<String>,

    /// Read the input from the clipboard
    #[arg(long)]
    paste: bool,

    /// Server base URL
    #[arg(long, env = "TUBELIFT_SERVER")]
    server: Option<String>,

    /// Download every fetched video
    #[arg(long)]
    download: bool,

    /// Resolution to download, e.g. 720p (defaults to the highest listed)
    #[arg(long)]
    quality: Option<String>,

    /// Directory to save downloads in
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Maximum simultaneous downloads
    #[arg(long, env = "TUBELIFT_MAX_DOWNLOADS")]
    max_concurrent: Option<usize>,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tubelift=info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging();

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Fetch(args) => fetch(args).await,
    }
}

async fn serve(args: ServeArgs) -> Result<()> {
    let mut settings = AppSettings::default();
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if let Some(max) = args.max_relays {
        settings.max_concurrent_relays = max;
    }
    settings.ytdlp_path = args.ytdlp;
    let settings = settings.normalized();

    let extractor = match &settings.ytdlp_path {
        Some(path) => YtDlpExtractor::with_path(path)?,
        None => YtDlpExtractor::new()?,
    };
    info!("Using yt-dlp at {}", extractor.ytdlp_path().display());
    let extractor: Arc<dyn Extractor> = Arc::new(extractor);

    backend::serve(&settings, extractor).await
}

async fn fetch(args: FetchArgs) -> Result<()> {
    let mut settings = AppSettings::default();
    if let Some(server) = args.server {
        settings.server_url = server;
    }
    if let Some(max) = args.max_concurrent {
        settings.max_concurrent_downloads = max;
    }
    if let Some(output) = args.output {
        settings.download_location = output;
    }
    let settings = settings.normalized();

    let mut input = args.input.join(" ");
    if args.paste {
        let pasted = clipboard::get_clipboard_content()?;
        input.push(' ');
        input.push_str(&pasted);
    }

    let (update_tx, update_rx) = mpsc::channel::<StateUpdate>(64);
    let api = ApiClient::new(&settings.server_url)?;
    let session = Session::new(api, settings.max_concurrent_downloads).with_updates(update_tx);

    session.set_input(input).await;
    let fetched = match session.submit().await {
        Ok(fetched) => fetched,
        Err(e) => bail!("{}", e),
    };

    for info in &fetched {
        println!("{} [{}] - {}", info.title, info.duration, info.channel);
        println!("  {}", info.url);
        println!("  qualities: {}", info.qualities.join(", "));
    }

    if !args.download {
        return Ok(());
    }

    let printer = tokio::spawn(report_progress(update_rx));

    // The same video pasted twice is downloaded once
    let mut seen = HashSet::new();
    let ids: Vec<String> = fetched
        .iter()
        .filter(|info| seen.insert(info.id.as_str()))
        .map(|info| info.id.clone())
        .collect();
    if let Some(quality) = &args.quality {
        for id in &ids {
            session.select_quality(id, quality).await?;
        }
    }

    let results = join_all(
        ids.iter()
            .map(|id| session.download(id, &settings.download_location)),
    )
    .await;

    // Closing the session closes the update channel
    drop(session);
    let _ = printer.await;

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        bail!("{} of {} downloads failed", failed, results.len());
    }
    Ok(())
}

async fn report_progress(mut updates: mpsc::Receiver<StateUpdate>) {
    // Only print when the visible value changes
    let mut last_shown: HashMap<String, u64> = HashMap::new();

    while let Some(update) = updates.recv().await {
        let label = update.state.label();
        match update.state {
            DownloadState::Downloading(progress) => {
                let (marker, line) = match progress.percentage() {
                    Some(pct) => (u64::from(pct), format!("{}%", pct)),
                    None => {
                        let mib = progress.downloaded_bytes / (1024 * 1024);
                        (mib, format!("{} MiB received", mib))
                    }
                };
                if last_shown.insert(update.video_id.clone(), marker) != Some(marker) {
                    println!("{}: {} {}", update.video_id, label, line);
                }
            }
            DownloadState::Completed(path) => {
                println!("{}: {}, saved to {}", update.video_id, label, path.display())
            }
            DownloadState::Error(message) => {
                eprintln!("{}: {}: {}", update.video_id, label, message)
            }
            DownloadState::Idle => {}
        }
    }
}
