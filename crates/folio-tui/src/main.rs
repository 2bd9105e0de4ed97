use std::fs::{self, File};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use folio_core::{
    ChatSession, CommandSynthesizer, Config, RemoteChatClient, Unsupported, VoiceIo,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Chat with the portfolio assistant from your terminal")]
#[command(version)]
struct Cli {
    /// Hostname the client runs under; localhost selects the development backend
    #[arg(long, env = "FOLIO_HOSTNAME", default_value = "")]
    hostname: String,

    /// Use this chat endpoint instead of the configured ones
    #[arg(long, env = "FOLIO_ENDPOINT")]
    endpoint: Option<String>,

    /// Disable speech output and voice input
    #[arg(long)]
    no_voice: bool,

    /// Log file (defaults to the user cache directory)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn default_log_path() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("folio")
        .join("folio.log")
}

/// Logs go to a file so they never draw over the terminal UI
fn init_logging(path: PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating log directory {}", parent.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("opening log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("folio=info,folio_core=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

fn build_voice(no_voice: bool) -> VoiceIo {
    if no_voice {
        return VoiceIo::unsupported();
    }
    // Speech recognition has no terminal counterpart; the session reports it as unsupported
    VoiceIo::new(Arc::new(CommandSynthesizer::new()), Arc::new(Unsupported))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.clone().unwrap_or_else(default_log_path))?;

    let config = Config::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load config, using defaults");
        Config::default()
    });

    let endpoint = cli
        .endpoint
        .clone()
        .unwrap_or_else(|| config.endpoints.select(&cli.hostname).to_string());
    info!(endpoint = %endpoint, hostname = %cli.hostname, "starting folio");

    let backend = RemoteChatClient::new(&endpoint);
    let voice = build_voice(cli.no_voice);
    let (session, session_events) = ChatSession::new(Arc::new(backend), voice, config.voice.clone());
    let mut app = App::new(session, endpoint);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(session_events);

    let result = run(&mut app, &mut terminal, &mut events).await;

    app.session.shutdown();
    tui::restore()?;
    info!("folio exited");
    result
}

async fn run(app: &mut App, terminal: &mut tui::Tui, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}
