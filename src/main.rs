mod api;
mod app;
mod config;
mod handler;
mod mock;
mod models;
mod speech;
mod tui;
mod ui;

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::app::App;
use crate::config::Config;
use crate::tui::EventHandler;

/// Terminal client for the Lingua language tutor.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Backend base URL, e.g. http://localhost:5000/api
    #[arg(long)]
    server: Option<String>,

    /// Numeric user id to sign in as
    #[arg(long)]
    user: Option<i64>,

    /// Skip the backend entirely and run on demo data
    #[arg(long)]
    offline: bool,
}

/// Log to a file; the alternate screen owns the terminal.
fn init_logging() -> Result<()> {
    let path = Config::log_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging()?;

    let mut config = Config::load().unwrap_or_else(|_| Config::new());
    let has_overrides = cli.server.is_some() || cli.user.is_some();
    if let Some(server) = cli.server {
        config.server_url = Some(server);
    }
    if let Some(user) = cli.user {
        config.user_id = Some(user);
    }
    // Flags stick for the next run
    if has_overrides {
        if let Err(e) = config.save() {
            warn!("could not persist config: {e:#}");
        }
    }

    info!(
        server = %config.server_url(),
        offline = cli.offline,
        "starting session"
    );

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut app = App::new(config, cli.offline);
    app.start();

    let mut events = EventHandler::new();
    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if let Some(event) = events.next().await {
            handler::handle_event(&mut app, event).await?;
        } else {
            break;
        }
    }

    tui::restore()?;
    info!("session ended");
    Ok(())
}
