use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

mod app;
mod config;
mod greet;
mod handler;
mod logging;
mod tui;
mod ui;
mod window;

use app::App;
use config::Config;
use greet::GreetClient;
use window::EventWindow;

#[derive(Parser)]
#[command(name = "tars")]
#[command(about = "Terminal chat window for the TARS assistant")]
struct Cli {
    /// Base URL of the greet backend (overrides the config file)
    #[arg(short, long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init()?;

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let backend_url = cli
        .backend
        .or(config.backend_url)
        .unwrap_or_else(|| config::DEFAULT_BACKEND_URL.to_string());

    let greeter = Arc::new(GreetClient::new(&backend_url));

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = tui::EventHandler::new();
    let window = Arc::new(EventWindow::new(events.sender()));
    let mut app = App::new(greeter, window, events.sender());

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

async fn run(
    terminal: &mut tui::Tui,
    events: &mut tui::EventHandler,
    app: &mut App,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
