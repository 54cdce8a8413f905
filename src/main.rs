use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use chess_clickboard::config::SessionConfig;
use chess_clickboard::console::ConsoleHandler;
use chess_clickboard::session::GameSession;

fn main() -> Result<()> {
    let config = SessionConfig::load("clickboard")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let session = GameSession::from_config(&config).context("invalid start_fen")?;
    let mut console = ConsoleHandler::new(session);
    console.run()
}
