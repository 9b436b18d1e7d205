#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use streamchat::cli::{self, Cli};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they never interleave with the chat transcript.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli.load_config()?;
    cli::dispatch(cli, config).await
}
