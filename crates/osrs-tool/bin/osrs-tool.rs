//! osrs-tool binary entry point
//!
//! Parses arguments, initializes logging and hands off to the library.

use anyhow::Result;
use osrs_tool::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::from_args();
    osrs_tool::run(cli).await
}
