use anyhow::Result;
use appraiser::cli::{Cli, CliHandler};
use appraiser::logging::initialize_logging;
use clap::Parser;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();
    let config = cli.load_config()?;

    // Initialize logging
    initialize_logging(&config.logging)?;
    info!("Starting appraiser with anchor {:?}", config.solver.anchor_item);

    // Handle command
    let handler = CliHandler::new(config, cli.format);
    handler.handle_command(cli.command).await?;

    Ok(())
}
