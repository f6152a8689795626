use anyhow::Result;
use clap::Parser;

use restkit::{
    cli::{handle_command, resolve_config, Cli},
    utils::init_logger,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = resolve_config(&cli)?;

    // Logging goes to stderr; --verbose wins over the configured level
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    init_logger(level);

    handle_command(&cli, config).await
}
