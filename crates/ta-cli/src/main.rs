mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use ta_config::Config;

use crate::cli::Commands;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so redacted text and JSON can be piped from stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();

    match cli.command {
        Commands::Redact(args) => commands::redact::handle(args, &Config::load()?).await,
        Commands::Audit(args) => commands::audit::handle(args, &Config::load()?).await,
        Commands::Batch(args) => commands::batch::handle(args, &Config::load()?).await,
        Commands::Config(cmd) => commands::config::handle(cmd, &Config::load()?),
        Commands::Categories => commands::categories::handle(),
        Commands::Completions { shell } => {
            commands::completions(shell);
            Ok(())
        }
    }
}
