use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use ta_core::Provider;

#[derive(Parser)]
#[command(name = "ticket-audit")]
#[command(about = "Redact incident tickets and audit them against the 16-question framework", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract and redact a ticket export
    Redact(RedactArgs),

    /// Redact a ticket and audit it with an AI provider
    Audit(AuditArgs),

    /// Redact every supported file in a directory
    Batch(BatchArgs),

    /// Inspect the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),

    /// List redaction categories and whether they are enabled
    Categories,

    /// Print shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args)]
pub struct RedactArgs {
    /// PDF or text file
    pub file: PathBuf,

    /// Write redacted text here instead of stdout
    #[arg(long, short)]
    pub out: Option<PathBuf>,

    /// Copy redacted text to the clipboard
    #[arg(long)]
    pub copy: bool,

    /// Print per-category redaction counts
    #[arg(long)]
    pub stats: bool,

    /// Print text and statistics as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct AuditArgs {
    /// PDF or text file
    pub file: PathBuf,

    /// AI provider (default from config)
    #[arg(long)]
    pub provider: Option<Provider>,

    /// Model name (default depends on provider)
    #[arg(long)]
    pub model: Option<String>,

    /// Save the report into the reports directory
    #[arg(long)]
    pub save: bool,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Always query the provider, ignoring cached responses
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// Directory of ticket exports
    pub dir: PathBuf,

    /// Where redacted files and the summary go (default: DIR/redacted)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// File-name glob, e.g. 'INC*.pdf'
    #[arg(long)]
    pub pattern: Option<String>,

    /// Descend into subdirectories
    #[arg(long, short)]
    pub recursive: bool,

    /// Audit each file after redaction
    #[arg(long)]
    pub audit: bool,

    /// AI provider for --audit (default from config)
    #[arg(long, requires = "audit")]
    pub provider: Option<Provider>,

    /// Always query the provider, ignoring cached responses
    #[arg(long, requires = "audit")]
    pub no_cache: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Print the configuration file path
    Path,

    /// Check keys, paths and limits
    Validate,
}
