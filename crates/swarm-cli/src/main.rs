use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "swarm")]
#[command(about = "Swarm CLI - streamed research reports with a live mission task list", long_about = None)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Path to config.toml (defaults to ~/.config/swarm/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the model and stream the report
    Ask(commands::ask::AskArgs),
    /// Replay a recorded transcript through a session
    Replay(commands::replay::ReplayArgs),
    /// Classify a transcript and print the fragments as JSON
    Classify {
        /// Transcript file
        file: PathBuf,
    },
}

fn init_tracing(log_level: &str) {
    let fallback = format!("swarm={}", log_level.trim().to_ascii_lowercase());
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&fallback))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("swarm=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    match cli.command {
        Commands::Ask(args) => commands::ask::run(args, cli.config.as_deref()).await?,
        Commands::Replay(args) => commands::replay::run(args, cli.config.as_deref()).await?,
        Commands::Classify { file } => commands::classify::run(&file)?,
    }

    Ok(())
}
