use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod supervisor;

#[derive(Parser)]
#[command(name = "loopshare", about = "Run a private smbd on a loopback port")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that smbd can be run on this host
    Check(commands::check::CheckArgs),
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Create the smbd state directory and smb.conf
    Init(commands::init::InitArgs),
    /// Run smbd under supervision
    Serve(commands::serve::ServeArgs),
    /// Show whether a supervisor is running
    Status(commands::status::StatusArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout belongs to smbd's relayed output
    let default = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Init(args) => commands::init::run(args),
        Commands::Serve(args) => commands::serve::run(args).await,
        Commands::Status(args) => commands::status::run(args),
    }
}
