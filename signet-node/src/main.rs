//! `signet`: private IOU ledger node

use clap::{Parser, Subcommand};
use signet_node::commands::{self, InitArgs};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signet", version, about = "Private IOU ledger node")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate keys, write the genesis block, and register this node
    Init(InitArgs),
    /// Load state, sync with peers, and serve the HTTP API
    Start,
    /// Stop a running node via its PID file
    Stop,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Init(args) => commands::init::run(args),
        Command::Start => commands::start::run().await,
        Command::Stop => commands::stop::run(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
