use agora_backend::config::AgoraConfig;
use agora_backend::node::AgoraNode;
use agora_backend::telemetry;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Agora publishing backend")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (Axum) for REST/API access
    Serve,
    /// Create the data directories and apply the schema, then exit
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let args = Args::parse();

    let config = AgoraConfig::from_env()?;
    let node = AgoraNode::start(config)?;
    tracing::info!(
        api_port = node.config().api_port,
        "bootstrap complete"
    );

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => node.run_http_server().await,
        Command::Migrate => {
            tracing::info!("schema is up to date");
            Ok(())
        }
    }
}
