use clap::{Parser, Subcommand};
use configuration::load_config;
// Import database types directly from the database crate
use database::connection::connect;
use database::repository::DbRepository;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// The main entry point for the reposcope metrics API.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (DATABASE_URL lives there,
    // not in config.toml).
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Parse command-line arguments
    let cli = Cli::parse();

    // Execute the appropriate command
    match cli.command {
        Commands::Serve(args) => handle_serve(args).await?,
    }

    Ok(())
}

// ==============================================================================
// CLI Structure
// ==============================================================================

/// A read-only HTTP API over the repository/issue schema, serving the dashboard.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    Serve(ServeArgs),
}

#[derive(Parser)]
struct ServeArgs {
    /// Override the listen port from config.toml.
    #[arg(long)]
    port: Option<u16>,
}

// ==============================================================================
// Serve Command Logic
// ==============================================================================

/// Wires configuration, the connection pool, and the web server together.
async fn handle_serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config()?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let db_pool = connect(&config.database).await?;
    let store = DbRepository::new(db_pool, config.database.statement_timeout());

    tracing::info!(
        host = %config.server.host,
        port = config.server.port,
        "Starting reposcope API server"
    );

    web_server::run_server(config.server, Arc::new(store)).await
}
