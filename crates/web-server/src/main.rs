use database::DbRepository;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

// This main function is the entry point when running `cargo run -p web-server`.
// It wires config -> pool -> store itself; the workspace root binary does the
// same behind a CLI.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = configuration::load_config()?;
    let db_pool = database::connect(&config.database).await?;
    let store = DbRepository::new(db_pool, config.database.statement_timeout());

    web_server::run_server(config.server, Arc::new(store)).await
}
