//! poolwatch entry point: sets up logging, parses config and starts the async monitor runtime.
//! The main function is intentionally thin and delegates to the runtime in `app`.

use anyhow::Result;
use poolwatch::{app, cli};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = cli::parse();
    app::run(config).await
}
