use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todo_server::{open_store, router, AppState, Clock, Config, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_new(&config.log_filter).context("parsing RUST_LOG")?)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let store = open_store(&config.database_url, clock.clone()).context("opening todo store")?;
    let app = router(AppState::new(store, clock), &config.cors);

    let addr = config.addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("API server running on http://{addr}");
    tracing::info!("health check: http://{addr}/api/health");

    todo_server::run(listener, app).await?;
    tracing::info!("server stopped");
    Ok(())
}
