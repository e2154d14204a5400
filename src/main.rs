use std::env;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use prod_assistant::core::config::AppPaths;
use prod_assistant::core::logging;
use prod_assistant::server;
use prod_assistant::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, "server.log");

    let state = AppState::initialize(paths).await?;

    let port = env::var("PORT")
        .ok()
        .and_then(|val| val.parse::<u16>().ok())
        .unwrap_or(state.settings.server.port);
    let bind_addr = format!("{}:{}", state.settings.server.host, port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    match state.rag_store.count().await {
        Ok(0) => tracing::warn!("Catalogue is empty; run prod-ingest before asking product questions"),
        Ok(count) => tracing::info!("Catalogue holds {} products", count),
        Err(e) => tracing::warn!("Failed to count catalogue records: {}", e),
    }

    tracing::info!(
        "Listening on {} (provider={})",
        addr,
        state.llm.provider_name()
    );

    let app: Router = server::router::router(state.clone());
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
