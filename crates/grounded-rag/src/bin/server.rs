//! RAG Server binary
//!
//! Run with: cargo run -p grounded-rag --bin grounded-rag-server

use grounded_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grounded_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env_or_default()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Backend: {:?} at {}", config.llm.backend, config.llm.base_url);
    tracing::info!("  - Chat model: {}", config.llm.chat_model);
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!(
        "  - Gate: top_k={}, max_distance={}, max_contexts={}",
        config.retrieval.top_k,
        config.retrieval.max_distance,
        config.retrieval.max_contexts
    );
    tracing::info!("  - Index: {}", config.index.dir.display());

    let server = RagServer::new(config).await?;

    match server.state().chat().health_check().await {
        Ok(true) => tracing::info!("Chat model is reachable"),
        _ => tracing::warn!("Chat model is not reachable; questions will return no answer"),
    }

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("  API Info: http://{}/api/info", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/query         - Ask questions");
    println!("  POST /api/sessions      - Start a conversation");
    println!("  POST /api/index/rebuild - Rebuild the index");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
