//! History API server.

use std::sync::Arc;

use anthropic_provider::AnthropicProvider;
use database::Database;
use history_api::{app, AppState, Config};
use history_service::{AccessPolicy, EnhancementService, HistoryHandler, SqliteCreditLedger};
use openai_provider::OpenAiProvider;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        moderation_enabled = config.moderation_enabled,
        token_required = config.api_token.is_some(),
        "Starting history API server"
    );

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Providers and ledger
    let openai = Arc::new(OpenAiProvider::from_env()?);
    let anthropic = Arc::new(AnthropicProvider::from_env()?);
    let ledger = Arc::new(SqliteCreditLedger::new(db.clone()));

    let enhancer = EnhancementService::new(openai, anthropic, ledger);
    let history = HistoryHandler::new(
        db,
        AccessPolicy::new(config.moderation_enabled),
        enhancer,
    );

    // Build application
    let state = AppState::new(history, config.api_token.clone());
    let app = app(state);

    // Start server
    info!(addr = %config.addr, "History API server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
