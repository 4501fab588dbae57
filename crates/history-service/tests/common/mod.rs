//! Shared fixtures for handler integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use database::Database;
use history_service::{
    AccessPolicy, Actor, CreateEntryRequest, Credits, EnhancementService, HistoryHandler,
};
use mock_provider::{CompletionProvider, InMemoryLedger, StaticProvider};

pub struct Harness {
    pub db: Database,
    pub handler: HistoryHandler,
    pub gpt: Arc<StaticProvider>,
    pub claude: Arc<StaticProvider>,
    pub ledger: Arc<InMemoryLedger>,
}

pub async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

/// A handler whose user `alice` holds `balance_cents`.
pub async fn harness(balance_cents: i64, moderation_enabled: bool) -> Harness {
    let db = test_db().await;
    let gpt = Arc::new(StaticProvider::new("Better prompt", 42).named("openai"));
    let claude = Arc::new(StaticProvider::new("Claude prompt", 17).named("anthropic"));
    let ledger = Arc::new(
        InMemoryLedger::new().with_balance("alice", Credits::from_cents(balance_cents)),
    );

    let enhancer = EnhancementService::new(gpt.clone(), claude.clone(), ledger.clone());
    let handler = HistoryHandler::new(db.clone(), AccessPolicy::new(moderation_enabled), enhancer);

    Harness {
        db,
        handler,
        gpt,
        claude,
        ledger,
    }
}

/// A handler with an arbitrary GPT-family provider.
pub fn handler_with(
    db: &Database,
    gpt: Arc<dyn CompletionProvider>,
    ledger: Arc<InMemoryLedger>,
) -> HistoryHandler {
    let claude = Arc::new(StaticProvider::new("unused", 0));
    let enhancer = EnhancementService::new(gpt, claude, ledger);
    HistoryHandler::new(db.clone(), AccessPolicy::new(false), enhancer)
}

pub fn prompt(text: &str) -> CreateEntryRequest {
    CreateEntryRequest {
        original_prompt: text.to_string(),
        ..Default::default()
    }
}

pub fn alice() -> Actor {
    Actor::user("alice")
}
