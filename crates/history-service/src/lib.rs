//! Prompt history requests and paid enhancement.
//!
//! This crate provides [`HistoryHandler`], which validates requests, applies
//! the [`AccessPolicy`], and drives the [`EnhancementService`] pipeline:
//!
//! ```text
//! enhance request
//!      ↓
//! validate model/style → load entry → owner check
//!      ↓
//! same idempotency key already stored? ──yes──→ replay stored result
//!      ↓ no
//! price → balance check → provider call → debit
//!      ↓
//! conditional write (revision) ──lost──→ replay or conflict
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use history_service::{AccessPolicy, Actor, EnhancementService, HistoryHandler, SqliteCreditLedger};
//!
//! let ledger = Arc::new(SqliteCreditLedger::new(db.clone()));
//! let enhancer = EnhancementService::new(openai, anthropic, ledger);
//! let handler = HistoryHandler::new(db, AccessPolicy::new(false), enhancer);
//!
//! let entry = handler.create_entry(&Actor::user("alice"), &request, Some("key-1")).await?;
//! ```

mod enhancement;
mod error;
mod handler;
mod ledger;
mod policy;
pub mod pricing;
mod request;
pub mod style;

pub use enhancement::{EnhancementOutcome, EnhancementResult, EnhancementService};
pub use error::{HistoryError, Result};
pub use handler::{HistoryHandler, MAX_IDEMPOTENCY_KEY_LENGTH};
pub use ledger::SqliteCreditLedger;
pub use policy::{Access, AccessPolicy, Actor, EntryView, Operation, ReadOnlyEntry, Role};
pub use request::{
    parse_date_bound, CreateEntryRequest, DateBound, EnhanceRequest, EnhancementResponse,
    ListParams, UpdateEntryRequest, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
pub use style::Style;

pub use database::{IntentCategory, PromptHistoryEntry, Source, ValidationError};
pub use enhance_core::Credits;
