//! Request handling for prompt history.
//!
//! Ties the record store, the access policy and the enhancement service
//! together. Every lookup goes through the policy, and a caller who may not
//! see an entry gets [`HistoryError::NotFound`], never a permission error.

use std::sync::Arc;

use database::models::META_IDEMPOTENCY_KEY;
use database::{
    history, Database, DatabaseError, EnhancementRecord, NewEntry, PromptHistoryEntry,
    ValidationError,
};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::enhancement::{EnhancementOutcome, EnhancementService};
use crate::error::{HistoryError, Result};
use crate::policy::{Access, AccessPolicy, Actor, EntryView, Operation};
use crate::request::{
    CreateEntryRequest, EnhanceRequest, EnhancementResponse, ListParams, UpdateEntryRequest,
};

/// Longest accepted idempotency key.
pub const MAX_IDEMPOTENCY_KEY_LENGTH: usize = 255;

/// Entry point for every history operation.
#[derive(Clone)]
pub struct HistoryHandler {
    db: Database,
    policy: AccessPolicy,
    enhancer: Arc<EnhancementService>,
}

impl HistoryHandler {
    pub fn new(db: Database, policy: AccessPolicy, enhancer: EnhancementService) -> Self {
        Self {
            db,
            policy,
            enhancer: Arc::new(enhancer),
        }
    }

    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Create an entry, or return the caller's live entry already created
    /// with the same idempotency key.
    pub async fn create_entry(
        &self,
        actor: &Actor,
        request: &CreateEntryRequest,
        idempotency_key: Option<&str>,
    ) -> Result<PromptHistoryEntry> {
        let valid = request.validate()?;
        let key = normalize_key(idempotency_key)?;

        if let Some(key) = key {
            if let Some(existing) = self.find_created_with(actor, key).await? {
                info!(entry_id = %existing.id, owner = %actor.user_id, "Replaying idempotent create");
                return Ok(existing);
            }
        }

        let mut meta = valid.meta;
        if let Some(key) = key {
            meta.insert(META_IDEMPOTENCY_KEY.to_string(), Value::String(key.to_string()));
        }

        let new_entry = NewEntry {
            owner_id: actor.user_id.clone(),
            original_prompt: valid.original_prompt,
            intent_category: valid.intent_category,
            source: valid.source,
            tags: valid.tags,
            meta,
        };

        match history::create_entry(self.db.pool(), &new_entry).await {
            Ok(entry) => {
                info!(
                    entry_id = %entry.id,
                    owner = %actor.user_id,
                    source = %entry.source,
                    "Created prompt history entry"
                );
                Ok(entry)
            }
            Err(DatabaseError::AlreadyExists { .. }) => {
                // A concurrent request with the same key inserted first.
                let key = key.unwrap_or_default();
                debug!(owner = %actor.user_id, "Idempotent create lost the insert race");
                self.find_created_with(actor, key).await?.ok_or_else(|| {
                    HistoryError::Conflict("entry for idempotency key was removed".to_string())
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// The caller's live entries matching `params`, newest first.
    pub async fn list_entries(
        &self,
        actor: &Actor,
        params: &ListParams,
    ) -> Result<Vec<PromptHistoryEntry>> {
        let filter = params.validate()?;
        let entries = history::list_entries(self.db.pool(), &actor.user_id, &filter).await?;

        debug!(owner = %actor.user_id, count = entries.len(), "Listed prompt history");
        Ok(entries)
    }

    /// A single entry. Moderators reading someone else's entry get a
    /// read-only view.
    pub async fn get_entry(&self, actor: &Actor, id: &str) -> Result<EntryView> {
        let (entry, access) = self.authorize(actor, id, Operation::Read).await?;

        if access == Access::ModeratorRead {
            info!(entry_id = %id, moderator = %actor.user_id, "Moderator read of prompt history entry");
        }

        Ok(EntryView::new(entry, access))
    }

    /// Edit `tags`, `meta` and/or `intent_category`.
    pub async fn update_entry(
        &self,
        actor: &Actor,
        id: &str,
        request: &UpdateEntryRequest,
    ) -> Result<PromptHistoryEntry> {
        let patch = request.validate()?;
        let (entry, _) = self.authorize(actor, id, Operation::Update).await?;

        let updated = history::update_entry(self.db.pool(), &entry.owner_id, id, &patch).await?;

        debug!(entry_id = %id, revision = updated.revision, "Updated prompt history entry");
        Ok(updated)
    }

    /// Soft-delete an entry.
    pub async fn delete_entry(&self, actor: &Actor, id: &str) -> Result<()> {
        let (entry, _) = self.authorize(actor, id, Operation::Delete).await?;

        history::soft_delete_entry(self.db.pool(), &entry.owner_id, id).await?;

        info!(entry_id = %id, owner = %actor.user_id, "Soft-deleted prompt history entry");
        Ok(())
    }

    /// Enhance an entry, or replay the stored result of an earlier
    /// enhancement made with the same idempotency key.
    pub async fn enhance_entry(
        &self,
        actor: &Actor,
        id: &str,
        request: &EnhanceRequest,
        idempotency_key: Option<&str>,
    ) -> Result<EnhancementResponse> {
        let (model, style) = request.validate()?;
        let key = normalize_key(idempotency_key)?;
        let (entry, _) = self.authorize(actor, id, Operation::Enhance).await?;

        if let Some(replay) = replay(&entry, key) {
            info!(entry_id = %id, "Replaying idempotent enhancement");
            return Ok(replay);
        }

        let result = match self.enhancer.enhance(actor, &entry, &model, style).await {
            EnhancementOutcome::Success(result) => result,
            EnhancementOutcome::InsufficientCredits { required, current } => {
                return Err(HistoryError::PaymentRequired { required, current });
            }
            EnhancementOutcome::UnsupportedModel(model) => {
                return Err(HistoryError::EnhancementFailed(format!(
                    "unsupported model: {}",
                    model
                )));
            }
            EnhancementOutcome::ProviderError(e) => {
                return Err(HistoryError::EnhancementFailed(e.to_string()));
            }
            EnhancementOutcome::LedgerError(e) => {
                return Err(HistoryError::EnhancementFailed(e.to_string()));
            }
        };

        let record = EnhancementRecord {
            optimized_prompt: result.optimized_prompt,
            model: result.model,
            tokens_used: result.tokens_used,
            credits_spent: result.credits_spent,
        };

        let written = history::record_enhancement(
            self.db.pool(),
            &entry.owner_id,
            id,
            entry.enhanced_at.as_deref(),
            &record,
            key,
        )
        .await;

        match written {
            Ok(updated) => {
                info!(
                    entry_id = %id,
                    model = %record.model,
                    tokens = record.tokens_used,
                    credits = %record.credits_spent,
                    transaction_id = %result.transaction_id,
                    "Stored enhancement"
                );
                stored_response(&updated)
            }
            Err(DatabaseError::Conflict { .. }) => {
                warn!(
                    entry_id = %id,
                    transaction_id = %result.transaction_id,
                    "Another enhancement was stored first; result discarded"
                );
                self.resolve_lost_write(id, key).await
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Load a live entry and check `operation` against the policy.
    async fn authorize(
        &self,
        actor: &Actor,
        id: &str,
        operation: Operation,
    ) -> Result<(PromptHistoryEntry, Access)> {
        let entry = history::get_visible_entry(self.db.pool(), id).await?;

        match self.policy.access(actor, &entry, operation) {
            Some(access) => Ok((entry, access)),
            None => {
                debug!(entry_id = %id, actor = %actor.user_id, ?operation, "Access denied");
                Err(HistoryError::NotFound(id.to_string()))
            }
        }
    }

    async fn find_created_with(
        &self,
        actor: &Actor,
        key: &str,
    ) -> Result<Option<PromptHistoryEntry>> {
        Ok(history::find_by_idempotency_key(self.db.pool(), &actor.user_id, key).await?)
    }

    /// After another enhancement was stored first, replay it if it used the
    /// same key.
    async fn resolve_lost_write(&self, id: &str, key: Option<&str>) -> Result<EnhancementResponse> {
        let current = history::inspect_entry(self.db.pool(), id)
            .await?
            .filter(|entry| !entry.is_deleted)
            .ok_or_else(|| HistoryError::NotFound(id.to_string()))?;

        match replay(&current, key) {
            Some(replay) => {
                info!(entry_id = %id, "Concurrent enhancement with the same key won; replaying");
                Ok(replay)
            }
            None => Err(HistoryError::Conflict(format!(
                "entry {} was enhanced by a concurrent request",
                id
            ))),
        }
    }
}

/// Trim a caller-supplied idempotency key. Blank keys count as absent.
fn normalize_key(key: Option<&str>) -> Result<Option<&str>> {
    let Some(key) = key.map(str::trim).filter(|k| !k.is_empty()) else {
        return Ok(None);
    };

    let length = key.chars().count();
    if length > MAX_IDEMPOTENCY_KEY_LENGTH {
        return Err(ValidationError::TooLong {
            field: "idempotency_key".to_string(),
            max: MAX_IDEMPOTENCY_KEY_LENGTH,
            actual: length,
        }
        .into());
    }

    Ok(Some(key))
}

/// The stored result, if `entry` was enhanced under `key`.
fn replay(entry: &PromptHistoryEntry, key: Option<&str>) -> Option<EnhancementResponse> {
    let key = key?;
    if !entry.is_enhanced() || entry.enhance_idempotency_key() != Some(key) {
        return None;
    }
    EnhancementResponse::from_entry(entry)
}

fn stored_response(entry: &PromptHistoryEntry) -> Result<EnhancementResponse> {
    EnhancementResponse::from_entry(entry).ok_or_else(|| {
        HistoryError::EnhancementFailed(format!("entry {} has no stored enhancement", entry.id))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key(None).unwrap(), None);
        assert_eq!(normalize_key(Some("   ")).unwrap(), None);
        assert_eq!(normalize_key(Some(" abc ")).unwrap(), Some("abc"));

        let long = "k".repeat(MAX_IDEMPOTENCY_KEY_LENGTH + 1);
        assert!(matches!(
            normalize_key(Some(long.as_str())),
            Err(HistoryError::Validation(ValidationError::TooLong { .. }))
        ));
    }
}
