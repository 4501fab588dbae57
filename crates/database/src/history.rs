//! Prompt history persistence.
//!
//! Every query here is scoped to an owner and skips soft-deleted rows unless
//! its name says otherwise (`get_visible_entry`, `inspect_entry`).

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DatabaseError, Result};
use crate::models::{
    carry_reserved_keys, EnhancementRecord, EntryPatch, IntentCategory, NewEntry,
    PromptHistoryEntry, Source, META_ENHANCE_IDEMPOTENCY_KEY, META_IDEMPOTENCY_KEY,
};
use crate::timestamp;

const ENTITY: &str = "PromptHistoryEntry";

/// Attempts made by `update_entry` before reporting a conflict.
const MAX_UPDATE_ATTEMPTS: usize = 3;

const SELECT_ENTRY: &str = r#"
    SELECT id, owner_id, original_prompt, optimized_prompt, intent_category, source,
           tags, meta, model, tokens_used, credits_spent_cents, enhanced_at,
           is_deleted, deleted_at, revision, created_at, updated_at
    FROM prompt_history
"#;

/// Filters for listing an owner's entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryFilter {
    pub intent_category: Option<IntentCategory>,
    pub source: Option<Source>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
    /// Case-insensitive substring of either prompt, or an exact tag.
    pub keyword: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Create a new entry.
///
/// Fails with [`DatabaseError::AlreadyExists`] if the owner already has a live
/// entry with the same `idempotency_key` in `meta`.
pub async fn create_entry(pool: &SqlitePool, entry: &NewEntry) -> Result<PromptHistoryEntry> {
    let id = Uuid::new_v4().to_string();
    let now = timestamp::now();
    let tags = encode_json(&entry.tags)?;
    let meta = encode_json(&entry.meta)?;

    sqlx::query(
        r#"
        INSERT INTO prompt_history
            (id, owner_id, original_prompt, original_prompt_folded, intent_category,
             source, tags, meta, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&entry.owner_id)
    .bind(&entry.original_prompt)
    .bind(fold(&entry.original_prompt))
    .bind(entry.intent_category.as_str())
    .bind(entry.source.as_str())
    .bind(&tags)
    .bind(&meta)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                let key = entry
                    .meta
                    .get(META_IDEMPOTENCY_KEY)
                    .and_then(|v| v.as_str())
                    .unwrap_or(&id);
                return DatabaseError::AlreadyExists {
                    entity: ENTITY,
                    id: key.to_string(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    debug!(entry_id = %id, owner = %entry.owner_id, "Created prompt history entry");

    get_entry(pool, &entry.owner_id, &id).await
}

/// Get a live entry owned by `owner_id`.
pub async fn get_entry(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<PromptHistoryEntry> {
    let sql = format!("{SELECT_ENTRY} WHERE id = ? AND owner_id = ? AND is_deleted = 0");

    sqlx::query_as::<_, PromptHistoryEntry>(&sql)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Get a live entry regardless of owner.
///
/// Only for read paths that have already been authorized by an access policy.
pub async fn get_visible_entry(pool: &SqlitePool, id: &str) -> Result<PromptHistoryEntry> {
    let sql = format!("{SELECT_ENTRY} WHERE id = ? AND is_deleted = 0");

    sqlx::query_as::<_, PromptHistoryEntry>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| not_found(id))
}

/// Get an entry in any state, including soft-deleted ones.
pub async fn inspect_entry(pool: &SqlitePool, id: &str) -> Result<Option<PromptHistoryEntry>> {
    let sql = format!("{SELECT_ENTRY} WHERE id = ?");

    let entry = sqlx::query_as::<_, PromptHistoryEntry>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(entry)
}

/// Find the owner's live entry created with the given idempotency key.
pub async fn find_by_idempotency_key(
    pool: &SqlitePool,
    owner_id: &str,
    key: &str,
) -> Result<Option<PromptHistoryEntry>> {
    let sql = format!(
        "{SELECT_ENTRY} WHERE owner_id = ? AND is_deleted = 0 \
         AND json_extract(meta, '$.{META_IDEMPOTENCY_KEY}') = ? \
         ORDER BY created_at ASC LIMIT 1"
    );

    let entry = sqlx::query_as::<_, PromptHistoryEntry>(&sql)
        .bind(owner_id)
        .bind(key)
        .fetch_optional(pool)
        .await?;

    Ok(entry)
}

/// List the owner's live entries, newest first.
pub async fn list_entries(
    pool: &SqlitePool,
    owner_id: &str,
    filter: &HistoryFilter,
) -> Result<Vec<PromptHistoryEntry>> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_ENTRY);
    query.push(" WHERE owner_id = ");
    query.push_bind(owner_id.to_string());
    query.push(" AND is_deleted = 0");

    if let Some(category) = filter.intent_category {
        query.push(" AND intent_category = ");
        query.push_bind(category.as_str());
    }

    if let Some(source) = filter.source {
        query.push(" AND source = ");
        query.push_bind(source.as_str());
    }

    if let Some(from) = filter.created_from {
        query.push(" AND created_at >= ");
        query.push_bind(timestamp::format(from));
    }

    if let Some(to) = filter.created_to {
        query.push(" AND created_at <= ");
        query.push_bind(timestamp::format(to));
    }

    if let Some(keyword) = filter.keyword.as_deref() {
        let pattern = format!("%{}%", escape_like(&fold(keyword)));
        query.push(" AND (original_prompt_folded LIKE ");
        query.push_bind(pattern.clone());
        query.push(" ESCAPE '\\' OR optimized_prompt_folded LIKE ");
        query.push_bind(pattern);
        query.push(
            " ESCAPE '\\' OR EXISTS (SELECT 1 FROM json_each(prompt_history.tags) \
             WHERE json_each.value = ",
        );
        query.push_bind(keyword.to_string());
        query.push("))");
    }

    query.push(" ORDER BY created_at DESC, rowid DESC");

    if let Some(limit) = filter.limit {
        query.push(" LIMIT ");
        query.push_bind(i64::from(limit));
        query.push(" OFFSET ");
        query.push_bind(i64::from(filter.offset.unwrap_or(0)));
    }

    let entries = query
        .build_query_as::<PromptHistoryEntry>()
        .fetch_all(pool)
        .await?;

    Ok(entries)
}

/// Apply an owner edit to `tags`, `meta` and/or `intent_category`.
///
/// Reserved meta keys are never taken from the patch; the stored values are
/// carried over. The write is conditional on the revision read just before it,
/// so an enhancement committed in between is not clobbered.
pub async fn update_entry(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    patch: &EntryPatch,
) -> Result<PromptHistoryEntry> {
    for attempt in 1..=MAX_UPDATE_ATTEMPTS {
        let current = get_entry(pool, owner_id, id).await?;
        if patch.is_empty() {
            return Ok(current);
        }

        let tags = patch.tags.as_ref().map(encode_json).transpose()?;
        let meta = patch
            .meta
            .as_ref()
            .map(|meta| encode_json(&carry_reserved_keys(meta, &current.meta)))
            .transpose()?;
        let category = patch.intent_category.map(|c| c.as_str());

        let result = sqlx::query(
            r#"
            UPDATE prompt_history
            SET tags = COALESCE(?, tags),
                meta = COALESCE(?, meta),
                intent_category = COALESCE(?, intent_category),
                updated_at = ?,
                revision = revision + 1
            WHERE id = ? AND owner_id = ? AND is_deleted = 0 AND revision = ?
            "#,
        )
        .bind(tags)
        .bind(meta)
        .bind(category)
        .bind(timestamp::now())
        .bind(id)
        .bind(owner_id)
        .bind(current.revision)
        .execute(pool)
        .await?;

        if result.rows_affected() == 1 {
            return get_entry(pool, owner_id, id).await;
        }

        debug!(entry_id = %id, attempt, "Entry changed during update, retrying");
    }

    Err(DatabaseError::Conflict {
        entity: ENTITY,
        id: id.to_string(),
    })
}

/// Soft-delete an entry.
///
/// Only `is_deleted` and `deleted_at` change; the row stays otherwise intact.
pub async fn soft_delete_entry(pool: &SqlitePool, owner_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE prompt_history
        SET is_deleted = 1, deleted_at = ?
        WHERE id = ? AND owner_id = ? AND is_deleted = 0
        "#,
    )
    .bind(timestamp::now())
    .bind(id)
    .bind(owner_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(not_found(id));
    }

    Ok(())
}

/// Record a successful enhancement, provided the entry's enhancement state
/// is still the one the caller read.
///
/// `expected_enhanced_at` is the `enhanced_at` value observed before the
/// provider call (`None` for an unenhanced entry). Owner edits to tags, meta
/// or category in the meantime do not block the write; another enhancement
/// committed first does. All enhancement fields and the enhancement
/// idempotency key are written in a single statement. When `enhance_key` is
/// `None` any stale key is removed so it cannot replay this result. Returns
/// [`DatabaseError::Conflict`] if another enhancement won, or the entry was
/// deleted or never existed; callers re-read to tell these apart.
pub async fn record_enhancement(
    pool: &SqlitePool,
    owner_id: &str,
    id: &str,
    expected_enhanced_at: Option<&str>,
    enhancement: &EnhancementRecord,
    enhance_key: Option<&str>,
) -> Result<PromptHistoryEntry> {
    let now = timestamp::now();
    let key_path = format!("$.{META_ENHANCE_IDEMPOTENCY_KEY}");

    let result = sqlx::query(
        r#"
        UPDATE prompt_history
        SET optimized_prompt = ?,
            optimized_prompt_folded = ?,
            model = ?,
            tokens_used = ?,
            credits_spent_cents = ?,
            enhanced_at = ?,
            meta = CASE
                WHEN ? IS NULL THEN json_remove(meta, ?)
                ELSE json_set(meta, ?, ?)
            END,
            updated_at = ?,
            revision = revision + 1
        WHERE id = ? AND owner_id = ? AND is_deleted = 0 AND enhanced_at IS ?
        "#,
    )
    .bind(&enhancement.optimized_prompt)
    .bind(fold(&enhancement.optimized_prompt))
    .bind(&enhancement.model)
    .bind(i64::from(enhancement.tokens_used))
    .bind(enhancement.credits_spent.cents())
    .bind(&now)
    .bind(enhance_key)
    .bind(&key_path)
    .bind(&key_path)
    .bind(enhance_key)
    .bind(&now)
    .bind(id)
    .bind(owner_id)
    .bind(expected_enhanced_at)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::Conflict {
            entity: ENTITY,
            id: id.to_string(),
        });
    }

    get_entry(pool, owner_id, id).await
}

/// Count an owner's entries.
pub async fn count_entries(
    pool: &SqlitePool,
    owner_id: &str,
    include_deleted: bool,
) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM prompt_history
        WHERE owner_id = ? AND (? OR is_deleted = 0)
        "#,
    )
    .bind(owner_id)
    .bind(include_deleted)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

fn not_found(id: &str) -> DatabaseError {
    DatabaseError::NotFound {
        entity: ENTITY,
        id: id.to_string(),
    }
}

fn encode_json<T: serde::Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Lowercase text for the `*_folded` search columns.
fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Escape LIKE wildcards so the keyword matches literally.
fn escape_like(keyword: &str) -> String {
    let mut escaped = String::with_capacity(keyword.len());
    for c in keyword.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
