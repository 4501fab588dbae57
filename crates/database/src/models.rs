//! Database models.

use std::fmt;
use std::str::FromStr;

use enhance_core::Credits;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// Free-form metadata attached to an entry.
pub type Meta = Map<String, Value>;

/// Meta key holding the idempotency key of the create request.
pub const META_IDEMPOTENCY_KEY: &str = "idempotency_key";

/// Meta key holding the idempotency key of the last successful enhancement.
pub const META_ENHANCE_IDEMPOTENCY_KEY: &str = "enhance_idempotency_key";

/// Meta keys written internally and never accepted from users.
pub const RESERVED_META_KEYS: [&str; 2] = [META_IDEMPOTENCY_KEY, META_ENHANCE_IDEMPOTENCY_KEY];

/// What the user was trying to do with a prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentCategory {
    Summary,
    Creative,
    Analysis,
    Code,
    Translation,
    #[default]
    Other,
}

impl IntentCategory {
    /// All categories, in display order.
    pub const ALL: [IntentCategory; 6] = [
        IntentCategory::Summary,
        IntentCategory::Creative,
        IntentCategory::Analysis,
        IntentCategory::Code,
        IntentCategory::Translation,
        IntentCategory::Other,
    ];

    /// The stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Summary => "summary",
            IntentCategory::Creative => "creative",
            IntentCategory::Analysis => "analysis",
            IntentCategory::Code => "code",
            IntentCategory::Translation => "translation",
            IntentCategory::Other => "other",
        }
    }
}

impl fmt::Display for IntentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntentCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntentCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| format!("unknown intent category '{}'", s))
    }
}

/// Where a prompt was captured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Extension,
    #[default]
    Web,
    Api,
}

impl Source {
    /// All sources.
    pub const ALL: [Source; 3] = [Source::Extension, Source::Web, Source::Api];

    /// The stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Extension => "extension",
            Source::Web => "web",
            Source::Api => "api",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == s)
            .ok_or_else(|| format!("unknown source '{}'", s))
    }
}

/// A stored prompt-history entry.
///
/// The enhancement fields (`optimized_prompt`, `model`, `tokens_used`,
/// `credits_spent`, `enhanced_at`) are either all set or all `None`; the
/// table enforces this with a CHECK constraint.
///
/// Serializes to the public API representation: ownership, soft-delete state
/// and the revision counter are not exposed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptHistoryEntry {
    /// UUID assigned at creation.
    pub id: String,
    /// Owning user ID. Never changes.
    #[serde(skip_serializing)]
    pub owner_id: String,
    /// Trimmed prompt text as submitted.
    pub original_prompt: String,
    /// Enhanced prompt, once an enhancement succeeded.
    pub optimized_prompt: Option<String>,
    pub intent_category: IntentCategory,
    pub source: Source,
    /// User tags, in the order given.
    pub tags: Vec<String>,
    /// User metadata plus the reserved idempotency keys.
    pub meta: Meta,
    /// Model that produced `optimized_prompt`.
    pub model: Option<String>,
    /// Tokens the provider billed for the enhancement.
    #[serde(rename = "tokens")]
    pub tokens_used: Option<u32>,
    /// Credits debited for the enhancement.
    pub credits_spent: Option<Credits>,
    pub enhanced_at: Option<String>,
    #[serde(skip_serializing)]
    pub is_deleted: bool,
    #[serde(skip_serializing)]
    pub deleted_at: Option<String>,
    /// Bumped on every mutation except soft delete; used for conditional writes.
    #[serde(skip_serializing)]
    pub revision: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl PromptHistoryEntry {
    /// Whether an enhancement has been recorded.
    pub fn is_enhanced(&self) -> bool {
        self.optimized_prompt.is_some()
    }

    /// A string value from `meta`, if present.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.meta.get(key).and_then(Value::as_str)
    }

    /// The create idempotency key stored on this entry.
    pub fn idempotency_key(&self) -> Option<&str> {
        self.meta_str(META_IDEMPOTENCY_KEY)
    }

    /// The idempotency key of the enhancement that produced `optimized_prompt`.
    pub fn enhance_idempotency_key(&self) -> Option<&str> {
        self.meta_str(META_ENHANCE_IDEMPOTENCY_KEY)
    }
}

impl<'r> FromRow<'r, SqliteRow> for PromptHistoryEntry {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        let intent_category: String = row.try_get("intent_category")?;
        let source: String = row.try_get("source")?;
        let tags: String = row.try_get("tags")?;
        let meta: String = row.try_get("meta")?;
        let tokens_used: Option<i64> = row.try_get("tokens_used")?;
        let credits_spent_cents: Option<i64> = row.try_get("credits_spent_cents")?;

        Ok(Self {
            id: row.try_get("id")?,
            owner_id: row.try_get("owner_id")?,
            original_prompt: row.try_get("original_prompt")?,
            optimized_prompt: row.try_get("optimized_prompt")?,
            intent_category: intent_category
                .parse()
                .map_err(|e: String| decode_error("intent_category", e))?,
            source: source
                .parse()
                .map_err(|e: String| decode_error("source", e))?,
            tags: serde_json::from_str(&tags).map_err(|e| decode_error("tags", e))?,
            meta: serde_json::from_str(&meta).map_err(|e| decode_error("meta", e))?,
            model: row.try_get("model")?,
            tokens_used: tokens_used
                .map(u32::try_from)
                .transpose()
                .map_err(|e| decode_error("tokens_used", e))?,
            credits_spent: credits_spent_cents.map(Credits::from_cents),
            enhanced_at: row.try_get("enhanced_at")?,
            is_deleted: row.try_get("is_deleted")?,
            deleted_at: row.try_get("deleted_at")?,
            revision: row.try_get("revision")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

fn decode_error(
    column: &str,
    err: impl Into<Box<dyn std::error::Error + Send + Sync>>,
) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: err.into(),
    }
}

/// Fields for a new entry. New entries are never enhanced or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntry {
    pub owner_id: String,
    pub original_prompt: String,
    pub intent_category: IntentCategory,
    pub source: Source,
    pub tags: Vec<String>,
    pub meta: Meta,
}

/// Owner-editable fields. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub tags: Option<Vec<String>>,
    pub meta: Option<Meta>,
    pub intent_category: Option<IntentCategory>,
}

impl EntryPatch {
    /// Whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.meta.is_none() && self.intent_category.is_none()
    }
}

/// The result of a successful enhancement, written to an entry in one update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnhancementRecord {
    pub optimized_prompt: String,
    pub model: String,
    pub tokens_used: u32,
    pub credits_spent: Credits,
}

/// A grant or debit against a user's credit balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditTransaction {
    /// UUID assigned by the ledger.
    pub id: String,
    pub user_id: String,
    /// Signed amount: positive for grants, negative for debits.
    pub amount: Credits,
    /// Balance immediately after this transaction.
    pub balance_after: Credits,
    pub reason: String,
    pub created_at: String,
}

impl<'r> FromRow<'r, SqliteRow> for CreditTransaction {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            amount: Credits::from_cents(row.try_get("amount_cents")?),
            balance_after: Credits::from_cents(row.try_get("balance_after_cents")?),
            reason: row.try_get("reason")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

/// Drop reserved keys from user-supplied metadata.
pub fn strip_reserved_keys(mut meta: Meta) -> Meta {
    for key in RESERVED_META_KEYS {
        meta.remove(key);
    }
    meta
}

/// Copy the reserved keys of `stored` over user-supplied `incoming` metadata.
pub fn carry_reserved_keys(incoming: &Meta, stored: &Meta) -> Meta {
    let mut merged = strip_reserved_keys(incoming.clone());
    for key in RESERVED_META_KEYS {
        if let Some(value) = stored.get(key) {
            merged.insert(key.to_string(), value.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_intent_category_parse() {
        assert_eq!("code".parse::<IntentCategory>(), Ok(IntentCategory::Code));
        assert!("poetry".parse::<IntentCategory>().is_err());
        assert_eq!(IntentCategory::default(), IntentCategory::Other);
    }

    #[test]
    fn test_source_parse() {
        assert_eq!("extension".parse::<Source>(), Ok(Source::Extension));
        assert!("mobile".parse::<Source>().is_err());
        assert_eq!(Source::default(), Source::Web);
    }

    #[test]
    fn test_strip_reserved_keys() {
        let meta = json!({"session": "s1", "idempotency_key": "k", "enhance_idempotency_key": "e"});
        let Value::Object(meta) = meta else { unreachable!() };

        let stripped = strip_reserved_keys(meta);
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped.get("session"), Some(&json!("s1")));
    }

    #[test]
    fn test_carry_reserved_keys() {
        let Value::Object(incoming) = json!({"note": "x", "idempotency_key": "forged"}) else {
            unreachable!()
        };
        let Value::Object(stored) = json!({"old": 1, "idempotency_key": "original"}) else {
            unreachable!()
        };

        let merged = carry_reserved_keys(&incoming, &stored);
        assert_eq!(merged.get("note"), Some(&json!("x")));
        assert_eq!(merged.get("idempotency_key"), Some(&json!("original")));
        assert!(merged.get("old").is_none());
        assert!(merged.get("enhance_idempotency_key").is_none());
    }
}
