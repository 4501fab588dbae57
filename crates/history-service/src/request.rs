//! Request bodies and query parameters, and their validation.
//!
//! Enum-valued and structured fields arrive loosely typed so that a bad value
//! is reported against its field name instead of failing deserialization.

use chrono::{DateTime, NaiveDate, Utc};
use database::validation::{validate_original_prompt, validate_tags};
use database::{
    EntryPatch, HistoryFilter, IntentCategory, Meta, PromptHistoryEntry, Source, ValidationError,
};
use enhance_core::Credits;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::pricing::{self, DEFAULT_MODEL};
use crate::style::Style;

/// Largest accepted `page_size`.
pub const MAX_PAGE_SIZE: u32 = 100;

/// `page_size` used when only `page` is given.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Body of a create request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateEntryRequest {
    #[serde(default)]
    pub original_prompt: String,
    pub intent_category: Option<String>,
    pub source: Option<String>,
    pub tags: Option<Value>,
    pub meta: Option<Value>,
}

/// A create request after validation. Reserved meta keys are already gone.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCreate {
    pub original_prompt: String,
    pub intent_category: IntentCategory,
    pub source: Source,
    pub tags: Vec<String>,
    pub meta: Meta,
}

impl CreateEntryRequest {
    pub fn validate(&self) -> Result<ValidCreate, ValidationError> {
        Ok(ValidCreate {
            original_prompt: validate_original_prompt(&self.original_prompt)?,
            intent_category: parse_choice(
                self.intent_category.as_deref(),
                "intent_category",
                &IntentCategory::ALL,
            )?
            .unwrap_or_default(),
            source: parse_choice(self.source.as_deref(), "source", &Source::ALL)?
                .unwrap_or_default(),
            tags: parse_tags(self.tags.as_ref())?.unwrap_or_default(),
            meta: parse_meta(self.meta.as_ref())?
                .map(database::models::strip_reserved_keys)
                .unwrap_or_default(),
        })
    }
}

/// Body of a PATCH request. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateEntryRequest {
    pub tags: Option<Value>,
    pub meta: Option<Value>,
    pub intent_category: Option<String>,
}

impl UpdateEntryRequest {
    pub fn validate(&self) -> Result<EntryPatch, ValidationError> {
        Ok(EntryPatch {
            tags: parse_tags(self.tags.as_ref())?,
            meta: parse_meta(self.meta.as_ref())?,
            intent_category: parse_choice(
                self.intent_category.as_deref(),
                "intent_category",
                &IntentCategory::ALL,
            )?,
        })
    }
}

/// Query parameters of a list request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub intent_category: Option<String>,
    pub source: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl ListParams {
    pub fn validate(&self) -> Result<HistoryFilter, ValidationError> {
        let (limit, offset) = parse_pagination(self.page.as_deref(), self.page_size.as_deref())?;

        Ok(HistoryFilter {
            intent_category: parse_choice(
                self.intent_category.as_deref(),
                "intent_category",
                &IntentCategory::ALL,
            )?,
            source: parse_choice(self.source.as_deref(), "source", &Source::ALL)?,
            created_from: self
                .date_from
                .as_deref()
                .map(|v| parse_date_bound(v, "date_from", DateBound::Start))
                .transpose()?,
            created_to: self
                .date_to
                .as_deref()
                .map(|v| parse_date_bound(v, "date_to", DateBound::End))
                .transpose()?,
            keyword: self
                .q
                .as_deref()
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(str::to_string),
            limit,
            offset,
        })
    }
}

/// Body of an enhance request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnhanceRequest {
    pub model: Option<String>,
    pub style: Option<String>,
}

impl EnhanceRequest {
    /// The requested model and style, with defaults applied.
    pub fn validate(&self) -> Result<(String, Style), ValidationError> {
        let model = self.model.as_deref().unwrap_or(DEFAULT_MODEL);
        if pricing::lookup(model).is_none() {
            return Err(ValidationError::invalid(
                "model",
                format!("model must be one of: {}", pricing::accepted_models()),
            ));
        }

        let style = match self.style.as_deref() {
            None => Style::default(),
            Some(key) => key.parse().map_err(|_| {
                ValidationError::invalid(
                    "style",
                    format!("style must be one of: {}", Style::accepted()),
                )
            })?,
        };

        Ok((model.to_string(), style))
    }
}

/// The enhancement fields of an entry, as returned by the enhance endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnhancementResponse {
    pub id: String,
    pub original_prompt: String,
    pub optimized_prompt: String,
    pub model: String,
    pub tokens: u32,
    pub credits_spent: Credits,
    pub enhanced_at: String,
}

impl EnhancementResponse {
    /// Build the response from a stored entry. `None` if it is not enhanced.
    pub fn from_entry(entry: &PromptHistoryEntry) -> Option<Self> {
        Some(Self {
            id: entry.id.clone(),
            original_prompt: entry.original_prompt.clone(),
            optimized_prompt: entry.optimized_prompt.clone()?,
            model: entry.model.clone()?,
            tokens: entry.tokens_used?,
            credits_spent: entry.credits_spent?,
            enhanced_at: entry.enhanced_at.clone()?,
        })
    }
}

fn parse_choice<T: Copy + std::fmt::Display>(
    value: Option<&str>,
    field: &str,
    choices: &[T],
) -> Result<Option<T>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };

    choices
        .iter()
        .copied()
        .find(|choice| choice.to_string() == value)
        .map(Some)
        .ok_or_else(|| {
            let accepted: Vec<String> = choices.iter().map(ToString::to_string).collect();
            ValidationError::invalid(field, format!("must be one of: {}", accepted.join(", ")))
        })
}

fn parse_tags(value: Option<&Value>) -> Result<Option<Vec<String>>, ValidationError> {
    let Some(value) = value else {
        return Ok(None);
    };

    let items = value
        .as_array()
        .ok_or_else(|| ValidationError::invalid("tags", "must be a list of strings"))?;

    let tags = items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| ValidationError::invalid("tags", "must be a list of strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    validate_tags(&tags).map(Some)
}

fn parse_meta(value: Option<&Value>) -> Result<Option<Meta>, ValidationError> {
    match value {
        None => Ok(None),
        Some(Value::Object(map)) => Ok(Some(map.clone())),
        Some(_) => Err(ValidationError::invalid("meta", "must be a JSON object")),
    }
}

fn parse_pagination(
    page: Option<&str>,
    page_size: Option<&str>,
) -> Result<(Option<u32>, Option<u32>), ValidationError> {
    if page.is_none() && page_size.is_none() {
        return Ok((None, None));
    }

    let page = match page {
        None => 1,
        Some(v) => v
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|p| *p >= 1)
            .ok_or_else(|| ValidationError::invalid("page", "must be a positive integer"))?,
    };

    let page_size = match page_size {
        None => DEFAULT_PAGE_SIZE,
        Some(v) => v
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|s| (1..=MAX_PAGE_SIZE).contains(s))
            .ok_or_else(|| {
                ValidationError::invalid(
                    "page_size",
                    format!("must be between 1 and {}", MAX_PAGE_SIZE),
                )
            })?,
    };

    let offset = (page - 1)
        .checked_mul(page_size)
        .ok_or_else(|| ValidationError::invalid("page", "page is out of range"))?;

    Ok((Some(page_size), Some(offset)))
}

/// Which end of a date range a bare date stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    /// Midnight at the start of the day.
    Start,
    /// The last microsecond of the day.
    End,
}

/// Parse `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date_bound(
    value: &str,
    field: &str,
    bound: DateBound,
) -> Result<DateTime<Utc>, ValidationError> {
    let value = value.trim();

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(timestamp.with_timezone(&Utc));
    }

    let invalid = || ValidationError::invalid(field, "expected YYYY-MM-DD or an RFC 3339 timestamp");
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let time = match bound {
        DateBound::Start => date.and_hms_opt(0, 0, 0),
        DateBound::End => date.and_hms_micro_opt(23, 59, 59, 999_999),
    };

    time.map(|t| t.and_utc()).ok_or_else(invalid)
}
