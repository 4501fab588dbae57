//! Access policy for prompt history entries.
//!
//! Owners have full access to their own entries. Moderators may read any
//! entry, but only while moderation is enabled, and what they get back is a
//! [`ReadOnlyEntry`].

use std::ops::Deref;

use database::PromptHistoryEntry;
use serde::Serialize;

/// Role carried by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    User,
    Moderator,
}

/// The authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: String,
    pub role: Role,
}

impl Actor {
    /// A regular user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::User,
        }
    }

    /// A user with the moderator role.
    pub fn moderator(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: Role::Moderator,
        }
    }

    pub fn is_moderator(&self) -> bool {
        self.role == Role::Moderator
    }
}

/// What the caller wants to do with an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Update,
    Delete,
    Enhance,
}

impl Operation {
    /// Whether the operation mutates the entry.
    pub fn is_write(self) -> bool {
        !matches!(self, Operation::Read)
    }
}

/// How an actor is allowed to reach an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Owner,
    /// Cross-user read through the moderation override.
    ModeratorRead,
}

/// Decides who may do what to an entry.
///
/// The moderation flag is fixed when the policy is built and injected into
/// the handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccessPolicy {
    moderation_enabled: bool,
}

impl AccessPolicy {
    pub fn new(moderation_enabled: bool) -> Self {
        Self { moderation_enabled }
    }

    pub fn moderation_enabled(&self) -> bool {
        self.moderation_enabled
    }

    /// The access granted to `actor` for `operation`, if any.
    pub fn access(
        &self,
        actor: &Actor,
        entry: &PromptHistoryEntry,
        operation: Operation,
    ) -> Option<Access> {
        if actor.user_id == entry.owner_id {
            return Some(Access::Owner);
        }
        if !operation.is_write() && self.moderation_enabled && actor.is_moderator() {
            return Some(Access::ModeratorRead);
        }
        None
    }

    pub fn can_access(
        &self,
        actor: &Actor,
        entry: &PromptHistoryEntry,
        operation: Operation,
    ) -> bool {
        self.access(actor, entry, operation).is_some()
    }
}

/// An entry reached through the moderation override.
///
/// Derefs to the entry for reading; there is no way to get a mutable or
/// owned entry back out.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ReadOnlyEntry(PromptHistoryEntry);

impl Deref for ReadOnlyEntry {
    type Target = PromptHistoryEntry;

    fn deref(&self) -> &PromptHistoryEntry {
        &self.0
    }
}

/// The result of a single-entry read.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EntryView {
    Owned(PromptHistoryEntry),
    ReadOnly(ReadOnlyEntry),
}

impl EntryView {
    pub(crate) fn new(entry: PromptHistoryEntry, access: Access) -> Self {
        match access {
            Access::Owner => EntryView::Owned(entry),
            Access::ModeratorRead => EntryView::ReadOnly(ReadOnlyEntry(entry)),
        }
    }

    pub fn entry(&self) -> &PromptHistoryEntry {
        match self {
            EntryView::Owned(entry) => entry,
            EntryView::ReadOnly(entry) => entry,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, EntryView::ReadOnly(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{IntentCategory, Meta, Source};

    fn entry(owner: &str) -> PromptHistoryEntry {
        PromptHistoryEntry {
            id: "e1".to_string(),
            owner_id: owner.to_string(),
            original_prompt: "hello".to_string(),
            optimized_prompt: None,
            intent_category: IntentCategory::Other,
            source: Source::Web,
            tags: vec![],
            meta: Meta::new(),
            model: None,
            tokens_used: None,
            credits_spent: None,
            enhanced_at: None,
            is_deleted: false,
            deleted_at: None,
            revision: 0,
            created_at: "2025-01-01T00:00:00.000000Z".to_string(),
            updated_at: "2025-01-01T00:00:00.000000Z".to_string(),
        }
    }

    const ALL_OPERATIONS: [Operation; 4] = [
        Operation::Read,
        Operation::Update,
        Operation::Delete,
        Operation::Enhance,
    ];

    #[test]
    fn test_owner_has_full_access() {
        let policy = AccessPolicy::new(false);
        let owner = Actor::user("alice");
        for operation in ALL_OPERATIONS {
            assert_eq!(
                policy.access(&owner, &entry("alice"), operation),
                Some(Access::Owner)
            );
        }
    }

    #[test]
    fn test_stranger_has_no_access() {
        let policy = AccessPolicy::new(true);
        let stranger = Actor::user("mallory");
        for operation in ALL_OPERATIONS {
            assert!(!policy.can_access(&stranger, &entry("alice"), operation));
        }
    }

    #[test]
    fn test_moderator_reads_only_when_enabled() {
        let moderator = Actor::moderator("mod");
        let target = entry("alice");

        let disabled = AccessPolicy::new(false);
        assert!(!disabled.can_access(&moderator, &target, Operation::Read));

        let enabled = AccessPolicy::new(true);
        assert_eq!(
            enabled.access(&moderator, &target, Operation::Read),
            Some(Access::ModeratorRead)
        );
        for operation in [Operation::Update, Operation::Delete, Operation::Enhance] {
            assert!(!enabled.can_access(&moderator, &target, operation));
        }
    }

    #[test]
    fn test_moderator_view_is_read_only() {
        let view = EntryView::new(entry("alice"), Access::ModeratorRead);
        assert!(view.is_read_only());
        assert_eq!(view.entry().owner_id, "alice");

        let view = EntryView::new(entry("alice"), Access::Owner);
        assert!(!view.is_read_only());
        assert!(matches!(view, EntryView::Owned(_)));
    }

    #[test]
    fn test_views_serialize_identically() {
        let owned = serde_json::to_value(EntryView::new(entry("alice"), Access::Owner)).unwrap();
        let read_only =
            serde_json::to_value(EntryView::new(entry("alice"), Access::ModeratorRead)).unwrap();
        assert_eq!(owned, read_only);
        assert_eq!(owned["id"], "e1");
    }
}
