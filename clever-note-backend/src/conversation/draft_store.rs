//! Per-user draft storage
//!
//! The diary flow only talks to `DraftStore`, so the process-local map can be
//! swapped for a persistent backend without touching the state machine.

use super::draft::ConversationDraft;
use dashmap::DashMap;

/// Key-value store holding at most one live draft per user
pub trait DraftStore: Send + Sync {
    fn get(&self, user_id: u64) -> Option<ConversationDraft>;

    /// Insert or replace the user's draft
    fn set(&self, user_id: u64, draft: ConversationDraft);

    /// Remove the user's draft, returning it if there was one
    fn clear(&self, user_id: u64) -> Option<ConversationDraft>;
}

/// Drafts held in process memory; lost on restart, never expire
pub struct InMemoryDraftStore {
    drafts: DashMap<u64, ConversationDraft>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self {
            drafts: DashMap::new(),
        }
    }
}

impl Default for InMemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftStore for InMemoryDraftStore {
    fn get(&self, user_id: u64) -> Option<ConversationDraft> {
        self.drafts.get(&user_id).map(|d| d.clone())
    }

    fn set(&self, user_id: u64, draft: ConversationDraft) {
        self.drafts.insert(user_id, draft);
    }

    fn clear(&self, user_id: u64) -> Option<ConversationDraft> {
        self.drafts.remove(&user_id).map(|(_, d)| d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::draft::DraftStep;

    #[test]
    fn test_set_replaces_existing_draft() {
        let store = InMemoryDraftStore::new();
        store.set(1, ConversationDraft::new_record(1));
        store.set(
            1,
            ConversationDraft::new_record(1).with_step(DraftStep::Datetime { awaiting_custom: true }),
        );
        assert_eq!(store.drafts.len(), 1);
        assert_eq!(
            store.get(1).map(|d| d.step),
            Some(DraftStep::Datetime { awaiting_custom: true })
        );
    }

    #[test]
    fn test_clear() {
        let store = InMemoryDraftStore::new();
        store.set(1, ConversationDraft::new_record(1));
        store.set(2, ConversationDraft::new_record(2));

        assert!(store.clear(1).is_some());
        assert!(store.clear(1).is_none());
        assert!(store.get(1).is_none());
        assert!(store.get(2).is_some());
    }
}
