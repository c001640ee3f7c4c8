//! Conversation state
//!
//! Transient per-user drafts for multi-step flows and the per-user lanes that
//! serialize a user's events.

mod draft;
mod draft_store;
mod lanes;

pub use draft::{CompletedDraft, ConversationDraft, DraftStep, DraftTarget};
pub use draft_store::{DraftStore, InMemoryDraftStore};
pub use lanes::UserLaneManager;
