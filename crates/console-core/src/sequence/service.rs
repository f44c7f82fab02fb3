//! Sequence backend collaborator trait.

use super::dto::{ActiveSequence, GeneratedSequence, SavedSequence, SequencePayload};
use crate::error::Result;
use async_trait::async_trait;

/// The sequence endpoints of the console backend.
///
/// Implementations report non-2xx responses as
/// [`ConsoleError::Transport`](crate::ConsoleError::Transport), preferring the
/// server's JSON `error` field for the message.
#[async_trait]
pub trait SequenceService: Send + Sync {
    /// `POST /tickets/{id}/generate-sequence`
    async fn generate_sequence(&self, ticket_id: &str) -> Result<GeneratedSequence>;

    /// `POST /sequences/from-ticket`
    async fn save_sequence(&self, payload: &SequencePayload) -> Result<SavedSequence>;

    /// `GET /sequences/active`
    async fn list_active_sequences(&self) -> Result<Vec<ActiveSequence>>;
}
