//! Draft editing session.
//!
//! `DraftEditor` owns the sequence draft of one editing session and runs the
//! two network operations around it: generating the draft from a ticket and
//! saving it. At most one generation and one save are current at any time; a
//! newer request cancels the older one, and a cancelled request never writes
//! state.
//!
//! [`DraftEditor::close`] is the teardown. In-flight requests borrow the
//! editor, so it cannot be dropped while one is pending; call `close` when the
//! session ends to cancel them.

use console_core::config::ConsoleConfig;
use console_core::sequence::{SequenceDraft, SequenceService, validate_for_save};
use console_core::{ConsoleError, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Generation state of the editor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenerationPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    /// Generation failed with a user-facing message; retry is possible.
    Failed(String),
}

/// Result of a request that may have been superseded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome<T> {
    Completed(T),
    /// Superseded by a newer request or the session was closed. Nothing was
    /// written.
    Cancelled,
}

impl<T> RequestOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }
}

#[derive(Default)]
struct EditorState {
    phase: GenerationPhase,
    ticket_id: Option<String>,
    draft: Option<SequenceDraft>,
    saving: bool,
    save_error: Option<String>,
    generation: Option<CancellationToken>,
    save: Option<CancellationToken>,
}

pub struct DraftEditor {
    service: Arc<dyn SequenceService>,
    min_loading: Duration,
    session: CancellationToken,
    state: Mutex<EditorState>,
}

impl DraftEditor {
    /// Creates an editor whose generations take at least `min_loading`.
    pub fn new(service: Arc<dyn SequenceService>, min_loading: Duration) -> Self {
        Self {
            service,
            min_loading,
            session: CancellationToken::new(),
            state: Mutex::new(EditorState::default()),
        }
    }

    pub fn from_config(service: Arc<dyn SequenceService>, config: &ConsoleConfig) -> Self {
        Self::new(service, config.min_loading())
    }

    fn state(&self) -> MutexGuard<'_, EditorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ============================================================================
    // Observers
    // ============================================================================

    pub fn phase(&self) -> GenerationPhase {
        self.state().phase.clone()
    }

    pub fn ticket_id(&self) -> Option<String> {
        self.state().ticket_id.clone()
    }

    pub fn is_saving(&self) -> bool {
        self.state().saving
    }

    pub fn save_error(&self) -> Option<String> {
        self.state().save_error.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_cancelled()
    }

    /// Snapshot of the current draft.
    pub fn draft(&self) -> Option<SequenceDraft> {
        self.state().draft.clone()
    }

    /// Reads the current draft without cloning it.
    pub fn with_draft<R>(&self, f: impl FnOnce(&SequenceDraft) -> R) -> Option<R> {
        self.state().draft.as_ref().map(f)
    }

    /// Applies a user edit to the current draft. `None` when there is no draft.
    pub fn edit<R>(&self, f: impl FnOnce(&mut SequenceDraft) -> R) -> Option<R> {
        self.state().draft.as_mut().map(f)
    }

    // ============================================================================
    // Generation
    // ============================================================================

    /// Generates a fresh draft from `ticket_id`, replacing the current one.
    ///
    /// Cancels any generation already in flight. Resolves no earlier than the
    /// configured minimum loading time. Transport failures move the editor to
    /// [`GenerationPhase::Failed`] and are returned.
    pub async fn generate(&self, ticket_id: &str) -> Result<RequestOutcome<()>> {
        let (token, settled) = {
            let mut state = self.state();
            if self.session.is_cancelled() {
                return Ok(RequestOutcome::Cancelled);
            }
            // Phase to fall back to if the backend abandons this request.
            let settled = match &state.phase {
                GenerationPhase::Loading if state.draft.is_some() => GenerationPhase::Ready,
                GenerationPhase::Loading => GenerationPhase::Idle,
                phase => phase.clone(),
            };
            if let Some(previous) = state.generation.take() {
                tracing::debug!(target: "draft_editor", "Superseding in-flight generation");
                previous.cancel();
            }
            let token = self.session.child_token();
            state.generation = Some(token.clone());
            state.phase = GenerationPhase::Loading;
            state.ticket_id = Some(ticket_id.to_string());
            (token, settled)
        };

        tracing::info!(target: "draft_editor", "Generating sequence from ticket {}", ticket_id);
        let request = async {
            let (result, ()) = futures::join!(
                self.service.generate_sequence(ticket_id),
                tokio::time::sleep(self.min_loading)
            );
            result
        };
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(RequestOutcome::Cancelled),
            result = request => result,
        };

        let mut state = self.state();
        if token.is_cancelled() {
            return Ok(RequestOutcome::Cancelled);
        }
        state.generation = None;
        match result {
            Ok(generated) => {
                let draft = SequenceDraft::from_generated(generated);
                tracing::info!(
                    target: "draft_editor",
                    "Draft '{}' ready with {} steps",
                    draft.name,
                    draft.step_count()
                );
                state.draft = Some(draft);
                state.phase = GenerationPhase::Ready;
                state.save_error = None;
                Ok(RequestOutcome::Completed(()))
            }
            Err(ConsoleError::Cancelled) => {
                state.phase = settled;
                Ok(RequestOutcome::Cancelled)
            }
            Err(err) => {
                tracing::warn!(target: "draft_editor", "Generation failed: {}", err);
                state.phase = GenerationPhase::Failed(err.to_string());
                Err(err)
            }
        }
    }

    /// Reissues the last generation request.
    pub async fn retry(&self) -> Result<RequestOutcome<()>> {
        let ticket_id = self
            .ticket_id()
            .ok_or_else(|| ConsoleError::precondition("no generation to retry"))?;
        self.generate(&ticket_id).await
    }

    // ============================================================================
    // Save
    // ============================================================================

    /// Validates and saves the current draft.
    ///
    /// Cancels any save already in flight. A validation failure is returned
    /// before any network call. On success `on_saved` receives the persisted
    /// sequence key; on failure the draft stays editable and the message is
    /// kept in [`save_error`](Self::save_error).
    pub async fn save<F>(&self, is_active: bool, on_saved: F) -> Result<RequestOutcome<String>>
    where
        F: FnOnce(&str) + Send,
    {
        let (token, payload) = {
            let mut state = self.state();
            if self.session.is_cancelled() {
                return Ok(RequestOutcome::Cancelled);
            }
            if let Some(previous) = state.save.take() {
                tracing::debug!(target: "draft_editor", "Superseding in-flight save");
                previous.cancel();
            }
            state.saving = false;

            let ticket_id = state.ticket_id.clone().unwrap_or_default();
            let Some(draft) = state.draft.as_ref() else {
                return Err(ConsoleError::precondition("no draft to save"));
            };
            let payload = match validate_for_save(draft) {
                Ok(key) => draft.to_payload(ticket_id, key, is_active),
                Err(err) => {
                    tracing::debug!(target: "draft_editor", "Save blocked: {}", err);
                    state.save_error = Some(err.to_string());
                    return Err(err);
                }
            };

            let token = self.session.child_token();
            state.save = Some(token.clone());
            state.saving = true;
            state.save_error = None;
            (token, payload)
        };

        tracing::info!(target: "draft_editor", "Saving sequence '{}'", payload.sequence_key);
        let result = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(RequestOutcome::Cancelled),
            result = self.service.save_sequence(&payload) => result,
        };

        let key = {
            let mut state = self.state();
            if token.is_cancelled() {
                return Ok(RequestOutcome::Cancelled);
            }
            state.save = None;
            state.saving = false;
            match result {
                Ok(saved) => saved.sequence_key.unwrap_or(payload.sequence_key),
                Err(ConsoleError::Cancelled) => return Ok(RequestOutcome::Cancelled),
                Err(err) => {
                    tracing::warn!(target: "draft_editor", "Save failed: {}", err);
                    state.save_error = Some(err.to_string());
                    return Err(err);
                }
            }
        };

        tracing::info!(target: "draft_editor", "Sequence '{}' saved", key);
        on_saved(&key);
        Ok(RequestOutcome::Completed(key))
    }

    // ============================================================================
    // Teardown
    // ============================================================================

    /// Drops the draft and cancels in-flight requests; the editor stays usable.
    pub fn discard(&self) {
        let mut state = self.state();
        if let Some(token) = state.generation.take() {
            token.cancel();
        }
        if let Some(token) = state.save.take() {
            token.cancel();
        }
        *state = EditorState::default();
    }

    /// Ends the editing session. In-flight requests are cancelled and later
    /// calls do nothing.
    pub fn close(&self) {
        let _state = self.state();
        self.session.cancel();
    }
}
