//! Application layer for the sequence console.
//!
//! This crate coordinates the domain model with the backend collaborators:
//! the draft editing session with its generate/save lifecycle, background
//! notification polling, and the active sequence catalog.

pub mod active_sequences;
pub mod draft_editor;
pub mod notification_poller;

pub use active_sequences::ActiveSequenceCatalog;
pub use draft_editor::{DraftEditor, GenerationPhase, RequestOutcome};
pub use notification_poller::{NotificationEvent, NotificationPoller};
