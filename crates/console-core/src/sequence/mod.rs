//! Sequence draft domain module.
//!
//! # Module Structure
//!
//! - `model`: step, tool, part and reference URL value types
//! - `draft`: the [`SequenceDraft`] aggregate and its structural edits
//! - `triggers`: per-step trigger list edits
//! - `key`: sequence key derivation and format check
//! - `validation`: the pre-save gate
//! - `dto`: wire shapes and draft conversions
//! - `service`: backend collaborator trait

mod draft;
pub mod dto;
mod key;
mod model;
pub mod service;
mod triggers;
mod validation;

pub use draft::SequenceDraft;
pub use dto::{ActiveSequence, GeneratedSequence, SavedSequence, SequencePayload};
pub use key::{MAX_KEY_LEN, generate_key, is_valid_key};
pub use model::{
    Category, Handoff, Part, PartField, ReferenceUrl, SequenceType, Step, StepField, Tool,
    ToolField, TriggerKind, UrlCategory, UrlField,
};
pub use service::SequenceService;
pub use validation::{is_allowed_link, validate_for_save};
