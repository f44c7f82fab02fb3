//! Per-step trigger list editing.
//!
//! Triggers are match phrases authored by the user. Unlike keywords they are
//! positional and may repeat.

use super::SequenceDraft;
use super::model::{SequenceType, TriggerKind};
use crate::error::{ConsoleError, Result};

impl SequenceDraft {
    /// Appends a trimmed trigger to step `number`. Blank input is ignored.
    ///
    /// Linear sequences auto-advance, so success triggers are refused there.
    /// Returns `true` if a trigger was added.
    pub fn add_trigger(&mut self, number: usize, kind: TriggerKind, text: &str) -> Result<bool> {
        if kind == TriggerKind::Success && self.sequence_type() == SequenceType::Linear {
            return Err(ConsoleError::precondition(
                "linear sequences do not use success triggers",
            ));
        }
        let step = self.step_mut(number)?;
        let text = text.trim();
        if text.is_empty() {
            return Ok(false);
        }
        step.triggers_mut(kind).push(text.to_string());
        Ok(true)
    }

    /// Removes the trigger at `index` from step `number`.
    pub fn remove_trigger(
        &mut self,
        number: usize,
        kind: TriggerKind,
        index: usize,
    ) -> Result<String> {
        let triggers = self.step_mut(number)?.triggers_mut(kind);
        if index >= triggers.len() {
            return Err(ConsoleError::not_found(
                "trigger",
                format!("step {number} {kind} #{index}"),
            ));
        }
        Ok(triggers.remove(index))
    }
}
