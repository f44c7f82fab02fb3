//! Pre-save validation gate.
//!
//! Runs before any save request leaves the process. Link fields are free text
//! rendered as anchors elsewhere in the console, so only absolute `http(s)`
//! URLs are accepted.

use super::SequenceDraft;
use super::key::{generate_key, is_valid_key};
use crate::error::{ConsoleError, Result};
use url::Url;

/// Whether `raw` is empty (after trimming) or an absolute http/https URL.
pub fn is_allowed_link(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return true;
    }
    match Url::parse(trimmed) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

fn check_link(label: impl FnOnce() -> String, raw: &str) -> Result<()> {
    if is_allowed_link(raw) {
        Ok(())
    } else {
        Err(ConsoleError::validation(format!(
            "{} must be an http(s) URL, got '{}'",
            label(),
            raw.trim()
        )))
    }
}

/// Checks every save precondition and returns the derived sequence key.
///
/// Stops at the first violation.
pub fn validate_for_save(draft: &SequenceDraft) -> Result<String> {
    let key = generate_key(&draft.name);
    if !is_valid_key(&key) {
        return Err(ConsoleError::validation(
            "Sequence name must contain at least one letter or digit",
        ));
    }

    for (number, step) in draft.numbered_steps() {
        if let Some(doc_url) = &step.doc_url {
            check_link(|| format!("Step {number} document URL"), doc_url)?;
        }
        if let Some(handoff) = &step.handoff {
            if handoff.trigger.trim().is_empty() {
                return Err(ConsoleError::validation(format!(
                    "Step {number} handoff needs a trigger phrase"
                )));
            }
            if !is_valid_key(&handoff.target_sequence_key) {
                return Err(ConsoleError::validation(format!(
                    "Step {number} handoff target '{}' is not a valid sequence key",
                    handoff.target_sequence_key
                )));
            }
        }
    }

    for tool in draft.tools() {
        check_link(|| format!("Tool '{}' link", tool.name), &tool.link)?;
    }
    for part in draft.parts() {
        check_link(|| format!("Part '{}' link", part.name), &part.link)?;
    }
    for url in draft.urls() {
        check_link(|| format!("Reference '{}' URL", url.title), &url.url)?;
    }

    Ok(key)
}
