//! Sequence draft value types.
//!
//! Steps, tools, parts and reference URLs as the editor sees them. None of these
//! carry a step number: numbers are a function of position in the draft and are
//! computed by [`SequenceDraft`](super::SequenceDraft).

use crate::identity::{EntityId, StepId};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Trade category of a sequence.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
pub enum Category {
    Electrical,
    Plumbing,
    #[serde(rename = "HVAC")]
    #[strum(serialize = "HVAC")]
    Hvac,
    Appliances,
    Mechanical,
    #[default]
    #[serde(other)]
    Other,
}

/// How a sequence advances between steps.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SequenceType {
    /// Customer replies are matched against success/failure triggers.
    #[default]
    Troubleshooting,
    /// Steps auto-advance; only failure (escalation) triggers apply.
    Linear,
}

/// Which trigger list of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TriggerKind {
    Success,
    Failure,
}

/// Transfer to another sequence when the customer reply matches `trigger`.
///
/// Trigger and target only exist together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handoff {
    pub trigger: String,
    pub target_sequence_key: String,
}

/// One message/decision unit of a sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    id: StepId,
    pub message_template: String,
    pub success_triggers: Vec<String>,
    pub failure_triggers: Vec<String>,
    pub doc_url: Option<String>,
    pub doc_title: Option<String>,
    pub handoff: Option<Handoff>,
}

impl Step {
    /// Creates an empty step with a fresh identity.
    pub fn new() -> Self {
        Self {
            id: StepId::new(),
            message_template: String::new(),
            success_triggers: Vec::new(),
            failure_triggers: Vec::new(),
            doc_url: None,
            doc_title: None,
            handoff: None,
        }
    }

    pub fn id(&self) -> StepId {
        self.id
    }

    pub fn triggers(&self, kind: TriggerKind) -> &[String] {
        match kind {
            TriggerKind::Success => &self.success_triggers,
            TriggerKind::Failure => &self.failure_triggers,
        }
    }

    pub(crate) fn triggers_mut(&mut self, kind: TriggerKind) -> &mut Vec<String> {
        match kind {
            TriggerKind::Success => &mut self.success_triggers,
            TriggerKind::Failure => &mut self.failure_triggers,
        }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new()
    }
}

/// Single-field step edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepField {
    MessageTemplate(String),
    DocUrl(Option<String>),
    DocTitle(Option<String>),
    Handoff(Option<Handoff>),
}

/// A tool the technician or customer needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    id: EntityId,
    pub name: String,
    pub description: String,
    pub link: String,
    pub is_required: bool,
    /// Weak reference to a step; `None` applies to all steps.
    pub(crate) step: Option<StepId>,
}

impl Tool {
    pub fn new() -> Self {
        Self {
            id: EntityId::new(),
            name: String::new(),
            description: String::new(),
            link: String::new(),
            is_required: true,
            step: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn step(&self) -> Option<StepId> {
        self.step
    }
}

impl Default for Tool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolField {
    Name(String),
    Description(String),
    Link(String),
    IsRequired(bool),
}

/// A replacement part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    id: EntityId,
    pub name: String,
    pub part_number: String,
    pub description: String,
    /// Free text while editing; parsed when the draft is serialized.
    pub estimated_price: String,
    pub link: String,
    pub is_required: bool,
    pub(crate) step: Option<StepId>,
}

impl Part {
    pub fn new() -> Self {
        Self {
            id: EntityId::new(),
            name: String::new(),
            part_number: String::new(),
            description: String::new(),
            estimated_price: String::new(),
            link: String::new(),
            is_required: true,
            step: None,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn step(&self) -> Option<StepId> {
        self.step
    }

    /// Parses `estimated_price`, tolerating a leading currency sign.
    pub fn parsed_price(&self) -> Option<f64> {
        let trimmed = self.estimated_price.trim().trim_start_matches('$').trim();
        trimmed.parse::<f64>().ok().filter(|p| p.is_finite())
    }
}

impl Default for Part {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartField {
    Name(String),
    PartNumber(String),
    Description(String),
    EstimatedPrice(String),
    Link(String),
    IsRequired(bool),
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UrlCategory {
    Tool,
    Video,
    #[default]
    #[serde(other)]
    Documentation,
}

/// Reference link attached to the whole sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceUrl {
    id: EntityId,
    pub title: String,
    pub url: String,
    pub category: UrlCategory,
}

impl ReferenceUrl {
    pub fn new() -> Self {
        Self {
            id: EntityId::new(),
            title: String::new(),
            url: String::new(),
            category: UrlCategory::default(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }
}

impl Default for ReferenceUrl {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlField {
    Title(String),
    Url(String),
    Category(UrlCategory),
}
