//! Wire shapes for the sequence endpoints.
//!
//! Generation responses and save payloads carry step numbers, never draft
//! identities. Identities are minted when a response is loaded and dropped when
//! a payload is built; numbers are resolved against the draft at both edges.

use super::SequenceDraft;
use super::model::{
    Category, Handoff, Part, ReferenceUrl, SequenceType, Step, Tool, UrlCategory,
};
use crate::identity::StepId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// POST /tickets/{id}/generate-sequence
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSequence {
    #[serde(default)]
    pub sequence_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub steps: Vec<StepDto>,
    #[serde(default)]
    pub urls: Vec<UrlDto>,
    #[serde(default)]
    pub tools: Vec<ToolDto>,
    #[serde(default)]
    pub parts: Vec<PartDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepDto {
    pub step_number: usize,
    #[serde(default)]
    pub message_template: String,
    #[serde(default)]
    pub success_triggers: Vec<String>,
    #[serde(default)]
    pub failure_triggers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_title: Option<String>,
    #[serde(default)]
    pub handoff_trigger: Option<String>,
    #[serde(default)]
    pub handoff_sequence_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToolDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default)]
    pub step_number: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartDto {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub estimated_price: Option<f64>,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_required")]
    pub is_required: bool,
    #[serde(default)]
    pub step_number: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UrlDto {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub category: UrlCategory,
}

fn default_required() -> bool {
    true
}

// ============================================================================
// POST /sequences/from-ticket
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencePayload {
    pub ticket_id: String,
    pub sequence_key: String,
    pub display_name: String,
    pub description: String,
    pub category: Category,
    pub sequence_type: SequenceType,
    pub is_active: bool,
    pub steps: Vec<StepDto>,
    pub urls: Vec<UrlDto>,
    pub keywords: Vec<String>,
    pub tools: Vec<ToolDto>,
    pub parts: Vec<PartDto>,
}

/// Save response. Older servers answer without a key; callers fall back to
/// the key they sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedSequence {
    #[serde(default)]
    pub sequence_key: Option<String>,
}

// ============================================================================
// GET /sequences/active
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveSequence {
    pub sequence_key: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub sequence_type: SequenceType,
}

// ============================================================================
// Conversions
// ============================================================================

impl SequenceDraft {
    /// Builds a fresh draft from a generation response.
    ///
    /// Steps are ordered by their server number and renumbered 1..N; tool and
    /// part references to numbers the response does not contain are detached.
    pub fn from_generated(generated: GeneratedSequence) -> Self {
        let mut draft = SequenceDraft::empty();
        draft.name = generated.sequence_name;
        draft.description = generated.description;
        draft.category = generated.category;
        for keyword in &generated.keywords {
            draft.add_keyword(keyword);
        }

        let mut steps = generated.steps;
        steps.sort_by_key(|s| s.step_number);
        let mut by_number: HashMap<usize, StepId> = HashMap::new();
        let mut first_step = None;
        for dto in steps {
            let step = Step::from(dto.clone());
            by_number.entry(dto.step_number).or_insert(step.id());
            first_step.get_or_insert(step.id());
            draft.push_step(step);
        }
        match first_step {
            Some(id) => draft.mark_expanded(id),
            None => {
                draft.add_step();
            }
        }

        let resolve = |n: Option<usize>| n.and_then(|n| by_number.get(&n).copied());
        for dto in generated.tools {
            let mut tool = Tool::new();
            tool.step = resolve(dto.step_number);
            tool.name = dto.name;
            tool.description = dto.description;
            tool.link = dto.link;
            tool.is_required = dto.is_required;
            draft.push_tool(tool);
        }
        for dto in generated.parts {
            let mut part = Part::new();
            part.step = resolve(dto.step_number);
            part.name = dto.name;
            part.part_number = dto.part_number;
            part.description = dto.description;
            part.estimated_price = dto.estimated_price.map(|p| p.to_string()).unwrap_or_default();
            part.link = dto.link;
            part.is_required = dto.is_required;
            draft.push_part(part);
        }
        for dto in generated.urls {
            let mut url = ReferenceUrl::new();
            url.title = dto.title;
            url.url = dto.url;
            url.category = dto.category;
            draft.push_url(url);
        }

        draft
    }

    /// Serializes the draft for the save endpoint.
    ///
    /// Does not validate; run the validation gate first and pass its key.
    pub fn to_payload(
        &self,
        ticket_id: impl Into<String>,
        sequence_key: impl Into<String>,
        is_active: bool,
    ) -> SequencePayload {
        let step_ref = |id: Option<StepId>| id.and_then(|id| self.step_number(id));

        SequencePayload {
            ticket_id: ticket_id.into(),
            sequence_key: sequence_key.into(),
            display_name: self.name.trim().to_string(),
            description: self.description.clone(),
            category: self.category,
            sequence_type: self.sequence_type(),
            is_active,
            steps: self
                .numbered_steps()
                .map(|(number, step)| StepDto::from_step(number, step))
                .collect(),
            urls: self
                .urls()
                .iter()
                .map(|u| UrlDto {
                    title: u.title.clone(),
                    url: u.url.trim().to_string(),
                    category: u.category,
                })
                .collect(),
            keywords: self.keywords().to_vec(),
            tools: self
                .tools()
                .iter()
                .filter(|t| !t.name.trim().is_empty())
                .map(|t| ToolDto {
                    name: t.name.trim().to_string(),
                    description: t.description.clone(),
                    link: t.link.trim().to_string(),
                    is_required: t.is_required,
                    step_number: step_ref(t.step),
                })
                .collect(),
            parts: self
                .parts()
                .iter()
                .filter(|p| !p.name.trim().is_empty())
                .map(|p| PartDto {
                    name: p.name.trim().to_string(),
                    part_number: p.part_number.clone(),
                    description: p.description.clone(),
                    estimated_price: p.parsed_price(),
                    link: p.link.trim().to_string(),
                    is_required: p.is_required,
                    step_number: step_ref(p.step),
                })
                .collect(),
        }
    }
}

impl From<StepDto> for Step {
    fn from(dto: StepDto) -> Self {
        let mut step = Step::new();
        step.message_template = dto.message_template;
        step.success_triggers = dto.success_triggers;
        step.failure_triggers = dto.failure_triggers;
        step.doc_url = dto.doc_url.filter(|u| !u.trim().is_empty());
        step.doc_title = dto.doc_title.filter(|t| !t.trim().is_empty());
        // A half-configured handoff is dropped rather than kept half-set.
        step.handoff = match (dto.handoff_trigger, dto.handoff_sequence_key) {
            (Some(trigger), Some(target_sequence_key)) => Some(Handoff {
                trigger,
                target_sequence_key,
            }),
            _ => None,
        };
        step
    }
}

impl StepDto {
    fn from_step(number: usize, step: &Step) -> Self {
        let (handoff_trigger, handoff_sequence_key) = match &step.handoff {
            Some(h) => (Some(h.trigger.clone()), Some(h.target_sequence_key.clone())),
            None => (None, None),
        };
        Self {
            step_number: number,
            message_template: step.message_template.clone(),
            success_triggers: step.success_triggers.clone(),
            failure_triggers: step.failure_triggers.clone(),
            doc_url: step
                .doc_url
                .as_deref()
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string),
            doc_title: step.doc_title.clone().filter(|t| !t.trim().is_empty()),
            handoff_trigger,
            handoff_sequence_key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::model::PartField;
    use serde_json::json;

    fn generated() -> GeneratedSequence {
        serde_json::from_value(json!({
            "sequence_name": "Furnace Short Cycling",
            "description": "Furnace turns on and off repeatedly",
            "category": "HVAC",
            "keywords": ["furnace", "Furnace", "cycling"],
            "steps": [
                {"step_number": 2, "message_template": "Check the filter", "failure_triggers": ["dirty"]},
                {"step_number": 1, "message_template": "Is the thermostat set to heat?",
                 "success_triggers": ["yes"], "handoff_trigger": "smell gas",
                 "handoff_sequence_key": "gas-leak"},
                {"step_number": 3, "message_template": "Inspect the flame sensor",
                 "handoff_trigger": "orphan"}
            ],
            "urls": [{"title": "Manual", "url": "https://example.com/m.pdf", "category": "documentation"}],
            "tools": [
                {"name": "Screwdriver", "step_number": 3},
                {"name": "Multimeter", "step_number": 9}
            ],
            "parts": [{"name": "Flame sensor", "estimated_price": 24.5, "step_number": 2}]
        }))
        .unwrap()
    }

    #[test]
    fn test_from_generated_orders_steps_and_links_references() {
        let draft = SequenceDraft::from_generated(generated());

        assert_eq!(draft.name, "Furnace Short Cycling");
        assert_eq!(draft.category, Category::Hvac);
        assert_eq!(draft.keywords(), &["furnace".to_string(), "cycling".to_string()]);
        assert_eq!(draft.step(1).unwrap().message_template, "Is the thermostat set to heat?");
        assert_eq!(draft.step(2).unwrap().message_template, "Check the filter");
        assert!(draft.step(1).unwrap().handoff.is_some());
        assert!(draft.step(3).unwrap().handoff.is_none());

        let screwdriver = draft.tools()[0].id();
        let multimeter = draft.tools()[1].id();
        assert_eq!(draft.tool_step_ref(screwdriver), Some(3));
        assert_eq!(draft.tool_step_ref(multimeter), None);
        assert_eq!(draft.part_step_ref(draft.parts()[0].id()), Some(2));
        assert_eq!(draft.parts()[0].estimated_price, "24.5");
        assert_eq!(
            draft.expansion_state().into_values().collect::<Vec<_>>(),
            vec![true, false, false]
        );
    }

    #[test]
    fn test_from_generated_mints_fresh_identities() {
        let a = SequenceDraft::from_generated(generated());
        let b = SequenceDraft::from_generated(generated());
        assert_ne!(a.tools()[0].id(), b.tools()[0].id());
        assert_ne!(a.step(1).unwrap().id(), b.step(1).unwrap().id());
    }

    #[test]
    fn test_empty_generation_still_has_a_step() {
        let draft = SequenceDraft::from_generated(GeneratedSequence::default());
        assert_eq!(draft.step_count(), 1);
        assert!(draft.is_expanded(1));
    }

    #[test]
    fn test_payload_renumbers_and_strips() {
        let mut draft = SequenceDraft::from_generated(generated());
        let blank = draft.add_tool();
        draft.remove_step(2).unwrap();
        let part = draft.parts()[0].id();
        draft
            .update_part(part, PartField::EstimatedPrice("n/a".into()))
            .unwrap();

        let payload = draft.to_payload("T-42", "furnace-short-cycling", true);

        let numbers: Vec<usize> = payload.steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(payload.steps[1].message_template, "Inspect the flame sensor");
        assert_eq!(payload.tools.len(), 2);
        assert_eq!(payload.tools[0].step_number, Some(2));
        assert!(draft.tool(blank).is_some());
        assert_eq!(payload.parts[0].step_number, None);
        assert_eq!(payload.parts[0].estimated_price, None);
        assert_eq!(payload.ticket_id, "T-42");
        assert!(payload.is_active);
    }

    #[test]
    fn test_payload_wire_shape() {
        let mut draft = SequenceDraft::new();
        draft.name = "Leaky Faucet".to_string();
        let value = serde_json::to_value(draft.to_payload("7", "leaky-faucet", false)).unwrap();

        assert_eq!(value["sequence_type"], "troubleshooting");
        assert_eq!(value["category"], "Other");
        assert_eq!(value["display_name"], "Leaky Faucet");
        assert_eq!(value["steps"][0]["step_number"], 1);
        assert!(value["steps"][0].get("doc_url").is_none());
        assert!(value["steps"][0]["handoff_trigger"].is_null());
    }
}
