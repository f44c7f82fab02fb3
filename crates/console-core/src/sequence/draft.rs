//! The editable sequence draft and its mutation algebra.
//!
//! Tools and parts reference steps by [`StepId`], and step numbers are derived
//! from position. Removing or moving a step therefore never leaves a tool
//! pointing at the wrong step: references follow their step, and references to
//! a removed step are detached (they then apply to all steps).

use super::model::{
    Category, Part, PartField, ReferenceUrl, SequenceType, Step, StepField, Tool, ToolField,
    UrlField,
};
use crate::error::{ConsoleError, Result};
use crate::identity::{EntityId, StepId};
use std::collections::{BTreeMap, HashSet};

/// In-memory sequence being authored.
///
/// Owned by a single editing session. Every public mutation leaves the draft
/// with at least one step, contiguous numbering, and no dangling step
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDraft {
    pub name: String,
    pub description: String,
    pub category: Category,
    sequence_type: SequenceType,
    keywords: Vec<String>,
    steps: Vec<Step>,
    tools: Vec<Tool>,
    parts: Vec<Part>,
    urls: Vec<ReferenceUrl>,
    /// View state only. Keyed by identity so renumbering carries it along.
    expanded: HashSet<StepId>,
}

impl SequenceDraft {
    /// Creates a draft with a single empty, expanded step.
    pub fn new() -> Self {
        let mut draft = Self::empty();
        draft.add_step();
        draft
    }

    /// A draft with no steps. Callers must add one before handing it out.
    pub(crate) fn empty() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            category: Category::default(),
            sequence_type: SequenceType::default(),
            keywords: Vec::new(),
            steps: Vec::new(),
            tools: Vec::new(),
            parts: Vec::new(),
            urls: Vec::new(),
            expanded: HashSet::new(),
        }
    }

    // ============================================================================
    // Read access
    // ============================================================================

    pub fn sequence_type(&self) -> SequenceType {
        self.sequence_type
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Steps paired with their 1-based numbers.
    pub fn numbered_steps(&self) -> impl Iterator<Item = (usize, &Step)> {
        self.steps.iter().enumerate().map(|(i, s)| (i + 1, s))
    }

    pub fn step(&self, number: usize) -> Option<&Step> {
        number.checked_sub(1).and_then(|i| self.steps.get(i))
    }

    /// Current number of the step with the given identity.
    pub fn step_number(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id() == id).map(|i| i + 1)
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn urls(&self) -> &[ReferenceUrl] {
        &self.urls
    }

    pub fn tool(&self, id: EntityId) -> Option<&Tool> {
        self.tools.iter().find(|t| t.id() == id)
    }

    pub fn part(&self, id: EntityId) -> Option<&Part> {
        self.parts.iter().find(|p| p.id() == id)
    }

    pub fn url(&self, id: EntityId) -> Option<&ReferenceUrl> {
        self.urls.iter().find(|u| u.id() == id)
    }

    /// Step number a tool is attached to, `None` when it applies to all steps.
    pub fn tool_step_ref(&self, id: EntityId) -> Option<usize> {
        self.tool(id)
            .and_then(|t| t.step)
            .and_then(|s| self.step_number(s))
    }

    /// Step number a part is attached to, `None` when it applies to all steps.
    pub fn part_step_ref(&self, id: EntityId) -> Option<usize> {
        self.part(id)
            .and_then(|p| p.step)
            .and_then(|s| self.step_number(s))
    }

    // ============================================================================
    // Steps
    // ============================================================================

    /// Appends an empty step, marks it expanded and returns its number.
    pub fn add_step(&mut self) -> usize {
        let step = Step::new();
        self.expanded.insert(step.id());
        self.steps.push(step);
        self.steps.len()
    }

    /// Removes step `number`.
    ///
    /// Later steps move up by one. Tools and parts attached to the removed step
    /// are detached; the rest keep pointing at the same step under its new
    /// number. Refuses to remove the last remaining step.
    pub fn remove_step(&mut self, number: usize) -> Result<Step> {
        let index = self.index_of(number)?;
        if self.steps.len() == 1 {
            return Err(ConsoleError::precondition(
                "cannot remove the only remaining step",
            ));
        }

        let removed = self.steps.remove(index);
        let removed_id = removed.id();
        for tool in self.tools.iter_mut().filter(|t| t.step == Some(removed_id)) {
            tool.step = None;
        }
        for part in self.parts.iter_mut().filter(|p| p.step == Some(removed_id)) {
            part.step = None;
        }
        self.expanded.remove(&removed_id);

        Ok(removed)
    }

    /// Moves step `from` so that it ends up numbered `to`.
    pub fn move_step(&mut self, from: usize, to: usize) -> Result<()> {
        let from_index = self.index_of(from)?;
        let to_index = self.index_of(to)?;
        if from_index != to_index {
            let step = self.steps.remove(from_index);
            self.steps.insert(to_index, step);
        }
        Ok(())
    }

    pub fn update_step(&mut self, number: usize, field: StepField) -> Result<()> {
        let step = self.step_mut(number)?;
        match field {
            StepField::MessageTemplate(value) => step.message_template = value,
            StepField::DocUrl(value) => step.doc_url = value,
            StepField::DocTitle(value) => step.doc_title = value,
            StepField::Handoff(value) => step.handoff = value,
        }
        Ok(())
    }

    /// Changes the sequence type.
    ///
    /// Switching to [`SequenceType::Linear`] clears every step's success
    /// triggers. Switching back does not bring them back.
    pub fn set_sequence_type(&mut self, sequence_type: SequenceType) {
        if sequence_type == SequenceType::Linear {
            for step in &mut self.steps {
                step.success_triggers.clear();
            }
        }
        self.sequence_type = sequence_type;
    }

    pub(crate) fn step_mut(&mut self, number: usize) -> Result<&mut Step> {
        let index = self.index_of(number)?;
        Ok(&mut self.steps[index])
    }

    fn index_of(&self, number: usize) -> Result<usize> {
        if number == 0 || number > self.steps.len() {
            return Err(ConsoleError::not_found("step", number.to_string()));
        }
        Ok(number - 1)
    }

    /// Identity of step `number`, or `None` for "all steps".
    fn resolve_step_ref(&self, number: Option<usize>) -> Result<Option<StepId>> {
        number
            .map(|n| self.index_of(n).map(|i| self.steps[i].id()))
            .transpose()
    }

    // ============================================================================
    // Tools, parts, URLs
    // ============================================================================

    pub fn add_tool(&mut self) -> EntityId {
        let tool = Tool::new();
        let id = tool.id();
        self.tools.push(tool);
        id
    }

    pub fn remove_tool(&mut self, id: EntityId) -> Result<Tool> {
        let index = self
            .tools
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| ConsoleError::not_found("tool", id.to_string()))?;
        Ok(self.tools.remove(index))
    }

    pub fn update_tool(&mut self, id: EntityId, field: ToolField) -> Result<()> {
        let tool = self.tool_mut(id)?;
        match field {
            ToolField::Name(value) => tool.name = value,
            ToolField::Description(value) => tool.description = value,
            ToolField::Link(value) => tool.link = value,
            ToolField::IsRequired(value) => tool.is_required = value,
        }
        Ok(())
    }

    /// Attaches a tool to step `number`, or to all steps with `None`.
    pub fn assign_tool_step(&mut self, id: EntityId, number: Option<usize>) -> Result<()> {
        let step = self.resolve_step_ref(number)?;
        self.tool_mut(id)?.step = step;
        Ok(())
    }

    fn tool_mut(&mut self, id: EntityId) -> Result<&mut Tool> {
        self.tools
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| ConsoleError::not_found("tool", id.to_string()))
    }

    pub fn add_part(&mut self) -> EntityId {
        let part = Part::new();
        let id = part.id();
        self.parts.push(part);
        id
    }

    pub fn remove_part(&mut self, id: EntityId) -> Result<Part> {
        let index = self
            .parts
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| ConsoleError::not_found("part", id.to_string()))?;
        Ok(self.parts.remove(index))
    }

    pub fn update_part(&mut self, id: EntityId, field: PartField) -> Result<()> {
        let part = self.part_mut(id)?;
        match field {
            PartField::Name(value) => part.name = value,
            PartField::PartNumber(value) => part.part_number = value,
            PartField::Description(value) => part.description = value,
            PartField::EstimatedPrice(value) => part.estimated_price = value,
            PartField::Link(value) => part.link = value,
            PartField::IsRequired(value) => part.is_required = value,
        }
        Ok(())
    }

    /// Attaches a part to step `number`, or to all steps with `None`.
    pub fn assign_part_step(&mut self, id: EntityId, number: Option<usize>) -> Result<()> {
        let step = self.resolve_step_ref(number)?;
        self.part_mut(id)?.step = step;
        Ok(())
    }

    fn part_mut(&mut self, id: EntityId) -> Result<&mut Part> {
        self.parts
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| ConsoleError::not_found("part", id.to_string()))
    }

    pub fn add_url(&mut self) -> EntityId {
        let url = ReferenceUrl::new();
        let id = url.id();
        self.urls.push(url);
        id
    }

    pub fn remove_url(&mut self, id: EntityId) -> Result<ReferenceUrl> {
        let index = self
            .urls
            .iter()
            .position(|u| u.id() == id)
            .ok_or_else(|| ConsoleError::not_found("url", id.to_string()))?;
        Ok(self.urls.remove(index))
    }

    pub fn update_url(&mut self, id: EntityId, field: UrlField) -> Result<()> {
        let url = self
            .urls
            .iter_mut()
            .find(|u| u.id() == id)
            .ok_or_else(|| ConsoleError::not_found("url", id.to_string()))?;
        match field {
            UrlField::Title(value) => url.title = value,
            UrlField::Url(value) => url.url = value,
            UrlField::Category(value) => url.category = value,
        }
        Ok(())
    }

    pub(crate) fn push_tool(&mut self, tool: Tool) {
        self.tools.push(tool);
    }

    pub(crate) fn push_part(&mut self, part: Part) {
        self.parts.push(part);
    }

    pub(crate) fn push_url(&mut self, url: ReferenceUrl) {
        self.urls.push(url);
    }

    pub(crate) fn push_step(&mut self, step: Step) {
        self.steps.push(step);
    }

    pub(crate) fn mark_expanded(&mut self, id: StepId) {
        self.expanded.insert(id);
    }

    // ============================================================================
    // Keywords
    // ============================================================================

    /// Adds a keyword unless an equal one (ignoring case) is already present.
    ///
    /// Returns `true` if the keyword set changed.
    pub fn add_keyword(&mut self, keyword: &str) -> bool {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return false;
        }
        let lowered = keyword.to_lowercase();
        if self.keywords.iter().any(|k| k.to_lowercase() == lowered) {
            return false;
        }
        self.keywords.push(keyword.to_string());
        true
    }

    pub fn remove_keyword(&mut self, index: usize) -> Option<String> {
        (index < self.keywords.len()).then(|| self.keywords.remove(index))
    }

    // ============================================================================
    // Expansion state
    // ============================================================================

    pub fn is_expanded(&self, number: usize) -> bool {
        self.step(number)
            .is_some_and(|s| self.expanded.contains(&s.id()))
    }

    pub fn set_expanded(&mut self, number: usize, expanded: bool) -> Result<()> {
        let id = self.steps[self.index_of(number)?].id();
        if expanded {
            self.expanded.insert(id);
        } else {
            self.expanded.remove(&id);
        }
        Ok(())
    }

    /// Flips the expansion flag of step `number` and returns the new value.
    pub fn toggle_expanded(&mut self, number: usize) -> Result<bool> {
        let expanded = !self.is_expanded(number);
        self.set_expanded(number, expanded)?;
        Ok(expanded)
    }

    /// Expansion flags keyed by current step number.
    pub fn expansion_state(&self) -> BTreeMap<usize, bool> {
        self.numbered_steps()
            .map(|(n, s)| (n, self.expanded.contains(&s.id())))
            .collect()
    }
}

impl Default for SequenceDraft {
    fn default() -> Self {
        Self::new()
    }
}
