use serde::{Deserialize, Serialize};

use super::{StepOperation, StepOverride};
use crate::model::{Origin, RecipeStep, StepId};

/// A step after applying the overrides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedStep {
    pub origin: Origin<StepId>,
    pub step_order: i32,
    pub instruction: String,
    pub media_url: Option<String>,
    pub timer_seconds: Option<u32>,
    pub skill_level: Option<String>,
    pub tools: Vec<String>,
    pub techniques: Vec<String>,
}

impl From<RecipeStep> for ResolvedStep {
    fn from(s: RecipeStep) -> Self {
        Self {
            origin: Origin::Base { id: s.id },
            step_order: s.step_order,
            instruction: s.instruction,
            media_url: s.media_url,
            timer_seconds: s.timer_seconds,
            skill_level: s.skill_level,
            tools: s.tools,
            techniques: s.techniques,
        }
    }
}

/// Apply step overrides to the base steps
///
/// Same rules as [`apply_ingredient_overrides`](super::apply_ingredient_overrides),
/// plus: every ADD re-sorts the list by `step_order`, so the new step lands in
/// the position the author chose. When orders tie, added steps go before base
/// steps, otherwise the sort is stable.
///
/// REMOVE, UPDATE and REPLACE never move steps. The target keeps its
/// `step_order`.
pub fn apply_step_overrides(base: Vec<RecipeStep>, overrides: &[StepOverride]) -> Vec<ResolvedStep> {
    let mut list: Vec<ResolvedStep> = base.into_iter().map(Into::into).collect();
    for ov in overrides {
        apply(&mut list, ov);
    }
    list
}

fn apply(list: &mut Vec<ResolvedStep>, ov: &StepOverride) {
    match &ov.operation {
        StepOperation::Add { data } => {
            list.push(ResolvedStep {
                origin: Origin::Synthetic { override_id: ov.id },
                step_order: data.step_order,
                instruction: data.instruction.clone(),
                media_url: data.media_url.clone(),
                timer_seconds: data.timer_seconds,
                skill_level: data.skill_level.clone(),
                tools: data.tools.clone(),
                techniques: data.techniques.clone(),
            });
            list.sort_by_key(|s| (s.step_order, !s.origin.is_synthetic()));
        }
        StepOperation::Remove { target } => {
            match list.iter().position(|s| s.origin.base_id() == Some(*target)) {
                Some(pos) => {
                    list.remove(pos);
                }
                None => dangling(ov, *target),
            }
        }
        StepOperation::Update { target, patch } => match find(list, *target) {
            Some(s) => {
                if let Some(instruction) = &patch.instruction {
                    s.instruction = instruction.clone();
                }
                if let Some(media_url) = &patch.media_url {
                    s.media_url = Some(media_url.clone());
                }
                if let Some(timer_seconds) = patch.timer_seconds {
                    s.timer_seconds = Some(timer_seconds);
                }
                if let Some(skill_level) = &patch.skill_level {
                    s.skill_level = Some(skill_level.clone());
                }
                if let Some(tools) = &patch.tools {
                    s.tools = tools.clone();
                }
                if let Some(techniques) = &patch.techniques {
                    s.techniques = techniques.clone();
                }
            }
            None => dangling(ov, *target),
        },
        StepOperation::Replace { target, data } => match find(list, *target) {
            Some(s) => {
                s.instruction = data.instruction.clone();
                s.media_url = data.media_url.clone();
                s.timer_seconds = data.timer_seconds;
                s.skill_level = data.skill_level.clone();
                s.tools = data.tools.clone();
                s.techniques = data.techniques.clone();
            }
            None => dangling(ov, *target),
        },
    }
}

fn find(list: &mut [ResolvedStep], target: StepId) -> Option<&mut ResolvedStep> {
    list.iter_mut().find(|s| s.origin.base_id() == Some(target))
}

fn dangling(ov: &StepOverride, target: StepId) {
    tracing::debug!(
        override_id = %ov.id,
        target_id = %target,
        operation = %ov.kind(),
        "step override target not found, skipping"
    );
}
