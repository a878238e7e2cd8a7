//! Difficulty overrides
//!
//! EASY and HARD versions store no ingredients or steps of their own. They
//! store an ordered list of delta operations on the MEDIUM data, which are
//! applied at read time by [`apply_ingredient_overrides`] and
//! [`apply_step_overrides`].
//!
//! Overrides come out of the store as [`IngredientOverrideRecord`] and
//! [`StepOverrideRecord`], with a loosely typed JSON payload. Converting them
//! with [`TryFrom`] validates that every operation carries exactly what it
//! needs.

use serde::{Deserialize, Serialize};

use crate::model::{IngredientId, OverrideId, StepId, StoredQuantity, VersionIngredientId};

mod ingredients;
mod record;
mod steps;

pub use ingredients::{apply_ingredient_overrides, ResolvedIngredient};
pub use record::{IngredientOverrideRecord, OverrideOperation, StepOverrideRecord};
pub use steps::{apply_step_overrides, ResolvedStep};

/// A decoded ingredient override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientOverride {
    pub id: OverrideId,
    pub operation: IngredientOperation,
}

/// Delta operation on the base ingredient list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientOperation {
    /// Append a new ingredient
    Add { data: IngredientAddData },
    /// Drop the target
    Remove { target: VersionIngredientId },
    /// Patch some fields of the target
    Update {
        target: VersionIngredientId,
        patch: IngredientPatch,
    },
    /// Swap the target for another catalog ingredient
    Replace {
        target: VersionIngredientId,
        data: IngredientReplaceData,
    },
}

/// Payload of an ADD ingredient override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientAddData {
    pub ingredient_id: IngredientId,
    pub quantity: StoredQuantity,
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
}

/// Payload of an UPDATE ingredient override
///
/// Fields left as [`None`] keep the base value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IngredientPatch {
    pub quantity: Option<StoredQuantity>,
    pub unit: Option<String>,
    pub notes: Option<String>,
    pub is_optional: Option<bool>,
}

/// Payload of a REPLACE ingredient override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngredientReplaceData {
    pub ingredient_id: IngredientId,
    pub quantity: StoredQuantity,
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
}

impl IngredientOverride {
    pub fn add(id: OverrideId, data: IngredientAddData) -> Self {
        Self {
            id,
            operation: IngredientOperation::Add { data },
        }
    }

    pub fn remove(id: OverrideId, target: VersionIngredientId) -> Self {
        Self {
            id,
            operation: IngredientOperation::Remove { target },
        }
    }

    pub fn update(id: OverrideId, target: VersionIngredientId, patch: IngredientPatch) -> Self {
        Self {
            id,
            operation: IngredientOperation::Update { target, patch },
        }
    }

    pub fn replace(
        id: OverrideId,
        target: VersionIngredientId,
        data: IngredientReplaceData,
    ) -> Self {
        Self {
            id,
            operation: IngredientOperation::Replace { target, data },
        }
    }

    /// Base ingredient this override points to. [`None`] for ADD.
    pub fn target(&self) -> Option<VersionIngredientId> {
        match &self.operation {
            IngredientOperation::Add { .. } => None,
            IngredientOperation::Remove { target }
            | IngredientOperation::Update { target, .. }
            | IngredientOperation::Replace { target, .. } => Some(*target),
        }
    }

    pub fn kind(&self) -> OverrideOperation {
        match &self.operation {
            IngredientOperation::Add { .. } => OverrideOperation::Add,
            IngredientOperation::Remove { .. } => OverrideOperation::Remove,
            IngredientOperation::Update { .. } => OverrideOperation::Update,
            IngredientOperation::Replace { .. } => OverrideOperation::Replace,
        }
    }
}

/// A decoded step override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOverride {
    pub id: OverrideId,
    pub operation: StepOperation,
}

/// Delta operation on the base step list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepOperation {
    /// Insert a new step at its `step_order`
    Add { data: StepAddData },
    Remove { target: StepId },
    Update { target: StepId, patch: StepPatch },
    /// Rewrite the target, keeping its position
    Replace { target: StepId, data: StepReplaceData },
}

/// Payload of an ADD step override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepAddData {
    pub step_order: i32,
    pub instruction: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub timer_seconds: Option<u32>,
    #[serde(default)]
    pub skill_level: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub techniques: Vec<String>,
}

/// Payload of an UPDATE step override
///
/// Fields left as [`None`] keep the base value. There is no way to change the
/// order of a step with an update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StepPatch {
    pub instruction: Option<String>,
    pub media_url: Option<String>,
    pub timer_seconds: Option<u32>,
    pub skill_level: Option<String>,
    pub tools: Option<Vec<String>>,
    pub techniques: Option<Vec<String>>,
}

/// Payload of a REPLACE step override
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReplaceData {
    pub instruction: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub timer_seconds: Option<u32>,
    #[serde(default)]
    pub skill_level: Option<String>,
    #[serde(default)]
    pub tools: Vec<String>,
    #[serde(default)]
    pub techniques: Vec<String>,
}

impl StepOverride {
    pub fn add(id: OverrideId, data: StepAddData) -> Self {
        Self {
            id,
            operation: StepOperation::Add { data },
        }
    }

    pub fn remove(id: OverrideId, target: StepId) -> Self {
        Self {
            id,
            operation: StepOperation::Remove { target },
        }
    }

    pub fn update(id: OverrideId, target: StepId, patch: StepPatch) -> Self {
        Self {
            id,
            operation: StepOperation::Update { target, patch },
        }
    }

    pub fn replace(id: OverrideId, target: StepId, data: StepReplaceData) -> Self {
        Self {
            id,
            operation: StepOperation::Replace { target, data },
        }
    }

    /// Base step this override points to. [`None`] for ADD.
    pub fn target(&self) -> Option<StepId> {
        match &self.operation {
            StepOperation::Add { .. } => None,
            StepOperation::Remove { target }
            | StepOperation::Update { target, .. }
            | StepOperation::Replace { target, .. } => Some(*target),
        }
    }

    pub fn kind(&self) -> OverrideOperation {
        match &self.operation {
            StepOperation::Add { .. } => OverrideOperation::Add,
            StepOperation::Remove { .. } => OverrideOperation::Remove,
            StepOperation::Update { .. } => OverrideOperation::Update,
            StepOperation::Replace { .. } => OverrideOperation::Replace,
        }
    }
}
