use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::{
    IngredientOperation, IngredientOverride, StepOperation, StepOverride,
};
use crate::{
    error::ComputationError,
    model::{OverrideId, StepId, VersionIngredientId},
};

/// Override operation as it is stored
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideOperation {
    Add,
    Remove,
    Update,
    Replace,
}

/// Stored ingredient override row
///
/// `override_data` is the JSON payload, with camelCase keys. Its shape depends
/// on `operation`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientOverrideRecord {
    pub id: OverrideId,
    pub operation: OverrideOperation,
    #[serde(default)]
    pub target_ingredient_id: Option<VersionIngredientId>,
    #[serde(default)]
    pub override_data: serde_json::Value,
}

/// Stored step override row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepOverrideRecord {
    pub id: OverrideId,
    pub operation: OverrideOperation,
    #[serde(default)]
    pub target_step_id: Option<StepId>,
    #[serde(default)]
    pub override_data: serde_json::Value,
}

impl TryFrom<IngredientOverrideRecord> for IngredientOverride {
    type Error = ComputationError;

    fn try_from(record: IngredientOverrideRecord) -> Result<Self, Self::Error> {
        let IngredientOverrideRecord {
            id,
            operation: kind,
            target_ingredient_id: target,
            override_data: data,
        } = record;

        let operation = match kind {
            OverrideOperation::Add => {
                no_target(id, kind, target)?;
                IngredientOperation::Add {
                    data: payload(id, kind, data)?,
                }
            }
            OverrideOperation::Remove => IngredientOperation::Remove {
                target: required_target(id, kind, target)?,
            },
            OverrideOperation::Update => IngredientOperation::Update {
                target: required_target(id, kind, target)?,
                patch: payload(id, kind, data)?,
            },
            OverrideOperation::Replace => IngredientOperation::Replace {
                target: required_target(id, kind, target)?,
                data: payload(id, kind, data)?,
            },
        };

        Ok(IngredientOverride { id, operation })
    }
}

impl TryFrom<StepOverrideRecord> for StepOverride {
    type Error = ComputationError;

    fn try_from(record: StepOverrideRecord) -> Result<Self, Self::Error> {
        let StepOverrideRecord {
            id,
            operation: kind,
            target_step_id: target,
            override_data: data,
        } = record;

        let operation = match kind {
            OverrideOperation::Add => {
                no_target(id, kind, target)?;
                StepOperation::Add {
                    data: payload(id, kind, data)?,
                }
            }
            OverrideOperation::Remove => StepOperation::Remove {
                target: required_target(id, kind, target)?,
            },
            OverrideOperation::Update => StepOperation::Update {
                target: required_target(id, kind, target)?,
                patch: payload(id, kind, data)?,
            },
            OverrideOperation::Replace => StepOperation::Replace {
                target: required_target(id, kind, target)?,
                data: payload(id, kind, data)?,
            },
        };

        Ok(StepOverride { id, operation })
    }
}

fn required_target<T>(
    id: OverrideId,
    kind: OverrideOperation,
    target: Option<T>,
) -> Result<T, ComputationError> {
    target.ok_or_else(|| ComputationError::InvalidOverride {
        override_id: id,
        reason: format!("{kind} needs a target"),
    })
}

fn no_target<T>(
    id: OverrideId,
    kind: OverrideOperation,
    target: Option<T>,
) -> Result<(), ComputationError> {
    match target {
        None => Ok(()),
        Some(_) => Err(ComputationError::InvalidOverride {
            override_id: id,
            reason: format!("{kind} can't have a target"),
        }),
    }
}

fn payload<T: DeserializeOwned>(
    id: OverrideId,
    kind: OverrideOperation,
    data: serde_json::Value,
) -> Result<T, ComputationError> {
    // a missing payload is the same as an empty one, so a patch with nothing
    // in it is still valid
    let data = match data {
        serde_json::Value::Null => serde_json::Value::Object(Default::default()),
        data => data,
    };
    serde_json::from_value(data).map_err(|e| ComputationError::InvalidOverride {
        override_id: id,
        reason: format!("bad {kind} data: {e}"),
    })
}
