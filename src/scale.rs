//! Support for serving scaling

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ScalingRule, ScalingRuleKind};

/// Servings every recipe is authored for
///
/// This is not read from the recipe. All the stored quantities are for this
/// many servings.
pub const BASE_SERVINGS: u32 = 4;

/// Stored decimals have 3 decimal places, computed quantities are rounded to
/// the same precision.
const DECIMAL_SCALE: f64 = 1000.0;

/// Tolerance when checking if a value already sits on a step boundary
const STEP_EPSILON: f64 = 1e-9;

/// Configures the scaling target
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaleTarget {
    servings: u32,
    factor: f64,
}

impl ScaleTarget {
    /// Creates a new [`ScaleTarget`] for the wanted number of servings.
    ///
    /// The factor is `servings / BASE_SERVINGS`.
    pub fn new(servings: u32) -> Self {
        ScaleTarget {
            servings,
            factor: servings as f64 / BASE_SERVINGS as f64,
        }
    }

    /// Wanted number of servings
    pub fn servings(&self) -> u32 {
        self.servings
    }

    /// Get the calculated servings multiplier
    pub fn factor(&self) -> f64 {
        self.factor
    }
}

/// How a quantity was scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScaleOutcome {
    /// Multiplied by the servings multiplier
    Linear,
    /// Multiplied by the author's factor instead of the servings multiplier
    Factor,
    /// Not changed because the rule says so
    Fixed,
    /// Multiplied and rounded up to the rule step
    Stepped,
}

/// A scaled quantity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Scaled {
    pub value: f64,
    pub outcome: ScaleOutcome,
}

/// Possible errors during scaling process
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ScaleError {
    #[error("Step size must be a positive multiple of 0.001, got {0}")]
    InvalidStepSize(f64),

    #[error("Scaling {base} by {multiplier} is not a finite number")]
    NonFinite { base: f64, multiplier: f64 },
}

/// Scale a base quantity
///
/// - Without a rule, the quantity is linear to `multiplier`.
/// - [`ScalingRuleKind::Fixed`] returns `base` untouched.
/// - [`ScalingRuleKind::Linear`] with a `factor` uses the factor instead of
///   `multiplier`.
/// - [`ScalingRuleKind::Step`] rounds the linear result **up** to the next
///   multiple of `step_size` (1 if unset). The step must be a positive
///   multiple of 0.001, otherwise the result could leave the step grid once
///   rounded.
///
/// The result is rounded to 3 decimal places.
pub fn scale_quantity(
    base: f64,
    rule: Option<&ScalingRule>,
    multiplier: f64,
) -> Result<Scaled, ScaleError> {
    let (value, outcome) = match rule {
        None => (base * multiplier, ScaleOutcome::Linear),
        Some(rule) => match rule.kind {
            ScalingRuleKind::Fixed => (base, ScaleOutcome::Fixed),
            ScalingRuleKind::Linear => match rule.factor {
                Some(factor) => (base * factor, ScaleOutcome::Factor),
                None => (base * multiplier, ScaleOutcome::Linear),
            },
            ScalingRuleKind::Step => {
                let step = rule.step_size.unwrap_or(1.0);
                if !is_valid_step(step) {
                    return Err(ScaleError::InvalidStepSize(step));
                }
                (round_up_to_step(base * multiplier, step), ScaleOutcome::Stepped)
            }
        },
    };

    if !value.is_finite() {
        return Err(ScaleError::NonFinite { base, multiplier });
    }

    Ok(Scaled {
        value: round_to_scale(value),
        outcome,
    })
}

/// Multiples of a valid step survive rounding to the output precision
fn is_valid_step(step: f64) -> bool {
    if !(step.is_finite() && step > 0.0) {
        return false;
    }
    let units = step * DECIMAL_SCALE;
    units.round() >= 1.0 && (units - units.round()).abs() < STEP_EPSILON * DECIMAL_SCALE
}

fn round_up_to_step(value: f64, step: f64) -> f64 {
    let steps = value / step;
    let nearest = steps.round();
    // 0.1 * 3 / 0.1 is 3.0000000000000004, that is already on a step
    let steps = if (steps - nearest).abs() < STEP_EPSILON {
        nearest
    } else {
        steps.ceil()
    };
    steps * step
}

pub(crate) fn round_to_scale(value: f64) -> f64 {
    (value * DECIMAL_SCALE).round() / DECIMAL_SCALE
}
