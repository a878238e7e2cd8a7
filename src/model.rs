//! Stored recipe representation
//!
//! These are the rows a [`VersionRepository`](crate::repository::VersionRepository)
//! hands to the resolver. Only the MEDIUM version owns ingredient and step rows,
//! the other difficulties are expressed as overrides on top of it.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

macro_rules! storage_id {
    ($($(#[$meta:meta])* $name:ident),+ $(,)?) => {
        $(
            $(#[$meta])*
            #[derive(
                Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            )]
            #[serde(transparent)]
            pub struct $name(pub i64);

            impl fmt::Display for $name {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    self.0.fmt(f)
                }
            }

            impl From<i64> for $name {
                fn from(value: i64) -> Self {
                    Self(value)
                }
            }
        )+
    };
}

storage_id! {
    /// Id of a [`Recipe`]
    RecipeId,
    /// Id of one of the difficulty versions of a recipe
    VersionId,
    /// Id of an ingredient row of the base version
    VersionIngredientId,
    /// Id of an ingredient in the shared catalog
    IngredientId,
    /// Id of an [`IngredientSubstitution`]
    SubstitutionId,
    /// Id of a [`ScalingRule`]
    ScalingRuleId,
    /// Id of a step row of the base version
    StepId,
    /// Id of a stored ingredient or step override
    OverrideId,
}

/// Difficulty of a recipe version
///
/// Every recipe has one version per difficulty. [`Difficulty::Medium`] is the
/// base one.
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
    strum::EnumIter,
    enum_map::Enum,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Check if this is the difficulty of the base version
    pub fn is_base(self) -> bool {
        self == Difficulty::Medium
    }
}

/// Recipe identity, as shown on top of every computed view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    /// Unique, URL safe
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub hero_image: Option<String>,
    #[serde(default)]
    pub published: bool,
}

/// A decimal quantity as it is stored
///
/// The text is kept untouched until scaling, where it is parsed. This accepts
/// both strings and numbers when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawQuantity", into = "String")]
pub struct StoredQuantity(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawQuantity {
    Number(f64),
    Text(String),
}

impl From<RawQuantity> for StoredQuantity {
    fn from(raw: RawQuantity) -> Self {
        match raw {
            RawQuantity::Number(n) => Self(n.to_string()),
            RawQuantity::Text(t) => Self(t),
        }
    }
}

impl From<StoredQuantity> for String {
    fn from(q: StoredQuantity) -> Self {
        q.0
    }
}

impl From<&str> for StoredQuantity {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<f64> for StoredQuantity {
    fn from(n: f64) -> Self {
        Self(n.to_string())
    }
}

impl StoredQuantity {
    /// Original stored text
    pub fn text(&self) -> &str {
        &self.0
    }

    /// Numeric value
    ///
    /// Returns [`None`] if the text is not a finite decimal number.
    pub fn value(&self) -> Option<f64> {
        self.0
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
    }
}

impl fmt::Display for StoredQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ingredient from the shared catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRef {
    pub id: IngredientId,
    /// Catalog name, unique ignoring case
    pub name: String,
}

/// An ingredient row of the base version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionIngredient {
    pub id: VersionIngredientId,
    pub ingredient: IngredientRef,
    pub quantity: StoredQuantity,
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_optional: bool,
    #[serde(default)]
    pub substitutions: Vec<IngredientSubstitution>,
    /// In stored order. Only the first one is used, see [`ScalingRule::select`].
    #[serde(default)]
    pub scaling_rules: SmallVec<[ScalingRule; 1]>,
}

/// Alternative ingredient that can be used instead of a [`VersionIngredient`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientSubstitution {
    pub id: SubstitutionId,
    pub ingredient: IngredientRef,
    pub quantity: StoredQuantity,
    pub unit: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// How an ingredient quantity reacts to the number of servings
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display, strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ScalingRuleKind {
    /// Proportional to the servings, or to an explicit factor
    Linear,
    /// Never changes
    Fixed,
    /// Proportional, rounded up to a multiple of the step size
    Step,
}

/// Per ingredient scaling policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalingRule {
    pub id: ScalingRuleId,
    pub kind: ScalingRuleKind,
    /// Multiplier used instead of the servings ratio. Only for [`ScalingRuleKind::Linear`].
    #[serde(default)]
    pub factor: Option<f64>,
    /// Rounding granularity, a multiple of 0.001. Only for
    /// [`ScalingRuleKind::Step`], defaults to 1.
    #[serde(default)]
    pub step_size: Option<f64>,
    #[serde(default)]
    pub min_servings: Option<u32>,
    #[serde(default)]
    pub max_servings: Option<u32>,
}

impl ScalingRule {
    /// Pick the rule that applies from an ingredient's rules
    ///
    /// Rules are never composed. The first one in stored order wins and the
    /// rest are ignored.
    pub fn select(rules: &[ScalingRule]) -> Option<&ScalingRule> {
        rules.first()
    }
}

/// A step row of the base version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeStep {
    pub id: StepId,
    /// Render position. Not necessarily contiguous.
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

/// Everything the resolver needs from the base version of a recipe
///
/// Steps are expected in ascending `step_order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseVersionData {
    pub recipe: Recipe,
    pub version_id: VersionId,
    pub ingredients: Vec<VersionIngredient>,
    pub steps: Vec<RecipeStep>,
}

/// Where a resolved entry comes from
///
/// Entries added by an override have no storage row of their own, so they are
/// never confused with a real id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Origin<Id> {
    /// Row of the base version
    Base { id: Id },
    /// Added by the ADD override with this id
    Synthetic { override_id: OverrideId },
}

impl<Id: Copy> Origin<Id> {
    /// Storage id of the base row, if any
    pub fn base_id(&self) -> Option<Id> {
        match self {
            Origin::Base { id } => Some(*id),
            Origin::Synthetic { .. } => None,
        }
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(self, Origin::Synthetic { .. })
    }
}

impl<Id: fmt::Display> fmt::Display for Origin<Id> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::Base { id } => write!(f, "#{id}"),
            Origin::Synthetic { override_id } => write!(f, "added by override #{override_id}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2" => Some(2.0); "integer")]
    #[test_case("2.500" => Some(2.5); "scale 3")]
    #[test_case(" 0.125 " => Some(0.125); "whitespace")]
    #[test_case("two" => None; "text")]
    #[test_case("" => None; "empty")]
    #[test_case("NaN" => None; "nan")]
    #[test_case("inf" => None; "infinite")]
    fn stored_quantity_value(s: &str) -> Option<f64> {
        StoredQuantity::from(s).value()
    }

    #[test]
    fn stored_quantity_from_number_or_text() {
        let q: StoredQuantity = serde_json::from_str("1.5").unwrap();
        assert_eq!(q.text(), "1.5");
        let q: StoredQuantity = serde_json::from_str("\"1.500\"").unwrap();
        assert_eq!(q.text(), "1.500");
        assert_eq!(serde_json::to_string(&q).unwrap(), "\"1.500\"");
    }

    #[test]
    fn difficulty_names() {
        assert_eq!(Difficulty::Easy.to_string(), "EASY");
        assert_eq!("hard".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!(Difficulty::Medium.is_base());
        assert_eq!(
            serde_json::to_string(&Difficulty::Medium).unwrap(),
            "\"MEDIUM\""
        );
    }

    #[test]
    fn first_scaling_rule_wins() {
        let rules = [
            ScalingRule {
                id: ScalingRuleId(7),
                kind: ScalingRuleKind::Fixed,
                factor: None,
                step_size: None,
                min_servings: None,
                max_servings: None,
            },
            ScalingRule {
                id: ScalingRuleId(3),
                kind: ScalingRuleKind::Step,
                factor: None,
                step_size: Some(2.0),
                min_servings: None,
                max_servings: None,
            },
        ];
        assert_eq!(ScalingRule::select(&rules).map(|r| r.id), Some(ScalingRuleId(7)));
        assert_eq!(ScalingRule::select(&[]), None);
    }
}
