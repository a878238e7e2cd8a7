use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{IngredientOperation, IngredientOverride};
use crate::model::{
    IngredientId, IngredientSubstitution, Origin, ScalingRule, StoredQuantity, VersionIngredient,
    VersionIngredientId,
};

/// An ingredient after applying the overrides, before scaling
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedIngredient {
    pub origin: Origin<VersionIngredientId>,
    pub ingredient_id: IngredientId,
    /// Catalog name
    ///
    /// [`None`] when the ingredient came from an ADD or REPLACE override and
    /// has not been looked up yet.
    pub name: Option<String>,
    pub quantity: StoredQuantity,
    pub unit: String,
    pub notes: Option<String>,
    pub is_optional: bool,
    pub substitutions: Vec<IngredientSubstitution>,
    pub scaling_rules: SmallVec<[ScalingRule; 1]>,
}

impl From<VersionIngredient> for ResolvedIngredient {
    fn from(i: VersionIngredient) -> Self {
        Self {
            origin: Origin::Base { id: i.id },
            ingredient_id: i.ingredient.id,
            name: Some(i.ingredient.name),
            quantity: i.quantity,
            unit: i.unit,
            notes: i.notes,
            is_optional: i.is_optional,
            substitutions: i.substitutions,
            scaling_rules: i.scaling_rules,
        }
    }
}

impl ResolvedIngredient {
    /// The rule used to scale this ingredient, if any
    pub fn scaling_rule(&self) -> Option<&ScalingRule> {
        ScalingRule::select(&self.scaling_rules)
    }
}

/// Apply ingredient overrides to the base ingredients
///
/// Overrides are applied one after the other in the given order, which is the
/// stored order. The result depends on it when two overrides touch the same
/// ingredient.
///
/// Overrides pointing to an ingredient that is not in the list are skipped.
/// Only base ingredients can be targeted, never one added by an override.
pub fn apply_ingredient_overrides(
    base: Vec<VersionIngredient>,
    overrides: &[IngredientOverride],
) -> Vec<ResolvedIngredient> {
    let mut list: Vec<ResolvedIngredient> = base.into_iter().map(Into::into).collect();
    for ov in overrides {
        apply(&mut list, ov);
    }
    list
}

fn apply(list: &mut Vec<ResolvedIngredient>, ov: &IngredientOverride) {
    match &ov.operation {
        IngredientOperation::Add { data } => list.push(ResolvedIngredient {
            origin: Origin::Synthetic { override_id: ov.id },
            ingredient_id: data.ingredient_id,
            name: None,
            quantity: data.quantity.clone(),
            unit: data.unit.clone(),
            notes: data.notes.clone(),
            is_optional: data.is_optional,
            substitutions: Vec::new(),
            scaling_rules: SmallVec::new(),
        }),
        IngredientOperation::Remove { target } => {
            match list.iter().position(|i| i.origin.base_id() == Some(*target)) {
                Some(pos) => {
                    list.remove(pos);
                }
                None => dangling(ov, *target),
            }
        }
        IngredientOperation::Update { target, patch } => match find(list, *target) {
            Some(i) => {
                if let Some(quantity) = &patch.quantity {
                    i.quantity = quantity.clone();
                }
                if let Some(unit) = &patch.unit {
                    i.unit = unit.clone();
                }
                if let Some(notes) = &patch.notes {
                    i.notes = Some(notes.clone());
                }
                if let Some(is_optional) = patch.is_optional {
                    i.is_optional = is_optional;
                }
            }
            None => dangling(ov, *target),
        },
        IngredientOperation::Replace { target, data } => match find(list, *target) {
            Some(i) => {
                if i.ingredient_id != data.ingredient_id {
                    i.name = None;
                }
                i.ingredient_id = data.ingredient_id;
                i.quantity = data.quantity.clone();
                i.unit = data.unit.clone();
                i.notes = data.notes.clone();
            }
            None => dangling(ov, *target),
        },
    }
}

fn find(
    list: &mut [ResolvedIngredient],
    target: VersionIngredientId,
) -> Option<&mut ResolvedIngredient> {
    list.iter_mut()
        .find(|i| i.origin.base_id() == Some(target))
}

fn dangling(ov: &IngredientOverride, target: VersionIngredientId) {
    tracing::debug!(
        override_id = %ov.id,
        target_id = %target,
        operation = %ov.kind(),
        "ingredient override target not found, skipping"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{IngredientRef, OverrideId, ScalingRuleId, ScalingRuleKind},
        overrides::{IngredientAddData, IngredientPatch, IngredientReplaceData},
    };
    use smallvec::smallvec;

    fn ingredient(id: i64, name: &str, quantity: &str) -> VersionIngredient {
        VersionIngredient {
            id: VersionIngredientId(id),
            ingredient: IngredientRef {
                id: IngredientId(id * 10),
                name: name.to_string(),
            },
            quantity: quantity.into(),
            unit: "g".to_string(),
            notes: Some(format!("{name} notes")),
            is_optional: false,
            substitutions: vec![],
            scaling_rules: smallvec![],
        }
    }

    fn base() -> Vec<VersionIngredient> {
        vec![
            ingredient(1, "flour", "200"),
            ingredient(2, "sugar", "50"),
            ingredient(3, "eggs", "2"),
        ]
    }

    fn names(list: &[ResolvedIngredient]) -> Vec<Option<&str>> {
        list.iter().map(|i| i.name.as_deref()).collect()
    }

    #[test]
    fn no_overrides_keeps_base() {
        let list = apply_ingredient_overrides(base(), &[]);
        assert_eq!(names(&list), [Some("flour"), Some("sugar"), Some("eggs")]);
        assert_eq!(list[0].origin, Origin::Base { id: VersionIngredientId(1) });
        assert_eq!(list[0].ingredient_id, IngredientId(10));
    }

    #[test]
    fn remove() {
        let list =
            apply_ingredient_overrides(base(), &[IngredientOverride::remove(OverrideId(1), VersionIngredientId(2))]);
        assert_eq!(names(&list), [Some("flour"), Some("eggs")]);
    }

    #[test]
    fn update_is_a_partial_patch() {
        let patch = IngredientPatch {
            quantity: Some("300".into()),
            is_optional: Some(true),
            ..Default::default()
        };
        let list = apply_ingredient_overrides(
            base(),
            &[IngredientOverride::update(OverrideId(1), VersionIngredientId(1), patch)],
        );
        let flour = &list[0];
        assert_eq!(flour.quantity.text(), "300");
        assert!(flour.is_optional);
        assert_eq!(flour.unit, "g");
        assert_eq!(flour.notes.as_deref(), Some("flour notes"));
        assert_eq!(flour.name.as_deref(), Some("flour"));
    }

    #[test]
    fn replace_swaps_ingredient_and_clears_name() {
        let mut base = base();
        base[0].scaling_rules = smallvec![ScalingRule {
            id: ScalingRuleId(1),
            kind: ScalingRuleKind::Fixed,
            factor: None,
            step_size: None,
            min_servings: None,
            max_servings: None,
        }];
        let data = IngredientReplaceData {
            ingredient_id: IngredientId(99),
            quantity: "180".into(),
            unit: "ml".into(),
            notes: None,
        };
        let list = apply_ingredient_overrides(
            base,
            &[IngredientOverride::replace(OverrideId(1), VersionIngredientId(1), data)],
        );
        let replaced = &list[0];
        assert_eq!(replaced.origin, Origin::Base { id: VersionIngredientId(1) });
        assert_eq!(replaced.ingredient_id, IngredientId(99));
        assert_eq!(replaced.name, None);
        assert_eq!(replaced.quantity.text(), "180");
        assert_eq!(replaced.unit, "ml");
        assert_eq!(replaced.notes, None);
        // the rest of the row stays
        assert_eq!(replaced.scaling_rule().map(|r| r.kind), Some(ScalingRuleKind::Fixed));
    }

    #[test]
    fn replace_with_same_ingredient_keeps_name() {
        let data = IngredientReplaceData {
            ingredient_id: IngredientId(20),
            quantity: "80".into(),
            unit: "g".into(),
            notes: None,
        };
        let list = apply_ingredient_overrides(
            base(),
            &[IngredientOverride::replace(OverrideId(1), VersionIngredientId(2), data)],
        );
        assert_eq!(list[1].name.as_deref(), Some("sugar"));
    }

    #[test]
    fn add_appends_synthetic() {
        let data = IngredientAddData {
            ingredient_id: IngredientId(7),
            quantity: "1".into(),
            unit: "pinch".into(),
            notes: None,
            is_optional: true,
        };
        let list = apply_ingredient_overrides(base(), &[IngredientOverride::add(OverrideId(42), data)]);
        assert_eq!(list.len(), 4);
        let added = &list[3];
        assert_eq!(added.origin, Origin::Synthetic { override_id: OverrideId(42) });
        assert!(added.origin.is_synthetic());
        assert!(added.substitutions.is_empty());
        assert!(added.scaling_rule().is_none());
        assert!(added.is_optional);
    }

    #[test]
    fn dangling_targets_are_skipped() {
        let overrides = [
            IngredientOverride::update(
                OverrideId(1),
                VersionIngredientId(404),
                IngredientPatch {
                    quantity: Some("1".into()),
                    ..Default::default()
                },
            ),
            IngredientOverride::remove(OverrideId(2), VersionIngredientId(405)),
        ];
        let list = apply_ingredient_overrides(base(), &overrides);
        assert_eq!(
            list,
            apply_ingredient_overrides(base(), &[])
        );
    }

    #[test]
    fn stored_order_matters() {
        let update = IngredientOverride::update(
            OverrideId(1),
            VersionIngredientId(3),
            IngredientPatch {
                quantity: Some("4".into()),
                ..Default::default()
            },
        );
        let remove = IngredientOverride::remove(OverrideId(2), VersionIngredientId(3));

        let update_then_remove =
            apply_ingredient_overrides(base(), &[update.clone(), remove.clone()]);
        assert_eq!(update_then_remove.len(), 2);

        // the update points to nothing once eggs are gone
        let remove_then_update = apply_ingredient_overrides(base(), &[remove, update]);
        assert_eq!(remove_then_update.len(), 2);

        let replace = IngredientOverride::replace(
            OverrideId(3),
            VersionIngredientId(3),
            IngredientReplaceData {
                ingredient_id: IngredientId(31),
                quantity: "3".into(),
                unit: "pc".into(),
                notes: None,
            },
        );
        let patch = IngredientOverride::update(
            OverrideId(4),
            VersionIngredientId(3),
            IngredientPatch {
                unit: Some("large".into()),
                ..Default::default()
            },
        );
        let a = apply_ingredient_overrides(base(), &[replace.clone(), patch.clone()]);
        let b = apply_ingredient_overrides(base(), &[patch, replace]);
        assert_eq!(a[2].unit, "large");
        assert_eq!(b[2].unit, "pc");
    }
}
