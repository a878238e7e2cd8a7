//! Version resolution
//!
//! Turns the stored base recipe plus the overrides of a difficulty into the
//! concrete ingredients and steps to show for a number of servings.

use serde::{Deserialize, Serialize};

use crate::{
    error::{ComputationError, QuantitySubject, ResolveError},
    model::{
        Difficulty, IngredientId, Origin, Recipe, RecipeId, StoredQuantity, SubstitutionId,
        VersionIngredientId,
    },
    overrides::{
        apply_ingredient_overrides, apply_step_overrides, IngredientOverride, ResolvedIngredient,
        ResolvedStep, StepOverride,
    },
    repository::VersionRepository,
    scale::{scale_quantity, ScaleOutcome, ScaleTarget, BASE_SERVINGS},
};

/// A recipe resolved for a difficulty and a number of servings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedRecipeView {
    pub recipe: Recipe,
    pub difficulty: Difficulty,
    pub servings: u32,
    /// Servings the stored quantities are for, always [`BASE_SERVINGS`]
    pub base_servings: u32,
    /// Overrides applied and quantities scaled
    pub ingredients: Vec<ComputedIngredient>,
    /// Overrides applied, ordered by `step_order`
    pub steps: Vec<ResolvedStep>,
}

/// An ingredient ready to display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedIngredient {
    pub origin: Origin<VersionIngredientId>,
    pub ingredient_id: IngredientId,
    /// Catalog name. [`None`] only if the ingredient is missing from the catalog.
    pub name: Option<String>,
    /// Scaled quantity
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
    pub is_optional: bool,
    pub scaling: ScaleOutcome,
    pub substitutions: Vec<ComputedSubstitution>,
}

/// A substitution with its quantity scaled
///
/// Substitutions always scale linearly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputedSubstitution {
    pub id: SubstitutionId,
    pub ingredient_id: IngredientId,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

impl ComputedRecipeView {
    /// Sum of all step timers
    pub fn total_timer_seconds(&self) -> u64 {
        self.steps
            .iter()
            .filter_map(|s| s.timer_seconds)
            .map(u64::from)
            .sum()
    }

    /// Ingredients marked as optional
    pub fn optional_ingredients(&self) -> impl Iterator<Item = &ComputedIngredient> {
        self.ingredients.iter().filter(|i| i.is_optional)
    }
}

/// Overrides of one difficulty version, decoded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VersionOverrides {
    pub ingredients: Vec<IngredientOverride>,
    pub steps: Vec<StepOverride>,
}

impl VersionOverrides {
    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty() && self.steps.is_empty()
    }
}

/// Computes [`ComputedRecipeView`]s from a [`VersionRepository`]
///
/// The resolver is stateless. Every call reads the repository again, so it is
/// always safe to call without a cache in front.
#[derive(Debug, Clone)]
pub struct VersionResolver<R> {
    repository: R,
}

impl<R: VersionRepository> VersionResolver<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Get the inner repository
    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Resolve a recipe for a difficulty and a number of servings
    ///
    /// Fails with [`ResolveError::NotFound`] if the recipe or its base version
    /// does not exist. A missing EASY or HARD version is not an error, the base
    /// recipe is used as is.
    #[tracing::instrument(level = "debug", skip_all, fields(recipe_id = %recipe_id, difficulty = %difficulty, servings = servings))]
    pub async fn resolve(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
        servings: u32,
    ) -> Result<ComputedRecipeView, ResolveError> {
        if servings == 0 {
            return Err(ResolveError::InvalidServings { difficulty });
        }

        let base = self
            .repository
            .base_version_with_data(recipe_id)
            .await?
            .ok_or(ResolveError::NotFound { recipe_id })?;

        let overrides = if difficulty.is_base() {
            VersionOverrides::default()
        } else {
            self.fetch_overrides(recipe_id, difficulty).await?
        };

        let mut ingredients = apply_ingredient_overrides(base.ingredients, &overrides.ingredients);
        let steps = apply_step_overrides(base.steps, &overrides.steps);

        self.fill_names(&mut ingredients).await?;

        let target = ScaleTarget::new(servings);
        let ingredients = ingredients
            .into_iter()
            .map(|i| compute_ingredient(i, target))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| {
                tracing::error!(%recipe_id, %difficulty, error = %e, "stored data can't be computed");
                e
            })?;

        Ok(ComputedRecipeView {
            recipe: base.recipe,
            difficulty,
            servings,
            base_servings: BASE_SERVINGS,
            ingredients,
            steps,
        })
    }

    /// Fetch and decode the overrides of a non base difficulty
    ///
    /// No version means no overrides.
    async fn fetch_overrides(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
    ) -> Result<VersionOverrides, ResolveError> {
        let Some(version_id) = self.repository.version_id(recipe_id, difficulty).await? else {
            tracing::debug!("no {difficulty} version, using the base recipe");
            return Ok(VersionOverrides::default());
        };

        let ingredient_records = self.repository.ingredient_overrides(version_id).await?;
        let step_records = self.repository.step_overrides(version_id).await?;

        let decoded = ingredient_records
            .into_iter()
            .map(IngredientOverride::try_from)
            .collect::<Result<Vec<_>, _>>()
            .and_then(|ingredients| {
                let steps = step_records
                    .into_iter()
                    .map(StepOverride::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(VersionOverrides { ingredients, steps })
            });

        match decoded {
            Ok(overrides) => {
                tracing::debug!(
                    %version_id,
                    ingredients = overrides.ingredients.len(),
                    steps = overrides.steps.len(),
                    "loaded overrides"
                );
                Ok(overrides)
            }
            Err(e) => {
                tracing::error!(%recipe_id, %version_id, error = %e, "invalid stored override");
                Err(e.into())
            }
        }
    }

    /// Look up catalog names for ingredients that came from ADD or REPLACE
    async fn fill_names(&self, ingredients: &mut [ResolvedIngredient]) -> Result<(), ResolveError> {
        let mut missing: Vec<IngredientId> = ingredients
            .iter()
            .filter(|i| i.name.is_none())
            .map(|i| i.ingredient_id)
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        missing.sort_unstable();
        missing.dedup();

        let names = self.repository.ingredient_names(&missing).await?;
        for i in ingredients.iter_mut().filter(|i| i.name.is_none()) {
            match names.get(&i.ingredient_id) {
                Some(name) => i.name = Some(name.clone()),
                None => tracing::warn!(
                    ingredient_id = %i.ingredient_id,
                    origin = %i.origin,
                    "ingredient not in the catalog"
                ),
            }
        }
        Ok(())
    }
}

fn compute_ingredient(
    i: ResolvedIngredient,
    target: ScaleTarget,
) -> Result<ComputedIngredient, ComputationError> {
    let subject = QuantitySubject::Ingredient(i.origin);
    let base = parse_quantity(&i.quantity, subject)?;
    let scaled = scale_quantity(base, i.scaling_rule(), target.factor())
        .map_err(|source| ComputationError::Scale { subject, source })?;

    let substitutions = i
        .substitutions
        .into_iter()
        .map(|s| {
            let subject = QuantitySubject::Substitution(s.id);
            let base = parse_quantity(&s.quantity, subject)?;
            let scaled = scale_quantity(base, None, target.factor())
                .map_err(|source| ComputationError::Scale { subject, source })?;
            Ok(ComputedSubstitution {
                id: s.id,
                ingredient_id: s.ingredient.id,
                name: s.ingredient.name,
                quantity: scaled.value,
                unit: s.unit,
                notes: s.notes,
            })
        })
        .collect::<Result<Vec<_>, ComputationError>>()?;

    Ok(ComputedIngredient {
        origin: i.origin,
        ingredient_id: i.ingredient_id,
        name: i.name,
        quantity: scaled.value,
        unit: i.unit,
        notes: i.notes,
        is_optional: i.is_optional,
        scaling: scaled.outcome,
        substitutions,
    })
}

fn parse_quantity(q: &StoredQuantity, subject: QuantitySubject) -> Result<f64, ComputationError> {
    q.value().ok_or_else(|| ComputationError::InvalidQuantity {
        subject,
        value: q.text().to_string(),
    })
}
