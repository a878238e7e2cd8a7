//! In memory [`VersionRepository`]
//!
//! Useful for tests, previews and fixtures. A repository can be built with the
//! mutation methods or loaded from a [`Snapshot`], which can be written in
//! TOML:
//!
//! ```toml
//! [[ingredients]]
//! id = 3
//! name = "butter"
//!
//! [[recipes]]
//! id = 1
//! name = "Pancakes"
//! slug = "pancakes"
//! published = true
//!
//! [recipes.base]
//! id = 10
//!
//! [[recipes.base.ingredients]]
//! id = 100
//! ingredient = { id = 1, name = "flour" }
//! quantity = "200.000"
//! unit = "g"
//!
//! [[recipes.base.steps]]
//! id = 1
//! step_order = 1
//! instruction = "Mix everything"
//!
//! [[recipes.variants]]
//! id = 11
//! difficulty = "EASY"
//!
//! [[recipes.variants.ingredient_overrides]]
//! id = 1
//! operation = "ADD"
//! override_data = { ingredientId = 3, quantity = 1, unit = "tbsp" }
//! ```
//!
//! This module is only available with the `memory` feature.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use enum_map::EnumMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{RepositoryError, VersionRepository};
use crate::{
    model::{
        BaseVersionData, Difficulty, IngredientId, IngredientRef, Recipe, RecipeId, RecipeStep,
        VersionId, VersionIngredient,
    },
    overrides::{IngredientOverrideRecord, StepOverrideRecord},
};

/// Serializable content of a [`MemoryRepository`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Ingredient catalog
    ///
    /// Ingredients referenced from base versions are added automatically.
    #[serde(default)]
    pub ingredients: Vec<IngredientRef>,
    #[serde(default)]
    pub recipes: Vec<StoredRecipe>,
}

/// A recipe with all of its versions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    /// The MEDIUM version
    #[serde(default)]
    pub base: Option<StoredBase>,
    /// EASY and HARD versions
    #[serde(default)]
    pub variants: Vec<StoredVariant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredBase {
    pub id: VersionId,
    #[serde(default)]
    pub ingredients: Vec<VersionIngredient>,
    #[serde(default)]
    pub steps: Vec<RecipeStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoredVariant {
    pub id: VersionId,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub ingredient_overrides: Vec<IngredientOverrideRecord>,
    #[serde(default)]
    pub step_overrides: Vec<StepOverrideRecord>,
}

/// Error loading a [`Snapshot`]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Default)]
struct State {
    catalog: IndexMap<IngredientId, String>,
    recipes: IndexMap<RecipeId, Recipe>,
    versions_by_recipe: HashMap<RecipeId, EnumMap<Difficulty, Option<VersionId>>>,
    versions: IndexMap<VersionId, StoredVersion>,
}

#[derive(Debug)]
struct StoredVersion {
    recipe_id: RecipeId,
    ingredients: Vec<VersionIngredient>,
    steps: Vec<RecipeStep>,
    ingredient_overrides: Vec<IngredientOverrideRecord>,
    step_overrides: Vec<StepOverrideRecord>,
}

impl StoredVersion {
    fn new(recipe_id: RecipeId) -> Self {
        Self {
            recipe_id,
            ingredients: Vec::new(),
            steps: Vec::new(),
            ingredient_overrides: Vec::new(),
            step_overrides: Vec::new(),
        }
    }
}

/// Repository that keeps everything in memory
///
/// All methods take `&self`, so it can be shared behind an
/// [`Arc`](std::sync::Arc) and modified while a resolver uses it.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<State>,
}

impl MemoryRepository {
    /// Creates an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a repository from a TOML [`Snapshot`]
    pub fn from_toml_str(s: &str) -> Result<Self, LoadError> {
        let snapshot: Snapshot = toml::from_str(s)?;
        Ok(Self::from_snapshot(snapshot)?)
    }

    /// Loads a repository from a [`Snapshot`]
    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, RepositoryError> {
        let repo = Self::new();
        for ingredient in snapshot.ingredients {
            repo.insert_ingredient(ingredient);
        }
        for stored in snapshot.recipes {
            let recipe_id = stored.recipe.id;
            repo.insert_recipe(stored.recipe);
            if let Some(base) = stored.base {
                repo.insert_base_version(recipe_id, base.id, base.ingredients, base.steps)?;
            }
            for variant in stored.variants {
                repo.insert_variant(recipe_id, variant.difficulty, variant.id)?;
                for record in variant.ingredient_overrides {
                    repo.push_ingredient_override(variant.id, record)?;
                }
                for record in variant.step_overrides {
                    repo.push_step_override(variant.id, record)?;
                }
            }
        }
        Ok(repo)
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds or renames an ingredient of the catalog
    pub fn insert_ingredient(&self, ingredient: IngredientRef) {
        self.write()
            .catalog
            .insert(ingredient.id, ingredient.name);
    }

    /// Adds or updates a recipe, without touching its versions
    pub fn insert_recipe(&self, recipe: Recipe) {
        let mut state = self.write();
        state.versions_by_recipe.entry(recipe.id).or_default();
        state.recipes.insert(recipe.id, recipe);
    }

    /// Sets the base (MEDIUM) version of a recipe
    ///
    /// Ingredients referenced by the rows are added to the catalog.
    pub fn insert_base_version(
        &self,
        recipe_id: RecipeId,
        version_id: VersionId,
        ingredients: Vec<VersionIngredient>,
        steps: Vec<RecipeStep>,
    ) -> Result<(), RepositoryError> {
        let mut state = self.write();
        let state = &mut *state;
        register_version(state, recipe_id, Difficulty::Medium, version_id)?;
        for i in &ingredients {
            let refs = std::iter::once(&i.ingredient).chain(i.substitutions.iter().map(|s| &s.ingredient));
            for r in refs {
                state.catalog.entry(r.id).or_insert_with(|| r.name.clone());
            }
        }
        let version = state
            .versions
            .entry(version_id)
            .or_insert_with(|| StoredVersion::new(recipe_id));
        version.ingredients = ingredients;
        version.steps = steps;
        Ok(())
    }

    /// Creates an EASY or HARD version with no overrides
    pub fn insert_variant(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
        version_id: VersionId,
    ) -> Result<(), RepositoryError> {
        if difficulty.is_base() {
            return Err(RepositoryError::Conflict(format!(
                "{difficulty} is the base version of recipe {recipe_id}, it can't hold overrides"
            )));
        }
        let mut state = self.write();
        register_version(&mut state, recipe_id, difficulty, version_id)?;
        state
            .versions
            .entry(version_id)
            .or_insert_with(|| StoredVersion::new(recipe_id));
        Ok(())
    }

    /// Appends an ingredient override to a version
    pub fn push_ingredient_override(
        &self,
        version_id: VersionId,
        record: IngredientOverrideRecord,
    ) -> Result<(), RepositoryError> {
        let mut state = self.write();
        variant_mut(&mut state, version_id)?
            .ingredient_overrides
            .push(record);
        Ok(())
    }

    /// Appends a step override to a version
    pub fn push_step_override(
        &self,
        version_id: VersionId,
        record: StepOverrideRecord,
    ) -> Result<(), RepositoryError> {
        let mut state = self.write();
        variant_mut(&mut state, version_id)?.step_overrides.push(record);
        Ok(())
    }

    /// Deletes an EASY or HARD version with all of its overrides
    ///
    /// The base version can't be deleted on its own, use
    /// [`Self::delete_recipe`].
    pub fn delete_version(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
    ) -> Result<(), RepositoryError> {
        if difficulty.is_base() {
            return Err(RepositoryError::BaseVersionDeletion { recipe_id });
        }
        let mut state = self.write();
        let versions = state
            .versions_by_recipe
            .get_mut(&recipe_id)
            .ok_or(RepositoryError::MissingRecipe { recipe_id })?;
        if let Some(version_id) = versions[difficulty].take() {
            state.versions.shift_remove(&version_id);
        }
        Ok(())
    }

    /// Deletes a recipe and all of its versions and overrides
    ///
    /// Returns `false` if the recipe did not exist.
    pub fn delete_recipe(&self, recipe_id: RecipeId) -> bool {
        let mut state = self.write();
        let existed = state.recipes.shift_remove(&recipe_id).is_some();
        if let Some(versions) = state.versions_by_recipe.remove(&recipe_id) {
            for version_id in versions.values().flatten() {
                state.versions.shift_remove(version_id);
            }
        }
        existed
    }
}

fn register_version(
    state: &mut State,
    recipe_id: RecipeId,
    difficulty: Difficulty,
    version_id: VersionId,
) -> Result<(), RepositoryError> {
    if let Some(existing) = state.versions.get(&version_id) {
        if existing.recipe_id != recipe_id {
            return Err(RepositoryError::Conflict(format!(
                "version {version_id} belongs to recipe {}",
                existing.recipe_id
            )));
        }
    }
    let versions = state
        .versions_by_recipe
        .get_mut(&recipe_id)
        .ok_or(RepositoryError::MissingRecipe { recipe_id })?;
    if let Some(previous) = versions[difficulty].replace(version_id) {
        if previous != version_id {
            state.versions.shift_remove(&previous);
        }
    }
    Ok(())
}

fn variant_mut(state: &mut State, version_id: VersionId) -> Result<&mut StoredVersion, RepositoryError> {
    let version = state
        .versions
        .get(&version_id)
        .ok_or(RepositoryError::MissingVersion { version_id })?;
    let is_base = state
        .versions_by_recipe
        .get(&version.recipe_id)
        .and_then(|v| v[Difficulty::Medium])
        == Some(version_id);
    if is_base {
        return Err(RepositoryError::Conflict(format!(
            "version {version_id} is a base version, it can't hold overrides"
        )));
    }
    state
        .versions
        .get_mut(&version_id)
        .ok_or(RepositoryError::MissingVersion { version_id })
}

impl VersionRepository for MemoryRepository {
    async fn base_version_with_data(
        &self,
        recipe_id: RecipeId,
    ) -> Result<Option<BaseVersionData>, RepositoryError> {
        let state = self.read();
        let Some(recipe) = state.recipes.get(&recipe_id) else {
            return Ok(None);
        };
        let Some(version_id) = state
            .versions_by_recipe
            .get(&recipe_id)
            .and_then(|v| v[Difficulty::Medium])
        else {
            return Ok(None);
        };
        let Some(version) = state.versions.get(&version_id) else {
            return Ok(None);
        };
        let mut steps = version.steps.clone();
        steps.sort_by_key(|s| s.step_order);
        Ok(Some(BaseVersionData {
            recipe: recipe.clone(),
            version_id,
            ingredients: version.ingredients.clone(),
            steps,
        }))
    }

    async fn version_id(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
    ) -> Result<Option<VersionId>, RepositoryError> {
        Ok(self
            .read()
            .versions_by_recipe
            .get(&recipe_id)
            .and_then(|v| v[difficulty]))
    }

    async fn ingredient_overrides(
        &self,
        version_id: VersionId,
    ) -> Result<Vec<IngredientOverrideRecord>, RepositoryError> {
        Ok(self
            .read()
            .versions
            .get(&version_id)
            .map(|v| v.ingredient_overrides.clone())
            .unwrap_or_default())
    }

    async fn step_overrides(
        &self,
        version_id: VersionId,
    ) -> Result<Vec<StepOverrideRecord>, RepositoryError> {
        Ok(self
            .read()
            .versions
            .get(&version_id)
            .map(|v| v.step_overrides.clone())
            .unwrap_or_default())
    }

    async fn ingredient_names(
        &self,
        ids: &[IngredientId],
    ) -> Result<HashMap<IngredientId, String>, RepositoryError> {
        let state = self.read();
        Ok(ids
            .iter()
            .filter_map(|id| state.catalog.get(id).map(|name| (*id, name.clone())))
            .collect())
    }
}
