//! Access to stored versions
//!
//! The resolver only reads through [`VersionRepository`]. Retries, pooling and
//! the actual queries belong to the implementation.

use std::{collections::HashMap, future::Future, sync::Arc};

use thiserror::Error;

use crate::{
    model::{BaseVersionData, Difficulty, IngredientId, RecipeId, VersionId},
    overrides::{IngredientOverrideRecord, StepOverrideRecord},
};

#[cfg(feature = "memory")]
pub mod memory;

/// Errors from a repository implementation
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The storage backend failed
    #[error("Storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The base version can only go away with the whole recipe
    #[error("Cannot delete the base version of recipe {recipe_id}")]
    BaseVersionDeletion { recipe_id: RecipeId },

    #[error("Recipe {recipe_id} does not exist")]
    MissingRecipe { recipe_id: RecipeId },

    #[error("Version {version_id} does not exist")]
    MissingVersion { version_id: VersionId },

    #[error("Conflict: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Wrap any backend error
    pub fn backend(e: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Backend(Box::new(e))
    }
}

/// Read access to recipe versions and their overrides
///
/// "Not found" is not an error here, it is [`None`] or an empty list. The
/// resolver decides what it means.
pub trait VersionRepository: Send + Sync {
    /// Base (MEDIUM) version of a recipe with its ingredients, substitutions,
    /// scaling rules and steps.
    ///
    /// Steps must be ordered by `step_order` and scaling rules in stored order.
    fn base_version_with_data(
        &self,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<Option<BaseVersionData>, RepositoryError>> + Send;

    /// Id of the version of a recipe for a difficulty
    fn version_id(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
    ) -> impl Future<Output = Result<Option<VersionId>, RepositoryError>> + Send;

    /// Ingredient overrides of a version, in stored order
    fn ingredient_overrides(
        &self,
        version_id: VersionId,
    ) -> impl Future<Output = Result<Vec<IngredientOverrideRecord>, RepositoryError>> + Send;

    /// Step overrides of a version, in stored order
    fn step_overrides(
        &self,
        version_id: VersionId,
    ) -> impl Future<Output = Result<Vec<StepOverrideRecord>, RepositoryError>> + Send;

    /// Catalog names for a set of ingredients
    ///
    /// Unknown ids are left out of the map.
    fn ingredient_names(
        &self,
        ids: &[IngredientId],
    ) -> impl Future<Output = Result<HashMap<IngredientId, String>, RepositoryError>> + Send;
}

impl<R: VersionRepository> VersionRepository for Arc<R> {
    fn base_version_with_data(
        &self,
        recipe_id: RecipeId,
    ) -> impl Future<Output = Result<Option<BaseVersionData>, RepositoryError>> + Send {
        (**self).base_version_with_data(recipe_id)
    }

    fn version_id(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
    ) -> impl Future<Output = Result<Option<VersionId>, RepositoryError>> + Send {
        (**self).version_id(recipe_id, difficulty)
    }

    fn ingredient_overrides(
        &self,
        version_id: VersionId,
    ) -> impl Future<Output = Result<Vec<IngredientOverrideRecord>, RepositoryError>> + Send {
        (**self).ingredient_overrides(version_id)
    }

    fn step_overrides(
        &self,
        version_id: VersionId,
    ) -> impl Future<Output = Result<Vec<StepOverrideRecord>, RepositoryError>> + Send {
        (**self).step_overrides(version_id)
    }

    fn ingredient_names(
        &self,
        ids: &[IngredientId],
    ) -> impl Future<Output = Result<HashMap<IngredientId, String>, RepositoryError>> + Send {
        (**self).ingredient_names(ids)
    }
}
