//! Error types

use std::fmt;

use thiserror::Error;

use crate::{
    model::{Difficulty, Origin, OverrideId, RecipeId, SubstitutionId, VersionIngredientId},
    repository::RepositoryError,
    scale::ScaleError,
};

/// Errors returned when resolving a recipe view
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The recipe or its base version does not exist
    #[error("Recipe {recipe_id} or its base version not found")]
    NotFound { recipe_id: RecipeId },

    #[error("Cannot resolve {difficulty} for 0 servings")]
    InvalidServings { difficulty: Difficulty },

    /// Stored data could not be interpreted
    #[error(transparent)]
    Computation(#[from] ComputationError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ResolveError {
    /// Check if the error means the recipe does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound { .. })
    }
}

/// A stored quantity or override payload can't be interpreted
///
/// This always points to bad data upstream. Nothing is coerced to a default.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ComputationError {
    #[error("Quantity {value:?} of {subject} is not a number")]
    InvalidQuantity {
        subject: QuantitySubject,
        value: String,
    },

    #[error("Override #{override_id} is invalid: {reason}")]
    InvalidOverride {
        override_id: OverrideId,
        reason: String,
    },

    #[error("Could not scale {subject}")]
    Scale {
        subject: QuantitySubject,
        #[source]
        source: ScaleError,
    },
}

/// What a quantity belongs to, for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantitySubject {
    Ingredient(Origin<VersionIngredientId>),
    Substitution(SubstitutionId),
}

impl fmt::Display for QuantitySubject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuantitySubject::Ingredient(origin) => write!(f, "ingredient {origin}"),
            QuantitySubject::Substitution(id) => write!(f, "substitution #{id}"),
        }
    }
}
