//! Difficulty variants and serving scaling for stored recipes.
//!
//! Every recipe is stored once, as its MEDIUM version, for
//! [`BASE_SERVINGS`](scale::BASE_SERVINGS) servings. The EASY and HARD
//! versions only store overrides: ordered ADD, REMOVE, UPDATE and REPLACE
//! operations on the MEDIUM ingredients and steps.
//!
//! This crate computes what to show for a `(recipe, difficulty, servings)`
//! triple:
//! - Overrides are applied in stored order, see [`overrides`].
//! - Ingredient quantities are scaled with their [`ScalingRule`], see [`scale`].
//! - The result is a [`ComputedRecipeView`].
//!
//! # Basic usage
//! Implement [`VersionRepository`] on top of your storage, or use the
//! in memory one (`memory` feature), and build a [`VersionResolver`]:
//!
//! ```rust
//! # #[cfg(feature = "memory")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # use recipe_versions::{repository::memory::MemoryRepository, Difficulty, RecipeId, VersionResolver};
//! # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
//! let repo = MemoryRepository::from_toml_str(r#"
//!     [[recipes]]
//!     id = 1
//!     name = "Omelette"
//!     slug = "omelette"
//!
//!     [recipes.base]
//!     id = 10
//!
//!     [[recipes.base.ingredients]]
//!     id = 100
//!     ingredient = { id = 1, name = "eggs" }
//!     quantity = "2"
//!     unit = "pc"
//! "#)?;
//!
//! let resolver = VersionResolver::new(repo);
//! let view = resolver.resolve(RecipeId(1), Difficulty::Medium, 8).await?;
//! assert_eq!(view.ingredients[0].quantity, 4.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # })
//! # }
//! # #[cfg(not(feature = "memory"))]
//! # fn main() {}
//! ```
//!
//! To avoid recomputing views on every request, wrap the resolver in a
//! `CachedResolver` (`cache` feature).

#![warn(rustdoc::broken_intra_doc_links, clippy::doc_markdown)]

#[cfg(feature = "cache")]
pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod overrides;
pub mod repository;
pub mod resolve;
pub mod scale;

pub use config::EngineConfig;
pub use error::{ComputationError, ResolveError};
pub use model::*;
pub use overrides::{IngredientOverride, StepOverride};
pub use repository::{RepositoryError, VersionRepository};
pub use resolve::{ComputedIngredient, ComputedRecipeView, VersionResolver};
pub use scale::{scale_quantity, ScaleOutcome, BASE_SERVINGS};

#[cfg(feature = "cache")]
pub use cache::CachedResolver;
