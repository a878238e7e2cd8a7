//! Caching in front of the resolver
//!
//! [`CachedResolver`] wraps a [`VersionResolver`] and keeps resolved views for
//! a while, keyed by recipe, difficulty and servings. The resolver itself
//! knows nothing about it. Whoever mutates overrides, ingredients or steps of
//! a recipe has to call [`CachedResolver::invalidate_recipe`].
//!
//! Each recipe has a generation, bumped on every invalidation. A view is only
//! stored if the generation it was resolved under is still current, so a
//! resolve that started before a mutation never writes its result back.
//!
//! This module is only available with the `cache` feature.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use dashmap::DashMap;

use crate::{
    config::CacheConfig,
    error::ResolveError,
    model::{Difficulty, RecipeId},
    repository::VersionRepository,
    resolve::{ComputedRecipeView, VersionResolver},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    recipe_id: RecipeId,
    difficulty: Difficulty,
    servings: u32,
}

#[derive(Debug)]
struct CacheEntry {
    view: Arc<ComputedRecipeView>,
    inserted: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration, now: Instant) -> bool {
        now.duration_since(self.inserted) < ttl
    }
}

/// A [`VersionResolver`] with a TTL cache of resolved views
///
/// Errors are never cached.
#[derive(Debug)]
pub struct CachedResolver<R> {
    resolver: VersionResolver<R>,
    config: CacheConfig,
    entries: DashMap<CacheKey, CacheEntry>,
    generations: DashMap<RecipeId, u64>,
}

impl<R: VersionRepository> CachedResolver<R> {
    pub fn new(resolver: VersionResolver<R>, config: CacheConfig) -> Self {
        Self {
            resolver,
            config,
            entries: DashMap::new(),
            generations: DashMap::new(),
        }
    }

    /// Get the inner resolver
    pub fn resolver(&self) -> &VersionResolver<R> {
        &self.resolver
    }

    /// Number of cached views, including expired ones not yet evicted
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Same as [`VersionResolver::resolve`], served from the cache when possible
    pub async fn resolve(
        &self,
        recipe_id: RecipeId,
        difficulty: Difficulty,
        servings: u32,
    ) -> Result<Arc<ComputedRecipeView>, ResolveError> {
        if !self.config.enabled {
            return self
                .resolver
                .resolve(recipe_id, difficulty, servings)
                .await
                .map(Arc::new);
        }

        let key = CacheKey {
            recipe_id,
            difficulty,
            servings,
        };

        if let Some(view) = self.fresh(&key) {
            tracing::trace!(%recipe_id, %difficulty, servings, "cache hit");
            return Ok(view);
        }
        tracing::trace!(%recipe_id, %difficulty, servings, "cache miss");

        let generation = self.generation(recipe_id);
        let view = Arc::new(self.resolver.resolve(recipe_id, difficulty, servings).await?);
        self.store(key, generation, Arc::clone(&view));
        Ok(view)
    }

    /// Drop every cached view of a recipe
    pub fn invalidate_recipe(&self, recipe_id: RecipeId) {
        *self.generations.entry(recipe_id).or_insert(0) += 1;
        let before = self.entries.len();
        self.entries.retain(|k, _| k.recipe_id != recipe_id);
        tracing::debug!(
            %recipe_id,
            removed = before.saturating_sub(self.entries.len()),
            "invalidated cached views"
        );
    }

    /// Drop everything
    pub fn clear(&self) {
        for mut generation in self.generations.iter_mut() {
            *generation += 1;
        }
        self.entries.clear();
    }

    fn generation(&self, recipe_id: RecipeId) -> u64 {
        *self.generations.entry(recipe_id).or_insert(0)
    }

    fn fresh(&self, key: &CacheKey) -> Option<Arc<ComputedRecipeView>> {
        let now = Instant::now();
        let view = {
            let entry = self.entries.get(key)?;
            entry
                .is_fresh(self.config.ttl, now)
                .then(|| Arc::clone(&entry.view))
        };
        if view.is_none() {
            self.entries
                .remove_if(key, |_, e| !e.is_fresh(self.config.ttl, now));
        }
        view
    }

    fn store(&self, key: CacheKey, generation: u64, view: Arc<ComputedRecipeView>) {
        if self.config.capacity == 0 {
            return;
        }
        // held until the insert, an invalidation can't slip in between
        let current = self.generations.entry(key.recipe_id).or_insert(0);
        if *current != generation {
            tracing::debug!(
                recipe_id = %key.recipe_id,
                "recipe invalidated while resolving, not caching"
            );
            return;
        }
        if self.entries.len() >= self.config.capacity && !self.entries.contains_key(&key) {
            let now = Instant::now();
            let ttl = self.config.ttl;
            self.entries.retain(|_, e| e.is_fresh(ttl, now));
            if self.entries.len() >= self.config.capacity {
                tracing::debug!("view cache full, not caching");
                return;
            }
        }
        self.entries.insert(
            key,
            CacheEntry {
                view,
                inserted: Instant::now(),
            },
        );
    }
}
