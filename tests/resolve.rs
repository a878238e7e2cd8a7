use recipe_versions::{
    error::QuantitySubject, repository::memory::MemoryRepository, ComputationError,
    ComputedIngredient, ComputedRecipeView, Difficulty, IngredientId, Origin, OverrideId,
    RecipeId, ResolveError, ScaleOutcome, StepId, VersionIngredientId, VersionResolver,
    BASE_SERVINGS,
};
use test_case::test_case;

const FIXTURE: &str = include_str!("fixtures/kitchen.toml");

const PANCAKES: RecipeId = RecipeId(1);
const TOAST: RecipeId = RecipeId(2);
const DRAFT: RecipeId = RecipeId(3);
const SOUP: RecipeId = RecipeId(4);

fn resolver() -> VersionResolver<MemoryRepository> {
    VersionResolver::new(MemoryRepository::from_toml_str(FIXTURE).unwrap())
}

async fn resolve(difficulty: Difficulty, servings: u32) -> ComputedRecipeView {
    resolver()
        .resolve(PANCAKES, difficulty, servings)
        .await
        .unwrap()
}

fn ingredient<'a>(view: &'a ComputedRecipeView, name: &str) -> &'a ComputedIngredient {
    view.ingredients
        .iter()
        .find(|i| i.name.as_deref() == Some(name))
        .unwrap_or_else(|| panic!("no {name} in {:?}", view.ingredients))
}

fn names(view: &ComputedRecipeView) -> Vec<&str> {
    view.ingredients
        .iter()
        .map(|i| i.name.as_deref().unwrap_or("?"))
        .collect()
}

fn instructions(view: &ComputedRecipeView) -> Vec<&str> {
    view.steps.iter().map(|s| s.instruction.as_str()).collect()
}

#[tokio::test]
async fn medium_is_the_base_recipe() {
    let view = resolve(Difficulty::Medium, 4).await;
    assert_eq!(view.recipe.slug, "pancakes");
    assert_eq!(view.recipe.hero_image.as_deref(), Some("/images/pancakes.jpg"));
    assert_eq!(view.difficulty, Difficulty::Medium);
    assert_eq!(view.servings, 4);
    assert_eq!(view.base_servings, BASE_SERVINGS);
    assert_eq!(names(&view), ["flour", "eggs", "bay leaf", "milk", "sugar"]);
    assert_eq!(
        instructions(&view),
        ["Mix the dry ingredients", "Let the batter rest", "Cook on a hot pan"]
    );
    assert_eq!(ingredient(&view, "flour").quantity, 200.0);
    assert_eq!(
        ingredient(&view, "flour").origin,
        Origin::Base {
            id: VersionIngredientId(100)
        }
    );
    assert_eq!(view.total_timer_seconds(), 720);
    assert_eq!(
        view.optional_ingredients()
            .map(|i| i.name.as_deref())
            .collect::<Vec<_>>(),
        [Some("bay leaf")]
    );
}

#[tokio::test]
async fn idempotent() {
    let resolver = resolver();
    let a = resolver.resolve(PANCAKES, Difficulty::Medium, 4).await.unwrap();
    let b = resolver.resolve(PANCAKES, Difficulty::Medium, 4).await.unwrap();
    assert_eq!(a, b);
}

#[test_case(8, 4.0; "double")]
#[test_case(2, 1.0; "half")]
#[test_case(4, 2.0; "base")]
#[test_case(6, 3.0; "one and a half")]
#[tokio::test]
async fn no_rule_scales_linearly(servings: u32, expected: f64) {
    let view = resolve(Difficulty::Medium, servings).await;
    let sugar = ingredient(&view, "sugar");
    assert_eq!(sugar.scaling, ScaleOutcome::Linear);
    assert_eq!(sugar.quantity, expected);
}

#[test_case(1)]
#[test_case(4)]
#[test_case(12)]
#[tokio::test]
async fn fixed_rule(servings: u32) {
    let view = resolve(Difficulty::Medium, servings).await;
    let bay = ingredient(&view, "bay leaf");
    assert_eq!(bay.quantity, 1.0);
    assert_eq!(bay.scaling, ScaleOutcome::Fixed);
}

#[test_case(6, 3.0; "exact")]
#[test_case(5, 3.0; "rounds up")]
#[test_case(4, 2.0; "base")]
#[test_case(1, 1.0; "one serving")]
#[tokio::test]
async fn step_rule(servings: u32, expected: f64) {
    let view = resolve(Difficulty::Medium, servings).await;
    let eggs = ingredient(&view, "eggs");
    assert_eq!(eggs.scaling, ScaleOutcome::Stepped);
    assert_eq!(eggs.quantity, expected);
}

#[tokio::test]
async fn first_rule_wins() {
    // milk has a linear factor rule followed by a fixed one
    let view = resolve(Difficulty::Medium, 12).await;
    let milk = ingredient(&view, "milk");
    assert_eq!(milk.quantity, 450.0);
    assert_eq!(milk.scaling, ScaleOutcome::Factor);
}

#[tokio::test]
async fn substitutions_scale_with_servings() {
    let view = resolve(Difficulty::Medium, 8).await;
    let flour = ingredient(&view, "flour");
    assert_eq!(flour.quantity, 400.0);
    assert_eq!(flour.substitutions.len(), 1);
    assert_eq!(flour.substitutions[0].name, "whole wheat flour");
    assert_eq!(flour.substitutions[0].quantity, 360.0);
}

#[tokio::test]
async fn easy_adds_and_replaces() {
    let view = resolve(Difficulty::Easy, 4).await;
    assert_eq!(view.difficulty, Difficulty::Easy);
    assert_eq!(
        names(&view),
        ["pancake mix", "eggs", "bay leaf", "milk", "sugar", "baking powder"]
    );

    let mix = ingredient(&view, "pancake mix");
    assert_eq!(mix.ingredient_id, IngredientId(8));
    assert_eq!(mix.quantity, 250.0);
    assert_eq!(
        mix.origin,
        Origin::Base {
            id: VersionIngredientId(100)
        }
    );

    let added = ingredient(&view, "baking powder");
    assert_eq!(
        added.origin,
        Origin::Synthetic {
            override_id: OverrideId(1)
        }
    );
    assert_eq!(added.quantity, 2.0);
    assert!(added.substitutions.is_empty());
}

#[test_case(8, 4.0; "double")]
#[test_case(5, 2.5; "not stepped")]
#[test_case(12, 6.0; "triple")]
#[tokio::test]
async fn added_ingredient_scales_linearly(servings: u32, expected: f64) {
    let view = resolve(Difficulty::Easy, servings).await;
    assert_eq!(view.ingredients.len(), 6);
    let added = ingredient(&view, "baking powder");
    assert_eq!(added.scaling, ScaleOutcome::Linear);
    assert_eq!(added.quantity, expected);
}

#[tokio::test]
async fn easy_step_lands_by_order() {
    let view = resolve(Difficulty::Easy, 4).await;
    assert_eq!(
        instructions(&view),
        [
            "Mix the dry ingredients",
            "Preheat the pan",
            "Let the batter rest",
            "Cook on a hot pan"
        ]
    );
    assert_eq!(
        view.steps.iter().map(|s| s.step_order).collect::<Vec<_>>(),
        [1, 2, 2, 3]
    );
    assert!(view.steps[1].origin.is_synthetic());
    assert_eq!(view.total_timer_seconds(), 780);
}

#[tokio::test]
async fn hard_removes_and_updates() {
    let resolver = resolver();
    let first = resolver.resolve(PANCAKES, Difficulty::Hard, 4).await.unwrap();
    let second = resolver.resolve(PANCAKES, Difficulty::Hard, 4).await.unwrap();
    assert_eq!(first, second);

    assert_eq!(names(&first), ["flour", "eggs", "milk", "sugar"]);
    let medium = resolve(Difficulty::Medium, 4).await;
    for name in ["flour", "milk", "sugar"] {
        assert_eq!(ingredient(&first, name), ingredient(&medium, name));
    }

    let eggs = ingredient(&first, "eggs");
    assert_eq!(eggs.quantity, 3.0);
    assert_eq!(eggs.notes.as_deref(), Some("separated"));
    assert_eq!(eggs.scaling, ScaleOutcome::Stepped);

    let cook = &first.steps[2];
    assert_eq!(cook.origin, Origin::Base { id: StepId(3) });
    assert_eq!(cook.instruction, "Cook and flip twice");
    assert_eq!(cook.timer_seconds, Some(180));
    assert_eq!(cook.step_order, 3);
}

#[test_case(Difficulty::Hard; "version without overrides")]
#[test_case(Difficulty::Easy; "missing version")]
#[tokio::test]
async fn degrades_to_medium(difficulty: Difficulty) {
    let resolver = resolver();
    let medium = resolver.resolve(TOAST, Difficulty::Medium, 4).await.unwrap();
    let view = resolver.resolve(TOAST, difficulty, 4).await.unwrap();
    assert_eq!(view.difficulty, difficulty);
    assert_eq!(view.ingredients, medium.ingredients);
    assert_eq!(view.steps, medium.steps);
    assert_eq!(view.recipe, medium.recipe);
}

#[test_case(RecipeId(404); "missing recipe")]
#[test_case(DRAFT; "missing base version")]
#[tokio::test]
async fn not_found(recipe_id: RecipeId) {
    for difficulty in [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard] {
        let err = resolver().resolve(recipe_id, difficulty, 4).await.unwrap_err();
        assert!(err.is_not_found(), "{err:?}");
    }
}

#[tokio::test]
async fn zero_servings() {
    let err = resolver()
        .resolve(PANCAKES, Difficulty::Medium, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::InvalidServings { .. }));
}

#[tokio::test]
async fn bad_stored_quantity() {
    let err = resolver()
        .resolve(SOUP, Difficulty::Medium, 4)
        .await
        .unwrap_err();
    let ResolveError::Computation(err) = err else {
        panic!("unexpected error {err:?}");
    };
    assert_eq!(
        err,
        ComputationError::InvalidQuantity {
            subject: QuantitySubject::Ingredient(Origin::Base {
                id: VersionIngredientId(400)
            }),
            value: "a handful".into()
        }
    );
}

#[tokio::test]
async fn bad_stored_override() {
    let err = resolver()
        .resolve(SOUP, Difficulty::Hard, 4)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ResolveError::Computation(ComputationError::InvalidOverride {
                override_id: OverrideId(40),
                ..
            })
        ),
        "{err:?}"
    );
}

#[tokio::test]
async fn ingredient_missing_from_catalog() {
    // the replace also fixes the broken base quantity
    let view = resolver().resolve(SOUP, Difficulty::Easy, 8).await.unwrap();
    assert_eq!(view.ingredients.len(), 1);
    let carrots = &view.ingredients[0];
    assert_eq!(carrots.ingredient_id, IngredientId(99));
    assert_eq!(carrots.name, None);
    assert_eq!(carrots.quantity, 6.0);
}

#[tokio::test]
async fn view_serializes() {
    let view = resolve(Difficulty::Easy, 4).await;
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["difficulty"], "EASY");
    assert_eq!(json["base_servings"], 4);
    assert_eq!(json["ingredients"][5]["origin"]["type"], "synthetic");
    assert_eq!(json["ingredients"][5]["origin"]["override_id"], 1);
    assert_eq!(json["ingredients"][1]["scaling"], "stepped");
    let back: ComputedRecipeView = serde_json::from_value(json).unwrap();
    assert_eq!(back, view);
}
