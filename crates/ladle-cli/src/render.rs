//! Plain-text rendering of recipes for terminal output.

use ladle_core::recipe::Recipe;

pub fn print_recipe(recipe: &Recipe) {
    println!("=== {} ===", recipe.title);
    println!("{}", recipe.description);
    println!(
        "Serves {} | prep {} min | cook {} min | total {} min | {}",
        recipe.servings,
        recipe.prep_time_minutes,
        recipe.cook_time_minutes,
        recipe.total_time_minutes,
        recipe.difficulty,
    );
    if !recipe.tags.is_empty() {
        println!("Tags: {}", recipe.tags.join(", "));
    }

    println!("\nIngredients:");
    for ingredient in &recipe.ingredients {
        if ingredient.unit.is_empty() {
            println!("  - {} {}", ingredient.amount, ingredient.item);
        } else {
            println!(
                "  - {} {} {}",
                ingredient.amount, ingredient.unit, ingredient.item
            );
        }
    }

    println!("\nInstructions:");
    for step in &recipe.instructions {
        println!("  {}. {}", step.step, step.description);
    }

    let n = &recipe.nutrition;
    println!(
        "\nPer serving: {:.0} kcal, {:.0}g protein, {:.0}g carbs, {:.0}g fat",
        n.calories, n.protein, n.carbs, n.fat
    );
}

/// One-line summary used in search listings.
pub fn recipe_summary(recipe: &Recipe) -> String {
    let id = recipe
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{} [{}] serves {}, {} min, {}",
        recipe.title, id, recipe.servings, recipe.total_time_minutes, recipe.difficulty
    )
}
