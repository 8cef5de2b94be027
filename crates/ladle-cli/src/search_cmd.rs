//! The `ladle search` command: hybrid lookup over approved recipes.

use anyhow::Result;

use ladle_core::search::SearchEngine;

use crate::render;

pub async fn run_search(engine: &SearchEngine, query: &str) -> Result<()> {
    let outcome = engine.search(query).await?;

    if outcome.exact_matches.is_empty() {
        println!("No exact matches.");
    } else {
        println!("Exact matches:");
        for recipe in &outcome.exact_matches {
            println!("  {}", render::recipe_summary(recipe));
        }
    }

    if outcome.similar_matches.is_empty() {
        println!("No similar recipes.");
    } else {
        println!("Similar recipes:");
        for similar in &outcome.similar_matches {
            println!(
                "  {:>3.0}%  {}",
                similar.similarity * 100.0,
                render::recipe_summary(&similar.recipe)
            );
        }
    }

    println!("\n{}", outcome.message);
    Ok(())
}
