//! Database query functions for the `recipes` table.

use anyhow::{Context, Result};
use pgvector::Vector;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewRecipe, RecipeChanges, RecipeRow, SemanticMatch};

/// Insert a new recipe row inside its own transaction. Returns the inserted
/// row with server-generated defaults (timestamps, rating aggregates).
///
/// The row id is caller-supplied (it is the draft id being promoted), so a
/// double approve of the same draft fails on the primary key instead of
/// silently duplicating the recipe.
pub async fn insert_recipe(pool: &PgPool, new: &NewRecipe) -> Result<RecipeRow> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let recipe = sqlx::query_as::<_, RecipeRow>(
        "INSERT INTO recipes \
         (id, user_id, title, description, servings, prep_time_minutes, \
          cook_time_minutes, total_time_minutes, ingredients, instructions, \
          nutrition, tags, difficulty, embedding, approved) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, TRUE) \
         RETURNING *",
    )
    .bind(new.id)
    .bind(new.user_id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.servings)
    .bind(new.prep_time_minutes)
    .bind(new.cook_time_minutes)
    .bind(new.total_time_minutes)
    .bind(&new.ingredients)
    .bind(&new.instructions)
    .bind(&new.nutrition)
    .bind(&new.tags)
    .bind(new.difficulty)
    .bind(&new.embedding)
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert recipe")?;

    tx.commit().await.context("failed to commit recipe insert")?;

    Ok(recipe)
}

/// Fetch a recipe by its ID.
pub async fn get_recipe(pool: &PgPool, id: Uuid) -> Result<Option<RecipeRow>> {
    let recipe = sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch recipe")?;

    Ok(recipe)
}

/// Fetch a recipe by ID, scoped to its owner.
pub async fn get_recipe_for_user(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
) -> Result<Option<RecipeRow>> {
    let recipe =
        sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch recipe for user")?;

    Ok(recipe)
}

/// Count recipes owned by a user.
pub async fn count_recipes_for_user(pool: &PgPool, user_id: Uuid) -> Result<i64> {
    let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM recipes WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("failed to count recipes for user")?;

    Ok(row.0)
}

/// Update a persisted recipe in place, scoped to its owner.
///
/// Runs in one transaction so the structural fields and the (optional)
/// recomputed embedding land atomically. When `changes.embedding` is `None`
/// the stored vector is kept via COALESCE. Fails if no row matched.
pub async fn update_recipe(
    pool: &PgPool,
    id: Uuid,
    user_id: Uuid,
    changes: &RecipeChanges,
) -> Result<RecipeRow> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let recipe = sqlx::query_as::<_, RecipeRow>(
        "UPDATE recipes \
         SET title = $1, description = $2, servings = $3, \
             prep_time_minutes = $4, cook_time_minutes = $5, total_time_minutes = $6, \
             ingredients = $7, instructions = $8, nutrition = $9, \
             tags = $10, difficulty = $11, \
             embedding = COALESCE($12, embedding), \
             updated_at = now() \
         WHERE id = $13 AND user_id = $14 \
         RETURNING *",
    )
    .bind(&changes.title)
    .bind(&changes.description)
    .bind(changes.servings)
    .bind(changes.prep_time_minutes)
    .bind(changes.cook_time_minutes)
    .bind(changes.total_time_minutes)
    .bind(&changes.ingredients)
    .bind(&changes.instructions)
    .bind(&changes.nutrition)
    .bind(&changes.tags)
    .bind(changes.difficulty)
    .bind(changes.embedding.as_ref())
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await
    .context("failed to update recipe")?;

    let recipe = match recipe {
        Some(r) => r,
        None => anyhow::bail!("recipe {id} not found for user {user_id}"),
    };

    tx.commit().await.context("failed to commit recipe update")?;

    Ok(recipe)
}

/// Case-insensitive substring search over title, description, and tags.
///
/// Results come back in storage order; the hybrid engine applies no further
/// ranking to exact matches.
pub async fn search_lexical(pool: &PgPool, query: &str) -> Result<Vec<RecipeRow>> {
    let pattern = format!("%{}%", query);
    let recipes = sqlx::query_as::<_, RecipeRow>(
        "SELECT * FROM recipes \
         WHERE approved \
           AND (title ILIKE $1 \
                OR description ILIKE $1 \
                OR array_to_string(tags, ' ') ILIKE $1)",
    )
    .bind(&pattern)
    .fetch_all(pool)
    .await
    .context("failed to run lexical search")?;

    Ok(recipes)
}

/// Nearest-neighbor search over stored embeddings using cosine similarity.
///
/// `<=>` is pgvector's cosine-distance operator; similarity is `1 - distance`.
/// Keeps rows above `min_similarity`, at most `limit`, ordered best-first.
pub async fn search_semantic(
    pool: &PgPool,
    query_embedding: &Vector,
    min_similarity: f64,
    limit: i64,
) -> Result<Vec<SemanticMatch>> {
    let matches = sqlx::query_as::<_, SemanticMatch>(
        "SELECT *, 1 - (embedding <=> $1) AS similarity \
         FROM recipes \
         WHERE approved \
           AND embedding IS NOT NULL \
           AND 1 - (embedding <=> $1) > $2 \
         ORDER BY embedding <=> $1 \
         LIMIT $3",
    )
    .bind(query_embedding)
    .bind(min_similarity)
    .bind(limit)
    .fetch_all(pool)
    .await
    .context("failed to run semantic search")?;

    Ok(matches)
}
