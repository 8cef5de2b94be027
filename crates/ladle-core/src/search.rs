//! Hybrid retrieval engine: lexical substring match plus vector
//! nearest-neighbor, merged without duplicate ids.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pgvector::Vector;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use ladle_db::models::SemanticMatch;
use ladle_db::queries::recipes as recipe_db;

use crate::convert;
use crate::error::CoreError;
use crate::gateway::EmbeddingProvider;
use crate::lifecycle::GATEWAY_TIMEOUT;
use crate::recipe::Recipe;

/// Minimum cosine similarity for a semantic hit.
pub const SIMILARITY_THRESHOLD: f64 = 0.5;

/// Maximum number of semantic hits returned.
pub const SEMANTIC_LIMIT: i64 = 5;

/// Hint returned with every search result set.
pub const SEARCH_HINT: &str =
    "If none of these match what you're looking for, try generating a new recipe.";

/// A semantic hit with its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct SimilarRecipe {
    pub recipe: Recipe,
    pub similarity: f64,
}

/// Result of one hybrid search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Lexical substring hits, in storage order.
    pub exact_matches: Vec<Recipe>,
    /// Semantic hits by similarity descending, minus ids already in
    /// `exact_matches`.
    pub similar_matches: Vec<SimilarRecipe>,
    pub message: &'static str,
}

/// Answers hybrid queries against the durable store.
pub struct SearchEngine {
    pool: PgPool,
    embedder: Arc<dyn EmbeddingProvider>,
    embed_timeout: Duration,
}

impl SearchEngine {
    pub fn new(pool: PgPool, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            pool,
            embedder,
            embed_timeout: GATEWAY_TIMEOUT,
        }
    }

    /// Override the embedding call budget. Used by tests.
    pub fn with_embed_timeout(mut self, timeout: Duration) -> Self {
        self.embed_timeout = timeout;
        self
    }

    /// Run both retrieval phases and merge.
    ///
    /// The lexical phase runs first; the semantic phase then drops any id
    /// the lexical phase already returned, so no id appears in both lists.
    pub async fn search(&self, query: &str) -> Result<SearchOutcome, CoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(CoreError::validation("search query must not be empty"));
        }

        let exact_rows = recipe_db::search_lexical(&self.pool, query)
            .await
            .map_err(CoreError::Persistence)?;

        let embedding = tokio::time::timeout(self.embed_timeout, self.embedder.embed(query))
            .await
            .map_err(|_| CoreError::Timeout(self.embed_timeout))??;
        let semantic_rows = recipe_db::search_semantic(
            &self.pool,
            &Vector::from(embedding),
            SIMILARITY_THRESHOLD,
            SEMANTIC_LIMIT,
        )
        .await
        .map_err(CoreError::Persistence)?;

        let semantic_rows = drop_duplicate_matches(semantic_rows, &exact_rows);

        let exact_matches = exact_rows
            .into_iter()
            .map(convert::from_row)
            .collect::<Result<Vec<_>, _>>()?;
        let similar_matches = semantic_rows
            .into_iter()
            .map(|m| {
                Ok(SimilarRecipe {
                    recipe: convert::from_row(m.recipe)?,
                    similarity: m.similarity,
                })
            })
            .collect::<Result<Vec<_>, CoreError>>()?;

        info!(
            query_len = query.len(),
            exact = exact_matches.len(),
            similar = similar_matches.len(),
            "search complete"
        );
        Ok(SearchOutcome {
            exact_matches,
            similar_matches,
            message: SEARCH_HINT,
        })
    }
}

/// Remove semantic hits whose id already appears among the lexical rows.
fn drop_duplicate_matches(
    semantic: Vec<SemanticMatch>,
    exact: &[ladle_db::models::RecipeRow],
) -> Vec<SemanticMatch> {
    let exact_ids: HashSet<Uuid> = exact.iter().map(|r| r.id).collect();
    semantic
        .into_iter()
        .filter(|m| !exact_ids.contains(&m.recipe.id))
        .collect()
}
