//! Recipe lifecycle manager: generation through approval.
//!
//! Every recipe passes through the same sequence: generate (LLM call, parse,
//! stage as draft), zero or more edits (manual patch or AI rewrite), then
//! either approve (embed, persist, drop the draft) or expiry. Nothing reaches
//! the durable store without an explicit approve.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use ladle_db::queries::recipes as recipe_db;

use crate::convert;
use crate::draft::DraftStore;
use crate::error::CoreError;
use crate::gateway::{EmbeddingProvider, LlmGateway};
use crate::prompt;
use crate::recipe::{Recipe, RecipePatch};

/// Wall-time budget for any single outbound LLM or embedding call.
pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(90);

/// Outcome of staging a generated recipe.
#[derive(Debug, Clone)]
pub struct GenerateOutcome {
    pub draft_id: Uuid,
    pub recipe: Recipe,
    /// Always "pending_approval"; drafts have exactly one live state.
    pub status: &'static str,
}

/// Outcome of approving a draft.
#[derive(Debug, Clone)]
pub struct ApproveOutcome {
    pub recipe: Recipe,
}

/// Outcome of editing a draft.
#[derive(Debug, Clone)]
pub struct ModifyOutcome {
    pub draft_id: Uuid,
    pub recipe: Recipe,
}

/// Orchestrates the draft -> review -> approve flow.
pub struct RecipeService {
    pool: PgPool,
    drafts: Arc<dyn DraftStore>,
    gateway: Arc<dyn LlmGateway>,
    embedder: Arc<dyn EmbeddingProvider>,
    gateway_timeout: Duration,
}

impl RecipeService {
    pub fn new(
        pool: PgPool,
        drafts: Arc<dyn DraftStore>,
        gateway: Arc<dyn LlmGateway>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            pool,
            drafts,
            gateway,
            embedder,
            gateway_timeout: GATEWAY_TIMEOUT,
        }
    }

    /// Override the outbound call budget. Used by tests.
    pub fn with_gateway_timeout(mut self, timeout: Duration) -> Self {
        self.gateway_timeout = timeout;
        self
    }

    async fn complete_within_budget(
        &self,
        system: &str,
        user: &str,
    ) -> Result<String, CoreError> {
        tokio::time::timeout(self.gateway_timeout, self.gateway.complete(system, user))
            .await
            .map_err(|_| CoreError::Timeout(self.gateway_timeout))?
    }

    async fn embed_within_budget(&self, text: &str) -> Result<Vec<f32>, CoreError> {
        tokio::time::timeout(self.gateway_timeout, self.embedder.embed(text))
            .await
            .map_err(|_| CoreError::Timeout(self.gateway_timeout))?
    }

    /// Generate a recipe from a free-text request and stage it as a draft.
    ///
    /// The recipe is NOT persisted; it lives in the draft store for one TTL
    /// window awaiting approval.
    pub async fn generate(&self, query: &str) -> Result<GenerateOutcome, CoreError> {
        if query.trim().is_empty() {
            return Err(CoreError::validation("query must not be empty"));
        }

        info!(model = %self.gateway.name(), query_len = query.len(), "generating recipe");
        let content = self
            .complete_within_budget(prompt::SYSTEM_PROMPT, &prompt::generation_prompt(query))
            .await?;
        let recipe = convert::parse_generated(&content)?;

        let draft_id = self.drafts.cache(recipe).await?;
        // Read back through the store so the returned copy carries the
        // assigned draft id.
        let draft = self.drafts.get(draft_id).await?;

        info!(%draft_id, title = %draft.current.title, "staged draft");
        Ok(GenerateOutcome {
            draft_id,
            recipe: draft.current,
            status: "pending_approval",
        })
    }

    /// Approve a draft: embed it, persist it into `user_id`'s collection,
    /// and drop the draft.
    ///
    /// The embedding and the insert both complete before the draft is
    /// deleted, so a failed approve leaves the draft intact for another try.
    pub async fn approve(&self, draft_id: Uuid, user_id: Uuid) -> Result<ApproveOutcome, CoreError> {
        let draft = self.drafts.get(draft_id).await?;

        let embedding = self
            .embed_within_budget(&convert::embedding_input(&draft.current))
            .await?;
        let new_recipe = convert::to_new_recipe(&draft.current, user_id, embedding)?;

        let row = recipe_db::insert_recipe(&self.pool, &new_recipe)
            .await
            .map_err(CoreError::Persistence)?;
        let recipe = convert::from_row(row)?;

        // The durable write is committed; a stale draft is harmless, so a
        // failed delete is logged and swallowed.
        if let Err(e) = self.drafts.delete(draft_id).await {
            warn!(%draft_id, error = %e, "failed to drop draft after approval");
        }

        info!(%draft_id, %user_id, title = %recipe.title, "approved recipe");
        Ok(ApproveOutcome { recipe })
    }

    /// Apply a manual patch to a draft's working copy.
    ///
    /// When the draft is the unedited mirror of an already-persisted recipe,
    /// the first edit also flows through to the durable row (recomputing the
    /// embedding when the edit touched embedding-relevant fields). Later
    /// edits stay draft-only.
    pub async fn modify(
        &self,
        draft_id: Uuid,
        patch: &RecipePatch,
    ) -> Result<ModifyOutcome, CoreError> {
        if patch.is_empty() {
            return Err(CoreError::validation("patch must provide at least one field"));
        }

        let draft = self.drafts.get(draft_id).await?;
        let first_edit = draft.modification_count == 0;

        let mut recipe = draft.current;
        let embedding_stale = patch.apply(&mut recipe);
        self.drafts.update(draft_id, recipe.clone()).await?;

        if first_edit {
            self.mirror_to_persisted(draft_id, &recipe, embedding_stale)
                .await?;
        }

        info!(%draft_id, embedding_stale, "modified draft");
        Ok(ModifyOutcome { draft_id, recipe })
    }

    /// If `draft_id` names a persisted recipe, write the edited content to
    /// that row as well.
    async fn mirror_to_persisted(
        &self,
        draft_id: Uuid,
        recipe: &Recipe,
        embedding_stale: bool,
    ) -> Result<(), CoreError> {
        let Some(row) = recipe_db::get_recipe(&self.pool, draft_id)
            .await
            .map_err(CoreError::Persistence)?
        else {
            return Ok(());
        };

        let embedding = if embedding_stale {
            Some(
                self.embed_within_budget(&convert::embedding_input(recipe))
                    .await?,
            )
        } else {
            None
        };
        let changes = convert::to_recipe_changes(recipe, embedding)?;

        recipe_db::update_recipe(&self.pool, draft_id, row.user_id, &changes)
            .await
            .map_err(CoreError::Persistence)?;
        info!(recipe_id = %draft_id, reembedded = embedding_stale, "mirrored edit to persisted recipe");
        Ok(())
    }

    /// Rewrite a draft's working copy via the LLM and stage the result as a
    /// brand-new draft.
    ///
    /// The source draft is left untouched; the rewrite starts its own
    /// lifecycle with a fresh id and a zero modification count.
    pub async fn modify_with_ai(
        &self,
        draft_id: Uuid,
        modification_type: &str,
        notes: &str,
    ) -> Result<ModifyOutcome, CoreError> {
        if modification_type.trim().is_empty() {
            return Err(CoreError::validation("modification type must not be empty"));
        }

        let draft = self.drafts.get(draft_id).await?;
        let user_prompt = prompt::rewrite_prompt(&draft.current, modification_type, notes)?;

        info!(%draft_id, model = %self.gateway.name(), "rewriting draft");
        let content = self
            .complete_within_budget(prompt::SYSTEM_PROMPT, &user_prompt)
            .await?;
        let recipe = convert::parse_generated(&content)?;

        let new_draft_id = self.drafts.cache(recipe).await?;
        let new_draft = self.drafts.get(new_draft_id).await?;

        info!(source = %draft_id, %new_draft_id, title = %new_draft.current.title, "staged rewrite");
        Ok(ModifyOutcome {
            draft_id: new_draft_id,
            recipe: new_draft.current,
        })
    }

    /// Fetch a staged draft without touching the durable store.
    pub async fn get_draft(&self, draft_id: Uuid) -> Result<crate::draft::Draft, CoreError> {
        self.drafts.get(draft_id).await
    }

    /// Discard a draft. Idempotent.
    pub async fn discard(&self, draft_id: Uuid) -> Result<(), CoreError> {
        self.drafts.delete(draft_id).await
    }

    /// Fetch one of `user_id`'s persisted recipes.
    pub async fn get_recipe(
        &self,
        recipe_id: Uuid,
        user_id: Uuid,
    ) -> Result<Recipe, CoreError> {
        let row = recipe_db::get_recipe_for_user(&self.pool, recipe_id, user_id)
            .await
            .map_err(CoreError::Persistence)?
            .ok_or_else(|| CoreError::not_found(format!("recipe {recipe_id}")))?;
        convert::from_row(row)
    }

    /// Count `user_id`'s persisted recipes.
    pub async fn count_recipes(&self, user_id: Uuid) -> Result<i64, CoreError> {
        recipe_db::count_recipes_for_user(&self.pool, user_id)
            .await
            .map_err(CoreError::Persistence)
    }
}
