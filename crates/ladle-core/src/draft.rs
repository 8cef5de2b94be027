//! TTL-bounded staging cache for generated recipes.
//!
//! A draft is an envelope around two copies of a recipe: the `original` as
//! generated, frozen for the draft's lifetime, and the `current` working
//! copy that edits rewrite. Every read and write slides the expiry forward
//! by the full TTL; an untouched draft vanishes after one hour.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use crate::error::CoreError;
use crate::recipe::Recipe;

/// How long an untouched draft survives.
pub const DRAFT_TTL: Duration = Duration::from_secs(3600);

/// Namespace prefix for draft cache keys.
pub const DRAFT_KEY_PREFIX: &str = "recipe_draft:";

/// The cached envelope for one staged recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draft {
    /// The recipe exactly as generated. Never rewritten.
    pub original: Recipe,
    /// The working copy that edits rewrite wholesale.
    pub current: Recipe,
    /// Number of completed edits against this draft.
    pub modification_count: u32,
    /// Wall-clock time of the last write.
    pub last_modified: DateTime<Utc>,
}

/// Build the cache key for a draft id.
pub fn draft_key(draft_id: Uuid) -> String {
    format!("{DRAFT_KEY_PREFIX}{draft_id}")
}

/// Staging cache for drafts awaiting review.
///
/// Implementations hold JSON-serializable envelopes under namespaced keys so
/// a shared backend (Redis, say) can stand in for the in-memory store
/// without changing callers.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Stage a freshly generated recipe. Assigns and returns the draft id;
    /// the stored copy carries that id in both `original` and `current`.
    async fn cache(&self, recipe: Recipe) -> Result<Uuid, CoreError>;

    /// Fetch a draft, sliding its expiry. Expired and never-staged drafts
    /// are indistinguishable: both are [`CoreError::NotFound`].
    async fn get(&self, draft_id: Uuid) -> Result<Draft, CoreError>;

    /// Replace the working copy, bumping `modification_count` and sliding
    /// the expiry. The frozen `original` is untouched.
    async fn update(&self, draft_id: Uuid, recipe: Recipe) -> Result<(), CoreError>;

    /// Discard a draft. Deleting an absent or expired draft succeeds.
    async fn delete(&self, draft_id: Uuid) -> Result<(), CoreError>;
}

struct Entry {
    payload: String,
    expires_at: Instant,
}

/// In-process draft store backed by a mutex-guarded map.
///
/// Expiry is lazy: an entry past its deadline is treated as absent on the
/// next access and dropped then. The mutex serializes writers per store, so
/// concurrent updates to one draft land in some order with a single winner.
pub struct MemoryDraftStore {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::with_ttl(DRAFT_TTL)
    }

    /// Store with a caller-chosen TTL. Used by tests; production callers
    /// want [`MemoryDraftStore::new`].
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn encode(draft: &Draft) -> Result<String, CoreError> {
        serde_json::to_string(draft)
            .map_err(|e| CoreError::Storage(anyhow::anyhow!("failed to encode draft: {e}")))
    }

    fn decode(payload: &str) -> Result<Draft, CoreError> {
        serde_json::from_str(payload)
            .map_err(|e| CoreError::Storage(anyhow::anyhow!("failed to decode draft: {e}")))
    }
}

impl Default for MemoryDraftStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DraftStore for MemoryDraftStore {
    async fn cache(&self, mut recipe: Recipe) -> Result<Uuid, CoreError> {
        let draft_id = Uuid::new_v4();
        recipe.id = Some(draft_id);

        let draft = Draft {
            original: recipe.clone(),
            current: recipe,
            modification_count: 0,
            last_modified: Utc::now(),
        };
        let payload = Self::encode(&draft)?;

        let mut entries = self.entries.lock().await;
        entries.insert(
            draft_key(draft_id),
            Entry {
                payload,
                expires_at: Instant::now() + self.ttl,
            },
        );
        debug!(%draft_id, "staged draft");
        Ok(draft_id)
    }

    async fn get(&self, draft_id: Uuid) -> Result<Draft, CoreError> {
        let key = draft_key(draft_id);
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(&key) else {
            return Err(CoreError::not_found(format!("draft {draft_id}")));
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(&key);
            return Err(CoreError::not_found(format!("draft {draft_id}")));
        }

        entry.expires_at = Instant::now() + self.ttl;
        Self::decode(&entry.payload)
    }

    async fn update(&self, draft_id: Uuid, recipe: Recipe) -> Result<(), CoreError> {
        let key = draft_key(draft_id);
        let mut entries = self.entries.lock().await;

        let Some(entry) = entries.get_mut(&key) else {
            return Err(CoreError::not_found(format!("draft {draft_id}")));
        };
        if entry.expires_at <= Instant::now() {
            entries.remove(&key);
            return Err(CoreError::not_found(format!("draft {draft_id}")));
        }

        let mut draft = Self::decode(&entry.payload)?;
        draft.current = recipe;
        draft.current.id = Some(draft_id);
        draft.modification_count += 1;
        draft.last_modified = Utc::now();

        entry.payload = Self::encode(&draft)?;
        entry.expires_at = Instant::now() + self.ttl;
        debug!(%draft_id, modification_count = draft.modification_count, "updated draft");
        Ok(())
    }

    async fn delete(&self, draft_id: Uuid) -> Result<(), CoreError> {
        let mut entries = self.entries.lock().await;
        entries.remove(&draft_key(draft_id));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::sample_recipe;
    use std::sync::Arc;

    #[tokio::test]
    async fn cache_then_get_returns_the_recipe_with_id() {
        let store = MemoryDraftStore::new();
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        let draft = store.get(draft_id).await.unwrap();
        assert_eq!(draft.current.id, Some(draft_id));
        assert_eq!(draft.original.id, Some(draft_id));
        assert_eq!(draft.current.title, "Spicy Vegan Chili");
        assert_eq!(draft.modification_count, 0);
    }

    #[tokio::test]
    async fn get_unknown_draft_is_not_found() {
        let store = MemoryDraftStore::new();
        let err = store.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_bumps_count_and_preserves_original() {
        let store = MemoryDraftStore::new();
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        let mut edited = store.get(draft_id).await.unwrap().current;
        edited.title = "Mild Vegan Chili".to_string();
        store.update(draft_id, edited).await.unwrap();

        let draft = store.get(draft_id).await.unwrap();
        assert_eq!(draft.modification_count, 1);
        assert_eq!(draft.current.title, "Mild Vegan Chili");
        assert_eq!(draft.original.title, "Spicy Vegan Chili");
    }

    #[tokio::test]
    async fn update_unknown_draft_is_not_found() {
        let store = MemoryDraftStore::new();
        let err = store
            .update(Uuid::new_v4(), sample_recipe())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryDraftStore::new();
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        store.delete(draft_id).await.unwrap();
        store.delete(draft_id).await.unwrap();
        store.delete(Uuid::new_v4()).await.unwrap();

        let err = store.get(draft_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn draft_expires_after_ttl() {
        let store = MemoryDraftStore::new();
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        tokio::time::advance(DRAFT_TTL + Duration::from_secs(1)).await;

        let err = store.get(draft_id).await.unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn get_slides_the_expiry() {
        let store = MemoryDraftStore::new();
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        // Touch the draft shortly before it would expire.
        tokio::time::advance(DRAFT_TTL - Duration::from_secs(1)).await;
        store.get(draft_id).await.unwrap();

        // Past the original deadline, but within the refreshed one.
        tokio::time::advance(DRAFT_TTL - Duration::from_secs(1)).await;
        let draft = store.get(draft_id).await.unwrap();
        assert_eq!(draft.current.title, "Spicy Vegan Chili");
    }

    #[tokio::test(start_paused = true)]
    async fn update_slides_the_expiry() {
        let store = MemoryDraftStore::new();
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        tokio::time::advance(DRAFT_TTL - Duration::from_secs(1)).await;
        let current = store.get(draft_id).await.unwrap().current;
        store.update(draft_id, current).await.unwrap();

        tokio::time::advance(DRAFT_TTL - Duration::from_secs(1)).await;
        assert!(store.get(draft_id).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_updates_have_a_single_winner() {
        let store = Arc::new(MemoryDraftStore::new());
        let draft_id = store.cache(sample_recipe()).await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut edited = store.get(draft_id).await.unwrap().current;
                edited.title = format!("Chili v{i}");
                store.update(draft_id, edited).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let draft = store.get(draft_id).await.unwrap();
        // Every writer landed, in some order; the working copy is one
        // writer's content wholesale.
        assert_eq!(draft.modification_count, 8);
        assert!(draft.current.title.starts_with("Chili v"));
        assert_eq!(draft.original.title, "Spicy Vegan Chili");
    }

    #[test]
    fn draft_key_is_namespaced() {
        let id = Uuid::nil();
        assert_eq!(
            draft_key(id),
            "recipe_draft:00000000-0000-0000-0000-000000000000"
        );
    }
}
