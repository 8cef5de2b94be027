//! The typed error taxonomy surfaced by the core engine.
//!
//! The engine never retries internally: transport-shaped failures are
//! distinguished from malformed-response failures so the caller can decide
//! whether a retry is worth attempting.

use std::time::Duration;

use thiserror::Error;

/// Errors produced by the draft store, lifecycle manager, and search engine.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Empty or malformed caller input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// A draft or persisted recipe that should exist does not.
    #[error("{0} not found")]
    NotFound(String),

    /// An outbound LLM or embedding call failed at the transport level.
    #[error("upstream request failed: {0}")]
    Transport(String),

    /// An outbound LLM or embedding call exceeded its deadline.
    #[error("upstream request exceeded {0:?}")]
    Timeout(Duration),

    /// Malformed LLM JSON. Terminal: retrying the same payload cannot
    /// succeed.
    #[error("malformed payload: {0}")]
    Serialization(String),

    /// The draft cache rejected a read or write, including envelope
    /// encode/decode failures inside the store.
    #[error("draft storage operation failed")]
    Storage(#[source] anyhow::Error),

    /// A transactional database write failed.
    #[error("database operation failed")]
    Persistence(#[source] anyhow::Error),
}

impl CoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Whether a caller-side retry could plausibly succeed.
    ///
    /// Only transport-level failures qualify; parse and validation failures
    /// are terminal by construction.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}
