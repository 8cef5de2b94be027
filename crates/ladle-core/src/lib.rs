//! Core engine for ladle: turns ephemeral AI-generated recipes into durable,
//! searchable records through an explicit draft -> review -> approve flow.
//!
//! Modules, leaves first:
//! - [`recipe`] -- canonical value types shared by every stage.
//! - [`error`] -- the typed error taxonomy surfaced to callers.
//! - [`convert`] -- pure mappers between the generation wire format, the
//!   draft envelope, and the durable row schema.
//! - [`draft`] -- TTL-bounded draft store.
//! - [`gateway`] -- LLM and embedding provider adapters.
//! - [`prompt`] -- prompt construction (pure, no I/O).
//! - [`lifecycle`] -- the recipe lifecycle manager.
//! - [`search`] -- the hybrid (lexical + semantic) retrieval engine.

pub mod convert;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod lifecycle;
pub mod prompt;
pub mod recipe;
pub mod search;
