//! PostgreSQL layer for ladle: configuration, pooling, embedded migrations,
//! row models, and the recipe query functions.

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
