use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Dimension of the recipe embedding column (`vector(1536)`).
pub const EMBEDDING_DIM: usize = 1536;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Difficulty rating of a recipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(DifficultyParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Difficulty`] string.
#[derive(Debug, Clone)]
pub struct DifficultyParseError(pub String);

impl fmt::Display for DifficultyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid difficulty: {:?}", self.0)
    }
}

impl std::error::Error for DifficultyParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A persisted recipe row.
///
/// Nested fields (ingredients, instructions, nutrition) are stored as JSONB
/// and surfaced here as raw `serde_json::Value`; the core crate owns the
/// canonical value types and the conversions at this boundary.
#[derive(Debug, Clone, FromRow)]
pub struct RecipeRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub servings: i32,
    pub prep_time_minutes: i32,
    pub cook_time_minutes: i32,
    pub total_time_minutes: i32,
    pub ingredients: serde_json::Value,
    pub instructions: serde_json::Value,
    pub nutrition: serde_json::Value,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub embedding: Option<Vector>,
    pub average_rating: f64,
    pub rating_count: i32,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert parameters for a new recipe row.
///
/// All nested-field serialization happens before this struct is built, so a
/// serialization failure can never abort a write midway.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub servings: i32,
    pub prep_time_minutes: i32,
    pub cook_time_minutes: i32,
    pub total_time_minutes: i32,
    pub ingredients: serde_json::Value,
    pub instructions: serde_json::Value,
    pub nutrition: serde_json::Value,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub embedding: Vector,
}

/// In-place field changes for an already-persisted recipe.
///
/// `embedding` is `None` when the edit did not touch any field that feeds
/// the embedding input; the UPDATE keeps the stored vector in that case.
#[derive(Debug, Clone)]
pub struct RecipeChanges {
    pub title: String,
    pub description: String,
    pub servings: i32,
    pub prep_time_minutes: i32,
    pub cook_time_minutes: i32,
    pub total_time_minutes: i32,
    pub ingredients: serde_json::Value,
    pub instructions: serde_json::Value,
    pub nutrition: serde_json::Value,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
    pub embedding: Option<Vector>,
}

/// A semantic search hit: the row plus its cosine similarity to the query.
#[derive(Debug, Clone, FromRow)]
pub struct SemanticMatch {
    #[sqlx(flatten)]
    pub recipe: RecipeRow,
    pub similarity: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
