//! Pure mappers between the three recipe representations: the generation
//! wire format, the draft envelope's canonical [`Recipe`], and the durable
//! row schema. All JSONB encoding/decoding for the database lives here.

use pgvector::Vector;
use serde::Deserialize;
use uuid::Uuid;

use ladle_db::models::{Difficulty, NewRecipe, RecipeChanges, RecipeRow};

use crate::error::CoreError;
use crate::recipe::{Ingredient, InstructionStep, Nutrition, Recipe};

// ---------------------------------------------------------------------------
// Generation wire format
// ---------------------------------------------------------------------------

/// The strict JSON document the LLM gateway is instructed to return.
///
/// Every field is required; a missing or mistyped field fails the decode.
#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub title: String,
    pub description: String,
    pub servings: i32,
    pub prep_time_minutes: i32,
    pub cook_time_minutes: i32,
    pub total_time_minutes: i32,
    pub ingredients: Vec<Ingredient>,
    pub instructions: Vec<InstructionStep>,
    pub nutrition: Nutrition,
    pub tags: Vec<String>,
    pub difficulty: Difficulty,
}

impl From<RecipePayload> for Recipe {
    fn from(p: RecipePayload) -> Self {
        Recipe {
            id: None,
            title: p.title,
            description: p.description,
            servings: p.servings,
            prep_time_minutes: p.prep_time_minutes,
            cook_time_minutes: p.cook_time_minutes,
            total_time_minutes: p.total_time_minutes,
            ingredients: p.ingredients,
            instructions: p.instructions,
            nutrition: p.nutrition,
            tags: p.tags,
            difficulty: p.difficulty,
            user_id: None,
        }
    }
}

/// Extract the first balanced JSON object from raw LLM output.
///
/// Models wrap JSON in markdown fences or prose despite instructions not to;
/// this scans for the first `{` and returns the slice up to its matching
/// closing brace. Returns `None` when no balanced object exists.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in raw[start..].char_indices() {
        if in_string {
            match ch {
                '\\' if !escaped => escaped = true,
                '"' if !escaped => in_string = false,
                _ => escaped = false,
            }
            if ch != '\\' {
                escaped = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode raw LLM output into a canonical [`Recipe`].
///
/// A missing object or a schema mismatch is a terminal
/// [`CoreError::Serialization`]; the lifecycle manager does not retry it.
pub fn parse_generated(content: &str) -> Result<Recipe, CoreError> {
    let json = extract_json_object(content).ok_or_else(|| {
        CoreError::Serialization("LLM response contains no JSON object".to_string())
    })?;

    let payload: RecipePayload = serde_json::from_str(json)
        .map_err(|e| CoreError::Serialization(format!("LLM recipe JSON is invalid: {e}")))?;

    Ok(payload.into())
}

// ---------------------------------------------------------------------------
// Embedding input
// ---------------------------------------------------------------------------

/// Build the text embedded for a recipe: title, description, tags joined by
/// ", ", and ingredient item names joined by ", ", one component per line.
///
/// The same function feeds both approve-time and edit-time embeddings so a
/// recipe always embeds identically for identical content.
pub fn embedding_input(recipe: &Recipe) -> String {
    let items: Vec<&str> = recipe
        .ingredients
        .iter()
        .map(|i| i.item.as_str())
        .collect();

    format!(
        "{}\n{}\n{}\n{}",
        recipe.title,
        recipe.description,
        recipe.tags.join(", "),
        items.join(", ")
    )
}

// ---------------------------------------------------------------------------
// Durable row boundary
// ---------------------------------------------------------------------------

fn encode_nested(
    recipe: &Recipe,
) -> Result<(serde_json::Value, serde_json::Value, serde_json::Value), CoreError> {
    let ingredients = serde_json::to_value(&recipe.ingredients)
        .map_err(|e| CoreError::Serialization(format!("failed to encode ingredients: {e}")))?;
    let instructions = serde_json::to_value(&recipe.instructions)
        .map_err(|e| CoreError::Serialization(format!("failed to encode instructions: {e}")))?;
    let nutrition = serde_json::to_value(&recipe.nutrition)
        .map_err(|e| CoreError::Serialization(format!("failed to encode nutrition: {e}")))?;
    Ok((ingredients, instructions, nutrition))
}

/// Convert a staged recipe into insert parameters for the durable store.
///
/// Every nested-field serialization happens here, before any transaction
/// opens, so a failure aborts the approve with zero partial writes.
pub fn to_new_recipe(
    recipe: &Recipe,
    user_id: Uuid,
    embedding: Vec<f32>,
) -> Result<NewRecipe, CoreError> {
    let id = recipe
        .id
        .ok_or_else(|| CoreError::validation("recipe has no draft id"))?;
    let (ingredients, instructions, nutrition) = encode_nested(recipe)?;

    Ok(NewRecipe {
        id,
        user_id,
        title: recipe.title.clone(),
        description: recipe.description.clone(),
        servings: recipe.servings,
        prep_time_minutes: recipe.prep_time_minutes,
        cook_time_minutes: recipe.cook_time_minutes,
        total_time_minutes: recipe.total_time_minutes,
        ingredients,
        instructions,
        nutrition,
        tags: recipe.tags.clone(),
        difficulty: recipe.difficulty,
        embedding: Vector::from(embedding),
    })
}

/// Convert an edited recipe into in-place update parameters.
///
/// `embedding` is `Some` only when the edit touched an embedding-relevant
/// field and a fresh vector was computed.
pub fn to_recipe_changes(
    recipe: &Recipe,
    embedding: Option<Vec<f32>>,
) -> Result<RecipeChanges, CoreError> {
    let (ingredients, instructions, nutrition) = encode_nested(recipe)?;

    Ok(RecipeChanges {
        title: recipe.title.clone(),
        description: recipe.description.clone(),
        servings: recipe.servings,
        prep_time_minutes: recipe.prep_time_minutes,
        cook_time_minutes: recipe.cook_time_minutes,
        total_time_minutes: recipe.total_time_minutes,
        ingredients,
        instructions,
        nutrition,
        tags: recipe.tags.clone(),
        difficulty: recipe.difficulty,
        embedding: embedding.map(Vector::from),
    })
}

/// Convert a durable row back into the canonical recipe shape.
///
/// A corrupt nested column is a [`CoreError::Serialization`]; it should be
/// impossible for rows written through [`to_new_recipe`].
pub fn from_row(row: RecipeRow) -> Result<Recipe, CoreError> {
    let ingredients: Vec<Ingredient> = serde_json::from_value(row.ingredients)
        .map_err(|e| CoreError::Serialization(format!("failed to decode ingredients: {e}")))?;
    let instructions: Vec<InstructionStep> = serde_json::from_value(row.instructions)
        .map_err(|e| CoreError::Serialization(format!("failed to decode instructions: {e}")))?;
    let nutrition: Nutrition = serde_json::from_value(row.nutrition)
        .map_err(|e| CoreError::Serialization(format!("failed to decode nutrition: {e}")))?;

    Ok(Recipe {
        id: Some(row.id),
        title: row.title,
        description: row.description,
        servings: row.servings,
        prep_time_minutes: row.prep_time_minutes,
        cook_time_minutes: row.cook_time_minutes,
        total_time_minutes: row.total_time_minutes,
        ingredients,
        instructions,
        nutrition,
        tags: row.tags,
        difficulty: row.difficulty,
        user_id: Some(row.user_id),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipe::sample_recipe;

    const VALID_PAYLOAD: &str = r#"{
        "title": "Garlic Butter Noodles",
        "description": "Weeknight noodles.",
        "servings": 2,
        "prep_time_minutes": 5,
        "cook_time_minutes": 10,
        "total_time_minutes": 15,
        "ingredients": [
            {"item": "noodles", "amount": "200", "unit": "g"},
            {"item": "garlic", "amount": "3", "unit": "cloves"}
        ],
        "instructions": [
            {"step": 1, "description": "Boil the noodles."},
            {"step": 2, "description": "Toss in garlic butter."}
        ],
        "nutrition": {"calories": 540, "protein": 14, "carbs": 78, "fat": 19},
        "tags": ["pasta", "quick"],
        "difficulty": "easy"
    }"#;

    // -- extract_json_object --

    #[test]
    fn extracts_bare_object() {
        let raw = r#"{"a": 1}"#;
        assert_eq!(extract_json_object(raw), Some(r#"{"a": 1}"#));
    }

    #[test]
    fn extracts_from_markdown_fence() {
        let raw = "Sure! Here it is:\n```json\n{\"a\": {\"b\": 2}}\n```\n";
        assert_eq!(extract_json_object(raw), Some(r#"{"a": {"b": 2}}"#));
    }

    #[test]
    fn extraction_ignores_braces_inside_strings() {
        let raw = r#"{"note": "use } sparingly"}"#;
        assert_eq!(extract_json_object(raw), Some(raw));
    }

    #[test]
    fn extraction_returns_none_without_object() {
        assert!(extract_json_object("no json here").is_none());
        assert!(extract_json_object("{unterminated").is_none());
    }

    // -- parse_generated --

    #[test]
    fn parses_valid_payload() {
        let recipe = parse_generated(VALID_PAYLOAD).expect("should parse");
        assert_eq!(recipe.title, "Garlic Butter Noodles");
        assert_eq!(recipe.servings, 2);
        assert_eq!(recipe.ingredients.len(), 2);
        assert_eq!(recipe.instructions[1].step, 2);
        assert_eq!(recipe.difficulty, Difficulty::Easy);
        assert!(recipe.id.is_none(), "wire payloads carry no id");
        assert!(recipe.user_id.is_none());
    }

    #[test]
    fn parses_payload_wrapped_in_prose_and_fences() {
        let wrapped = format!("Here is your recipe:\n```json\n{VALID_PAYLOAD}\n```");
        let recipe = parse_generated(&wrapped).expect("should parse");
        assert_eq!(recipe.title, "Garlic Butter Noodles");
    }

    #[test]
    fn missing_field_is_serialization_error() {
        let truncated = r#"{"title": "Only a title"}"#;
        let err = parse_generated(truncated).unwrap_err();
        assert!(matches!(err, CoreError::Serialization(_)), "got {err:?}");
        assert!(!err.is_retryable());
    }

    #[test]
    fn no_object_is_serialization_error() {
        let err = parse_generated("I couldn't come up with anything.").unwrap_err();
        assert!(matches!(err, CoreError::Serialization(_)));
    }

    #[test]
    fn invalid_difficulty_is_serialization_error() {
        let bad = VALID_PAYLOAD.replace("\"easy\"", "\"brutal\"");
        let err = parse_generated(&bad).unwrap_err();
        assert!(matches!(err, CoreError::Serialization(_)));
    }

    // -- embedding_input --

    #[test]
    fn embedding_input_order_and_separators() {
        let recipe = sample_recipe();
        let input = embedding_input(&recipe);
        assert_eq!(
            input,
            "Spicy Vegan Chili\nA smoky three-bean chili.\nvegan, spicy\nblack beans, chipotle pepper"
        );
    }

    #[test]
    fn embedding_input_with_no_tags_or_ingredients() {
        let mut recipe = sample_recipe();
        recipe.tags.clear();
        recipe.ingredients.clear();
        let input = embedding_input(&recipe);
        assert_eq!(input, "Spicy Vegan Chili\nA smoky three-bean chili.\n\n");
    }

    // -- row conversions --

    #[test]
    fn to_new_recipe_requires_a_draft_id() {
        let recipe = sample_recipe();
        let err = to_new_recipe(&recipe, Uuid::new_v4(), vec![0.0; 4]).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn to_new_recipe_encodes_nested_fields() {
        let mut recipe = sample_recipe();
        recipe.id = Some(Uuid::new_v4());
        let user_id = Uuid::new_v4();

        let new = to_new_recipe(&recipe, user_id, vec![0.1, 0.2]).expect("should convert");

        assert_eq!(new.id, recipe.id.unwrap());
        assert_eq!(new.user_id, user_id);
        assert!(new.ingredients.is_array());
        assert_eq!(new.ingredients[0]["item"], "black beans");
        assert_eq!(new.nutrition["calories"], 320.0);
        assert_eq!(new.tags, vec!["vegan", "spicy"]);
    }

    #[test]
    fn to_recipe_changes_keeps_embedding_optional() {
        let recipe = sample_recipe();
        let without = to_recipe_changes(&recipe, None).unwrap();
        assert!(without.embedding.is_none());

        let with = to_recipe_changes(&recipe, Some(vec![0.5; 3])).unwrap();
        assert!(with.embedding.is_some());
    }

    #[test]
    fn row_roundtrip_preserves_recipe() {
        let mut recipe = sample_recipe();
        recipe.id = Some(Uuid::new_v4());
        let user_id = Uuid::new_v4();
        let new = to_new_recipe(&recipe, user_id, vec![0.0; 4]).unwrap();

        // Simulate what the database hands back.
        let row = RecipeRow {
            id: new.id,
            user_id: new.user_id,
            title: new.title,
            description: new.description,
            servings: new.servings,
            prep_time_minutes: new.prep_time_minutes,
            cook_time_minutes: new.cook_time_minutes,
            total_time_minutes: new.total_time_minutes,
            ingredients: new.ingredients,
            instructions: new.instructions,
            nutrition: new.nutrition,
            tags: new.tags,
            difficulty: new.difficulty,
            embedding: Some(new.embedding),
            average_rating: 0.0,
            rating_count: 0,
            approved: true,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        let back = from_row(row).expect("should decode");
        assert_eq!(back.title, recipe.title);
        assert_eq!(back.ingredients, recipe.ingredients);
        assert_eq!(back.instructions, recipe.instructions);
        assert_eq!(back.nutrition, recipe.nutrition);
        assert_eq!(back.user_id, Some(user_id));
    }
}
