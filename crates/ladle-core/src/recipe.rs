//! Canonical recipe value types.
//!
//! These are the single definitions of Ingredient/InstructionStep/Nutrition
//! used at every stage; the db boundary converts to and from JSONB in
//! [`crate::convert`] and nowhere else.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use ladle_db::models::Difficulty;

/// One entry in a recipe's ordered ingredient list.
///
/// `amount` is numeric-as-text ("2", "1/2", "a pinch") to tolerate
/// fractional and unit-less values coming out of the LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub item: String,
    pub amount: String,
    pub unit: String,
}

/// One numbered step in a recipe's instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstructionStep {
    pub step: i32,
    pub description: String,
}

/// Per-serving nutrition estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// The shared recipe shape used at every lifecycle stage.
///
/// `id` is empty until the recipe is staged as a draft; `user_id` is empty
/// until the recipe is approved into a user's collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
}

/// A partial edit to a staged recipe: only provided fields overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub servings: Option<i32>,
    pub prep_time_minutes: Option<i32>,
    pub cook_time_minutes: Option<i32>,
    pub total_time_minutes: Option<i32>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub instructions: Option<Vec<InstructionStep>>,
    pub nutrition: Option<Nutrition>,
    pub tags: Option<Vec<String>>,
    pub difficulty: Option<Difficulty>,
}

impl RecipePatch {
    /// True when no field is provided.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.servings.is_none()
            && self.prep_time_minutes.is_none()
            && self.cook_time_minutes.is_none()
            && self.total_time_minutes.is_none()
            && self.ingredients.is_none()
            && self.instructions.is_none()
            && self.nutrition.is_none()
            && self.tags.is_none()
            && self.difficulty.is_none()
    }

    /// Apply the patch to `recipe`, overwriting only provided fields.
    ///
    /// Returns true when a field that feeds the embedding input (title,
    /// description, tags, ingredients) actually changed value, so the caller
    /// knows whether a persisted embedding is now stale.
    pub fn apply(&self, recipe: &mut Recipe) -> bool {
        let mut embedding_stale = false;

        if let Some(ref title) = self.title {
            embedding_stale |= *title != recipe.title;
            recipe.title = title.clone();
        }
        if let Some(ref description) = self.description {
            embedding_stale |= *description != recipe.description;
            recipe.description = description.clone();
        }
        if let Some(servings) = self.servings {
            recipe.servings = servings;
        }
        if let Some(minutes) = self.prep_time_minutes {
            recipe.prep_time_minutes = minutes;
        }
        if let Some(minutes) = self.cook_time_minutes {
            recipe.cook_time_minutes = minutes;
        }
        if let Some(minutes) = self.total_time_minutes {
            recipe.total_time_minutes = minutes;
        }
        if let Some(ref ingredients) = self.ingredients {
            embedding_stale |= *ingredients != recipe.ingredients;
            recipe.ingredients = ingredients.clone();
        }
        if let Some(ref instructions) = self.instructions {
            recipe.instructions = instructions.clone();
        }
        if let Some(ref nutrition) = self.nutrition {
            recipe.nutrition = nutrition.clone();
        }
        if let Some(ref tags) = self.tags {
            embedding_stale |= *tags != recipe.tags;
            recipe.tags = tags.clone();
        }
        if let Some(difficulty) = self.difficulty {
            recipe.difficulty = difficulty;
        }

        embedding_stale
    }
}

/// Shared fixture for unit tests across the crate.
#[cfg(test)]
pub(crate) fn sample_recipe() -> Recipe {
    Recipe {
        id: None,
        title: "Spicy Vegan Chili".to_string(),
        description: "A smoky three-bean chili.".to_string(),
        servings: 4,
        prep_time_minutes: 15,
        cook_time_minutes: 45,
        total_time_minutes: 60,
        ingredients: vec![
            Ingredient {
                item: "black beans".to_string(),
                amount: "2".to_string(),
                unit: "cans".to_string(),
            },
            Ingredient {
                item: "chipotle pepper".to_string(),
                amount: "1".to_string(),
                unit: "".to_string(),
            },
        ],
        instructions: vec![
            InstructionStep {
                step: 1,
                description: "Saute the aromatics.".to_string(),
            },
            InstructionStep {
                step: 2,
                description: "Simmer everything for 45 minutes.".to_string(),
            },
        ],
        nutrition: Nutrition {
            calories: 320.0,
            protein: 18.0,
            carbs: 52.0,
            fat: 6.0,
        },
        tags: vec!["vegan".to_string(), "spicy".to_string()],
        difficulty: Difficulty::Easy,
        user_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch_is_empty() {
        assert!(RecipePatch::default().is_empty());
    }

    #[test]
    fn patch_with_one_field_is_not_empty() {
        let patch = RecipePatch {
            servings: Some(8),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_overwrites_only_provided_fields() {
        let mut recipe = sample_recipe();
        let patch = RecipePatch {
            servings: Some(8),
            ..Default::default()
        };

        let stale = patch.apply(&mut recipe);

        assert_eq!(recipe.servings, 8);
        assert_eq!(recipe.title, "Spicy Vegan Chili");
        assert_eq!(recipe.tags, vec!["vegan", "spicy"]);
        assert!(!stale, "servings do not feed the embedding");
    }

    #[test]
    fn patch_title_marks_embedding_stale() {
        let mut recipe = sample_recipe();
        let patch = RecipePatch {
            title: Some("Mild Vegan Chili".to_string()),
            ..Default::default()
        };

        assert!(patch.apply(&mut recipe));
        assert_eq!(recipe.title, "Mild Vegan Chili");
    }

    #[test]
    fn patch_with_identical_title_is_not_stale() {
        let mut recipe = sample_recipe();
        let patch = RecipePatch {
            title: Some(recipe.title.clone()),
            ..Default::default()
        };

        assert!(!patch.apply(&mut recipe));
    }

    #[test]
    fn patch_tags_marks_embedding_stale() {
        let mut recipe = sample_recipe();
        let patch = RecipePatch {
            tags: Some(vec!["vegan".to_string()]),
            ..Default::default()
        };

        assert!(patch.apply(&mut recipe));
        assert_eq!(recipe.tags, vec!["vegan"]);
    }

    #[test]
    fn patch_instructions_does_not_mark_stale() {
        let mut recipe = sample_recipe();
        let patch = RecipePatch {
            instructions: Some(vec![InstructionStep {
                step: 1,
                description: "Just simmer it all.".to_string(),
            }]),
            ..Default::default()
        };

        assert!(!patch.apply(&mut recipe));
        assert_eq!(recipe.instructions.len(), 1);
    }
}
