//! Prompt construction for recipe generation and AI rewrites. Pure string
//! assembly; no I/O.

use crate::error::CoreError;
use crate::recipe::Recipe;

/// System prompt shared by generation and rewrite calls. Pins the exact
/// output schema so the response decodes without field inference.
pub const SYSTEM_PROMPT: &str = "\
You are a professional recipe developer. Respond with a single JSON object \
and nothing else: no markdown fences, no commentary. The object must have \
exactly these fields:
{
  \"title\": string,
  \"description\": string,
  \"servings\": integer,
  \"prep_time_minutes\": integer,
  \"cook_time_minutes\": integer,
  \"total_time_minutes\": integer,
  \"ingredients\": [{\"item\": string, \"amount\": string, \"unit\": string}],
  \"instructions\": [{\"step\": integer, \"description\": string}],
  \"nutrition\": {\"calories\": number, \"protein\": number, \"carbs\": number, \"fat\": number},
  \"tags\": [string],
  \"difficulty\": \"easy\" | \"medium\" | \"hard\"
}
Nutrition values are per serving. total_time_minutes must equal \
prep_time_minutes plus cook_time_minutes.";

/// User prompt for generating a recipe from a free-text request.
pub fn generation_prompt(query: &str) -> String {
    format!("Create a recipe for the following request: {query}")
}

/// User prompt for rewriting a staged recipe.
///
/// `modification_type` names the kind of change ("make it vegan", "halve the
/// servings"); `notes` carries free-text detail and may be empty. Embeds the
/// full current recipe as JSON so the model revises rather than starts over,
/// and requires a changed title so variants never collide by name.
pub fn rewrite_prompt(
    recipe: &Recipe,
    modification_type: &str,
    notes: &str,
) -> Result<String, CoreError> {
    let json = serde_json::to_string_pretty(recipe)
        .map_err(|e| CoreError::Serialization(format!("failed to encode recipe: {e}")))?;

    let mut prompt = format!(
        "Here is an existing recipe:\n{json}\n\n\
         Rewrite it with this modification: {modification_type}\n"
    );
    if !notes.trim().is_empty() {
        prompt.push_str(&format!("Additional notes: {notes}\n"));
    }
    prompt.push_str(
        "\nKeep the same JSON schema. The new title MUST differ from the \
         current title and reflect the modification.",
    );
    Ok(prompt)
}
