//! The `ladle generate` command: generate a recipe, then drive the review
//! loop (approve / patch / AI rewrite / discard) in one session.
//!
//! Drafts live in an in-process store, so the whole review happens here
//! rather than across separate invocations.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use uuid::Uuid;

use ladle_core::lifecycle::RecipeService;
use ladle_core::recipe::{Difficulty, RecipePatch};

use crate::render;

pub async fn run_generate(service: &RecipeService, query: &str, user_id: Uuid) -> Result<()> {
    println!("Generating a recipe for: {query}");
    let outcome = service.generate(query).await?;
    let mut draft_id = outcome.draft_id;

    println!();
    render::print_recipe(&outcome.recipe);
    println!("\nDraft {draft_id} staged ({}).", outcome.status);

    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n[a]pprove  [s]et <field> <value>  [r]ewrite <instruction>  [p]rint  [d]iscard  [q]uit > ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next() else {
            println!("\nInput closed; draft {draft_id} left staged (expires in 1 hour).");
            return Ok(());
        };
        let line = line.context("failed to read input")?;
        let input = line.trim();
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((c, r)) => (c, r.trim()),
            None => (input, ""),
        };

        match cmd {
            "a" | "approve" => {
                let approved = service.approve(draft_id, user_id).await?;
                let id = approved.recipe.id.map(|id| id.to_string()).unwrap_or_default();
                println!("Approved. Recipe {id} saved for user {user_id}.");
                return Ok(());
            }
            "s" | "set" => match parse_set(rest) {
                Ok(patch) => match service.modify(draft_id, &patch).await {
                    Ok(modified) => {
                        render::print_recipe(&modified.recipe);
                    }
                    Err(e) => println!("Edit failed: {e}"),
                },
                Err(e) => println!("{e}"),
            },
            "r" | "rewrite" => {
                if rest.is_empty() {
                    println!("Usage: r <instruction> (e.g. `r make it vegan`)");
                    continue;
                }
                // Everything before an optional ';' is the modification,
                // the remainder is free-text notes.
                let (kind, notes) = match rest.split_once(';') {
                    Some((k, n)) => (k.trim(), n.trim()),
                    None => (rest, ""),
                };
                match service.modify_with_ai(draft_id, kind, notes).await {
                    Ok(rewritten) => {
                        println!("New draft {} staged; the previous draft is kept.", rewritten.draft_id);
                        draft_id = rewritten.draft_id;
                        render::print_recipe(&rewritten.recipe);
                    }
                    Err(e) => println!("Rewrite failed: {e}"),
                }
            }
            "p" | "print" => {
                let draft = service.get_draft(draft_id).await?;
                render::print_recipe(&draft.current);
                println!("(edits so far: {})", draft.modification_count);
            }
            "d" | "discard" => {
                service.discard(draft_id).await?;
                println!("Draft {draft_id} discarded.");
                return Ok(());
            }
            "q" | "quit" => {
                println!("Draft {draft_id} left staged (expires in 1 hour).");
                return Ok(());
            }
            "" => {}
            other => println!("Unknown command: {other}"),
        }
    }
}

/// Parse a `set <field> <value>` edit into a single-field patch.
fn parse_set(rest: &str) -> Result<RecipePatch, String> {
    let (field, value) = rest
        .split_once(char::is_whitespace)
        .map(|(f, v)| (f, v.trim()))
        .ok_or_else(|| "Usage: s <field> <value> (e.g. `s servings 6`)".to_string())?;
    if value.is_empty() {
        return Err(format!("no value given for field {field}"));
    }

    let mut patch = RecipePatch::default();
    match field {
        "title" => patch.title = Some(value.to_string()),
        "description" => patch.description = Some(value.to_string()),
        "servings" => {
            patch.servings = Some(parse_int(field, value)?);
        }
        "prep" | "prep_time_minutes" => {
            patch.prep_time_minutes = Some(parse_int(field, value)?);
        }
        "cook" | "cook_time_minutes" => {
            patch.cook_time_minutes = Some(parse_int(field, value)?);
        }
        "total" | "total_time_minutes" => {
            patch.total_time_minutes = Some(parse_int(field, value)?);
        }
        "tags" => {
            patch.tags = Some(
                value
                    .split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect(),
            );
        }
        "difficulty" => {
            let difficulty: Difficulty = value
                .parse()
                .map_err(|_| format!("invalid difficulty {value:?}: use easy, medium, or hard"))?;
            patch.difficulty = Some(difficulty);
        }
        other => {
            return Err(format!(
                "unknown field {other:?}: editable fields are title, description, servings, \
                 prep, cook, total, tags, difficulty"
            ));
        }
    }
    Ok(patch)
}

fn parse_int(field: &str, value: &str) -> Result<i32, String> {
    value
        .parse()
        .map_err(|_| format!("field {field} needs a whole number, got {value:?}"))
}
