mod config;
mod generate_cmd;
mod render;
mod search_cmd;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use uuid::Uuid;

use ladle_core::draft::MemoryDraftStore;
use ladle_core::gateway::OpenAiGateway;
use ladle_core::lifecycle::RecipeService;
use ladle_core::search::SearchEngine;
use ladle_db::pool;

use config::LadleConfig;

#[derive(Parser)]
#[command(name = "ladle", about = "AI recipe staging, approval, and search")]
struct Cli {
    /// Database URL (overrides LADLE_DATABASE_URL env var)
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a ladle config file (no database required)
    Init {
        /// PostgreSQL connection URL
        #[arg(long, default_value = "postgresql://localhost:5432/ladle")]
        db_url: String,
        /// OpenAI API key to store in the config file
        #[arg(long)]
        api_key: Option<String>,
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
    /// Initialize the ladle database (requires config file or env vars)
    DbInit,
    /// Generate a recipe and review it interactively
    Generate {
        /// What to cook (free text)
        query: String,
        /// User ID to save the recipe under on approval
        #[arg(long)]
        user: Option<String>,
    },
    /// Search approved recipes (lexical + semantic)
    Search {
        /// Search text
        query: String,
    },
}

/// Execute the `ladle init` command: write config file.
fn cmd_init(db_url: &str, api_key: Option<&str>, force: bool) -> anyhow::Result<()> {
    let path = config::config_path();

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}\nUse --force to overwrite.",
            path.display()
        );
    }

    let cfg = config::ConfigFile {
        database: config::DatabaseSection {
            url: db_url.to_string(),
        },
        openai: config::OpenAiSection {
            api_key: api_key.unwrap_or_default().to_string(),
            model: None,
            embedding_model: None,
            api_base: None,
        },
    };

    config::save_config(&cfg)?;

    println!("Config written to {}", path.display());
    println!("  database.url = {db_url}");
    match api_key {
        Some(key) => {
            let shown = key.get(..6).unwrap_or(key);
            println!("  openai.api_key = {shown}...");
        }
        None => {
            println!("  openai.api_key = (unset)");
            println!("  Set it in the file or export LADLE_OPENAI_API_KEY.");
        }
    }
    println!();
    println!("Next: run `ladle db-init` to create and migrate the database.");

    Ok(())
}

/// Execute the `ladle db-init` command: create database and run migrations.
async fn cmd_db_init(cli_db_url: Option<&str>) -> anyhow::Result<()> {
    let resolved = LadleConfig::resolve(cli_db_url)?;

    println!("Initializing ladle database...");

    // 1. Create the database if it does not exist.
    pool::ensure_database_exists(&resolved.db_config).await?;

    // 2. Connect to the target database.
    let db_pool = pool::create_pool(&resolved.db_config).await?;

    // 3. Run migrations.
    pool::run_migrations(&db_pool).await?;

    // 4. Report readiness.
    let recipes = pool::recipe_count(&db_pool).await?;
    println!("Database ready ({recipes} recipes).");

    // 5. Clean shutdown.
    db_pool.close().await;

    println!("ladle db-init complete.");
    Ok(())
}

fn parse_user(user: Option<&str>) -> anyhow::Result<Uuid> {
    match user {
        Some(raw) => Uuid::parse_str(raw).with_context(|| format!("invalid user ID: {raw}")),
        None => {
            let generated = Uuid::new_v4();
            println!("No --user given; using generated user {generated}.");
            Ok(generated)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {
            db_url,
            api_key,
            force,
        } => {
            cmd_init(&db_url, api_key.as_deref(), force)?;
        }
        Commands::DbInit => {
            cmd_db_init(cli.database_url.as_deref()).await?;
        }
        Commands::Generate { query, user } => {
            let resolved = LadleConfig::resolve(cli.database_url.as_deref())?;
            let user_id = parse_user(user.as_deref())?;

            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let gateway = Arc::new(OpenAiGateway::new(resolved.openai)?);
            let service = RecipeService::new(
                db_pool.clone(),
                Arc::new(MemoryDraftStore::new()),
                gateway.clone(),
                gateway,
            );

            let result = generate_cmd::run_generate(&service, &query, user_id).await;
            db_pool.close().await;
            result?;
        }
        Commands::Search { query } => {
            let resolved = LadleConfig::resolve(cli.database_url.as_deref())?;

            let db_pool = pool::create_pool(&resolved.db_config).await?;
            let gateway = Arc::new(OpenAiGateway::new(resolved.openai)?);
            let engine = SearchEngine::new(db_pool.clone(), gateway);

            let result = search_cmd::run_search(&engine, &query).await;
            db_pool.close().await;
            result?;
        }
    }

    Ok(())
}
