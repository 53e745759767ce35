use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use company_access::authz::{AccessConfig, AccessEngine, AccessLevel, Principal, Provider};
use company_access::db::{SqliteIdentityRepository, SqliteMembershipRepository};
use company_access::jwt::{JwtConfig, CONSOLE_SUBJECT};
use company_access::models::{ActorRef, CompanyId};

#[derive(Parser, Debug)]
#[command(author, version, about = "company-access admin tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Ask the access engine whether an actor may read or manage a company
    Check {
        /// Actor UUID, or `console`
        #[arg(long)]
        actor: String,
        #[arg(long, default_value = "cli")]
        name: String,
        #[arg(long)]
        company: CompanyId,
        #[arg(long, default_value = "read")]
        level: AccessLevel,
        /// Provision the actor's identity if it does not exist yet
        #[arg(long)]
        provision: bool,
        /// Capabilities granted to the actor (repeatable)
        #[arg(long = "cap")]
        caps: Vec<String>,
    },
    /// Mint a bearer token for the HTTP API
    Token {
        /// Actor UUID, or `console`
        #[arg(long)]
        actor: String,
        #[arg(long, default_value = "cli")]
        name: String,
        #[arg(long = "cap")]
        caps: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Fall back to the crate-local `.env` when the CWD has none
    if dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::Check { actor, name, company, level, provision, caps } => {
            let principal = parse_principal(&actor, &name, caps)?;
            let pool = get_pool().await?;
            let provider = Provider::new(
                Arc::new(SqliteIdentityRepository::new(pool.clone())),
                Arc::new(SqliteMembershipRepository::new(pool)),
            );
            let config = AccessConfig::from_env()?;
            let engine = AccessEngine::with_capability(config.override_capability);

            let allowed = if provision {
                engine.check(Some(&principal), Some(&provider), Some(company), level).await?
            } else {
                let read_only = provider.read_only();
                engine.check_if_known(Some(&principal), Some(&read_only), Some(company), level).await?
            };

            println!("{} {} on {}: {}", principal, level, company, if allowed { "allowed" } else { "denied" });
        }
        Commands::Token { actor, name, caps } => {
            let principal = parse_principal(&actor, &name, caps)?;
            let jwt = JwtConfig::from_env()?;
            println!("{}", jwt.encode(&principal)?);
        }
    }

    Ok(())
}

fn parse_principal(actor: &str, name: &str, caps: Vec<String>) -> anyhow::Result<Principal> {
    let principal = if actor == CONSOLE_SUBJECT {
        Principal::console()
    } else {
        let id = Uuid::parse_str(actor).with_context(|| format!("invalid actor id: {}", actor))?;
        Principal::player(ActorRef::new(id, name))
    };

    Ok(principal.with_capabilities(caps))
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    // No migrations table means nothing has been applied yet
    let table = sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'")
        .fetch_optional(pool)
        .await?;
    let applied_versions: HashSet<i64> = if table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let version = migration.version;
        let status = if applied_versions.contains(&version) { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, version, name);
    }

    Ok(())
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    // ./migrations when run from the repo root, else the crate-local folder
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}
