//! Maintenance CLI
//!
//! One-shot, idempotent data fixes run by an operator against the same
//! database as the API server. Never runs concurrently with itself.
//!
//! ```sh
//! vacx-maintenance backfill-districts
//! vacx-maintenance collapse-district-roles
//! vacx-maintenance cleanup-sessions
//! ```

use std::sync::Arc;

use anyhow::Context;
use auth::PgAuthRepository;
use care::{BackfillDistrictsUseCase, PgCareRepository};
use clap::{Parser, Subcommand};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// VacXCare maintenance operations
#[derive(Parser, Debug)]
#[command(name = "vacx-maintenance", version, about)]
struct Cli {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// Apply pending migrations before running the command
    #[arg(long)]
    migrate: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Fill in the district of children and vaccinations from their health center
    BackfillDistricts,
    /// Rewrite legacy agent users with agent_level=district as district users
    CollapseDistrictRoles,
    /// Delete expired auth sessions
    CleanupSessions,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "maintenance=info,auth=info,care=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&cli.database_url)
        .await
        .context("failed to connect to the database")?;

    if cli.migrate {
        sqlx::migrate!("../../../database/migrations")
            .run(&pool)
            .await?;
        tracing::info!("Migrations completed");
    }

    match cli.command {
        Command::BackfillDistricts => {
            let report = BackfillDistrictsUseCase::new(Arc::new(PgCareRepository::new(pool)))
                .execute()
                .await?;
            println!(
                "district assigned to {} children and {} vaccinations",
                report.children, report.vaccinations
            );
        }
        Command::CollapseDistrictRoles => {
            let updated = PgAuthRepository::new(pool)
                .collapse_legacy_district_roles()
                .await?;
            println!("{updated} users rewritten as district users");
        }
        Command::CleanupSessions => {
            let deleted = PgAuthRepository::new(pool).cleanup_expired().await?;
            println!("{deleted} expired sessions deleted");
        }
    }

    Ok(())
}
