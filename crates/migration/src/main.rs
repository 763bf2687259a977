//! Applies the planner schema outside the app, e.g. to prepare a database
//! file or to inspect which migrations ran.
use clap::{Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DbErr};

#[derive(Debug, Parser)]
#[command(name = "migration", about = "Manage the exchange planner schema")]
struct Args {
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./exchange_planner.db?mode=rwc"
    )]
    database_url: String,
    #[command(subcommand)]
    action: Option<Action>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Action {
    /// Apply pending migrations (default).
    Up {
        #[arg(long)]
        steps: Option<u32>,
    },
    /// Roll back the last migrations, one unless told otherwise.
    Down {
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Drop every table and apply all migrations again.
    Fresh,
    Status,
}

#[tokio::main]
async fn main() -> Result<(), DbErr> {
    let args = Args::parse();
    let db = Database::connect(&args.database_url).await?;
    match args.action.unwrap_or(Action::Up { steps: None }) {
        Action::Up { steps } => Migrator::up(&db, steps).await,
        Action::Down { steps } => Migrator::down(&db, Some(steps)).await,
        Action::Fresh => Migrator::fresh(&db).await,
        Action::Status => Migrator::status(&db).await,
    }
}
