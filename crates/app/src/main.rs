use std::process::ExitCode;

use clap::Parser;
use migration::{Migrator, MigratorTrait};

use crate::{cli::Cli, commands::Planner, error::Result, settings::Settings};

mod cli;
mod commands;
mod error;
mod export;
mod settings;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if err.is_user_facing() {
                eprintln!("{err}");
            } else {
                tracing::error!("{err}");
                eprintln!("error: {err}");
            }
            ExitCode::from(err.exit_code())
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "exchange_planner={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let url = cli
        .database_url
        .clone()
        .unwrap_or_else(|| settings.database.url());
    let db = connect_db(&url).await?;

    let scope = cli.scope.as_deref().unwrap_or(&settings.app.scope);
    let engine = engine::Engine::builder()
        .database(db)
        .scope(scope)
        .build()
        .await?;

    Planner::new(engine, settings.step()?, settings.app.upcoming_meals)
        .run(cli.command)
        .await
}

async fn connect_db(url: &str) -> Result<sea_orm::DatabaseConnection> {
    tracing::debug!(%url, "opening database");
    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
