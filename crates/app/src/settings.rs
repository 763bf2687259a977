//! Handles settings for the application. Values come from an optional
//! `settings.toml` and from `EXCHANGE_PLANNER_*` environment variables,
//! e.g. `EXCHANGE_PLANNER_APP__LEVEL=debug`.
use config::{Config, ConfigBuilder, Environment, File, builder::DefaultState};
use engine::{DEFAULT_SCOPE, DEFAULT_UPCOMING_LIMIT, Step};
use serde::Deserialize;

use crate::error::Result;

const DEFAULT_CONFIG_PATH: &str = "settings";
const ENV_PREFIX: &str = "EXCHANGE_PLANNER";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

impl Database {
    pub fn url(&self) -> String {
        match self {
            Database::Memory => String::from("sqlite::memory:"),
            Database::Sqlite(path) => format!("sqlite:{path}?mode=rwc"),
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        Database::Sqlite("exchange_planner.db".to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
    pub scope: String,
    /// How many upcoming meals `meals status` lists.
    pub upcoming_meals: usize,
    /// Step used when a command does not pass one, e.g. "0.5".
    pub default_step: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            scope: DEFAULT_SCOPE.to_string(),
            upcoming_meals: DEFAULT_UPCOMING_LIMIT,
            default_step: "1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub database: Database,
}

impl Settings {
    /// Read the settings file (`settings.toml` when `path` is `None`, in which
    /// case it may be missing) and the environment.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(path.is_some());
        Self::build(
            Config::builder()
                .add_source(file)
                .add_source(
                    Environment::with_prefix(ENV_PREFIX)
                        .prefix_separator("_")
                        .separator("__"),
                ),
        )
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.step()?;
        Ok(settings)
    }

    pub fn step(&self) -> Result<Step> {
        Ok(self.app.default_step.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use config::FileFormat;

    use super::*;

    fn from_toml(toml: &str) -> Result<Settings> {
        Settings::build(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn defaults_apply_to_an_empty_file() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.app.scope, DEFAULT_SCOPE);
        assert_eq!(settings.app.upcoming_meals, 2);
        assert_eq!(settings.step().unwrap(), Step::One);
        assert_eq!(settings.database.url(), "sqlite:exchange_planner.db?mode=rwc");
    }

    #[test]
    fn reads_app_and_database_sections() {
        let settings = from_toml(
            r#"
            database = "memory"

            [app]
            level = "debug"
            scope = "weekend"
            upcoming_meals = 3
            default_step = "0.25"
            "#,
        )
        .unwrap();
        assert_eq!(settings.database, Database::Memory);
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.app.scope, "weekend");
        assert_eq!(settings.app.upcoming_meals, 3);
        assert_eq!(settings.step().unwrap(), Step::Quarter);
    }

    #[test]
    fn sqlite_path_is_a_table() {
        let settings = from_toml("[database]\nsqlite = \"/tmp/plan.db\"\n").unwrap();
        assert_eq!(settings.database.url(), "sqlite:/tmp/plan.db?mode=rwc");
    }

    #[test]
    fn unsupported_step_is_rejected() {
        assert!(from_toml("[app]\ndefault_step = \"0.3\"\n").is_err());
    }
}
