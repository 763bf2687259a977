use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod budget;
mod foods;
mod journal;
mod meals;
mod preferences;

pub use budget::SetupStatus;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Preference scope used when the builder is given none.
pub const DEFAULT_SCOPE: &str = "default";

/// Persistence service.
///
/// Loads and saves meals, foods, the food journal and the planning state
/// kept in preferences. It never decides allocations itself: callers load an
/// [`AllocationLedger`](crate::AllocationLedger), mutate it and save it back.
#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    scope: String,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Preference scope of this engine.
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    scope: Option<String>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Preference scope, e.g. one per user profile.
    pub fn scope(mut self, scope: &str) -> EngineBuilder {
        let trimmed = scope.trim();
        if !trimmed.is_empty() {
            self.scope = Some(trimmed.to_string());
        }
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            scope: self.scope.unwrap_or_else(|| DEFAULT_SCOPE.to_string()),
        })
    }
}
