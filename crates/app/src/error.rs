use engine::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Exit status of a rejected command, e.g. over budget or an invalid amount.
pub const EXIT_REJECTED: u8 = 2;
/// Exit status of a store, file or configuration failure.
pub const EXIT_FAILED: u8 = 1;

impl AppError {
    /// Rejections printed as a plain message, as opposed to failures.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, AppError::Engine(err) if err.is_user_facing())
    }

    pub fn exit_code(&self) -> u8 {
        if self.is_user_facing() {
            EXIT_REJECTED
        } else {
            EXIT_FAILED
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_engine_rejections_are_user_facing() {
        let over = AppError::from(EngineError::OverBudget("Fruit".to_string()));
        assert!(over.is_user_facing());

        let db = AppError::from(EngineError::Database(sea_orm::DbErr::Custom(
            "locked".to_string(),
        )));
        assert!(!db.is_user_facing());

        let io = AppError::from(std::io::Error::other("disk full"));
        assert!(!io.is_user_facing());
    }

    #[test]
    fn rejections_and_failures_exit_differently() {
        let invalid = AppError::from(EngineError::InvalidAmount("two".to_string()));
        assert_eq!(invalid.exit_code(), EXIT_REJECTED);

        let io = AppError::from(std::io::Error::other("disk full"));
        assert_eq!(io.exit_code(), EXIT_FAILED);
        assert_ne!(EXIT_REJECTED, 0);
    }
}
