use crate::gateway::GatewayError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error")]
    Database(#[from] sqlx::Error),

    #[error("Migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("IO error")]
    Io(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    NotFound(String),

    #[error("Ambiguous task ID, matches: {0:?}")]
    AmbiguousId(Vec<(String, String)>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Tag '{0}' does not exist")]
    InvalidTag(String),

    #[error("Tag '{0}' is protected and cannot be removed")]
    ProtectedTag(String),

    #[error("Remote store rejected the change: {0}")]
    Remote(#[from] GatewayError),

    #[error("No active session. Call init() first.")]
    NoSession,
}

impl CoreError {
    /// Rejected locally before anything was sent to the remote store.
    pub fn is_validation(&self) -> bool {
        matches!(self, CoreError::InvalidInput(_) | CoreError::InvalidTag(_))
    }

    /// The optimistic change was rolled back after the remote call failed.
    pub fn is_remote(&self) -> bool {
        matches!(self, CoreError::Remote(_))
    }
}
