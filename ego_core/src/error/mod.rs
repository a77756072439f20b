//! Utilities for host loop error handling.

use thiserror::Error;

use ego_ecs::EcsError;

/// Result of any operation of the application which can return an error.
pub type Result<T> = std::result::Result<T, AppError>;

/// Error of the running application.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("ECS error: {0}")]
    Ecs(#[from] EcsError),

    #[error("validation failed for {failed} system(s), first error: {first}")]
    Validation { failed: usize, first: EcsError },
}

/// Error of the application creation.
#[derive(Debug, Error)]
pub enum AppCreationError {
    #[error("cannot create more than one application instance")]
    Initialized,
}
