//! Service error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors surfaced by the catalog, engagement and identity services.
///
/// `context` names the operation that failed (e.g. `"find user"`), so the
/// message reads like a small stack of what was being attempted.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input was rejected before touching storage.
    #[error("{0}")]
    Validation(String),

    /// A required record does not exist.
    #[error("{context}: not found")]
    NotFound { context: &'static str },

    /// The caller may not perform this operation.
    #[error("forbidden: {0}")]
    Forbidden(&'static str),

    /// Storage failed.
    #[error("{context}: {source}")]
    Persistence {
        context: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl ServiceError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Wrap a repository error with the name of the failed operation.
    pub(crate) fn from_repository(context: &'static str, source: RepositoryError) -> Self {
        match source {
            RepositoryError::NotFound => Self::NotFound { context },
            source => Self::Persistence { context, source },
        }
    }
}

/// Attach operation context to repository results.
pub(crate) trait Context<T> {
    fn context(self, context: &'static str) -> Result<T, ServiceError>;
}

impl<T> Context<T> for Result<T, RepositoryError> {
    fn context(self, context: &'static str) -> Result<T, ServiceError> {
        self.map_err(|e| ServiceError::from_repository(context, e))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_keeps_context() {
        let err: Result<(), _> = Err(RepositoryError::NotFound);
        let err = err.context("find user").unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { context: "find user" }));
        assert_eq!(err.to_string(), "find user: not found");
    }

    #[test]
    fn test_other_errors_become_persistence() {
        let err: Result<(), _> = Err(RepositoryError::DataCorruption("bad row".to_string()));
        let err = err.context("get recipes").unwrap_err();
        assert!(matches!(err, ServiceError::Persistence { context: "get recipes", .. }));
        assert_eq!(err.to_string(), "get recipes: data corruption: bad row");
    }
}
