//! Repository error type

use uuid::Uuid;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("{operation} failed: {source}")]
    DataSource {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },
}

impl DbError {
    /// Wrap a store failure, logging it with the operation context.
    ///
    /// This is the only place store failures are logged; callers must not
    /// log them again.
    pub(crate) fn data_source(operation: &'static str, id: Option<Uuid>, source: sqlx::Error) -> Self {
        tracing::error!(operation, id = ?id, error = %source, "database operation failed");
        Self::DataSource { operation, source }
    }

    pub(crate) fn restaurant_not_found(id: Uuid) -> Self {
        Self::NotFound {
            resource: "restaurant",
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = DbError::DataSource {
            operation: "create restaurant",
            source: sqlx::Error::PoolTimedOut,
        };
        assert!(err.to_string().starts_with("create restaurant failed"));

        let id = Uuid::nil();
        let err = DbError::restaurant_not_found(id);
        assert_eq!(
            err.to_string(),
            "not found: restaurant '00000000-0000-0000-0000-000000000000'"
        );
    }
}
