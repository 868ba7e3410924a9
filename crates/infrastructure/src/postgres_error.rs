use hectara_core::AppError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Returns whether the error is a unique constraint violation.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    has_code(error, UNIQUE_VIOLATION)
}

/// Returns whether the error is a foreign key violation.
pub(crate) fn is_foreign_key_violation(error: &sqlx::Error) -> bool {
    has_code(error, FOREIGN_KEY_VIOLATION)
}

/// Returns the name of the violated constraint, if the driver reported one.
pub(crate) fn violated_constraint(error: &sqlx::Error) -> Option<&str> {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.constraint();
    }

    None
}

fn has_code(error: &sqlx::Error, code: &str) -> bool {
    if let sqlx::Error::Database(database_error) = error {
        return database_error.code().as_deref() == Some(code);
    }

    false
}

/// Maps a driver error that has no domain meaning.
///
/// Connectivity failures become `ResolutionUnavailable` so callers can tell
/// an unreachable store apart from a bug.
pub(crate) fn map_store_error(error: sqlx::Error, context: &str) -> AppError {
    match error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => {
            AppError::ResolutionUnavailable(format!("{context}: {error}"))
        }
        error => AppError::Internal(format!("{context}: {error}")),
    }
}
