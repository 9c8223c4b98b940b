//! Custom error types for the common library
//!
//! Backend failures are classified here once so that every service can tell a
//! uniqueness conflict apart from a generic query failure.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {}", constraint.as_deref().unwrap_or("unknown"))]
    UniqueViolation { constraint: Option<String> },

    /// A foreign key constraint rejected the write
    #[error("Foreign key constraint violated: {}", constraint.as_deref().unwrap_or("unknown"))]
    ForeignKeyViolation { constraint: Option<String> },

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

impl DatabaseError {
    /// Classify an error returned by a query.
    ///
    /// Constraint violations keep the constraint name reported by Postgres so
    /// callers can map them to a specific condition.
    pub fn from_query(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            let constraint = db_err.constraint().map(str::to_string);
            if db_err.is_unique_violation() {
                return DatabaseError::UniqueViolation { constraint };
            }
            if db_err.is_foreign_key_violation() {
                return DatabaseError::ForeignKeyViolation { constraint };
            }
        }
        DatabaseError::Query(err)
    }

    /// True when this is a uniqueness violation on the named constraint
    pub fn is_unique_violation_on(&self, name: &str) -> bool {
        matches!(
            self,
            DatabaseError::UniqueViolation { constraint: Some(c) } if c == name
        )
    }
}

impl From<SqlxError> for DatabaseError {
    fn from(err: SqlxError) -> Self {
        DatabaseError::from_query(err)
    }
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_database_errors_stay_query_errors() {
        let err = DatabaseError::from_query(SqlxError::RowNotFound);
        assert!(matches!(err, DatabaseError::Query(SqlxError::RowNotFound)));
    }

    #[test]
    fn test_unique_violation_matches_only_its_constraint() {
        let err = DatabaseError::UniqueViolation {
            constraint: Some("event_registrations_user_event_key".to_string()),
        };
        assert!(err.is_unique_violation_on("event_registrations_user_event_key"));
        assert!(!err.is_unique_violation_on("employee_encouragements_user_employee_key"));

        let unnamed = DatabaseError::UniqueViolation { constraint: None };
        assert!(!unnamed.is_unique_violation_on("event_registrations_user_event_key"));
    }

    #[test]
    fn test_error_messages_name_the_constraint() {
        let err = DatabaseError::ForeignKeyViolation {
            constraint: Some("complaints_category_id_fkey".to_string()),
        };
        assert_eq!(
            err.to_string(),
            "Foreign key constraint violated: complaints_category_id_fkey"
        );
    }
}
