//! Shared Diesel error mapping for the persistence adapters.
//!
//! Each adapter owns its port error type; these helpers capture the common
//! classification (closed connection, unique violation, everything else) and
//! the debug logging that goes with it.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a port-specific connection error constructor.
pub(crate) fn map_basic_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    debug!(error = %error, "connection pool checkout failed");
    connection(error.into_message())
}

/// Emit debug context for a failed Diesel operation.
pub(crate) fn log_diesel_error(error: &DieselError) {
    match error {
        DieselError::DatabaseError(kind, info) => {
            debug!(
                ?kind,
                message = info.message(),
                constraint = info.constraint_name(),
                "diesel operation failed"
            );
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(error),
            error = %error,
            "diesel operation failed"
        ),
    }
}

/// Name of the violated unique constraint, when `error` is a unique
/// violation. Unknown constraint names are reported as an empty string.
pub(crate) fn unique_violation(error: &DieselError) -> Option<&str> {
    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            Some(info.constraint_name().unwrap_or_default())
        }
        _ => None,
    }
}

/// Map the remaining Diesel error variants into query/connection errors.
pub(crate) fn map_basic_diesel_error<E, Q, C>(error: DieselError, query: Q, connection: C) -> E
where
    Q: FnOnce(String) -> E,
    C: FnOnce(String) -> E,
{
    log_diesel_error(&error);
    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            connection(info.message().to_owned())
        }
        DieselError::DatabaseError(_, info) => query(info.message().to_owned()),
        DieselError::DeserializationError(err) => query(format!("invalid stored row: {err}")),
        other => query(other.to_string()),
    }
}

/// Wrap a row conversion failure so it can abort a Diesel transaction.
pub(crate) fn invalid_row(message: impl Into<String>) -> DieselError {
    let message: String = message.into();
    DieselError::DeserializationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[derive(Debug, PartialEq, Eq)]
    enum Mapped {
        Query(String),
        Connection(String),
    }

    fn map(error: DieselError) -> Mapped {
        map_basic_diesel_error(error, Mapped::Query, Mapped::Connection)
    }

    #[rstest]
    fn not_found_maps_to_query() {
        assert_eq!(
            map(DieselError::NotFound),
            Mapped::Query("record not found".to_owned())
        );
    }

    #[rstest]
    fn closed_connection_maps_to_connection() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert_eq!(
            map(error),
            Mapped::Connection("server closed the connection".to_owned())
        );
    }

    #[rstest]
    fn unique_violation_is_detected() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(unique_violation(&error), Some(""));
        assert_eq!(unique_violation(&DieselError::NotFound), None);
    }

    #[rstest]
    fn invalid_rows_map_to_query_errors() {
        let mapped = map(invalid_row("unknown scope"));
        assert!(matches!(mapped, Mapped::Query(message) if message.contains("unknown scope")));
    }

    #[rstest]
    fn pool_errors_use_connection_constructor() {
        let mapped: Mapped =
            map_basic_pool_error(PoolError::checkout("timed out"), Mapped::Connection);
        assert_eq!(mapped, Mapped::Connection("timed out".to_owned()));
    }
}
