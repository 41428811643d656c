//! Shared Diesel error mapping for the regulation repositories.
//!
//! Uniqueness and protection invariants are enforced twice: optimistically in
//! the adapters and authoritatively by database constraints. The constraint
//! name carried by a violation tells us which invariant fired, so races lose
//! cleanly with the same conflict errors as the optimistic checks.

use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use super::pool::PoolError;

/// Map pool errors into a repository-specific connection error constructor.
pub fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// The constraint behind a database-side invariant violation, when known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintViolation {
    /// A unique index rejected the write.
    Unique(Option<String>),
    /// A foreign key (cascade/restrict rule) rejected the write.
    ForeignKey(Option<String>),
}

/// Map common Diesel error variants into query/connection constructors,
/// routing constraint violations through `violation` first so adapters can
/// translate them into their domain-specific conflict variants.
pub fn map_diesel_error<E, Q, C, V>(
    error: DieselError,
    query: Q,
    connection: C,
    violation: V,
) -> E
where
    Q: Fn(String) -> E,
    C: Fn(String) -> E,
    V: FnOnce(ConstraintViolation) -> Option<E>,
{
    if let DieselError::DatabaseError(kind, info) = &error {
        debug!(?kind, message = info.message(), "diesel operation failed");
        let hit = match kind {
            DatabaseErrorKind::UniqueViolation => {
                Some(ConstraintViolation::Unique(constraint_name(info.as_ref())))
            }
            DatabaseErrorKind::ForeignKeyViolation => Some(ConstraintViolation::ForeignKey(
                constraint_name(info.as_ref()),
            )),
            _ => None,
        };
        if let Some(mapped) = hit.and_then(violation) {
            return mapped;
        }
    } else {
        debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        );
    }

    match error {
        DieselError::NotFound => query("record not found".to_owned()),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            connection(info.message().to_owned())
        }
        other => query(other.to_string()),
    }
}

fn constraint_name(info: &dyn DatabaseErrorInformation) -> Option<String> {
    info.constraint_name().map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[derive(Debug, PartialEq)]
    enum Mapped {
        Query(String),
        Connection(String),
        Conflict,
    }

    fn map(error: DieselError) -> Mapped {
        map_diesel_error(
            error,
            Mapped::Query,
            Mapped::Connection,
            |violation| match violation {
                ConstraintViolation::Unique(_) => Some(Mapped::Conflict),
                ConstraintViolation::ForeignKey(_) => None,
            },
        )
    }

    #[rstest]
    fn not_found_maps_to_query() {
        assert_eq!(
            map(DieselError::NotFound),
            Mapped::Query("record not found".to_owned())
        );
    }

    #[rstest]
    fn unique_violation_routes_through_the_violation_hook() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key".to_owned()),
        );
        assert_eq!(map(error), Mapped::Conflict);
    }

    #[rstest]
    fn unhandled_violation_falls_back_to_query() {
        let error = DieselError::DatabaseError(
            DatabaseErrorKind::ForeignKeyViolation,
            Box::new("fk violation".to_owned()),
        );
        assert!(matches!(map(error), Mapped::Query(_)));
    }
}
