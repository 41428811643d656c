//! PostgreSQL-backed `AssignmentRepository` implementation using Diesel ORM.
//!
//! The assignment and its initial entries are written in one transaction so
//! a partially initialised assignment is never observable. The
//! `(schema, vehicle)` pair is guarded by a unique index.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{AssignmentRepository, AssignmentRepositoryError};
use crate::domain::tracking::{RegulationEntry, SchemaAssignment};

use super::diesel_error_mapping::{ConstraintViolation, map_diesel_error, map_pool_error};
use super::models::{AssignmentRow, NewAssignmentRow, NewEntryRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::assignment_from_row;
use super::schema::{regulation_assignments, regulation_entries};

/// Diesel-backed implementation of the assignment repository port.
#[derive(Clone)]
pub struct DieselAssignmentRepository {
    pool: DbPool,
}

impl DieselAssignmentRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> AssignmentRepositoryError {
    map_pool_error(error, AssignmentRepositoryError::connection)
}

fn map_plain_diesel(error: diesel::result::Error) -> AssignmentRepositoryError {
    map_diesel_error(
        error,
        AssignmentRepositoryError::query,
        AssignmentRepositoryError::connection,
        |_| None,
    )
}

#[async_trait]
impl AssignmentRepository for DieselAssignmentRepository {
    async fn create_with_entries(
        &self,
        assignment: &SchemaAssignment,
        entries: &[RegulationEntry],
    ) -> Result<(), AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_assignment = NewAssignmentRow {
            id: assignment.id,
            vehicle_id: assignment.vehicle_id,
            schema_id: assignment.schema_id,
            assigned_at: assignment.assigned_at,
        };
        let new_entries: Vec<NewEntryRow> = entries
            .iter()
            .map(|entry| NewEntryRow {
                id: entry.id,
                assignment_id: entry.assignment_id,
                item_id: entry.item_id,
                last_done_km: entry.last_done_km,
                updated_at: entry.updated_at,
            })
            .collect();

        conn.transaction(|conn| {
            async move {
                diesel::insert_into(regulation_assignments::table)
                    .values(&new_assignment)
                    .execute(conn)
                    .await?;

                if !new_entries.is_empty() {
                    diesel::insert_into(regulation_entries::table)
                        .values(&new_entries)
                        .execute(conn)
                        .await?;
                }

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| {
            let vehicle_id = assignment.vehicle_id;
            let schema_id = assignment.schema_id;
            map_diesel_error(
                error,
                AssignmentRepositoryError::query,
                AssignmentRepositoryError::connection,
                move |violation| match violation {
                    ConstraintViolation::Unique(_) => {
                        Some(AssignmentRepositoryError::AlreadyAssigned {
                            vehicle_id,
                            schema_id,
                        })
                    }
                    ConstraintViolation::ForeignKey(constraint) => {
                        Some(AssignmentRepositoryError::missing_reference(
                            constraint.unwrap_or_else(|| "foreign key violation".to_owned()),
                        ))
                    }
                },
            )
        })
    }

    async fn delete(&self, assignment_id: Uuid) -> Result<bool, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let deleted = diesel::delete(regulation_assignments::table.find(assignment_id))
            .execute(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        Ok(deleted > 0)
    }

    async fn find_by_id(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<SchemaAssignment>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = regulation_assignments::table
            .find(assignment_id)
            .select(AssignmentRow::as_select())
            .first::<AssignmentRow>(&mut conn)
            .await
            .optional()
            .map_err(map_plain_diesel)?;

        Ok(row.map(assignment_from_row))
    }

    async fn list_for_vehicle(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<SchemaAssignment>, AssignmentRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows = regulation_assignments::table
            .filter(regulation_assignments::vehicle_id.eq(vehicle_id))
            .order((
                regulation_assignments::assigned_at.asc(),
                regulation_assignments::id.asc(),
            ))
            .select(AssignmentRow::as_select())
            .load::<AssignmentRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        Ok(rows.into_iter().map(assignment_from_row).collect())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for error mapping edge cases.

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool(PoolError::checkout("connection refused"));

        assert!(matches!(
            repo_err,
            AssignmentRepositoryError::Connection { .. }
        ));
    }

    #[rstest]
    fn plain_diesel_error_maps_to_query_error() {
        let repo_err = map_plain_diesel(diesel::result::Error::NotFound);

        assert!(matches!(repo_err, AssignmentRepositoryError::Query { .. }));
    }
}
