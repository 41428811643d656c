//! Port for schema-to-vehicle assignment persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::tracking::{RegulationEntry, SchemaAssignment};

/// Errors raised by assignment repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignmentRepositoryError {
    /// Repository connection could not be established.
    #[error("assignment repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("assignment repository query failed: {message}")]
    Query { message: String },

    /// The vehicle already has this schema assigned.
    #[error("vehicle {vehicle_id} already has schema {schema_id} assigned")]
    AlreadyAssigned { vehicle_id: Uuid, schema_id: Uuid },

    /// A referenced row vanished between validation and the write.
    #[error("assignment references a missing row: {message}")]
    MissingReference { message: String },
}

impl AssignmentRepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a missing-reference error with the given message.
    pub fn missing_reference(message: impl Into<String>) -> Self {
        Self::MissingReference {
            message: message.into(),
        }
    }
}

/// Port for creating and removing assignments together with their entries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssignmentRepository: Send + Sync {
    /// Persist an assignment and its initial entries as one atomic batch.
    /// Partial creation must never be observable.
    async fn create_with_entries(
        &self,
        assignment: &SchemaAssignment,
        entries: &[RegulationEntry],
    ) -> Result<(), AssignmentRepositoryError>;

    /// Remove an assignment, cascading its entries. Returns `false` when the
    /// id is absent.
    async fn delete(&self, assignment_id: Uuid) -> Result<bool, AssignmentRepositoryError>;

    /// Find an assignment by id.
    async fn find_by_id(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<SchemaAssignment>, AssignmentRepositoryError>;

    /// List assignments for a vehicle, oldest first.
    async fn list_for_vehicle(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<SchemaAssignment>, AssignmentRepositoryError>;
}

/// Fixture implementation for tests that do not exercise assignments.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAssignmentRepository;

#[async_trait]
impl AssignmentRepository for FixtureAssignmentRepository {
    async fn create_with_entries(
        &self,
        _assignment: &SchemaAssignment,
        _entries: &[RegulationEntry],
    ) -> Result<(), AssignmentRepositoryError> {
        Ok(())
    }

    async fn delete(&self, _assignment_id: Uuid) -> Result<bool, AssignmentRepositoryError> {
        Ok(true)
    }

    async fn find_by_id(
        &self,
        _assignment_id: Uuid,
    ) -> Result<Option<SchemaAssignment>, AssignmentRepositoryError> {
        Ok(None)
    }

    async fn list_for_vehicle(
        &self,
        _vehicle_id: Uuid,
    ) -> Result<Vec<SchemaAssignment>, AssignmentRepositoryError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_list_returns_empty() {
        let repo = FixtureAssignmentRepository;
        let listed = repo
            .list_for_vehicle(Uuid::new_v4())
            .await
            .expect("fixture list succeeds");
        assert!(listed.is_empty());
    }

    #[rstest]
    fn already_assigned_formats_both_ids() {
        let vehicle_id = Uuid::new_v4();
        let schema_id = Uuid::new_v4();
        let err = AssignmentRepositoryError::AlreadyAssigned {
            vehicle_id,
            schema_id,
        };
        let msg = err.to_string();
        assert!(msg.contains(&vehicle_id.to_string()));
        assert!(msg.contains(&schema_id.to_string()));
    }
}
