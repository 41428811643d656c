//! Assignment service.
//!
//! Binds schemas to vehicles and initialises the per-item entries. Entry
//! creation assumes the vehicle's regulation clock starts now; callers that
//! need backdating must pre-adjust readings through the recorder.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use super::Error;
use super::ports::{
    AssignmentRepository, AssignmentRepositoryError, SchemaRepository, VehicleRegistry,
    VehicleRegistryError,
};
use super::schema_service::SchemaRegistryService;
use super::tracking::{RegulationEntry, SchemaAssignment};

/// An assignment together with its freshly initialised entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentWithEntries {
    /// The created assignment.
    pub assignment: SchemaAssignment,
    /// One entry per schema item, all starting at `last_done_km = 0`.
    pub entries: Vec<RegulationEntry>,
}

fn map_repository_error(error: AssignmentRepositoryError) -> Error {
    match error {
        AssignmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("assignment repository unavailable: {message}"))
        }
        AssignmentRepositoryError::Query { message } => {
            Error::internal(format!("assignment repository error: {message}"))
        }
        AssignmentRepositoryError::AlreadyAssigned {
            vehicle_id,
            schema_id,
        } => Error::conflict(format!(
            "vehicle {vehicle_id} already has schema {schema_id} assigned"
        )),
        AssignmentRepositoryError::MissingReference { message } => {
            Error::not_found(format!("assignment reference vanished: {message}"))
        }
    }
}

fn map_registry_error(error: VehicleRegistryError) -> Error {
    match error {
        VehicleRegistryError::Connection { message } => {
            Error::service_unavailable(format!("vehicle registry unavailable: {message}"))
        }
        VehicleRegistryError::Query { message } => {
            Error::internal(format!("vehicle registry error: {message}"))
        }
    }
}

/// Driving service for schema assignment.
#[derive(Clone)]
pub struct AssignmentService<A, S, V> {
    assignments: Arc<A>,
    schemas: SchemaRegistryService<S>,
    vehicles: Arc<V>,
}

impl<A, S, V> AssignmentService<A, S, V> {
    /// Create a new assignment service from its collaborators.
    pub fn new(assignments: Arc<A>, schemas: SchemaRegistryService<S>, vehicles: Arc<V>) -> Self {
        Self {
            assignments,
            schemas,
            vehicles,
        }
    }
}

impl<A, S, V> AssignmentService<A, S, V>
where
    A: AssignmentRepository,
    S: SchemaRepository,
    V: VehicleRegistry,
{
    /// Assign a schema to a vehicle and initialise one entry per item.
    ///
    /// The assignment and its entries are written as one atomic batch, so a
    /// partially initialised assignment is never observable.
    pub async fn assign_schema(
        &self,
        vehicle_id: Uuid,
        schema_id: Uuid,
    ) -> Result<AssignmentWithEntries, Error> {
        let known = self
            .vehicles
            .exists(vehicle_id)
            .await
            .map_err(map_registry_error)?;
        if !known {
            return Err(Error::not_found(format!("vehicle {vehicle_id} not found")));
        }

        let schema = self.schemas.get_schema(schema_id).await?;

        let now = Utc::now();
        let assignment = SchemaAssignment {
            id: Uuid::new_v4(),
            vehicle_id,
            schema_id,
            assigned_at: now,
        };
        let entries: Vec<RegulationEntry> = schema
            .items
            .iter()
            .map(|item| RegulationEntry {
                id: Uuid::new_v4(),
                assignment_id: assignment.id,
                item_id: item.id(),
                last_done_km: 0,
                updated_at: now,
            })
            .collect();

        self.assignments
            .create_with_entries(&assignment, &entries)
            .await
            .map_err(map_repository_error)?;

        info!(
            assignment_id = %assignment.id,
            %vehicle_id,
            %schema_id,
            entries = entries.len(),
            "schema assigned to vehicle"
        );
        Ok(AssignmentWithEntries {
            assignment,
            entries,
        })
    }

    /// Remove an assignment, cascading its entries.
    pub async fn remove_assignment(&self, assignment_id: Uuid) -> Result<(), Error> {
        let found = self
            .assignments
            .delete(assignment_id)
            .await
            .map_err(map_repository_error)?;
        if !found {
            return Err(Error::not_found(format!(
                "assignment {assignment_id} not found"
            )));
        }
        info!(%assignment_id, "assignment removed");
        Ok(())
    }

    /// Fetch an assignment by id.
    pub async fn get_assignment(&self, assignment_id: Uuid) -> Result<SchemaAssignment, Error> {
        self.assignments
            .find_by_id(assignment_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("assignment {assignment_id} not found")))
    }

    /// List assignments for a vehicle, oldest first.
    pub async fn assignments_for_vehicle(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<SchemaAssignment>, Error> {
        self.assignments
            .list_for_vehicle(vehicle_id)
            .await
            .map_err(map_repository_error)
    }
}

#[cfg(test)]
#[path = "assignment_service_tests.rs"]
mod tests;
