//! Tests for the assignment service.

use std::sync::Arc;

use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    MockAssignmentRepository, MockSchemaRepository, MockVehicleRegistry, SchemaRepositoryError,
};
use crate::domain::schema::{RegulationItemDraft, RegulationSchemaDraft, SchemaWithItems};

fn two_item_schema() -> SchemaWithItems {
    SchemaWithItems::new(RegulationSchemaDraft {
        title: "Basic".to_owned(),
        is_default: false,
        items: vec![
            RegulationItemDraft {
                title: "Engine oil".to_owned(),
                every_km: 10_000,
                notify_before_km: 500,
            },
            RegulationItemDraft {
                title: "Air filter".to_owned(),
                every_km: 20_000,
                notify_before_km: 1_000,
            },
        ],
        created_by: None,
    })
    .expect("valid schema")
}

fn service_with(
    assignments: MockAssignmentRepository,
    schemas: MockSchemaRepository,
    vehicles: MockVehicleRegistry,
) -> AssignmentService<MockAssignmentRepository, MockSchemaRepository, MockVehicleRegistry> {
    AssignmentService::new(
        Arc::new(assignments),
        SchemaRegistryService::new(Arc::new(schemas)),
        Arc::new(vehicles),
    )
}

#[tokio::test]
async fn assign_schema_initialises_one_entry_per_item_at_zero() {
    let schema = two_item_schema();
    let schema_id = schema.schema.id();

    let mut vehicles = MockVehicleRegistry::new();
    vehicles.expect_exists().times(1).return_once(|_| Ok(true));

    let mut schemas = MockSchemaRepository::new();
    schemas
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(schema)));

    let mut assignments = MockAssignmentRepository::new();
    assignments
        .expect_create_with_entries()
        .times(1)
        .withf(|assignment, entries| {
            entries.len() == 2
                && entries
                    .iter()
                    .all(|e| e.last_done_km == 0 && e.assignment_id == assignment.id)
        })
        .return_once(|_, _| Ok(()));

    let service = service_with(assignments, schemas, vehicles);
    let created = service
        .assign_schema(Uuid::new_v4(), schema_id)
        .await
        .expect("assign succeeds");

    assert_eq!(created.assignment.schema_id, schema_id);
    assert_eq!(created.entries.len(), 2);
}

#[tokio::test]
async fn assign_schema_rejects_unknown_vehicle() {
    let mut vehicles = MockVehicleRegistry::new();
    vehicles.expect_exists().times(1).return_once(|_| Ok(false));

    let mut schemas = MockSchemaRepository::new();
    schemas.expect_find_by_id().times(0);

    let mut assignments = MockAssignmentRepository::new();
    assignments.expect_create_with_entries().times(0);

    let service = service_with(assignments, schemas, vehicles);
    let error = service
        .assign_schema(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("unknown vehicle");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert!(error.message().contains("vehicle"));
}

#[tokio::test]
async fn assign_schema_rejects_unknown_schema() {
    let mut vehicles = MockVehicleRegistry::new();
    vehicles.expect_exists().times(1).return_once(|_| Ok(true));

    let mut schemas = MockSchemaRepository::new();
    schemas.expect_find_by_id().times(1).return_once(|_| Ok(None));

    let mut assignments = MockAssignmentRepository::new();
    assignments.expect_create_with_entries().times(0);

    let service = service_with(assignments, schemas, vehicles);
    let error = service
        .assign_schema(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("unknown schema");

    assert_eq!(error.code(), ErrorCode::NotFound);
    assert!(error.message().contains("schema"));
}

#[tokio::test]
async fn assign_schema_maps_duplicate_pair_to_conflict() {
    let schema = two_item_schema();
    let schema_id = schema.schema.id();
    let vehicle_id = Uuid::new_v4();

    let mut vehicles = MockVehicleRegistry::new();
    vehicles.expect_exists().times(1).return_once(|_| Ok(true));

    let mut schemas = MockSchemaRepository::new();
    schemas
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(schema)));

    let mut assignments = MockAssignmentRepository::new();
    assignments
        .expect_create_with_entries()
        .times(1)
        .return_once(move |_, _| {
            Err(AssignmentRepositoryError::AlreadyAssigned {
                vehicle_id,
                schema_id,
            })
        });

    let service = service_with(assignments, schemas, vehicles);
    let error = service
        .assign_schema(vehicle_id, schema_id)
        .await
        .expect_err("duplicate assignment");

    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn assign_schema_maps_schema_repo_outage_to_service_unavailable() {
    let mut vehicles = MockVehicleRegistry::new();
    vehicles.expect_exists().times(1).return_once(|_| Ok(true));

    let mut schemas = MockSchemaRepository::new();
    schemas
        .expect_find_by_id()
        .times(1)
        .return_once(|_| Err(SchemaRepositoryError::connection("pool unavailable")));

    let mut assignments = MockAssignmentRepository::new();
    assignments.expect_create_with_entries().times(0);

    let service = service_with(assignments, schemas, vehicles);
    let error = service
        .assign_schema(Uuid::new_v4(), Uuid::new_v4())
        .await
        .expect_err("repo outage");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn remove_assignment_returns_not_found_for_unknown_id() {
    let vehicles = MockVehicleRegistry::new();
    let schemas = MockSchemaRepository::new();
    let mut assignments = MockAssignmentRepository::new();
    assignments.expect_delete().times(1).return_once(|_| Ok(false));

    let service = service_with(assignments, schemas, vehicles);
    let error = service
        .remove_assignment(Uuid::new_v4())
        .await
        .expect_err("unknown assignment");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
