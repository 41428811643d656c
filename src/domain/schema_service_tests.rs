//! Tests for the schema registry service.

use std::sync::Arc;

use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::MockSchemaRepository;
use crate::domain::schema::RegulationItemDraft;

fn sample_request() -> CreateSchemaRequest {
    CreateSchemaRequest {
        title: "Basic".to_owned(),
        items: vec![RegulationItemDraft {
            title: "Engine oil".to_owned(),
            every_km: 10_000,
            notify_before_km: 500,
        }],
        is_default: false,
        actor: Some(Uuid::new_v4()),
    }
}

#[tokio::test]
async fn create_schema_persists_validated_draft() {
    let request = sample_request();

    let mut repo = MockSchemaRepository::new();
    repo.expect_insert_schema()
        .times(1)
        .withf(|schema| schema.schema.title() == "Basic" && schema.items.len() == 1)
        .return_once(|_| Ok(()));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let created = service
        .create_schema(request)
        .await
        .expect("create succeeds");

    assert_eq!(created.schema.title(), "Basic");
    assert!(!created.schema.is_default());
    assert_eq!(created.items[0].every_km(), 10_000);
}

#[tokio::test]
async fn create_schema_rejects_non_positive_interval_without_touching_the_repo() {
    let mut request = sample_request();
    request.items[0].every_km = 0;

    let mut repo = MockSchemaRepository::new();
    repo.expect_insert_schema().times(0);

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .create_schema(request)
        .await
        .expect_err("invalid interval");

    assert_eq!(error.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn create_schema_maps_duplicate_title_to_conflict() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_insert_schema()
        .times(1)
        .return_once(|_| Err(SchemaRepositoryError::duplicate_title("Basic")));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .create_schema(sample_request())
        .await
        .expect_err("duplicate title");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert!(error.message().contains("'Basic'"));
}

#[tokio::test]
async fn create_schema_maps_default_contention_to_conflict() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_insert_schema()
        .times(1)
        .return_once(|_| Err(SchemaRepositoryError::DefaultContention));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .create_schema(CreateSchemaRequest {
            is_default: true,
            ..sample_request()
        })
        .await
        .expect_err("lost the default race");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert!(error.message().contains("retry"));
}

#[tokio::test]
async fn create_schema_maps_connection_error_to_service_unavailable() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_insert_schema()
        .times(1)
        .return_once(|_| Err(SchemaRepositoryError::connection("pool unavailable")));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .create_schema(sample_request())
        .await
        .expect_err("service unavailable");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
}

#[tokio::test]
async fn set_default_returns_not_found_for_unknown_schema() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_set_default().times(1).return_once(|_| Ok(false));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .set_default(Uuid::new_v4())
        .await
        .expect_err("unknown schema");

    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn delete_schema_maps_live_assignments_to_conflict() {
    let schema_id = Uuid::new_v4();

    let mut repo = MockSchemaRepository::new();
    repo.expect_delete_schema()
        .times(1)
        .return_once(move |_| Err(SchemaRepositoryError::HasAssignments { schema_id }));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .delete_schema(schema_id)
        .await
        .expect_err("protected schema");

    assert_eq!(error.code(), ErrorCode::Conflict);
    assert!(error.message().contains("live assignments"));
}

#[tokio::test]
async fn get_schema_returns_not_found_when_missing() {
    let mut repo = MockSchemaRepository::new();
    repo.expect_find_by_id().times(1).return_once(|_| Ok(None));

    let service = SchemaRegistryService::new(Arc::new(repo));
    let error = service
        .get_schema(Uuid::new_v4())
        .await
        .expect_err("missing schema");

    assert_eq!(error.code(), ErrorCode::NotFound);
}
