//! End-to-end lifecycle tests over the in-memory adapters.
//!
//! These drive the real services against [`InMemoryFleetStore`], which runs
//! the same planners as the Diesel adapters, so the scenarios here pin the
//! observable semantics of the whole core: schema lifecycle, assignment,
//! recording, notification idempotence, and the due report.

use std::sync::Arc;

use rstest::{fixture, rstest};
use uuid::Uuid;

use fleet_regulation::domain::ports::{NotificationFeed, TrackingRepository};
use fleet_regulation::domain::{
    AssignmentService, CreateSchemaRequest, ErrorCode, EventType, RecordKmUpdateRequest,
    RecordPerformedRequest, RegulationItemDraft, SchemaRegistryService, TrackingService,
};
use fleet_regulation::test_support::InMemoryFleetStore;

struct World {
    store: InMemoryFleetStore,
    schemas: SchemaRegistryService<InMemoryFleetStore>,
    assignments: AssignmentService<InMemoryFleetStore, InMemoryFleetStore, InMemoryFleetStore>,
    tracking: TrackingService<InMemoryFleetStore, InMemoryFleetStore>,
}

#[fixture]
fn world() -> World {
    let store = InMemoryFleetStore::new();
    let shared = Arc::new(store.clone());
    let schemas = SchemaRegistryService::new(Arc::clone(&shared));
    let assignments =
        AssignmentService::new(Arc::clone(&shared), schemas.clone(), Arc::clone(&shared));
    let tracking = TrackingService::new(Arc::clone(&shared), shared);
    World {
        store,
        schemas,
        assignments,
        tracking,
    }
}

fn item(title: &str, every_km: i64, notify_before_km: i64) -> RegulationItemDraft {
    RegulationItemDraft {
        title: title.to_owned(),
        every_km,
        notify_before_km,
    }
}

fn basic_schema_request() -> CreateSchemaRequest {
    CreateSchemaRequest {
        title: "Basic".to_owned(),
        items: vec![item("Engine oil", 10_000, 500)],
        is_default: false,
        actor: None,
    }
}

async fn assigned_oil_entry(world: &World) -> (Uuid, Uuid) {
    let schema = world
        .schemas
        .create_schema(basic_schema_request())
        .await
        .expect("create schema");
    let vehicle_id = Uuid::new_v4();
    world.store.register_vehicle(vehicle_id);
    let assigned = world
        .assignments
        .assign_schema(vehicle_id, schema.schema.id())
        .await
        .expect("assign schema");
    (assigned.assignment.id, assigned.entries[0].id)
}

#[rstest]
#[tokio::test]
async fn km_update_crossing_the_window_notifies_exactly_once(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;

    // 9_600 falls inside the 9_500..10_000 window.
    let crossed = world
        .tracking
        .record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 9_600,
            actor: None,
        })
        .await
        .expect("record km update");
    let notification = crossed.notification.expect("window crossing notifies");
    assert_eq!(notification.due_km_target, 10_000);
    assert!(notification.message.contains("due in 400 km"));
    assert_eq!(crossed.events.len(), 2);
    assert_eq!(crossed.events[1].event_type, EventType::Notified);

    // A later reading in the same window must not notify again.
    let repeat = world
        .tracking
        .record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 9_700,
            actor: None,
        })
        .await
        .expect("record second km update");
    assert!(repeat.notification.is_none());
    assert_eq!(repeat.events.len(), 1);

    let pending = world
        .store
        .pending_notifications(10)
        .await
        .expect("list pending");
    assert_eq!(pending.len(), 1);
}

#[rstest]
#[tokio::test]
async fn performing_the_service_resets_the_cycle(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;

    world
        .tracking
        .record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 9_600,
            actor: None,
        })
        .await
        .expect("cross the window");

    let record = world
        .tracking
        .record_performed(RecordPerformedRequest {
            entry_id,
            km_at_event: 10_050,
            note: "oil changed".to_owned(),
            actor: None,
        })
        .await
        .expect("record performed");
    assert_eq!(record.entry.last_done_km, 10_050);
    // Remaining is measured against the new 20_050 target.
    assert_eq!(record.event.km_remaining, 10_000);

    // The next cycle's window opens at 19_550 and notifies independently.
    let next_cycle = world
        .tracking
        .record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 19_600,
            actor: None,
        })
        .await
        .expect("cross the next window");
    let notification = next_cycle.notification.expect("new cycle notifies again");
    assert_eq!(notification.due_km_target, 20_050);
}

#[rstest]
#[tokio::test]
async fn regressing_reading_is_rejected_and_leaves_history_untouched(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;

    world
        .tracking
        .record_performed(RecordPerformedRequest {
            entry_id,
            km_at_event: 10_050,
            note: String::new(),
            actor: None,
        })
        .await
        .expect("first service");

    let error = world
        .tracking
        .record_performed(RecordPerformedRequest {
            entry_id,
            km_at_event: 9_000,
            note: String::new(),
            actor: None,
        })
        .await
        .expect_err("regression must be rejected");
    assert_eq!(error.code(), ErrorCode::InvalidRequest);

    let history = world
        .tracking
        .entry_history(entry_id)
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event_type, EventType::Performed);
    assert_eq!(history[0].km_at_event, 10_050);
}

#[rstest]
#[tokio::test]
async fn history_is_returned_newest_first(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;

    for km in [1_000, 2_000, 3_000] {
        world
            .tracking
            .record_km_update(RecordKmUpdateRequest {
                entry_id,
                current_km: km,
                actor: None,
            })
            .await
            .expect("record km update");
    }

    let history = world
        .tracking
        .entry_history(entry_id)
        .await
        .expect("history");
    let readings: Vec<i64> = history.iter().map(|event| event.km_at_event).collect();
    assert_eq!(readings, vec![3_000, 2_000, 1_000]);
}

#[rstest]
#[tokio::test]
async fn due_report_reflects_every_entry_of_the_assignment(world: World) {
    let schema = world
        .schemas
        .create_schema(CreateSchemaRequest {
            title: "Full".to_owned(),
            items: vec![
                item("Engine oil", 10_000, 500),
                item("Air filter", 20_000, 1_000),
            ],
            is_default: false,
            actor: None,
        })
        .await
        .expect("create schema");
    let vehicle_id = Uuid::new_v4();
    world.store.register_vehicle(vehicle_id);
    let assigned = world
        .assignments
        .assign_schema(vehicle_id, schema.schema.id())
        .await
        .expect("assign schema");

    let report = world
        .tracking
        .due_report(assigned.assignment.id, 10_200)
        .await
        .expect("due report");

    assert_eq!(report.len(), 2);
    // Items are reported in title order.
    assert_eq!(report[0].item_title, "Air filter");
    assert!(!report[0].is_due);
    assert_eq!(report[0].km_remaining, 9_800);
    assert_eq!(report[1].item_title, "Engine oil");
    assert!(report[1].is_due);
    assert_eq!(report[1].km_remaining, -200);
}

#[rstest]
#[tokio::test]
async fn default_flag_moves_between_schemas(world: World) {
    let first = world
        .schemas
        .create_schema(CreateSchemaRequest {
            title: "First".to_owned(),
            items: vec![item("Engine oil", 10_000, 500)],
            is_default: true,
            actor: None,
        })
        .await
        .expect("create first");
    let second = world
        .schemas
        .create_schema(CreateSchemaRequest {
            title: "Second".to_owned(),
            items: vec![item("Engine oil", 10_000, 500)],
            is_default: false,
            actor: None,
        })
        .await
        .expect("create second");

    let default = world
        .schemas
        .default_schema()
        .await
        .expect("default lookup")
        .expect("first is default");
    assert_eq!(default.schema.id(), first.schema.id());

    world
        .schemas
        .set_default(second.schema.id())
        .await
        .expect("move default");

    let default = world
        .schemas
        .default_schema()
        .await
        .expect("default lookup")
        .expect("second is default");
    assert_eq!(default.schema.id(), second.schema.id());

    let flagged: Vec<bool> = world
        .schemas
        .list_schemas()
        .await
        .expect("list")
        .iter()
        .map(|schema| schema.schema.is_default())
        .collect();
    assert_eq!(flagged.iter().filter(|is_default| **is_default).count(), 1);
}

#[rstest]
#[tokio::test]
async fn assigned_schema_cannot_be_deleted_until_unassigned(world: World) {
    let (assignment_id, _) = assigned_oil_entry(&world).await;
    let schema = world
        .schemas
        .list_schemas()
        .await
        .expect("list")
        .remove(0);

    let error = world
        .schemas
        .delete_schema(schema.schema.id())
        .await
        .expect_err("assignment blocks deletion");
    assert_eq!(error.code(), ErrorCode::Conflict);

    world
        .assignments
        .remove_assignment(assignment_id)
        .await
        .expect("remove assignment");
    world
        .schemas
        .delete_schema(schema.schema.id())
        .await
        .expect("deletion succeeds once unassigned");
}

#[rstest]
#[tokio::test]
async fn duplicate_assignment_of_the_same_schema_conflicts(world: World) {
    let schema = world
        .schemas
        .create_schema(basic_schema_request())
        .await
        .expect("create schema");
    let vehicle_id = Uuid::new_v4();
    world.store.register_vehicle(vehicle_id);

    world
        .assignments
        .assign_schema(vehicle_id, schema.schema.id())
        .await
        .expect("first assignment");
    let error = world
        .assignments
        .assign_schema(vehicle_id, schema.schema.id())
        .await
        .expect_err("second assignment conflicts");
    assert_eq!(error.code(), ErrorCode::Conflict);
}

#[rstest]
#[tokio::test]
async fn unknown_vehicle_is_rejected_on_assignment(world: World) {
    let schema = world
        .schemas
        .create_schema(basic_schema_request())
        .await
        .expect("create schema");

    let error = world
        .assignments
        .assign_schema(Uuid::new_v4(), schema.schema.id())
        .await
        .expect_err("unregistered vehicle");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn set_default_on_unknown_id_leaves_the_current_default_untouched(world: World) {
    let schema = world
        .schemas
        .create_schema(CreateSchemaRequest {
            is_default: true,
            ..basic_schema_request()
        })
        .await
        .expect("create default schema");

    let error = world
        .schemas
        .set_default(Uuid::new_v4())
        .await
        .expect_err("unknown schema id");
    assert_eq!(error.code(), ErrorCode::NotFound);

    let default = world
        .schemas
        .default_schema()
        .await
        .expect("default lookup")
        .expect("default survives the failed call");
    assert_eq!(default.schema.id(), schema.schema.id());
}

#[rstest]
#[tokio::test]
async fn concurrent_set_default_calls_leave_exactly_one_default(world: World) {
    let first = world
        .schemas
        .create_schema(CreateSchemaRequest {
            title: "First".to_owned(),
            ..basic_schema_request()
        })
        .await
        .expect("create first");
    let second = world
        .schemas
        .create_schema(CreateSchemaRequest {
            title: "Second".to_owned(),
            ..basic_schema_request()
        })
        .await
        .expect("create second");

    let (a, b) = tokio::join!(
        world.schemas.set_default(first.schema.id()),
        world.schemas.set_default(second.schema.id()),
    );
    a.expect("first call succeeds");
    b.expect("second call succeeds");

    let defaults = world
        .schemas
        .list_schemas()
        .await
        .expect("list")
        .iter()
        .filter(|schema| schema.schema.is_default())
        .count();
    assert_eq!(defaults, 1);
}

#[rstest]
#[tokio::test]
async fn concurrent_window_crossings_notify_exactly_once(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;

    let (a, b) = tokio::join!(
        world.tracking.record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 9_600,
            actor: None,
        }),
        world.tracking.record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 9_700,
            actor: None,
        }),
    );
    let notifications = [a.expect("first update"), b.expect("second update")]
        .iter()
        .filter(|record| record.notification.is_some())
        .count();
    assert_eq!(notifications, 1);

    assert_eq!(world.store.notifications().len(), 1);
}

#[rstest]
#[tokio::test]
async fn concurrent_service_records_never_regress_the_baseline(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;

    // 10_500 is monotonic in either interleaving; 10_000 regresses when it
    // lands second and must then be rejected.
    let (low, high) = tokio::join!(
        world.tracking.record_performed(RecordPerformedRequest {
            entry_id,
            km_at_event: 10_000,
            note: String::new(),
            actor: None,
        }),
        world.tracking.record_performed(RecordPerformedRequest {
            entry_id,
            km_at_event: 10_500,
            note: String::new(),
            actor: None,
        }),
    );
    let record = high.expect("higher reading is always monotonic");
    assert_eq!(record.entry.last_done_km, 10_500);
    if let Err(error) = low {
        assert_eq!(error.code(), ErrorCode::InvalidRequest);
    }

    let entry = world
        .store
        .load_entry(entry_id)
        .await
        .expect("load entry")
        .expect("entry exists");
    assert_eq!(entry.entry.last_done_km, 10_500);

    let history = world
        .tracking
        .entry_history(entry_id)
        .await
        .expect("history");
    let mut chronological: Vec<i64> = history.iter().map(|event| event.km_at_event).collect();
    chronological.reverse();
    assert!(chronological.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[rstest]
#[tokio::test]
async fn non_positive_feed_limit_yields_no_rows(world: World) {
    let (_, entry_id) = assigned_oil_entry(&world).await;
    world
        .tracking
        .record_km_update(RecordKmUpdateRequest {
            entry_id,
            current_km: 9_600,
            actor: None,
        })
        .await
        .expect("create a pending notification");

    for limit in [-1, 0] {
        let pending = world
            .store
            .pending_notifications(limit)
            .await
            .expect("feed call succeeds");
        assert!(pending.is_empty());
    }

    let pending = world
        .store
        .pending_notifications(10)
        .await
        .expect("feed call succeeds");
    assert_eq!(pending.len(), 1);
}

#[rstest]
#[tokio::test]
async fn duplicate_schema_title_conflicts(world: World) {
    world
        .schemas
        .create_schema(basic_schema_request())
        .await
        .expect("create schema");

    let error = world
        .schemas
        .create_schema(basic_schema_request())
        .await
        .expect_err("duplicate title");
    assert_eq!(error.code(), ErrorCode::Conflict);
}
