//! In-memory port implementations for tests.
//!
//! One shared store implements all five ports so a test can wire the
//! services against a single coherent state. The recording operations run
//! the same domain planners as the Diesel adapters, with the whole store
//! behind one mutex standing in for the per-entry row locks.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::ports::{
    AssignmentRepository, AssignmentRepositoryError, KmUpdateRecord, NotificationFeed,
    NotificationFeedError, PerformedRecord, SchemaRepository, SchemaRepositoryError,
    TrackingRepository, TrackingRepositoryError, VehicleRegistry, VehicleRegistryError,
};
use crate::domain::recorder::{plan_km_update, plan_performed};
use crate::domain::schema::{RegulationItem, SchemaWithItems};
use crate::domain::tracking::{
    EntryWithItem, HistoryEvent, NotificationStatus, RegulationEntry, RegulationNotification,
    SchemaAssignment,
};

#[derive(Debug, Default)]
struct StoreState {
    schemas: HashMap<Uuid, SchemaWithItems>,
    items: HashMap<Uuid, RegulationItem>,
    assignments: HashMap<Uuid, SchemaAssignment>,
    entries: HashMap<Uuid, RegulationEntry>,
    events: Vec<HistoryEvent>,
    notifications: Vec<RegulationNotification>,
    notified_targets: HashSet<(Uuid, i64)>,
    vehicles: HashSet<Uuid>,
}

/// Shared in-memory store implementing every port of the crate.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFleetStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryFleetStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a vehicle id known to the registry side of the store.
    pub fn register_vehicle(&self, vehicle_id: Uuid) {
        self.lock().vehicles.insert(vehicle_id);
    }

    /// Snapshot of every notification, regardless of status.
    pub fn notifications(&self) -> Vec<RegulationNotification> {
        self.lock().notifications.clone()
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl SchemaRepository for InMemoryFleetStore {
    async fn insert_schema(&self, schema: &SchemaWithItems) -> Result<(), SchemaRepositoryError> {
        let mut state = self.lock();

        if state
            .schemas
            .values()
            .any(|existing| existing.schema.title() == schema.schema.title())
        {
            return Err(SchemaRepositoryError::duplicate_title(
                schema.schema.title(),
            ));
        }

        if schema.schema.is_default() {
            clear_default(&mut state);
        }
        for item in &schema.items {
            state.items.insert(item.id(), item.clone());
        }
        state.schemas.insert(schema.schema.id(), schema.clone());
        Ok(())
    }

    async fn set_default(&self, schema_id: Uuid) -> Result<bool, SchemaRepositoryError> {
        let mut state = self.lock();

        if !state.schemas.contains_key(&schema_id) {
            return Ok(false);
        }

        clear_default(&mut state);
        if let Some(target) = state.schemas.get_mut(&schema_id) {
            target.schema = target.schema.with_default(true);
        }
        Ok(true)
    }

    async fn delete_schema(&self, schema_id: Uuid) -> Result<bool, SchemaRepositoryError> {
        let mut state = self.lock();

        if state
            .assignments
            .values()
            .any(|assignment| assignment.schema_id == schema_id)
        {
            return Err(SchemaRepositoryError::HasAssignments { schema_id });
        }

        let Some(removed) = state.schemas.remove(&schema_id) else {
            return Ok(false);
        };
        for item in &removed.items {
            state.items.remove(&item.id());
        }
        Ok(true)
    }

    async fn find_by_id(
        &self,
        schema_id: Uuid,
    ) -> Result<Option<SchemaWithItems>, SchemaRepositoryError> {
        Ok(self.lock().schemas.get(&schema_id).cloned())
    }

    async fn find_default(&self) -> Result<Option<SchemaWithItems>, SchemaRepositoryError> {
        Ok(self
            .lock()
            .schemas
            .values()
            .find(|schema| schema.schema.is_default())
            .cloned())
    }

    async fn list(&self) -> Result<Vec<SchemaWithItems>, SchemaRepositoryError> {
        let mut schemas: Vec<SchemaWithItems> = self.lock().schemas.values().cloned().collect();
        schemas.sort_by(|a, b| a.schema.title().cmp(b.schema.title()));
        Ok(schemas)
    }
}

fn clear_default(state: &mut StoreState) {
    let cleared: Vec<Uuid> = state
        .schemas
        .values()
        .filter(|schema| schema.schema.is_default())
        .map(|schema| schema.schema.id())
        .collect();
    for id in cleared {
        if let Some(schema) = state.schemas.get_mut(&id) {
            schema.schema = schema.schema.with_default(false);
        }
    }
}

#[async_trait]
impl AssignmentRepository for InMemoryFleetStore {
    async fn create_with_entries(
        &self,
        assignment: &SchemaAssignment,
        entries: &[RegulationEntry],
    ) -> Result<(), AssignmentRepositoryError> {
        let mut state = self.lock();

        if !state.schemas.contains_key(&assignment.schema_id) {
            return Err(AssignmentRepositoryError::missing_reference(format!(
                "schema {} does not exist",
                assignment.schema_id
            )));
        }
        if !state.vehicles.contains(&assignment.vehicle_id) {
            return Err(AssignmentRepositoryError::missing_reference(format!(
                "vehicle {} does not exist",
                assignment.vehicle_id
            )));
        }
        if state.assignments.values().any(|existing| {
            existing.vehicle_id == assignment.vehicle_id
                && existing.schema_id == assignment.schema_id
        }) {
            return Err(AssignmentRepositoryError::AlreadyAssigned {
                vehicle_id: assignment.vehicle_id,
                schema_id: assignment.schema_id,
            });
        }

        state.assignments.insert(assignment.id, assignment.clone());
        for entry in entries {
            state.entries.insert(entry.id, entry.clone());
        }
        Ok(())
    }

    async fn delete(&self, assignment_id: Uuid) -> Result<bool, AssignmentRepositoryError> {
        let mut state = self.lock();

        if state.assignments.remove(&assignment_id).is_none() {
            return Ok(false);
        }

        // Mirror the cascading foreign keys of the relational adapter.
        let removed_entries: HashSet<Uuid> = state
            .entries
            .values()
            .filter(|entry| entry.assignment_id == assignment_id)
            .map(|entry| entry.id)
            .collect();
        state.entries.retain(|_, entry| entry.assignment_id != assignment_id);
        state
            .events
            .retain(|event| !removed_entries.contains(&event.entry_id));
        state
            .notifications
            .retain(|notification| notification.assignment_id != assignment_id);
        Ok(true)
    }

    async fn find_by_id(
        &self,
        assignment_id: Uuid,
    ) -> Result<Option<SchemaAssignment>, AssignmentRepositoryError> {
        Ok(self.lock().assignments.get(&assignment_id).cloned())
    }

    async fn list_for_vehicle(
        &self,
        vehicle_id: Uuid,
    ) -> Result<Vec<SchemaAssignment>, AssignmentRepositoryError> {
        let mut assignments: Vec<SchemaAssignment> = self
            .lock()
            .assignments
            .values()
            .filter(|assignment| assignment.vehicle_id == vehicle_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| a.assigned_at.cmp(&b.assigned_at).then(a.id.cmp(&b.id)));
        Ok(assignments)
    }
}

fn joined_entry(
    state: &StoreState,
    entry: &RegulationEntry,
) -> Result<EntryWithItem, TrackingRepositoryError> {
    let item = state.items.get(&entry.item_id).ok_or_else(|| {
        TrackingRepositoryError::query(format!("item {} missing for entry {}", entry.item_id, entry.id))
    })?;
    Ok(EntryWithItem {
        entry: entry.clone(),
        item: item.clone(),
    })
}

#[async_trait]
impl TrackingRepository for InMemoryFleetStore {
    async fn load_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<EntryWithItem>, TrackingRepositoryError> {
        let state = self.lock();
        state
            .entries
            .get(&entry_id)
            .map(|entry| joined_entry(&state, entry))
            .transpose()
    }

    async fn list_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<EntryWithItem>, TrackingRepositoryError> {
        let state = self.lock();
        let mut entries = state
            .entries
            .values()
            .filter(|entry| entry.assignment_id == assignment_id)
            .map(|entry| joined_entry(&state, entry))
            .collect::<Result<Vec<EntryWithItem>, _>>()?;
        entries.sort_by(|a, b| a.item.title().cmp(b.item.title()));
        Ok(entries)
    }

    async fn record_performed(
        &self,
        entry_id: Uuid,
        km_at_event: i64,
        note: String,
        recorded_by: Option<Uuid>,
    ) -> Result<PerformedRecord, TrackingRepositoryError> {
        let mut state = self.lock();
        let Some(entry) = state.entries.get(&entry_id) else {
            return Err(TrackingRepositoryError::EntryMissing { entry_id });
        };
        let current = joined_entry(&state, entry)?;

        let plan = plan_performed(&current, km_at_event, note, recorded_by, Utc::now()).map_err(
            |err| TrackingRepositoryError::KmRegression {
                entry_id: err.entry_id,
                last_done_km: err.last_done_km,
            },
        )?;

        state.entries.insert(entry_id, plan.entry.clone());
        state.events.push(plan.event.clone());
        Ok(PerformedRecord {
            entry: plan.entry,
            event: plan.event,
        })
    }

    async fn record_km_update(
        &self,
        entry_id: Uuid,
        current_km: i64,
        recorded_by: Option<Uuid>,
    ) -> Result<KmUpdateRecord, TrackingRepositoryError> {
        let mut state = self.lock();
        let Some(entry) = state.entries.get(&entry_id) else {
            return Err(TrackingRepositoryError::EntryMissing { entry_id });
        };
        let current = joined_entry(&state, entry)?;

        let plan = plan_km_update(&current, current_km, recorded_by, Utc::now());
        state.events.push(plan.km_update_event.clone());

        let mut events = vec![plan.km_update_event];
        let mut notification = None;

        if let Some(notify) = plan.notify {
            let target = (entry_id, notify.notification.due_km_target);
            if state.notified_targets.insert(target) {
                state.notifications.push(notify.notification.clone());
                state.events.push(notify.event.clone());
                events.push(notify.event);
                notification = Some(notify.notification);
            }
        }

        Ok(KmUpdateRecord {
            events,
            notification,
        })
    }

    async fn entry_history(
        &self,
        entry_id: Uuid,
    ) -> Result<Vec<HistoryEvent>, TrackingRepositoryError> {
        // Events are appended chronologically, so newest-first is a reverse
        // scan.
        Ok(self
            .lock()
            .events
            .iter()
            .rev()
            .filter(|event| event.entry_id == entry_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl VehicleRegistry for InMemoryFleetStore {
    async fn exists(&self, vehicle_id: Uuid) -> Result<bool, VehicleRegistryError> {
        Ok(self.lock().vehicles.contains(&vehicle_id))
    }
}

#[async_trait]
impl NotificationFeed for InMemoryFleetStore {
    async fn pending_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<RegulationNotification>, NotificationFeedError> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|notification| notification.status == NotificationStatus::Pending)
            .take(usize::try_from(limit.max(0)).unwrap_or(0))
            .cloned()
            .collect())
    }
}
