//! Conversions from Diesel rows into validated domain types.
//!
//! Shared by the repository adapters; every conversion goes through a
//! validating domain constructor or parser so corrupt rows surface as query
//! errors instead of leaking into the domain.

use crate::domain::schema::{RegulationItem, RegulationSchema};
use crate::domain::tracking::{
    EntryWithItem, HistoryEvent, RegulationEntry, RegulationNotification, SchemaAssignment,
};

use super::models::{AssignmentRow, EntryRow, HistoryEventRow, ItemRow, NotificationRow, SchemaRow};

pub(crate) fn schema_from_row(row: SchemaRow) -> Result<RegulationSchema, String> {
    RegulationSchema::from_parts(
        row.id,
        row.title,
        row.is_default,
        row.created_by,
        row.created_at,
    )
    .map_err(|err| err.to_string())
}

pub(crate) fn item_from_row(row: ItemRow) -> Result<RegulationItem, String> {
    RegulationItem::from_parts(
        row.id,
        row.schema_id,
        row.title,
        row.every_km,
        row.notify_before_km,
    )
    .map_err(|err| err.to_string())
}

pub(crate) fn assignment_from_row(row: AssignmentRow) -> SchemaAssignment {
    SchemaAssignment {
        id: row.id,
        vehicle_id: row.vehicle_id,
        schema_id: row.schema_id,
        assigned_at: row.assigned_at,
    }
}

pub(crate) fn entry_from_row(row: EntryRow) -> RegulationEntry {
    RegulationEntry {
        id: row.id,
        assignment_id: row.assignment_id,
        item_id: row.item_id,
        last_done_km: row.last_done_km,
        updated_at: row.updated_at,
    }
}

pub(crate) fn entry_with_item_from_rows(
    entry: EntryRow,
    item: ItemRow,
) -> Result<EntryWithItem, String> {
    Ok(EntryWithItem {
        entry: entry_from_row(entry),
        item: item_from_row(item)?,
    })
}

pub(crate) fn event_from_row(row: HistoryEventRow) -> Result<HistoryEvent, String> {
    Ok(HistoryEvent {
        id: row.id,
        entry_id: row.entry_id,
        event_type: row.event_type.parse().map_err(|err| format!("{err}"))?,
        km_at_event: row.km_at_event,
        km_remaining: row.km_remaining,
        note: row.note,
        recorded_by: row.recorded_by,
        created_at: row.created_at,
    })
}

pub(crate) fn notification_from_row(
    row: NotificationRow,
) -> Result<RegulationNotification, String> {
    Ok(RegulationNotification {
        id: row.id,
        assignment_id: row.assignment_id,
        entry_id: row.entry_id,
        due_km_target: row.due_km_target,
        message: row.message,
        send_at: row.send_at,
        status: row.status.parse().map_err(|err| format!("{err}"))?,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rstest::rstest;
    use uuid::Uuid;

    use super::*;

    #[rstest]
    fn corrupt_event_type_is_reported() {
        let row = HistoryEventRow {
            id: Uuid::new_v4(),
            entry_id: Uuid::new_v4(),
            event_type: "repainted".to_owned(),
            km_at_event: 100,
            km_remaining: 900,
            note: String::new(),
            recorded_by: None,
            created_at: Utc::now(),
        };
        let error = event_from_row(row).expect_err("unknown event type");
        assert!(error.contains("repainted"));
    }

    #[rstest]
    fn corrupt_interval_is_reported() {
        let row = ItemRow {
            id: Uuid::new_v4(),
            schema_id: Uuid::new_v4(),
            title: "Engine oil".to_owned(),
            every_km: 0,
            notify_before_km: 500,
        };
        let error = item_from_row(row).expect_err("zero interval");
        assert!(error.contains("non-positive"));
    }
}
