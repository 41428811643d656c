//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types go
//! through the validating constructors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    regulation_assignments, regulation_entries, regulation_history_events, regulation_items,
    regulation_notifications, regulation_schemas,
};

/// Row struct for reading from the regulation_schemas table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regulation_schemas)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SchemaRow {
    pub id: Uuid,
    pub title: String,
    pub is_default: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating schema records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = regulation_schemas)]
pub(crate) struct NewSchemaRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub is_default: bool,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the regulation_items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regulation_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: Uuid,
    pub schema_id: Uuid,
    pub title: String,
    pub every_km: i64,
    pub notify_before_km: i64,
}

/// Insertable struct for creating item records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = regulation_items)]
pub(crate) struct NewItemRow<'a> {
    pub id: Uuid,
    pub schema_id: Uuid,
    pub title: &'a str,
    pub every_km: i64,
    pub notify_before_km: i64,
}

/// Row struct for reading from the regulation_assignments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regulation_assignments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AssignmentRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub schema_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Insertable struct for creating assignment records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = regulation_assignments)]
pub(crate) struct NewAssignmentRow {
    pub id: Uuid,
    pub vehicle_id: Uuid,
    pub schema_id: Uuid,
    pub assigned_at: DateTime<Utc>,
}

/// Row struct for reading from the regulation_entries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regulation_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct EntryRow {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub item_id: Uuid,
    pub last_done_km: i64,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating entry records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = regulation_entries)]
pub(crate) struct NewEntryRow {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub item_id: Uuid,
    pub last_done_km: i64,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the regulation_history_events table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regulation_history_events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HistoryEventRow {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub event_type: String,
    pub km_at_event: i64,
    pub km_remaining: i64,
    pub note: String,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for appending history events.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = regulation_history_events)]
pub(crate) struct NewHistoryEventRow<'a> {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub event_type: &'a str,
    pub km_at_event: i64,
    pub km_remaining: i64,
    pub note: &'a str,
    pub recorded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Row struct for reading from the regulation_notifications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = regulation_notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub entry_id: Uuid,
    pub due_km_target: i64,
    pub message: String,
    pub send_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating pending notifications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = regulation_notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub entry_id: Uuid,
    pub due_km_target: i64,
    pub message: &'a str,
    pub send_at: DateTime<Utc>,
    pub status: &'a str,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
