//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations exactly; regenerate with
//! `diesel print-schema` when the migrations change.

diesel::table! {
    /// Vehicles known to the back office. Lifecycle is owned by the vehicle
    /// registry; the tracker only reads ids for referential integrity.
    vehicles (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Human-readable vehicle name.
        name -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Named, reusable maintenance schedules.
    regulation_schemas (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Schema title, unique system-wide.
        title -> Varchar,
        /// Whether this schema is the single system default.
        is_default -> Bool,
        /// Creating operator; nulled when the user is deleted.
        created_by -> Nullable<Uuid>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Maintenance items belonging to a schema.
    regulation_items (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning schema; deletion cascades here.
        schema_id -> Uuid,
        /// Item title, unique within the schema.
        title -> Varchar,
        /// Service interval in kilometres.
        every_km -> Int8,
        /// Notify-window width in kilometres.
        notify_before_km -> Int8,
    }
}

diesel::table! {
    /// Bindings of one schema to one vehicle.
    regulation_assignments (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The tracked vehicle; vehicle deletion cascades here.
        vehicle_id -> Uuid,
        /// The assigned schema; schema deletion is restricted while rows exist.
        schema_id -> Uuid,
        /// When the schema was assigned.
        assigned_at -> Timestamptz,
    }
}

diesel::table! {
    /// Live due-tracking state, one row per (assignment, item).
    regulation_entries (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Owning assignment; deletion cascades here.
        assignment_id -> Uuid,
        /// The tracked item; item deletion is restricted while rows exist.
        item_id -> Uuid,
        /// Odometer reading at the last recorded service.
        last_done_km -> Int8,
        /// Last mutation timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only event history per entry.
    regulation_history_events (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The entry the event belongs to.
        entry_id -> Uuid,
        /// Event kind: performed, km_updated, or notified.
        event_type -> Varchar,
        /// Odometer reading at the moment of the event.
        km_at_event -> Int8,
        /// Signed distance to the due point at that moment.
        km_remaining -> Int8,
        /// Free-text note.
        note -> Text,
        /// Acting user; nulled when the user is deleted.
        recorded_by -> Nullable<Uuid>,
        /// When the event was recorded.
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending/sent/failed notifications, one per (entry, due cycle).
    regulation_notifications (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// The assignment the due item belongs to.
        assignment_id -> Uuid,
        /// The entry that crossed into its notify window.
        entry_id -> Uuid,
        /// The next_due_km the notification refers to; deduplication key.
        due_km_target -> Int8,
        /// Human-readable message for the dispatcher.
        message -> Varchar,
        /// Earliest time the dispatcher should send.
        send_at -> Timestamptz,
        /// Lifecycle state: pending, sent, or failed.
        status -> Varchar,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(regulation_items -> regulation_schemas (schema_id));
diesel::joinable!(regulation_assignments -> vehicles (vehicle_id));
diesel::joinable!(regulation_assignments -> regulation_schemas (schema_id));
diesel::joinable!(regulation_entries -> regulation_assignments (assignment_id));
diesel::joinable!(regulation_entries -> regulation_items (item_id));
diesel::joinable!(regulation_history_events -> regulation_entries (entry_id));
diesel::joinable!(regulation_notifications -> regulation_assignments (assignment_id));
diesel::joinable!(regulation_notifications -> regulation_entries (entry_id));

diesel::allow_tables_to_appear_in_same_query!(
    vehicles,
    regulation_schemas,
    regulation_items,
    regulation_assignments,
    regulation_entries,
    regulation_history_events,
    regulation_notifications,
);
