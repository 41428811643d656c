//! Assignment and due-tracking domain types.
//!
//! An assignment binds one schema to one vehicle; each schema item then has
//! one live entry recording when it was last serviced. Every mutation is
//! reflected in the append-only history, and notify-window crossings create
//! pending notifications for the external dispatcher.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::due::DueCycle;
use super::schema::RegulationItem;

/// The binding of one schema to one vehicle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAssignment {
    /// Assignment identifier.
    pub id: Uuid,
    /// The vehicle being tracked; lifecycle owned by the vehicle registry.
    pub vehicle_id: Uuid,
    /// The schema whose items are tracked.
    pub schema_id: Uuid,
    /// When the schema was assigned.
    pub assigned_at: DateTime<Utc>,
}

/// Live due-tracking state for one `(assignment, item)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationEntry {
    /// Entry identifier.
    pub id: Uuid,
    /// Owning assignment.
    pub assignment_id: Uuid,
    /// The schema item this entry tracks.
    pub item_id: Uuid,
    /// Odometer reading at the last recorded service; starts at 0.
    pub last_done_km: i64,
    /// Last mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl RegulationEntry {
    /// The due cycle this entry is currently in, given its item's thresholds.
    pub fn due_cycle(&self, item: &RegulationItem) -> DueCycle {
        DueCycle {
            last_done_km: self.last_done_km,
            every_km: item.every_km(),
            notify_before_km: item.notify_before_km(),
        }
    }
}

/// An entry joined with the item it tracks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryWithItem {
    /// The live entry state.
    pub entry: RegulationEntry,
    /// The item supplying interval and notify thresholds.
    pub item: RegulationItem,
}

impl EntryWithItem {
    /// The entry's current due cycle.
    pub fn due_cycle(&self) -> DueCycle {
        self.entry.due_cycle(&self.item)
    }
}

/// The kind of event recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// The service was carried out and the baseline advanced.
    Performed,
    /// An odometer reading was recorded without servicing.
    KmUpdated,
    /// A pending notification was created for the current due cycle.
    Notified,
}

impl EventType {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Performed => "performed",
            Self::KmUpdated => "km_updated",
            Self::Notified => "notified",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown event type string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {input}")]
pub struct ParseEventTypeError {
    /// The unrecognised input value.
    pub input: String,
}

impl std::str::FromStr for EventType {
    type Err = ParseEventTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "performed" => Ok(Self::Performed),
            "km_updated" => Ok(Self::KmUpdated),
            "notified" => Ok(Self::Notified),
            _ => Err(ParseEventTypeError {
                input: s.to_owned(),
            }),
        }
    }
}

/// One immutable history record. Never updated or deleted by normal flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEvent {
    /// Event identifier.
    pub id: Uuid,
    /// The entry this event belongs to.
    pub entry_id: Uuid,
    /// What happened.
    pub event_type: EventType,
    /// Odometer reading at the moment of the event.
    pub km_at_event: i64,
    /// Signed distance to the due point at that moment.
    pub km_remaining: i64,
    /// Free-text note.
    pub note: String,
    /// Acting user; survives user deletion as `None`.
    pub recorded_by: Option<Uuid>,
    /// When the event was recorded.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle state of a scheduled notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    /// Created by the core, awaiting the dispatcher.
    #[default]
    Pending,
    /// Delivered by the dispatcher.
    Sent,
    /// Delivery failed; the dispatcher owns retries, if any.
    Failed,
}

impl NotificationStatus {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown notification status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification status: {input}")]
pub struct ParseNotificationStatusError {
    /// The unrecognised input value.
    pub input: String,
}

impl std::str::FromStr for NotificationStatus {
    type Err = ParseNotificationStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseNotificationStatusError {
                input: s.to_owned(),
            }),
        }
    }
}

/// A scheduled maintenance notification.
///
/// The core only ever creates these in [`NotificationStatus::Pending`]; the
/// dispatcher owns the pending→sent/failed transition. `due_km_target` is the
/// `next_due_km` the notification refers to and deduplicates notifications
/// per due cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationNotification {
    /// Notification identifier.
    pub id: Uuid,
    /// The assignment the due item belongs to.
    pub assignment_id: Uuid,
    /// The entry that crossed into its notify window.
    pub entry_id: Uuid,
    /// The `next_due_km` this notification refers to.
    pub due_km_target: i64,
    /// Human-readable message for the dispatcher.
    pub message: String,
    /// Earliest time the dispatcher should send.
    pub send_at: DateTime<Utc>,
    /// Lifecycle state.
    pub status: NotificationStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Build the dispatcher-facing message for a notify-window crossing.
pub fn notification_message(item_title: &str, km_remaining: i64, next_due_km: i64) -> String {
    if km_remaining > 0 {
        format!("{item_title} due in {km_remaining} km (at {next_due_km} km)")
    } else {
        format!(
            "{item_title} overdue by {} km (was due at {next_due_km} km)",
            -km_remaining
        )
    }
}

/// Due status of one entry at a given odometer reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDueStatus {
    /// The entry being reported on.
    pub entry_id: Uuid,
    /// Title of the tracked item.
    pub item_title: String,
    /// Odometer reading at which the item falls due.
    pub next_due_km: i64,
    /// Signed distance to the due point.
    pub km_remaining: i64,
    /// Whether the item is due at the reading.
    pub is_due: bool,
    /// Whether the reading falls inside the notify window.
    pub in_notify_window: bool,
}

impl EntryDueStatus {
    /// Evaluate an entry's due status at the given reading.
    pub fn evaluate(entry: &EntryWithItem, current_km: i64) -> Self {
        let cycle = entry.due_cycle();
        Self {
            entry_id: entry.entry.id,
            item_title: entry.item.title().to_owned(),
            next_due_km: cycle.next_due_km(),
            km_remaining: cycle.km_remaining(current_km),
            is_due: cycle.is_due(current_km),
            in_notify_window: cycle.in_notify_window(current_km),
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::domain::schema::RegulationItem;

    fn sample_entry() -> EntryWithItem {
        let assignment_id = Uuid::new_v4();
        let item = RegulationItem::from_parts(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Engine oil".to_owned(),
            10_000,
            500,
        )
        .expect("valid item");
        EntryWithItem {
            entry: RegulationEntry {
                id: Uuid::new_v4(),
                assignment_id,
                item_id: item.id(),
                last_done_km: 0,
                updated_at: Utc::now(),
            },
            item,
        }
    }

    #[rstest]
    #[case("performed", EventType::Performed)]
    #[case("km_updated", EventType::KmUpdated)]
    #[case("notified", EventType::Notified)]
    fn event_type_round_trips(#[case] text: &str, #[case] value: EventType) {
        assert_eq!(text.parse::<EventType>().expect("parse"), value);
        assert_eq!(value.as_str(), text);
    }

    #[rstest]
    fn unknown_event_type_fails_to_parse() {
        let error = "retired".parse::<EventType>().expect_err("unknown");
        assert_eq!(error.input, "retired");
    }

    #[rstest]
    #[case("pending", NotificationStatus::Pending)]
    #[case("sent", NotificationStatus::Sent)]
    #[case("failed", NotificationStatus::Failed)]
    fn notification_status_round_trips(#[case] text: &str, #[case] value: NotificationStatus) {
        assert_eq!(text.parse::<NotificationStatus>().expect("parse"), value);
        assert_eq!(value.as_str(), text);
    }

    #[rstest]
    fn due_status_reflects_the_engine() {
        let entry = sample_entry();
        let status = EntryDueStatus::evaluate(&entry, 9_600);

        assert_eq!(status.next_due_km, 10_000);
        assert_eq!(status.km_remaining, 400);
        assert!(!status.is_due);
        assert!(status.in_notify_window);
    }

    #[rstest]
    fn message_distinguishes_upcoming_from_overdue() {
        let upcoming = notification_message("Engine oil", 400, 10_000);
        assert!(upcoming.contains("due in 400 km"));

        let overdue = notification_message("Engine oil", -250, 10_000);
        assert!(overdue.contains("overdue by 250 km"));
    }
}
