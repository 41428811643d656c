//! Pure planning of recording side effects.
//!
//! Both persistence adapters (Diesel and in-memory) execute the same plans:
//! the planner decides what an operation writes, the adapter decides how to
//! write it atomically. Keeping the decision pure means the due arithmetic
//! and the notify-window rules are tested once, independent of storage.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::tracking::{
    EntryWithItem, EventType, HistoryEvent, NotificationStatus, RegulationEntry,
    RegulationNotification, notification_message,
};

/// The reported reading is behind the entry's recorded baseline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("km_at_event {km_at_event} regresses behind last_done_km {last_done_km}")]
pub struct KmRegressionError {
    /// The entry whose baseline would regress.
    pub entry_id: Uuid,
    /// The entry's current baseline.
    pub last_done_km: i64,
    /// The offending reading.
    pub km_at_event: i64,
}

/// Writes for one `record_performed` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformedPlan {
    /// The entry with its baseline advanced to `km_at_event`.
    pub entry: RegulationEntry,
    /// The `performed` event, with `km_remaining` computed against the new
    /// target.
    pub event: HistoryEvent,
}

/// Plan a `record_performed` call against the entry's current state.
///
/// Distance is monotonically non-decreasing per entry: readings behind the
/// baseline are rejected and leave no plan to apply.
pub fn plan_performed(
    current: &EntryWithItem,
    km_at_event: i64,
    note: String,
    recorded_by: Option<Uuid>,
    now: DateTime<Utc>,
) -> Result<PerformedPlan, KmRegressionError> {
    if km_at_event < current.entry.last_done_km {
        return Err(KmRegressionError {
            entry_id: current.entry.id,
            last_done_km: current.entry.last_done_km,
            km_at_event,
        });
    }

    let entry = RegulationEntry {
        last_done_km: km_at_event,
        updated_at: now,
        ..current.entry.clone()
    };
    let cycle = entry.due_cycle(&current.item);

    Ok(PerformedPlan {
        event: HistoryEvent {
            id: Uuid::new_v4(),
            entry_id: entry.id,
            event_type: EventType::Performed,
            km_at_event,
            km_remaining: cycle.km_remaining(km_at_event),
            note,
            recorded_by,
            created_at: now,
        },
        entry,
    })
}

/// The notification half of a km-update plan. Applied only when no
/// notification exists yet for the same `(entry, due_km_target)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyPlan {
    /// The pending notification for the dispatcher.
    pub notification: RegulationNotification,
    /// The `notified` event accompanying it.
    pub event: HistoryEvent,
}

/// Writes for one `record_km_update` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmUpdatePlan {
    /// The `km_updated` event; always written.
    pub km_update_event: HistoryEvent,
    /// Notification writes, present when the reading falls inside the notify
    /// window. The adapter drops this half when the due cycle was already
    /// notified.
    pub notify: Option<NotifyPlan>,
}

/// Plan a `record_km_update` call against the entry's current state.
///
/// The baseline is never touched; the plan only appends history and, inside
/// the notify window, proposes a notification keyed on `next_due_km`.
pub fn plan_km_update(
    current: &EntryWithItem,
    current_km: i64,
    recorded_by: Option<Uuid>,
    now: DateTime<Utc>,
) -> KmUpdatePlan {
    let cycle = current.due_cycle();
    let km_remaining = cycle.km_remaining(current_km);

    let km_update_event = HistoryEvent {
        id: Uuid::new_v4(),
        entry_id: current.entry.id,
        event_type: EventType::KmUpdated,
        km_at_event: current_km,
        km_remaining,
        note: String::new(),
        recorded_by,
        created_at: now,
    };

    let notify = cycle.in_notify_window(current_km).then(|| {
        let message = notification_message(current.item.title(), km_remaining, cycle.next_due_km());
        NotifyPlan {
            notification: RegulationNotification {
                id: Uuid::new_v4(),
                assignment_id: current.entry.assignment_id,
                entry_id: current.entry.id,
                due_km_target: cycle.next_due_km(),
                message: message.clone(),
                send_at: now,
                status: NotificationStatus::Pending,
                created_at: now,
            },
            event: HistoryEvent {
                id: Uuid::new_v4(),
                entry_id: current.entry.id,
                event_type: EventType::Notified,
                km_at_event: current_km,
                km_remaining,
                note: message,
                recorded_by,
                created_at: now,
            },
        }
    });

    KmUpdatePlan {
        km_update_event,
        notify,
    }
}
