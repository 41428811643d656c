//! PostgreSQL-backed `TrackingRepository` implementation using Diesel ORM.
//!
//! Each recording call is one transaction. The entry row is taken with
//! `SELECT ... FOR UPDATE` so concurrent recorders serialise per entry, and
//! the regression guard is re-evaluated against the locked row rather than
//! whatever the caller last read. Notification idempotence rides on the
//! `(entry_id, due_km_target)` unique index: the insert is attempted with
//! `ON CONFLICT DO NOTHING` and the `notified` event is only written when
//! the insert took.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    KmUpdateRecord, PerformedRecord, TrackingRepository, TrackingRepositoryError,
};
use crate::domain::recorder::{plan_km_update, plan_performed};
use crate::domain::tracking::{EntryWithItem, HistoryEvent, RegulationNotification};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{EntryRow, HistoryEventRow, ItemRow, NewHistoryEventRow, NewNotificationRow};
use super::pool::{DbPool, PoolError};
use super::row_mapping::{entry_with_item_from_rows, event_from_row};
use super::schema::{regulation_entries, regulation_history_events, regulation_items,
    regulation_notifications};

/// Diesel-backed implementation of the tracking repository port.
#[derive(Clone)]
pub struct DieselTrackingRepository {
    pool: DbPool,
}

impl DieselTrackingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> TrackingRepositoryError {
    map_pool_error(error, TrackingRepositoryError::connection)
}

fn map_plain_diesel(error: diesel::result::Error) -> TrackingRepositoryError {
    map_diesel_error(
        error,
        TrackingRepositoryError::query,
        TrackingRepositoryError::connection,
        |_| None,
    )
}

/// Transaction-internal error: either a Diesel failure or a port error the
/// planner raised against the locked row.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Port(TrackingRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_tx_error(error: TxError) -> TrackingRepositoryError {
    match error {
        TxError::Diesel(error) => map_plain_diesel(error),
        TxError::Port(error) => error,
    }
}

fn event_insert<'a>(event: &'a HistoryEvent) -> NewHistoryEventRow<'a> {
    NewHistoryEventRow {
        id: event.id,
        entry_id: event.entry_id,
        event_type: event.event_type.as_str(),
        km_at_event: event.km_at_event,
        km_remaining: event.km_remaining,
        note: event.note.as_str(),
        recorded_by: event.recorded_by,
        created_at: event.created_at,
    }
}

fn notification_insert<'a>(notification: &'a RegulationNotification) -> NewNotificationRow<'a> {
    NewNotificationRow {
        id: notification.id,
        assignment_id: notification.assignment_id,
        entry_id: notification.entry_id,
        due_km_target: notification.due_km_target,
        message: notification.message.as_str(),
        send_at: notification.send_at,
        status: notification.status.as_str(),
        created_at: notification.created_at,
        updated_at: notification.created_at,
    }
}

/// Load an entry joined with its item inside a transaction, taking the
/// per-entry row lock.
async fn load_locked_entry(
    conn: &mut AsyncPgConnection,
    entry_id: Uuid,
) -> Result<EntryWithItem, TxError> {
    let entry_row = regulation_entries::table
        .find(entry_id)
        .select(EntryRow::as_select())
        .for_update()
        .first::<EntryRow>(conn)
        .await
        .optional()?;
    let Some(entry_row) = entry_row else {
        return Err(TxError::Port(TrackingRepositoryError::EntryMissing {
            entry_id,
        }));
    };

    let item_row = regulation_items::table
        .find(entry_row.item_id)
        .select(ItemRow::as_select())
        .first::<ItemRow>(conn)
        .await?;

    entry_with_item_from_rows(entry_row, item_row)
        .map_err(|message| TxError::Port(TrackingRepositoryError::query(message)))
}

#[async_trait]
impl TrackingRepository for DieselTrackingRepository {
    async fn load_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<EntryWithItem>, TrackingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows = regulation_entries::table
            .inner_join(regulation_items::table)
            .filter(regulation_entries::id.eq(entry_id))
            .select((EntryRow::as_select(), ItemRow::as_select()))
            .first::<(EntryRow, ItemRow)>(&mut conn)
            .await
            .optional()
            .map_err(map_plain_diesel)?;

        rows.map(|(entry, item)| {
            entry_with_item_from_rows(entry, item).map_err(TrackingRepositoryError::query)
        })
        .transpose()
    }

    async fn list_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<EntryWithItem>, TrackingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows = regulation_entries::table
            .inner_join(regulation_items::table)
            .filter(regulation_entries::assignment_id.eq(assignment_id))
            .order(regulation_items::title.asc())
            .select((EntryRow::as_select(), ItemRow::as_select()))
            .load::<(EntryRow, ItemRow)>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        rows.into_iter()
            .map(|(entry, item)| {
                entry_with_item_from_rows(entry, item).map_err(TrackingRepositoryError::query)
            })
            .collect()
    }

    async fn record_performed(
        &self,
        entry_id: Uuid,
        km_at_event: i64,
        note: String,
        recorded_by: Option<Uuid>,
    ) -> Result<PerformedRecord, TrackingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        conn.transaction::<PerformedRecord, TxError, _>(|conn| {
            async move {
                let current = load_locked_entry(conn, entry_id).await?;

                let plan = plan_performed(&current, km_at_event, note, recorded_by, Utc::now())
                    .map_err(|err| {
                        TxError::Port(TrackingRepositoryError::KmRegression {
                            entry_id: err.entry_id,
                            last_done_km: err.last_done_km,
                        })
                    })?;

                diesel::update(regulation_entries::table.find(entry_id))
                    .set((
                        regulation_entries::last_done_km.eq(plan.entry.last_done_km),
                        regulation_entries::updated_at.eq(plan.entry.updated_at),
                    ))
                    .execute(conn)
                    .await?;

                diesel::insert_into(regulation_history_events::table)
                    .values(event_insert(&plan.event))
                    .execute(conn)
                    .await?;

                Ok(PerformedRecord {
                    entry: plan.entry,
                    event: plan.event,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn record_km_update(
        &self,
        entry_id: Uuid,
        current_km: i64,
        recorded_by: Option<Uuid>,
    ) -> Result<KmUpdateRecord, TrackingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        conn.transaction::<KmUpdateRecord, TxError, _>(|conn| {
            async move {
                let current = load_locked_entry(conn, entry_id).await?;
                let plan = plan_km_update(&current, current_km, recorded_by, Utc::now());

                diesel::insert_into(regulation_history_events::table)
                    .values(event_insert(&plan.km_update_event))
                    .execute(conn)
                    .await?;

                let mut events = vec![plan.km_update_event];
                let mut notification = None;

                if let Some(notify) = plan.notify {
                    let inserted = diesel::insert_into(regulation_notifications::table)
                        .values(notification_insert(&notify.notification))
                        .on_conflict((
                            regulation_notifications::entry_id,
                            regulation_notifications::due_km_target,
                        ))
                        .do_nothing()
                        .execute(conn)
                        .await?;

                    // Zero rows means this due cycle was already notified.
                    if inserted > 0 {
                        diesel::insert_into(regulation_history_events::table)
                            .values(event_insert(&notify.event))
                            .execute(conn)
                            .await?;
                        events.push(notify.event);
                        notification = Some(notify.notification);
                    }
                }

                Ok(KmUpdateRecord {
                    events,
                    notification,
                })
            }
            .scope_boxed()
        })
        .await
        .map_err(map_tx_error)
    }

    async fn entry_history(
        &self,
        entry_id: Uuid,
    ) -> Result<Vec<HistoryEvent>, TrackingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows = regulation_history_events::table
            .filter(regulation_history_events::entry_id.eq(entry_id))
            .order((
                regulation_history_events::created_at.desc(),
                regulation_history_events::id.desc(),
            ))
            .select(HistoryEventRow::as_select())
            .load::<HistoryEventRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        rows.into_iter()
            .map(|row| event_from_row(row).map_err(TrackingRepositoryError::query))
            .collect()
    }
}
