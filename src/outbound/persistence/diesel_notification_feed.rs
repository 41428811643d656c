//! PostgreSQL-backed `NotificationFeed` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationFeed, NotificationFeedError};
use crate::domain::tracking::{NotificationStatus, RegulationNotification};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::NotificationRow;
use super::pool::{DbPool, PoolError};
use super::row_mapping::notification_from_row;
use super::schema::regulation_notifications;

/// Diesel-backed implementation of the notification feed port.
#[derive(Clone)]
pub struct DieselNotificationFeed {
    pool: DbPool,
}

impl DieselNotificationFeed {
    /// Create a new feed with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> NotificationFeedError {
    map_pool_error(error, NotificationFeedError::connection)
}

fn map_plain_diesel(error: diesel::result::Error) -> NotificationFeedError {
    map_diesel_error(
        error,
        NotificationFeedError::query,
        NotificationFeedError::connection,
        |_| None,
    )
}

#[async_trait]
impl NotificationFeed for DieselNotificationFeed {
    async fn pending_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<RegulationNotification>, NotificationFeedError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows = regulation_notifications::table
            .filter(regulation_notifications::status.eq(NotificationStatus::Pending.as_str()))
            .order((
                regulation_notifications::created_at.asc(),
                regulation_notifications::id.asc(),
            ))
            // PostgreSQL rejects a negative LIMIT.
            .limit(limit.max(0))
            .select(NotificationRow::as_select())
            .load::<NotificationRow>(&mut conn)
            .await
            .map_err(map_plain_diesel)?;

        rows.into_iter()
            .map(|row| notification_from_row(row).map_err(NotificationFeedError::query))
            .collect()
    }
}
