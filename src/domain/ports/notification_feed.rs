//! Port feeding pending notifications to the external dispatcher.
//!
//! The core only creates notifications in the pending state; the dispatcher
//! owns the pending→sent/failed transition and never hands status back
//! through this port.

use async_trait::async_trait;

use crate::domain::tracking::RegulationNotification;

/// Errors raised by notification feed adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationFeedError {
    /// Feed connection could not be established.
    #[error("notification feed connection failed: {message}")]
    Connection { message: String },

    /// Query failed during execution.
    #[error("notification feed query failed: {message}")]
    Query { message: String },
}

impl NotificationFeedError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Port for reading pending notifications, oldest first.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationFeed: Send + Sync {
    /// Pending notifications awaiting dispatch, oldest first. A non-positive
    /// `limit` yields no rows.
    async fn pending_notifications(
        &self,
        limit: i64,
    ) -> Result<Vec<RegulationNotification>, NotificationFeedError>;
}

/// Fixture feed for tests that do not exercise notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationFeed;

#[async_trait]
impl NotificationFeed for FixtureNotificationFeed {
    async fn pending_notifications(
        &self,
        _limit: i64,
    ) -> Result<Vec<RegulationNotification>, NotificationFeedError> {
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.

    use rstest::rstest;

    use super::*;

    #[rstest]
    #[tokio::test]
    async fn fixture_feed_is_empty() {
        let feed = FixtureNotificationFeed;
        let pending = feed
            .pending_notifications(10)
            .await
            .expect("fixture feed succeeds");
        assert!(pending.is_empty());
    }
}
