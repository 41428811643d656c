//! Port for due-tracking state, event history, and notification creation.
//!
//! The recording methods are deliberately coarse: each one is a single
//! atomic unit of work in the adapter, so a crash can never leave a history
//! record whose `km_remaining` disagrees with the persisted entry state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::tracking::{EntryWithItem, HistoryEvent, RegulationEntry, RegulationNotification};

/// Errors raised by tracking repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackingRepositoryError {
    /// Repository connection could not be established.
    #[error("tracking repository connection failed: {message}")]
    Connection { message: String },

    /// Query or mutation failed during execution.
    #[error("tracking repository query failed: {message}")]
    Query { message: String },

    /// The referenced entry does not exist.
    #[error("entry {entry_id} not found")]
    EntryMissing { entry_id: Uuid },

    /// The reported reading is behind the entry's recorded baseline.
    #[error("km_at_event regresses behind last_done_km {last_done_km} for entry {entry_id}")]
    KmRegression { entry_id: Uuid, last_done_km: i64 },
}

impl TrackingRepositoryError {
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

/// Outcome of a successful `record_performed` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerformedRecord {
    /// The entry with its advanced baseline.
    pub entry: RegulationEntry,
    /// The appended `performed` event.
    pub event: HistoryEvent,
}

/// Outcome of a successful `record_km_update` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KmUpdateRecord {
    /// Events appended by this call: always one `km_updated`, plus one
    /// `notified` when a notification was created.
    pub events: Vec<HistoryEvent>,
    /// The pending notification, when this call crossed into an un-notified
    /// notify window.
    pub notification: Option<RegulationNotification>,
}

/// Port for entry reads and the two atomic recording operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackingRepository: Send + Sync {
    /// Load an entry joined with its item.
    async fn load_entry(
        &self,
        entry_id: Uuid,
    ) -> Result<Option<EntryWithItem>, TrackingRepositoryError>;

    /// List the entries of an assignment, in item title order.
    async fn list_for_assignment(
        &self,
        assignment_id: Uuid,
    ) -> Result<Vec<EntryWithItem>, TrackingRepositoryError>;

    /// Advance the entry baseline and append a `performed` event atomically.
    ///
    /// Adapters must re-check the regression guard under a per-entry lock so
    /// concurrent calls cannot interleave into a regressing baseline.
    async fn record_performed(
        &self,
        entry_id: Uuid,
        km_at_event: i64,
        note: String,
        recorded_by: Option<Uuid>,
    ) -> Result<PerformedRecord, TrackingRepositoryError>;

    /// Append a `km_updated` event; when the reading falls inside an
    /// un-notified notify window, also create one pending notification and a
    /// `notified` event. Idempotent per `(entry, due_km_target)`.
    async fn record_km_update(
        &self,
        entry_id: Uuid,
        current_km: i64,
        recorded_by: Option<Uuid>,
    ) -> Result<KmUpdateRecord, TrackingRepositoryError>;

    /// Event history for an entry, newest first.
    async fn entry_history(
        &self,
        entry_id: Uuid,
    ) -> Result<Vec<HistoryEvent>, TrackingRepositoryError>;
}

/// Fixture implementation for tests that do not exercise tracking.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTrackingRepository;

#[async_trait]
impl TrackingRepository for FixtureTrackingRepository {
    async fn load_entry(
        &self,
        _entry_id: Uuid,
    ) -> Result<Option<EntryWithItem>, TrackingRepositoryError> {
        Ok(None)
    }

    async fn list_for_assignment(
        &self,
        _assignment_id: Uuid,
    ) -> Result<Vec<EntryWithItem>, TrackingRepositoryError> {
        Ok(Vec::new())
    }

    async fn record_performed(
        &self,
        entry_id: Uuid,
        _km_at_event: i64,
        _note: String,
        _recorded_by: Option<Uuid>,
    ) -> Result<PerformedRecord, TrackingRepositoryError> {
        Err(TrackingRepositoryError::EntryMissing { entry_id })
    }

    async fn record_km_update(
        &self,
        entry_id: Uuid,
        _current_km: i64,
        _recorded_by: Option<Uuid>,
    ) -> Result<KmUpdateRecord, TrackingRepositoryError> {
        Err(TrackingRepositoryError::EntryMissing { entry_id })
    }

    async fn entry_history(
        &self,
        _entry_id: Uuid,
    ) -> Result<Vec<HistoryEvent>, TrackingRepositoryError> {
        Ok(Vec::new())
    }
}
