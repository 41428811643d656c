//! Due-tracking service.
//!
//! Records performed services and odometer updates against entries, exposes
//! the event history, and evaluates due reports. The atomicity of each
//! recording call lives in the tracking repository; this service validates
//! input, attributes the acting user, and maps port errors.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use super::Error;
use super::ports::{
    AssignmentRepository, AssignmentRepositoryError, KmUpdateRecord, PerformedRecord,
    TrackingRepository, TrackingRepositoryError,
};
use super::tracking::{EntryDueStatus, HistoryEvent};

/// Input for recording a performed service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPerformedRequest {
    /// The entry being serviced.
    pub entry_id: Uuid,
    /// Odometer reading when the service was carried out.
    pub km_at_event: i64,
    /// Free-text note for the history log.
    pub note: String,
    /// Acting user, for audit attribution.
    pub actor: Option<Uuid>,
}

/// Input for recording an odometer update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordKmUpdateRequest {
    /// The entry the reading applies to.
    pub entry_id: Uuid,
    /// The new odometer reading.
    pub current_km: i64,
    /// Acting user, for audit attribution.
    pub actor: Option<Uuid>,
}

fn map_repository_error(error: TrackingRepositoryError) -> Error {
    match error {
        TrackingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("tracking repository unavailable: {message}"))
        }
        TrackingRepositoryError::Query { message } => {
            Error::internal(format!("tracking repository error: {message}"))
        }
        TrackingRepositoryError::EntryMissing { entry_id } => {
            Error::not_found(format!("entry {entry_id} not found"))
        }
        TrackingRepositoryError::KmRegression {
            entry_id,
            last_done_km,
        } => Error::invalid_request(format!(
            "reading regresses behind last_done_km {last_done_km} for entry {entry_id}"
        )),
    }
}

fn map_assignment_error(error: AssignmentRepositoryError) -> Error {
    match error {
        AssignmentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("assignment repository unavailable: {message}"))
        }
        other => Error::internal(format!("assignment repository error: {other}")),
    }
}

fn require_non_negative(label: &str, value: i64) -> Result<(), Error> {
    if value < 0 {
        return Err(Error::invalid_request(format!(
            "{label} must be non-negative, got {value}"
        )));
    }
    Ok(())
}

/// Driving service for the due-tracking recorder and read models.
#[derive(Clone)]
pub struct TrackingService<T, A> {
    tracking: Arc<T>,
    assignments: Arc<A>,
}

impl<T, A> TrackingService<T, A> {
    /// Create a new tracking service from its repositories.
    pub fn new(tracking: Arc<T>, assignments: Arc<A>) -> Self {
        Self {
            tracking,
            assignments,
        }
    }
}

impl<T, A> TrackingService<T, A>
where
    T: TrackingRepository,
    A: AssignmentRepository,
{
    /// Record a performed service: advance the entry baseline and append a
    /// `performed` event atomically.
    ///
    /// Fails with a validation error when the reading is negative or behind
    /// the entry's baseline; state is left unchanged on failure.
    pub async fn record_performed(
        &self,
        request: RecordPerformedRequest,
    ) -> Result<PerformedRecord, Error> {
        require_non_negative("km_at_event", request.km_at_event)?;

        let record = self
            .tracking
            .record_performed(
                request.entry_id,
                request.km_at_event,
                request.note,
                request.actor,
            )
            .await
            .map_err(map_repository_error)?;

        info!(
            entry_id = %record.entry.id,
            km_at_event = request.km_at_event,
            last_done_km = record.entry.last_done_km,
            "service performed"
        );
        Ok(record)
    }

    /// Record an odometer reading: append a `km_updated` event and, on an
    /// un-notified notify-window crossing, one pending notification plus a
    /// `notified` event.
    pub async fn record_km_update(
        &self,
        request: RecordKmUpdateRequest,
    ) -> Result<KmUpdateRecord, Error> {
        require_non_negative("current_km", request.current_km)?;

        let record = self
            .tracking
            .record_km_update(request.entry_id, request.current_km, request.actor)
            .await
            .map_err(map_repository_error)?;

        debug!(
            entry_id = %request.entry_id,
            current_km = request.current_km,
            events = record.events.len(),
            "km update recorded"
        );
        if let Some(notification) = &record.notification {
            info!(
                entry_id = %notification.entry_id,
                due_km_target = notification.due_km_target,
                "pending notification created"
            );
        }
        Ok(record)
    }

    /// Event history for an entry, newest first.
    pub async fn entry_history(&self, entry_id: Uuid) -> Result<Vec<HistoryEvent>, Error> {
        let exists = self
            .tracking
            .load_entry(entry_id)
            .await
            .map_err(map_repository_error)?
            .is_some();
        if !exists {
            return Err(Error::not_found(format!("entry {entry_id} not found")));
        }

        self.tracking
            .entry_history(entry_id)
            .await
            .map_err(map_repository_error)
    }

    /// Due status of every entry of an assignment at the given reading.
    pub async fn due_report(
        &self,
        assignment_id: Uuid,
        current_km: i64,
    ) -> Result<Vec<EntryDueStatus>, Error> {
        require_non_negative("current_km", current_km)?;

        let known = self
            .assignments
            .find_by_id(assignment_id)
            .await
            .map_err(map_assignment_error)?
            .is_some();
        if !known {
            return Err(Error::not_found(format!(
                "assignment {assignment_id} not found"
            )));
        }

        let entries = self
            .tracking
            .list_for_assignment(assignment_id)
            .await
            .map_err(map_repository_error)?;

        Ok(entries
            .iter()
            .map(|entry| EntryDueStatus::evaluate(entry, current_km))
            .collect())
    }
}

#[cfg(test)]
#[path = "tracking_service_tests.rs"]
mod tests;
