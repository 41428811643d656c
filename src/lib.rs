//! Fleet regulation tracker.
//!
//! Maintains reusable maintenance schedules ("schemas"), their assignment to
//! vehicles, live per-item due-state tracking, an append-only event history,
//! and pending-notification creation for the external dispatcher.
//!
//! The crate is organised hexagonally: `domain` holds validated entities, the
//! pure due-state engine, driving services, and ports; `outbound` holds the
//! Diesel/PostgreSQL adapters implementing those ports.

pub mod domain;
pub mod outbound;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
