//! Domain ports for the hexagonal boundary.

mod assignment_repository;
mod notification_feed;
mod schema_repository;
mod tracking_repository;
mod vehicle_registry;

#[cfg(test)]
pub use assignment_repository::MockAssignmentRepository;
pub use assignment_repository::{
    AssignmentRepository, AssignmentRepositoryError, FixtureAssignmentRepository,
};
#[cfg(test)]
pub use notification_feed::MockNotificationFeed;
pub use notification_feed::{FixtureNotificationFeed, NotificationFeed, NotificationFeedError};
#[cfg(test)]
pub use schema_repository::MockSchemaRepository;
pub use schema_repository::{FixtureSchemaRepository, SchemaRepository, SchemaRepositoryError};
#[cfg(test)]
pub use tracking_repository::MockTrackingRepository;
pub use tracking_repository::{
    FixtureTrackingRepository, KmUpdateRecord, PerformedRecord, TrackingRepository,
    TrackingRepositoryError,
};
#[cfg(test)]
pub use vehicle_registry::MockVehicleRegistry;
pub use vehicle_registry::{FixtureVehicleRegistry, VehicleRegistry, VehicleRegistryError};
