//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of the domain ports backed
//! by PostgreSQL via the Diesel ORM with async support through `diesel-async`
//! and `bb8` connection pooling.
//!
//! # Architecture
//!
//! The persistence layer follows these principles:
//!
//! - **Thin adapters**: Repository implementations translate between Diesel
//!   rows and domain types; the decision logic for the recording operations
//!   lives in the domain planners and is executed here under row locks.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Async-safe pooling**: Connections are managed via `bb8` pools with
//!   proper async integration through `diesel-async`.
//! - **Strongly typed errors**: All database errors are mapped to the port
//!   error types.
//!
//! # Example
//!
//! ```ignore
//! use fleet_regulation::outbound::persistence::{DbPool, PoolConfig, DieselSchemaRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/fleet");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselSchemaRepository::new(pool);
//! ```

mod diesel_assignment_repository;
pub(crate) mod diesel_error_mapping;
mod diesel_notification_feed;
mod diesel_schema_repository;
mod diesel_tracking_repository;
mod diesel_vehicle_registry;
mod models;
mod pool;
mod row_mapping;
mod schema;

pub use diesel_assignment_repository::DieselAssignmentRepository;
pub use diesel_notification_feed::DieselNotificationFeed;
pub use diesel_schema_repository::DieselSchemaRepository;
pub use diesel_tracking_repository::DieselTrackingRepository;
pub use diesel_vehicle_registry::DieselVehicleRegistry;
pub use pool::{DbPool, PoolConfig, PoolError};
