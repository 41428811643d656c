//! Domain primitives, aggregates, services, and ports.
//!
//! Keep types immutable and validated at construction; adapters reconstruct
//! entities through the same validating paths so invalid data cannot enter
//! the domain.

pub mod assignment_service;
pub mod due;
pub mod error;
pub mod ports;
pub mod recorder;
pub mod schema;
pub mod schema_service;
pub mod tracking;
pub mod tracking_service;

pub use self::assignment_service::{AssignmentService, AssignmentWithEntries};
pub use self::due::DueCycle;
pub use self::error::{Error, ErrorCode};
pub use self::recorder::{KmRegressionError, KmUpdatePlan, NotifyPlan, PerformedPlan};
pub use self::schema::{
    RegulationItem, RegulationItemDraft, RegulationSchema, RegulationSchemaDraft,
    SchemaValidationError, SchemaWithItems,
};
pub use self::schema_service::{CreateSchemaRequest, SchemaRegistryService};
pub use self::tracking::{
    EntryDueStatus, EntryWithItem, EventType, HistoryEvent, NotificationStatus, RegulationEntry,
    RegulationNotification, SchemaAssignment,
};
pub use self::tracking_service::{
    RecordKmUpdateRequest, RecordPerformedRequest, TrackingService,
};
