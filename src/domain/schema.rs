//! Regulation schema and item aggregates.
//!
//! A schema is a named, reusable package of maintenance items, each with a
//! distance interval and a notify-before threshold. Instances are built from
//! drafts through validating constructors; adapters reconstruct them from
//! rows through the same path so invalid data cannot enter the domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation failures for schema and item drafts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaValidationError {
    /// The schema title is empty once trimmed.
    #[error("schema title must not be blank")]
    BlankSchemaTitle,
    /// An item title is empty once trimmed.
    #[error("item title must not be blank")]
    BlankItemTitle,
    /// An item interval is zero or negative.
    #[error("item '{title}' has non-positive interval {every_km}")]
    NonPositiveInterval { title: String, every_km: i64 },
    /// An item notify threshold is negative.
    #[error("item '{title}' has negative notify threshold {notify_before_km}")]
    NegativeNotifyThreshold { title: String, notify_before_km: i64 },
    /// Two items in the same draft share a title.
    #[error("duplicate item title '{title}' within schema")]
    DuplicateItemTitle { title: String },
}

/// Unvalidated input for one maintenance item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationItemDraft {
    /// Item title, unique within its schema.
    pub title: String,
    /// Service interval in kilometres; must be strictly positive.
    pub every_km: i64,
    /// Notify-window width in kilometres; must be non-negative.
    pub notify_before_km: i64,
}

/// A validated maintenance item belonging to one schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationItem {
    id: Uuid,
    schema_id: Uuid,
    title: String,
    every_km: i64,
    notify_before_km: i64,
}

impl RegulationItem {
    /// Reconstruct an item from stored parts, re-running draft validation.
    pub fn from_parts(
        id: Uuid,
        schema_id: Uuid,
        title: String,
        every_km: i64,
        notify_before_km: i64,
    ) -> Result<Self, SchemaValidationError> {
        validate_item(&RegulationItemDraft {
            title: title.clone(),
            every_km,
            notify_before_km,
        })?;
        Ok(Self {
            id,
            schema_id,
            title,
            every_km,
            notify_before_km,
        })
    }

    /// Item identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Owning schema identifier.
    pub fn schema_id(&self) -> Uuid {
        self.schema_id
    }

    /// Item title.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Service interval in kilometres.
    pub fn every_km(&self) -> i64 {
        self.every_km
    }

    /// Notify-window width in kilometres.
    pub fn notify_before_km(&self) -> i64 {
        self.notify_before_km
    }
}

fn validate_item(draft: &RegulationItemDraft) -> Result<(), SchemaValidationError> {
    if draft.title.trim().is_empty() {
        return Err(SchemaValidationError::BlankItemTitle);
    }
    if draft.every_km <= 0 {
        return Err(SchemaValidationError::NonPositiveInterval {
            title: draft.title.clone(),
            every_km: draft.every_km,
        });
    }
    if draft.notify_before_km < 0 {
        return Err(SchemaValidationError::NegativeNotifyThreshold {
            title: draft.title.clone(),
            notify_before_km: draft.notify_before_km,
        });
    }
    Ok(())
}

/// Unvalidated input for a schema and its items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationSchemaDraft {
    /// Schema title, unique system-wide.
    pub title: String,
    /// Whether this schema becomes the system default.
    pub is_default: bool,
    /// Items to create alongside the schema.
    pub items: Vec<RegulationItemDraft>,
    /// Operator creating the schema, for audit attribution.
    pub created_by: Option<Uuid>,
}

/// A validated schema header. Items live in [`SchemaWithItems`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegulationSchema {
    id: Uuid,
    title: String,
    is_default: bool,
    created_by: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl RegulationSchema {
    /// Reconstruct a schema header from stored parts.
    pub fn from_parts(
        id: Uuid,
        title: String,
        is_default: bool,
        created_by: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SchemaValidationError> {
        if title.trim().is_empty() {
            return Err(SchemaValidationError::BlankSchemaTitle);
        }
        Ok(Self {
            id,
            title,
            is_default,
            created_by,
            created_at,
        })
    }

    /// Schema identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Schema title, treated as a stable key after creation.
    pub fn title(&self) -> &str {
        self.title.as_str()
    }

    /// Whether this schema is the system default.
    pub fn is_default(&self) -> bool {
        self.is_default
    }

    /// Copy of this header with the default flag replaced.
    pub fn with_default(&self, is_default: bool) -> Self {
        Self {
            is_default,
            ..self.clone()
        }
    }

    /// Operator who created the schema, if still known.
    pub fn created_by(&self) -> Option<Uuid> {
        self.created_by
    }

    /// Creation timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// A schema together with its items, the unit the registry works in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaWithItems {
    /// The schema header.
    pub schema: RegulationSchema,
    /// The schema's items, sorted by title.
    pub items: Vec<RegulationItem>,
}

impl SchemaWithItems {
    /// Validate a draft and mint a new schema with fresh identifiers.
    pub fn new(draft: RegulationSchemaDraft) -> Result<Self, SchemaValidationError> {
        let RegulationSchemaDraft {
            title,
            is_default,
            items,
            created_by,
        } = draft;

        let schema_id = Uuid::new_v4();
        let schema =
            RegulationSchema::from_parts(schema_id, title, is_default, created_by, Utc::now())?;

        let mut seen = std::collections::HashSet::new();
        let mut validated = Vec::with_capacity(items.len());
        for item in items {
            validate_item(&item)?;
            if !seen.insert(item.title.trim().to_owned()) {
                return Err(SchemaValidationError::DuplicateItemTitle { title: item.title });
            }
            validated.push(RegulationItem {
                id: Uuid::new_v4(),
                schema_id,
                title: item.title,
                every_km: item.every_km,
                notify_before_km: item.notify_before_km,
            });
        }
        validated.sort_by(|a, b| a.title.cmp(&b.title));

        Ok(Self {
            schema,
            items: validated,
        })
    }
}
