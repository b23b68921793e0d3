//! Entity base: audit metadata and access to the domain event queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::DomainEvent;

/// Who created or last modified an entity, and when.
///
/// Stamped by the persistence layer during a save, never by the entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditInfo {
    pub created: Option<DateTime<Utc>>,
    pub created_by: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}

impl AuditInfo {
    /// Returns true if the entity has never been saved.
    pub fn is_new(&self) -> bool {
        self.created.is_none()
    }

    /// Records the creation of the entity.
    pub fn mark_created(&mut self, at: DateTime<Utc>, by: impl Into<String>) {
        self.created = Some(at);
        self.created_by = by.into();
    }

    /// Records a modification of an already persisted entity.
    pub fn mark_modified(&mut self, at: DateTime<Utc>, by: impl Into<String>) {
        self.last_modified = Some(at);
        self.last_modified_by = Some(by.into());
    }
}

/// Trait for persisted entities that carry audit metadata and raise events.
///
/// The event queue is read-only to collaborators; only the entity's own
/// mutators append to it. [`Entity::clear_domain_events`] exists for the
/// save routine, which calls it after every queued event was published.
pub trait Entity: Send + Sync {
    /// The events this entity raises.
    type Event: DomainEvent;

    /// Returns the entity type name, used in logs and error messages.
    fn entity_type() -> &'static str
    where
        Self: Sized;

    /// Returns the audit metadata.
    fn audit(&self) -> &AuditInfo;

    /// Returns the audit metadata for stamping.
    fn audit_mut(&mut self) -> &mut AuditInfo;

    /// Returns the queued, not yet published events.
    fn domain_events(&self) -> &[Self::Event];

    /// Drops all queued events.
    ///
    /// Reserved for the persistence save routine, which calls it only after
    /// the entity was written and every queued event was delivered. Calling
    /// it anywhere else loses events that were never published.
    fn clear_domain_events(&mut self);
}
