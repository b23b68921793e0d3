//! The explicit save routine.
//!
//! A handler collects the entities it touched in a [`ChangeSet`] and hands it
//! to [`UnitOfWork::save`], which stamps audit fields, writes the batch, and
//! then publishes and clears the queued domain events.

use std::sync::Arc;

use common::{TodoItemId, UserId};
use domain::{AuditInfo, DomainEvent, Entity, TodoEvent, TodoItem, TodoList};

use crate::clock::Clock;
use crate::publisher::EventPublisher;
use crate::store::{TodoStore, WriteBatch};
use crate::{PersistenceError, Result};

enum Tracked<'a> {
    List(&'a mut TodoList),
    Item(&'a mut TodoItem),
}

impl Tracked<'_> {
    fn entity(&self) -> &dyn Entity<Event = TodoEvent> {
        match self {
            Tracked::List(list) => &**list,
            Tracked::Item(item) => &**item,
        }
    }

    fn entity_mut(&mut self) -> &mut dyn Entity<Event = TodoEvent> {
        match self {
            Tracked::List(list) => &mut **list,
            Tracked::Item(item) => &mut **item,
        }
    }
}

/// Entities touched by one operation, in the order they were added.
#[derive(Default)]
pub struct ChangeSet<'a> {
    tracked: Vec<Tracked<'a>>,
    deleted_items: Vec<TodoItemId>,
}

impl<'a> ChangeSet<'a> {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self {
            tracked: Vec::new(),
            deleted_items: Vec::new(),
        }
    }

    /// Tracks a new or modified list.
    pub fn add_list(&mut self, list: &'a mut TodoList) -> &mut Self {
        self.tracked.push(Tracked::List(list));
        self
    }

    /// Tracks a new or modified item.
    pub fn add_item(&mut self, item: &'a mut TodoItem) -> &mut Self {
        self.tracked.push(Tracked::Item(item));
        self
    }

    /// Marks an item for deletion.
    pub fn delete_item(&mut self, id: TodoItemId) -> &mut Self {
        self.deleted_items.push(id);
        self
    }

    /// Returns the number of tracked entities and deletions.
    pub fn len(&self) -> usize {
        self.tracked.len() + self.deleted_items.len()
    }

    /// Returns true if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn pending_events(&self) -> Vec<TodoEvent> {
        self.tracked
            .iter()
            .flat_map(|tracked| tracked.entity().domain_events().iter().cloned())
            .collect()
    }
}

/// Persistence gateway: writes change sets and publishes their events.
pub struct UnitOfWork {
    store: Arc<dyn TodoStore>,
    publisher: Arc<EventPublisher<TodoEvent>>,
    clock: Arc<dyn Clock>,
}

impl UnitOfWork {
    /// Creates a unit of work over a store, an event publisher, and a clock.
    pub fn new(
        store: Arc<dyn TodoStore>,
        publisher: Arc<EventPublisher<TodoEvent>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            publisher,
            clock,
        }
    }

    /// Returns the underlying store for reads.
    pub fn store(&self) -> &dyn TodoStore {
        self.store.as_ref()
    }

    /// Returns a shared handle to the underlying store.
    pub fn shared_store(&self) -> Arc<dyn TodoStore> {
        self.store.clone()
    }

    /// Saves a change set.
    ///
    /// 1. Stamps audit fields on snapshots: creation for unsaved entities,
    ///    modification for the rest, using `actor` (empty when anonymous).
    /// 2. Applies the batch atomically; the stamps are copied back onto the
    ///    entities only once it succeeded.
    /// 3. Publishes every queued event, entity by entity in tracking order.
    /// 4. Clears the queues.
    ///
    /// If a subscriber fails, events already delivered stay delivered and
    /// no queue is cleared, so saving the same entities again re-publishes
    /// (at-least-once delivery). Returns the number of rows written.
    #[tracing::instrument(skip(self, changes, actor), fields(tracked = changes.len()))]
    pub async fn save(&self, changes: &mut ChangeSet<'_>, actor: Option<&UserId>) -> Result<usize> {
        let now = self.clock.now();
        let actor = actor.map(UserId::to_string).unwrap_or_default();

        let mut batch = WriteBatch {
            deleted_items: changes.deleted_items.clone(),
            ..Default::default()
        };
        let mut stamps: Vec<AuditInfo> = Vec::with_capacity(changes.tracked.len());

        for tracked in &changes.tracked {
            let mut audit = tracked.entity().audit().clone();
            if audit.is_new() {
                audit.mark_created(now, actor.clone());
            } else {
                audit.mark_modified(now, actor.clone());
            }

            match tracked {
                Tracked::List(list) => {
                    let mut snapshot = list.snapshot();
                    snapshot.audit = audit.clone();
                    batch.lists.push(snapshot);
                }
                Tracked::Item(item) => {
                    let mut snapshot = item.snapshot();
                    snapshot.audit = audit.clone();
                    batch.items.push(snapshot);
                }
            }
            stamps.push(audit);
        }

        let written = if batch.is_empty() {
            0
        } else {
            self.store.apply(batch).await?
        };

        for (tracked, audit) in changes.tracked.iter_mut().zip(stamps) {
            *tracked.entity_mut().audit_mut() = audit;
        }

        let events = changes.pending_events();
        for (delivered, event) in events.iter().enumerate() {
            self.publisher
                .publish(event)
                .await
                .map_err(|source| PersistenceError::Publish {
                    event_type: event.event_type(),
                    delivered,
                    source,
                })?;
        }

        for tracked in &mut changes.tracked {
            tracked.entity_mut().clear_domain_events();
        }

        tracing::debug!(written, published = events.len(), "changes saved");
        Ok(written)
    }
}
