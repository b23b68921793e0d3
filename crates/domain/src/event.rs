//! Domain event trait and the per-entity event queue.

use serde::Serialize;

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone + std::fmt::Debug + 'static {
    /// Returns the event type name.
    ///
    /// Subscribers register against this name.
    fn event_type(&self) -> &'static str;
}

/// Ordered, append-only buffer of events raised by one entity.
///
/// Entities append through their own mutators; collaborators only see the
/// events as a slice. The persistence layer clears the queue once every
/// event has been published.
#[derive(Debug, Clone, PartialEq)]
pub struct DomainEvents<E> {
    pending: Vec<E>,
}

impl<E> DomainEvents<E> {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    pub(crate) fn raise(&mut self, event: E) {
        self.pending.push(event);
    }

    /// Returns the queued events in the order they were raised.
    pub fn as_slice(&self) -> &[E] {
        &self.pending
    }

    /// Returns the number of queued events.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.pending.clear();
    }
}

impl<E> Default for DomainEvents<E> {
    fn default() -> Self {
        Self::new()
    }
}
