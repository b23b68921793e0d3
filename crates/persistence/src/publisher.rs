//! Domain event subscriber registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use domain::DomainEvent;

/// Error returned by a subscriber.
pub type SubscriberError = Box<dyn std::error::Error + Send + Sync>;

/// Reacts to published domain events of the types it subscribed to.
#[async_trait]
pub trait EventSubscriber<E: DomainEvent>: Send + Sync {
    /// Returns the subscriber name, used in logs.
    fn name(&self) -> &'static str;

    /// Handles one event.
    async fn handle(&self, event: &E) -> Result<(), SubscriberError>;
}

/// Delivers domain events synchronously to the subscribers of their type.
///
/// Subscriptions are made at composition time; publication happens during
/// a save and awaits every subscriber in registration order.
pub struct EventPublisher<E: DomainEvent> {
    subscribers: HashMap<&'static str, Vec<Arc<dyn EventSubscriber<E>>>>,
}

impl<E: DomainEvent> EventPublisher<E> {
    /// Creates a publisher with no subscribers.
    pub fn new() -> Self {
        Self {
            subscribers: HashMap::new(),
        }
    }

    /// Registers a subscriber for one event type.
    pub fn subscribe(
        &mut self,
        event_type: &'static str,
        subscriber: Arc<dyn EventSubscriber<E>>,
    ) -> &mut Self {
        self.subscribers
            .entry(event_type)
            .or_default()
            .push(subscriber);
        self
    }

    /// Returns the number of subscribers for an event type.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers.get(event_type).map_or(0, Vec::len)
    }

    /// Delivers an event to every subscriber of its type.
    ///
    /// Stops at the first failing subscriber; earlier subscribers have
    /// already handled the event.
    #[tracing::instrument(skip(self, event), fields(event_type = event.event_type()))]
    pub async fn publish(&self, event: &E) -> Result<(), SubscriberError> {
        let Some(subscribers) = self.subscribers.get(event.event_type()) else {
            tracing::trace!("no subscribers");
            return Ok(());
        };

        for subscriber in subscribers {
            subscriber.handle(event).await.inspect_err(|e| {
                tracing::warn!(subscriber = subscriber.name(), error = %e, "subscriber failed");
            })?;
        }

        metrics::counter!("domain_events_published_total", "event_type" => event.event_type())
            .increment(1);
        Ok(())
    }
}

impl<E: DomainEvent> Default for EventPublisher<E> {
    fn default() -> Self {
        Self::new()
    }
}
