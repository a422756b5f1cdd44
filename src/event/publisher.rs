use log::{debug, warn};
use std::collections::HashSet;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use crate::entity::{DomainEvent, EventType};

/// Receiver of domain events.
pub trait EventSubscriber: Send + Sync {
    fn notify(&self, event: &DomainEvent);
}

impl<F> EventSubscriber for F
where
    F: Fn(&DomainEvent) + Send + Sync,
{
    fn notify(&self, event: &DomainEvent) {
        self(event)
    }
}

struct Subscription {
    subscriber: Weak<dyn EventSubscriber>,
    event_type: EventType,
}

impl Subscription {
    fn belongs_to(&self, key: *const ()) -> bool {
        self.subscriber.as_ptr() as *const () == key
    }
}

#[derive(Default)]
struct Registry {
    subscriptions: Vec<Subscription>,
    filters: HashSet<EventType>,
    closed: bool,
}

/// Event bus owned by the application and handed to every component that
/// publishes or listens.
///
/// Subscribers are held weakly: dropping the last `Arc` of a subscriber ends
/// its subscriptions. When filters are set, only events of filtered types are
/// delivered.
#[derive(Default)]
pub struct EventPublisher {
    registry: RwLock<Registry>,
}

impl EventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers the event to its subscribers and returns how many were notified.
    ///
    /// Subscribers are called after the registry lock is released, so they may
    /// subscribe or unsubscribe from inside `notify`.
    pub fn publish(&self, event: DomainEvent) -> usize {
        let event_type = event.event_type();
        let receivers: Vec<Arc<dyn EventSubscriber>> = {
            let registry = self.registry.read().unwrap_or_else(PoisonError::into_inner);
            if registry.closed {
                warn!("Dropping {} published after the event bus was closed", event_type);
                return 0;
            }
            if !registry.filters.is_empty() && !registry.filters.contains(&event_type) {
                debug!("Filtered out {}", event_type);
                return 0;
            }
            registry
                .subscriptions
                .iter()
                .filter(|s| s.event_type == event_type)
                .filter_map(|s| s.subscriber.upgrade())
                .collect()
        };

        debug!("Publishing {} to {} subscriber(s)", event_type, receivers.len());
        for receiver in &receivers {
            receiver.notify(&event);
        }
        self.prune();
        receivers.len()
    }

    /// Subscribes to one event type. Subscribing twice to the same type is a no-op.
    pub fn subscribe<S>(&self, subscriber: &Arc<S>, event_type: EventType)
    where
        S: EventSubscriber + 'static,
    {
        let key = Arc::as_ptr(subscriber) as *const ();
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        if registry.closed {
            warn!("Ignoring subscription to {} on a closed event bus", event_type);
            return;
        }
        let exists = registry
            .subscriptions
            .iter()
            .any(|s| s.belongs_to(key) && s.event_type == event_type);
        if !exists {
            let subscriber: Arc<dyn EventSubscriber> = subscriber.clone();
            registry.subscriptions.push(Subscription {
                subscriber: Arc::downgrade(&subscriber),
                event_type,
            });
        }
    }

    /// Removes every subscription of the subscriber. Unknown subscribers are ignored.
    pub fn unsubscribe<S>(&self, subscriber: &Arc<S>)
    where
        S: EventSubscriber + 'static,
    {
        let key = Arc::as_ptr(subscriber) as *const ();
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .retain(|s| !s.belongs_to(key));
    }

    /// Restricts delivery to the filtered event types.
    pub fn add_filter(&self, event_type: EventType) {
        self.registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .filters
            .insert(event_type);
    }

    /// Drops all subscriptions and filters.
    pub fn reset(&self) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.subscriptions.clear();
        registry.filters.clear();
    }

    /// Shuts the bus down; later publishes and subscriptions are ignored.
    pub fn close(&self) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry.subscriptions.clear();
        registry.filters.clear();
        registry.closed = true;
        debug!("Event bus closed");
    }

    pub fn is_closed(&self) -> bool {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .closed
    }

    pub fn subscription_count(&self) -> usize {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .iter()
            .filter(|s| s.subscriber.strong_count() > 0)
            .count()
    }

    fn prune(&self) {
        let mut registry = self.registry.write().unwrap_or_else(PoisonError::into_inner);
        registry
            .subscriptions
            .retain(|s| s.subscriber.strong_count() > 0);
    }
}
