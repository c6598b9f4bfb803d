//! Component event bus
//!
//! In-process distribution of [`ComponentEvent`]s over a tokio broadcast
//! channel. Publishing never blocks and never fails the caller; events sent
//! while nobody is subscribed are dropped.

use scr_domain::ComponentEvent;
use tokio::sync::broadcast;
use tracing::{debug, trace};

/// Default channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Broadcast bus for component lifecycle events
#[derive(Clone)]
pub struct ComponentEventBus {
    sender: broadcast::Sender<ComponentEvent>,
}

impl ComponentEventBus {
    /// Create a bus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event to all current subscribers
    pub fn publish(&self, event: ComponentEvent) {
        trace!(?event, "publishing component event");
        if self.sender.send(event).is_err() {
            debug!("no subscribers for component event");
        }
    }

    /// Subscribe to events published from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ComponentEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// True if anybody is listening
    pub fn has_subscribers(&self) -> bool {
        self.subscriber_count() > 0
    }
}

impl Default for ComponentEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

impl std::fmt::Debug for ComponentEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentEventBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}
