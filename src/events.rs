//! Application-wide change notifications and the bus that fans them out.

use std::fmt;
use std::path::PathBuf;

use crate::playback::PlaybackEvent;
use crate::service::StoreEvent;
use crate::slides::SlideEvent;

/// Anything an observer (a renderer, a remote, a log) may want to hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The item store changed.
    Store(StoreEvent),
    /// The slide sequence changed.
    Slides(SlideEvent),
    /// Playback state changed.
    Playback(PlaybackEvent),
    /// The service was written to disk.
    Saved(PathBuf),
    /// A service file replaced the current contents.
    Loaded(PathBuf),
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&AppEvent) + Send>;

/// Synchronous publish/subscribe dispatcher.
///
/// Listeners run in subscription order on the publishing thread.
#[derive(Default)]
pub struct EventBus {
    listeners: Vec<(SubscriptionId, Listener)>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EventBus {
    /// Create a bus with no listeners.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&AppEvent) + Send + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to every listener.
    pub fn publish(&mut self, event: &AppEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether nobody is listening.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
