//! Navigation events.

use crate::record::ScreenKey;
use crate::transition::NavigationMode;
use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;

/// Observable events emitted by a frame.
///
/// Events are notifications only; observers cannot cancel a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationEvent {
    /// The stack cursor moved to a new entry.
    CurrentChanged {
        from: Option<ScreenKey>,
        to: ScreenKey,
    },
    /// The stack has been updated and the visual swap is about to start.
    Navigating {
        mode: NavigationMode,
        from: Option<ScreenKey>,
        to: ScreenKey,
    },
    /// The navigation has completed.
    Navigated {
        mode: NavigationMode,
        from: Option<ScreenKey>,
        to: ScreenKey,
    },
}

impl NavigationEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            NavigationEvent::CurrentChanged { .. } => EventKind::CurrentChanged,
            NavigationEvent::Navigating { .. } => EventKind::Navigating,
            NavigationEvent::Navigated { .. } => EventKind::Navigated,
        }
    }
}

/// List of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    CurrentChanged,
    Navigating,
    Navigated,
}

/// Identifies a registered event handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler = Arc<dyn Fn(&NavigationEvent) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    handlers: Vec<(HandlerId, EventKind, Handler)>,
    subscribers: Vec<Sender<NavigationEvent>>,
}

/// Event handlers and channel subscribers of one frame.
#[derive(Default)]
pub(crate) struct Events {
    registry: Mutex<Registry>,
}

impl Events {
    pub fn add_handler<F>(&self, kind: EventKind, handler: F) -> HandlerId
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = HandlerId(registry.next_id);
        registry.next_id += 1;
        registry.handlers.push((id, kind, Arc::new(handler)));
        id
    }

    pub fn remove_handler(&self, id: HandlerId) -> bool {
        let mut registry = self.registry.lock();
        let len = registry.handlers.len();
        registry.handlers.retain(|(handler_id, _, _)| *handler_id != id);
        registry.handlers.len() != len
    }

    pub fn subscribe(&self) -> Receiver<NavigationEvent> {
        let (sender, receiver) = channel::unbounded();
        self.registry.lock().subscribers.push(sender);
        receiver
    }

    /// Calls all matching handlers and forwards the event to all subscribers.
    ///
    /// Handlers are called without any locks held, so they may call back into the frame.
    pub fn emit(&self, event: NavigationEvent) {
        tracing::trace!(?event, "emit");
        let handlers: Vec<Handler> = {
            let mut registry = self.registry.lock();
            // dead subscribers are dropped here
            registry
                .subscribers
                .retain(|subscriber| subscriber.send(event).is_ok());
            registry
                .handlers
                .iter()
                .filter(|(_, kind, _)| *kind == event.kind())
                .map(|(_, _, handler)| Arc::clone(handler))
                .collect()
        };

        for handler in handlers {
            handler(&event);
        }
    }
}
