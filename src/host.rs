use crossbeam::channel::{self, Receiver, Sender, TryRecvError};

/// Events sent by the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The window moved to the foreground (`true`) or the background (`false`).
    VisibilityChanged(bool),
}

/// Sending half of a frame’s host connection; hand this to the native side.
///
/// Sending fails once the frame has been detached.
#[derive(Debug, Clone)]
pub struct HostSender {
    sender: Sender<HostEvent>,
}

impl HostSender {
    pub fn send(&self, event: HostEvent) -> Result<(), HostEvent> {
        self.sender.send(event).map_err(|err| err.into_inner())
    }

    pub fn visibility_changed(&self, visible: bool) -> Result<(), HostEvent> {
        self.send(HostEvent::VisibilityChanged(visible))
    }
}

/// Receiving half of a frame’s host connection.
#[derive(Debug)]
pub(crate) struct HostLink {
    event_recv: Receiver<HostEvent>,
}

impl HostLink {
    pub fn new() -> (HostLink, HostSender) {
        let (sender, event_recv) = channel::unbounded();
        (HostLink { event_recv }, HostSender { sender })
    }

    /// Receives all events from the event queue.
    ///
    /// The second value is false if every sender has gone away.
    pub fn drain(&self) -> (Vec<HostEvent>, bool) {
        let mut events = Vec::new();
        loop {
            match self.event_recv.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => return (events, true),
                Err(TryRecvError::Disconnected) => return (events, false),
            }
        }
    }
}
