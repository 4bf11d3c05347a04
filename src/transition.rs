//! Transition protocol.

use crate::error::TransitionError;
use crate::record::{ScreenKey, ScreenRecord};
use crate::screen::{Lifecycle, ScreenHandle};
use async_trait::async_trait;
use core::fmt;
use std::sync::Arc;

/// The kind of a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NavigationMode {
    /// A new screen is pushed on top of the current one.
    New,
    /// The current screen is popped to reveal an earlier one.
    Back,
    /// Reserved; no lifecycle callbacks are invoked.
    Forward,
    /// Reserved; no lifecycle callbacks are invoked.
    Refresh,
}

impl NavigationMode {
    /// Callbacks invoked on the (outgoing, incoming) screens before the visual swap.
    pub fn before_swap(self) -> Option<(Lifecycle, Lifecycle)> {
        match self {
            NavigationMode::New => Some((Lifecycle::Pause, Lifecycle::Start)),
            NavigationMode::Back => Some((Lifecycle::Close, Lifecycle::Restart)),
            NavigationMode::Forward | NavigationMode::Refresh => None,
        }
    }

    /// Callbacks invoked on the (outgoing, incoming) screens after the visual swap.
    pub fn after_swap(self) -> Option<(Lifecycle, Lifecycle)> {
        match self {
            NavigationMode::New => Some((Lifecycle::Stop, Lifecycle::Resume)),
            NavigationMode::Back => Some((Lifecycle::Destroy, Lifecycle::Resume)),
            NavigationMode::Forward | NavigationMode::Refresh => None,
        }
    }
}

/// Where the incoming visual goes relative to the outgoing one while a transition runs.
///
/// This is resolved the same way for every navigation mode: for back navigation the incoming
/// visual is the revealed screen and the outgoing one is the screen being popped. With
/// `IncomingAbove` the revealed screen covers the popped one while `on_close` runs, so a
/// transition that animates the popped screen away should use `IncomingBelow` to keep it visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InsertionMode {
    /// The incoming visual is inserted on top of the outgoing one.
    IncomingAbove,
    /// The incoming visual is inserted below the outgoing one.
    IncomingBelow,
}

impl Default for InsertionMode {
    fn default() -> InsertionMode {
        InsertionMode::IncomingAbove
    }
}

/// A screen’s visual as seen by the content root and by transitions.
#[derive(Clone)]
pub struct Visual {
    key: ScreenKey,
    screen: ScreenHandle,
}

impl Visual {
    pub fn new(key: ScreenKey, screen: ScreenHandle) -> Visual {
        Visual { key, screen }
    }

    pub fn key(&self) -> ScreenKey {
        self.key
    }

    pub fn screen(&self) -> &ScreenHandle {
        &self.screen
    }
}

impl fmt::Debug for Visual {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Visual({})", self.key)
    }
}

/// An animated transition between two screens.
///
/// Both hooks are awaited to completion before any further lifecycle callbacks run. A transition
/// that never completes leaves the frame navigating forever.
#[async_trait]
pub trait Transition: fmt::Debug + Send + Sync {
    /// Placement of the incoming visual while the animation runs.
    fn insertion_mode(&self) -> InsertionMode {
        InsertionMode::IncomingAbove
    }

    /// Animates a forward navigation. `outgoing` is `None` for the very first screen.
    async fn on_start(
        &self,
        incoming: &Visual,
        outgoing: Option<&Visual>,
    ) -> Result<(), TransitionError>;

    /// Animates a back navigation.
    async fn on_close(&self, outgoing: &Visual, incoming: &Visual) -> Result<(), TransitionError>;
}

/// Everything known about one navigation while its visuals are being swapped.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub mode: NavigationMode,
    pub outgoing: Option<Arc<ScreenRecord>>,
    pub incoming: Arc<ScreenRecord>,
    /// The resolved transition; `None` means the visuals are swapped immediately.
    pub transition: Option<Arc<dyn Transition>>,
}

impl TransitionContext {
    pub fn insertion_mode(&self) -> Option<InsertionMode> {
        self.transition.as_ref().map(|t| t.insertion_mode())
    }
}

/// Picks the transition for a navigation.
///
/// A transition on the request wins over one on the incoming screen; either wins over the
/// content-level toolkit transitions. With toolkit transitions enabled the frame-level default is
/// ignored and `None` is returned, leaving the animation to the toolkit.
pub fn resolve(
    request: Option<Arc<dyn Transition>>,
    screen: Option<Arc<dyn Transition>>,
    frame_default: Option<Arc<dyn Transition>>,
    toolkit_transitions: bool,
) -> Option<Arc<dyn Transition>> {
    request.or(screen).or_else(|| {
        if toolkit_transitions {
            None
        } else {
            frame_default
        }
    })
}
