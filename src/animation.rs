//! Connected animations.

use crate::record::ScreenKey;
use core::any::Any;
use core::fmt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// An element prepared by an outgoing screen, waiting to be picked up by the incoming one.
#[derive(Clone)]
pub struct ConnectedAnimation {
    source: Option<ScreenKey>,
    element: Arc<dyn Any + Send + Sync>,
}

impl ConnectedAnimation {
    /// The screen that prepared the animation, if it said so.
    pub fn source(&self) -> Option<ScreenKey> {
        self.source
    }

    /// The prepared element.
    pub fn element<T: Any>(&self) -> Option<&T> {
        self.element.downcast_ref()
    }
}

impl fmt::Debug for ConnectedAnimation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ConnectedAnimation")
            .field("source", &self.source)
            .finish()
    }
}

/// Keyed store of connected animations, handed to
/// [`prepare_connected_animation`](crate::Screen::prepare_connected_animation) and
/// [`use_connected_animation`](crate::Screen::use_connected_animation).
///
/// Animations that were not picked up by the end of a navigation are discarded.
#[derive(Debug, Default)]
pub struct ConnectedAnimationService {
    prepared: Mutex<HashMap<String, ConnectedAnimation>>,
}

impl ConnectedAnimationService {
    pub fn new() -> ConnectedAnimationService {
        ConnectedAnimationService::default()
    }

    /// Prepares an element to be animated under the given key, replacing any previous one.
    pub fn prepare_to_animate<T>(&self, key: impl Into<String>, element: T)
    where
        T: Any + Send + Sync,
    {
        self.prepare(key, None, element);
    }

    /// Like [`prepare_to_animate`](Self::prepare_to_animate), recording the source screen.
    pub fn prepare<T>(&self, key: impl Into<String>, source: Option<ScreenKey>, element: T)
    where
        T: Any + Send + Sync,
    {
        let animation = ConnectedAnimation {
            source,
            element: Arc::new(element),
        };
        self.prepared.lock().insert(key.into(), animation);
    }

    /// Takes the animation prepared under the given key.
    pub fn get_animation(&self, key: &str) -> Option<ConnectedAnimation> {
        self.prepared.lock().remove(key)
    }

    pub fn is_prepared(&self, key: &str) -> bool {
        self.prepared.lock().contains_key(key)
    }

    /// Discards all animations that were not picked up; returns how many there were.
    pub(crate) fn expire(&self) -> usize {
        let mut prepared = self.prepared.lock();
        let count = prepared.len();
        prepared.clear();
        count
    }
}
