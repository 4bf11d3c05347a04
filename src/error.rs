//! Errors.

use crate::record::ScreenKey;
use thiserror::Error;

/// Boxed error returned by screen factories and transitions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type used throughout the crate.
pub type Result<T, E = NavigationError> = core::result::Result<T, E>;

/// Errors returned by navigation calls.
///
/// A rejected navigation (another one is still running) or an index outside the stack is *not* an
/// error; those calls return `Ok(false)`. The variants below are caller-contract violations or
/// failures of an external collaborator.
#[derive(Debug, Error)]
pub enum NavigationError {
    /// `go_back` was called while there was nothing to go back to.
    #[error("the frame cannot go back")]
    CannotGoBack,

    /// The current entry cannot be removed from the stack.
    #[error("the current screen (index {index}) cannot be removed from the stack")]
    RemoveCurrent { index: usize },

    /// A screen factory failed to produce a screen.
    #[error("failed to create screen `{screen}`")]
    Factory {
        screen: &'static str,
        #[source]
        source: BoxError,
    },

    /// A record whose instance was released was asked for its screen again.
    #[error("screen record {0} has been released")]
    Released(ScreenKey),

    /// The entry being navigated back to left the stack before the navigation could commit.
    #[error("screen record {0} was removed from the stack during navigation")]
    TargetRemoved(ScreenKey),

    /// The transition animation failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The frame behind a [`FrameHandle`](crate::FrameHandle) no longer exists.
    #[error("the frame has been dropped")]
    Detached,
}

/// Error reported by a [`Transition`](crate::Transition) implementation.
#[derive(Debug, Error)]
#[error("transition failed: {message}")]
pub struct TransitionError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransitionError {
    /// Creates a new transition error with a message.
    pub fn new(message: impl Into<String>) -> TransitionError {
        TransitionError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new transition error wrapping another error.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> TransitionError {
        TransitionError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
