use crate::animation::ConnectedAnimationService;
use crate::error::{BoxError, NavigationError, Result};
use crate::frame::FrameHandle;
use crate::transition::Transition;
use core::any::{self, Any};
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;

/// An opaque navigation argument, handed to a screen once when it is created.
pub type Parameter = Arc<dyn Any + Send + Sync>;

/// A live screen instance, shared between its stack record and the frame while it is navigating.
pub type ScreenHandle = Arc<Mutex<dyn Screen>>;

/// Wraps a screen in a [`ScreenHandle`].
pub fn handle<S: Screen>(screen: S) -> ScreenHandle {
    Arc::new(Mutex::new(screen))
}

/// Implements the boilerplate of the `Screen` trait for a given struct.
///
/// Syntax:
///
/// ```text
/// impl_screen! {
///     StructName;
///     (lifecycle overrides like on_create() go here, using normal rust syntax)
/// }
/// ```
#[macro_export]
macro_rules! impl_screen {
    (
        $(#[$attr:meta])*
        $struct:ty;
        $($extra:tt)*
    ) => {
        $(#[$attr])*
        impl $crate::Screen for $struct {
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            $($extra)*
        }
    };
}

/// Screens are the navigable units hosted by a [`Frame`](crate::Frame).
///
/// The frame creates a screen lazily from its [`ScreenType`], binds it, calls `on_create` exactly
/// once, and then drives the remaining callbacks in a fixed order around every navigation:
///
/// | navigation | before the swap            | after the swap                 |
/// |------------|----------------------------|--------------------------------|
/// | new        | old `on_pause`, new `on_start`  | old `on_stop`, new `on_resume`    |
/// | back       | old `on_close`, new `on_restart` | old `on_destroy`, new `on_resume` |
///
/// Every callback has an empty default implementation.
///
/// This trait should probably be implemented using the [`impl_screen`] macro.
///
/// # Deadlocks
/// Callbacks run while the frame holds the screen’s lock. A screen may call back into its frame
/// (e.g. to navigate), but must not try to lock its own handle from a callback.
pub trait Screen: Any + fmt::Debug + Send {
    /// For downcasting.
    fn as_any(&self) -> &dyn Any;

    /// For downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Binds the screen to the frame hosting it; called right before `on_create`.
    ///
    /// The handle does not keep the frame alive.
    fn bind(&mut self, frame: FrameHandle) {
        drop(frame);
    }

    /// Called once, when the screen is first materialized.
    fn on_create(&mut self, parameter: Option<Parameter>) {
        drop(parameter);
    }

    fn on_start(&mut self) {}

    fn on_restart(&mut self) {}

    fn on_resume(&mut self) {}

    fn on_pause(&mut self) {}

    fn on_stop(&mut self) {}

    fn on_close(&mut self) {}

    fn on_destroy(&mut self) {}

    /// Called on the outgoing screen before the visual swap begins.
    fn prepare_connected_animation(&mut self, service: &ConnectedAnimationService) {
        let _ = service;
    }

    /// Called on the incoming screen once its visual has been inserted.
    fn use_connected_animation(&mut self, service: &ConnectedAnimationService) {
        let _ = service;
    }

    /// Called when the host window is shown or hidden, but only while this screen is current.
    fn on_visibility_changed(&mut self, visible: bool) {
        let _ = visible;
    }

    /// Whether the instance survives being navigated away from.
    fn cache_mode(&self) -> CacheMode {
        CacheMode::Required
    }

    /// A transition that overrides the frame’s transition while this screen is being shown.
    fn transition(&self) -> Option<Arc<dyn Transition>> {
        None
    }
}

/// Cache policy of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheMode {
    /// The instance is kept while its record stays in the stack.
    Required,
    /// The instance is released as soon as the screen is navigated away from.
    Disabled,
}

/// Lifecycle callbacks driven around the visual swap.
///
/// Creation is not part of this set since it carries the navigation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    Start,
    Restart,
    Resume,
    Pause,
    Stop,
    Close,
    Destroy,
}

impl Lifecycle {
    /// Invokes the corresponding callback on a screen.
    pub fn dispatch(self, screen: &mut dyn Screen) {
        match self {
            Lifecycle::Start => screen.on_start(),
            Lifecycle::Restart => screen.on_restart(),
            Lifecycle::Resume => screen.on_resume(),
            Lifecycle::Pause => screen.on_pause(),
            Lifecycle::Stop => screen.on_stop(),
            Lifecycle::Close => screen.on_close(),
            Lifecycle::Destroy => screen.on_destroy(),
        }
    }
}

type Factory = dyn Fn() -> core::result::Result<ScreenHandle, BoxError> + Send + Sync;

/// Identifies a kind of screen and knows how to construct it.
///
/// Two screen types are equal if they have the same name.
#[derive(Clone)]
pub struct ScreenType {
    name: &'static str,
    factory: Arc<Factory>,
}

impl ScreenType {
    /// The screen type for a `Default`-constructible screen, named after the Rust type.
    pub fn of<S: Screen + Default>() -> ScreenType {
        ScreenType {
            name: any::type_name::<S>(),
            factory: Arc::new(|| Ok(handle(S::default()))),
        }
    }

    /// A screen type with a custom factory.
    ///
    /// An error from the factory surfaces as [`NavigationError::Factory`] from the navigation
    /// that needed the screen.
    pub fn from_fn<F>(name: &'static str, factory: F) -> ScreenType
    where
        F: Fn() -> core::result::Result<ScreenHandle, BoxError> + Send + Sync + 'static,
    {
        ScreenType {
            name,
            factory: Arc::new(factory),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Constructs a new, unbound screen.
    pub(crate) fn create(&self) -> Result<ScreenHandle> {
        (self.factory)().map_err(|source| NavigationError::Factory {
            screen: self.name,
            source,
        })
    }
}

impl PartialEq for ScreenType {
    fn eq(&self, other: &ScreenType) -> bool {
        self.name == other.name
    }
}

impl Eq for ScreenType {}

impl fmt::Debug for ScreenType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ScreenType({})", self.name)
    }
}
