//! Screen navigation.
//!
//! # Conceptual overview
//! Paging manages a stack of screens hosted by a windowed UI toolkit: when screens are created,
//! shown, paused and discarded, and how the visual swap between two screens is animated. It does
//! not render anything itself; the toolkit is reached through a [`Backend`].
//!
//! ## Screens and records
//! A screen is a navigable unit of UI implementing the [`Screen`] lifecycle trait. Navigating to a
//! screen does not create it right away: it creates a [`ScreenRecord`] holding the requested
//! [`ScreenType`], the navigation parameter, and a fresh [`ScreenKey`]. The screen itself is
//! materialized from the record the first time it is needed, and `on_create` is called exactly
//! once per record. If a record’s instance is released (see *Caching*), it is never recreated from
//! that record.
//!
//! ## The stack
//! A [`NavigationStack`] holds records in navigation order and a cursor pointing at the current
//! one. Entries below the cursor are the back stack, entries above it the forward stack. Every new
//! navigation discards the forward stack, and so does going back, so there is no redo.
//!
//! ## Navigating
//! The [`Frame`] is the navigation controller. Every navigation runs the same protocol:
//!
//! 1. input on the content root is disabled
//! 2. the outgoing screen is paused (new) or closed (back); the incoming screen is created if
//!    necessary and started (new) or restarted (back)
//! 3. the stack cursor moves, and `CurrentChanged` and `Navigating` events are emitted
//! 4. the visuals are swapped, possibly with an animated [`Transition`]; this is the only step
//!    that suspends
//! 5. the outgoing screen is stopped (new) or destroyed (back), and the incoming one resumed
//! 6. input is enabled again, the outgoing screen may be released, and `Navigated` is emitted
//!
//! Navigations never overlap. A navigation call made while another one is running returns
//! `Ok(false)` without doing anything; it is up to the caller to try again.
//!
//! ## Transitions
//! Transitions are pluggable animations with one hook for forward and one for back navigation.
//! Before the animation runs, the incoming visual is inserted above or below the outgoing one as
//! the transition’s [`InsertionMode`] says; afterwards the outgoing visual is removed. Without a
//! transition the swap is immediate. A transition given with the request wins over one provided
//! by the incoming screen, which wins over the frame’s default.
//!
//! ## Caching
//! A screen that is navigated away from is kept alive while its record stays in the stack, unless
//! its [`CacheMode`] is `Disabled` or the frame has caching disabled, in which case the record
//! releases it. Going back to a released record shows a fresh instance under a new record.
//!
//! ## Threading
//! A frame is meant to be driven from a single UI thread. Queries such as
//! [`can_go_back`](Frame::can_go_back) may be called at any time, but their answer can be stale by
//! the time it is used.

pub mod animation;
pub mod backend;
mod coordinator;
pub mod error;
pub mod events;
mod frame;
mod host;
mod options;
mod record;
#[macro_use]
mod screen;
pub mod stack;
pub mod transition;

pub use animation::{ConnectedAnimation, ConnectedAnimationService};
pub use backend::Backend;
pub use coordinator::ContentRoot;
pub use error::{NavigationError, Result, TransitionError};
pub use events::{EventKind, HandlerId, NavigationEvent};
pub use frame::{Frame, FrameHandle, NavigateRequest};
pub use host::{HostEvent, HostSender};
pub use options::FrameOptions;
pub use record::{ScreenKey, ScreenRecord};
pub use screen::{handle, CacheMode, Lifecycle, Parameter, Screen, ScreenHandle, ScreenType};
pub use stack::{NavigationStack, Relocation};
pub use transition::{InsertionMode, NavigationMode, Transition, TransitionContext, Visual};
