//! The navigation controller.

use crate::animation::ConnectedAnimationService;
use crate::backend::Backend;
use crate::coordinator::{self, ContentRoot};
use crate::error::{NavigationError, Result};
use crate::events::{EventKind, Events, HandlerId, NavigationEvent};
use crate::host::{HostEvent, HostLink, HostSender};
use crate::options::FrameOptions;
use crate::record::{ScreenKey, ScreenRecord};
use crate::screen::{CacheMode, Lifecycle, Parameter, ScreenHandle, ScreenType};
use crate::stack::NavigationStack;
use crate::transition::{self, NavigationMode, Transition, TransitionContext, Visual};
use core::sync::atomic::{AtomicBool, Ordering};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// A request to show a new screen.
#[derive(Debug, Clone)]
pub struct NavigateRequest {
    pub screen_type: ScreenType,
    pub parameter: Option<Parameter>,
    /// Overrides every other transition for this navigation.
    pub transition: Option<Arc<dyn Transition>>,
}

impl NavigateRequest {
    pub fn new(screen_type: ScreenType) -> NavigateRequest {
        NavigateRequest {
            screen_type,
            parameter: None,
            transition: None,
        }
    }

    pub fn with_parameter(mut self, parameter: Parameter) -> NavigateRequest {
        self.parameter = Some(parameter);
        self
    }

    pub fn with_transition(mut self, transition: Arc<dyn Transition>) -> NavigateRequest {
        self.transition = Some(transition);
        self
    }
}

struct State {
    stack: NavigationStack,
    options: FrameOptions,
    transition: Option<Arc<dyn Transition>>,
    source_screen_type: Option<ScreenType>,
    /// Set if the forward stack was cleared while a navigation was running.
    pending_forward_clear: bool,
}

/// Where the incoming record ends up once a navigation commits.
#[derive(Debug, Clone, Copy)]
enum Target {
    /// Appended on top of the stack.
    Top,
    /// Takes the place of the entry with this key, wherever it is by then.
    Entry(ScreenKey),
}

struct Inner {
    state: Mutex<State>,
    content: Mutex<ContentRoot>,
    navigating: AtomicBool,
    backend: Arc<dyn Backend>,
    events: Events,
    animations: ConnectedAnimationService,
    host: Mutex<Option<HostLink>>,
}

/// Holds the re-entrancy flag for the duration of one navigation.
///
/// The flag is cleared on drop, so it is released on every exit path, including errors, panics and
/// a navigation future that is dropped before completion.
struct NavigationGuard<'a> {
    inner: &'a Inner,
}

impl<'a> NavigationGuard<'a> {
    fn acquire(inner: &'a Inner) -> Option<NavigationGuard<'a>> {
        inner
            .navigating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| NavigationGuard { inner })
    }
}

impl Drop for NavigationGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.inner.state.lock();
        if state.pending_forward_clear {
            state.pending_forward_clear = false;
            let removed = state.stack.clear_forward_stack();
            debug!(removed = removed.len(), "applied deferred forward stack clear");
        }
        drop(state);
        self.inner.navigating.store(false, Ordering::Release);
    }
}

/// A navigation frame: hosts a stack of screens and drives their lifecycle and transitions.
///
/// All navigation calls share a single re-entrancy flag. A call made while another navigation is
/// running returns `Ok(false)` immediately and changes nothing; it is not queued.
///
/// Cloning a frame is cheap and yields another owner of the same frame. Screens receive a
/// [`FrameHandle`] instead, which does not keep the frame alive.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<Inner>,
}

impl Frame {
    /// Creates a frame with default options.
    pub fn new<B: Backend + 'static>(backend: B) -> Frame {
        Frame::with_options(backend, FrameOptions::default())
    }

    pub fn with_options<B: Backend + 'static>(backend: B, options: FrameOptions) -> Frame {
        let mut stack = NavigationStack::new();
        stack.set_automatic_back_button(options.automatic_back_button);

        Frame {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    stack,
                    options,
                    transition: None,
                    source_screen_type: None,
                    pending_forward_clear: false,
                }),
                content: Mutex::new(ContentRoot::new()),
                navigating: AtomicBool::new(false),
                backend: Arc::new(backend),
                events: Events::default(),
                animations: ConnectedAnimationService::new(),
                host: Mutex::new(None),
            }),
        }
    }

    /// A frame without a host toolkit.
    pub fn headless() -> Frame {
        Frame::new(())
    }

    /// Returns a non-owning handle to this frame.
    pub fn handle(&self) -> FrameHandle {
        FrameHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }

    // options

    pub fn options(&self) -> FrameOptions {
        self.inner.state.lock().options
    }

    pub fn set_disable_cache(&self, disable: bool) {
        self.inner.state.lock().options.disable_cache = disable;
    }

    pub fn set_toolkit_transitions(&self, enabled: bool) {
        self.inner.state.lock().options.toolkit_transitions = enabled;
    }

    pub fn set_automatic_back_button(&self, enabled: bool) {
        let change = {
            let mut state = self.inner.state.lock();
            state.options.automatic_back_button = enabled;
            state.stack.set_automatic_back_button(enabled);
            state.stack.back_button_change()
        };
        self.signal_back_button(change);
    }

    /// Sets the default transition used when neither the request nor the incoming screen has one.
    pub fn set_transition(&self, transition: Option<Arc<dyn Transition>>) {
        self.inner.state.lock().transition = transition;
    }

    pub fn transition(&self) -> Option<Arc<dyn Transition>> {
        self.inner.state.lock().transition.clone()
    }

    // queries

    pub fn is_navigating(&self) -> bool {
        self.inner.navigating.load(Ordering::Acquire)
    }

    pub fn can_go_back(&self) -> bool {
        self.inner.state.lock().stack.can_go_back()
    }

    pub fn can_go_forward(&self) -> bool {
        self.inner.state.lock().stack.can_go_forward()
    }

    /// The number of entries up to and including the current one.
    pub fn back_stack_depth(&self) -> usize {
        self.inner.state.lock().stack.back_stack_depth()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.inner.state.lock().stack.current_index()
    }

    pub fn current_record(&self) -> Option<Arc<ScreenRecord>> {
        self.inner.state.lock().stack.current().cloned()
    }

    /// The live instance of the current screen.
    pub fn current_screen(&self) -> Option<ScreenHandle> {
        self.current_record().and_then(|record| record.instance())
    }

    /// A snapshot of the stack entries, bottom first.
    pub fn entries(&self) -> Vec<Arc<ScreenRecord>> {
        self.inner.state.lock().stack.entries().to_vec()
    }

    pub fn keys(&self) -> Vec<ScreenKey> {
        self.inner.state.lock().stack.keys()
    }

    pub fn find_nearest(&self, screen_type: &ScreenType) -> Option<Arc<ScreenRecord>> {
        self.inner.state.lock().stack.find_nearest(screen_type).cloned()
    }

    /// Keys of the visuals currently in the content root, bottom first.
    pub fn visuals(&self) -> Vec<ScreenKey> {
        self.inner.content.lock().keys()
    }

    pub fn animations(&self) -> &ConnectedAnimationService {
        &self.inner.animations
    }

    // navigation

    /// Shows the first screen.
    pub async fn initialize(&self, home: ScreenType, parameter: Option<Parameter>) -> Result<bool> {
        self.navigate(home, parameter).await
    }

    /// Pushes a new screen, discarding the forward stack.
    ///
    /// Returns `Ok(false)` if another navigation is running.
    pub async fn navigate(
        &self,
        screen_type: ScreenType,
        parameter: Option<Parameter>,
    ) -> Result<bool> {
        self.navigate_with(NavigateRequest {
            screen_type,
            parameter,
            transition: None,
        })
        .await
    }

    pub async fn navigate_with(&self, request: NavigateRequest) -> Result<bool> {
        let _guard = match self.begin("navigate") {
            Some(guard) => guard,
            None => return Ok(false),
        };
        let record = Arc::new(ScreenRecord::new(request.screen_type, request.parameter));
        self.push(record, request.transition).await?;
        Ok(true)
    }

    /// Pops the current screen.
    ///
    /// Calling this when [`can_go_back`](Self::can_go_back) is false is an error.
    pub async fn go_back(&self) -> Result<bool> {
        let _guard = match self.begin("go_back") {
            Some(guard) => guard,
            None => return Ok(false),
        };
        let target = match self.inner.state.lock().stack.current_index() {
            Some(current) if current > 0 => current - 1,
            _ => return Err(NavigationError::CannotGoBack),
        };
        self.pop_to(target).await?;
        Ok(true)
    }

    /// Jumps back to the entry at `index`, discarding everything above it.
    ///
    /// Only the current screen and the target receive lifecycle callbacks; entries in between are
    /// dropped without being resumed or destroyed. Returns `Ok(false)` if `index` is not below the
    /// current entry.
    pub async fn go_back_to(&self, index: usize) -> Result<bool> {
        if !self.inner.state.lock().stack.can_go_back_to(index) {
            return Ok(false);
        }
        let _guard = match self.begin("go_back_to") {
            Some(guard) => guard,
            None => return Ok(false),
        };
        // the stack may have changed between the check and the guard
        if !self.inner.state.lock().stack.can_go_back_to(index) {
            return Ok(false);
        }
        self.pop_to(index).await?;
        Ok(true)
    }

    /// Jumps back to the first entry.
    pub async fn go_home(&self) -> Result<bool> {
        self.go_back_to(0).await
    }

    /// Moves an entry on top of the stack by showing it again as a new navigation.
    ///
    /// If the navigation fails before the stack is updated, the entry is put back where it was.
    /// Returns `Ok(false)` if there is no such entry or another navigation is running.
    pub async fn move_to_top(&self, key: ScreenKey) -> Result<bool> {
        let _guard = match self.begin("move_to_top") {
            Some(guard) => guard,
            None => return Ok(false),
        };
        let relocation = {
            let mut state = self.inner.state.lock();
            if state.stack.current().map(|record| record.key()) == Some(key) {
                return Ok(true);
            }
            match state.stack.take_for_relocation(key) {
                Some(relocation) => relocation,
                None => return Ok(false),
            }
        };

        let record = Arc::clone(relocation.record());
        let record = if record.is_released() {
            Arc::new(record.renew())
        } else {
            record
        };
        let moved_key = record.key();

        match self.push(record, None).await {
            Ok(()) => Ok(true),
            Err(err) => {
                let mut state = self.inner.state.lock();
                if state.stack.index_of(moved_key).is_none() {
                    relocation.rollback(&mut state.stack);
                }
                Err(err)
            }
        }
    }

    /// Setting the source screen type navigates to it.
    pub async fn set_source_screen_type(&self, screen_type: ScreenType) -> Result<bool> {
        self.inner.state.lock().source_screen_type = Some(screen_type.clone());
        self.navigate(screen_type, None).await
    }

    pub fn source_screen_type(&self) -> Option<ScreenType> {
        self.inner.state.lock().source_screen_type.clone()
    }

    // stack administration

    /// Removes a non-current entry; removing the current one is an error.
    pub fn remove_at(&self, index: usize) -> Result<bool> {
        let (removed, change) = {
            let mut state = self.inner.state.lock();
            let removed = state.stack.remove_at(index)?;
            (removed, state.stack.back_button_change())
        };
        self.signal_back_button(change);
        Ok(removed)
    }

    pub fn remove(&self, key: ScreenKey) -> Result<bool> {
        let (removed, change) = {
            let mut state = self.inner.state.lock();
            let removed = state.stack.remove(key)?;
            (removed, state.stack.back_button_change())
        };
        self.signal_back_button(change);
        Ok(removed)
    }

    pub fn clear_back_stack(&self) {
        let change = {
            let mut state = self.inner.state.lock();
            let removed = state.stack.clear_back_stack();
            debug!(removed = removed.len(), "cleared back stack");
            state.stack.back_button_change()
        };
        self.signal_back_button(change);
    }

    /// Removes every entry above the current one.
    ///
    /// While a navigation is running this is deferred until it has finished.
    pub fn clear_forward_stack(&self) {
        let mut state = self.inner.state.lock();
        if self.is_navigating() {
            state.pending_forward_clear = true;
            debug!("deferring forward stack clear");
        } else {
            let removed = state.stack.clear_forward_stack();
            debug!(removed = removed.len(), "cleared forward stack");
        }
    }

    // events

    pub fn on_navigating<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.inner.events.add_handler(EventKind::Navigating, handler)
    }

    pub fn on_navigated<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.inner.events.add_handler(EventKind::Navigated, handler)
    }

    /// Called whenever the stack cursor moves, before the visual swap.
    pub fn on_current_changed<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&NavigationEvent) + Send + Sync + 'static,
    {
        self.inner
            .events
            .add_handler(EventKind::CurrentChanged, handler)
    }

    pub fn remove_handler(&self, id: HandlerId) -> bool {
        self.inner.events.remove_handler(id)
    }

    /// Returns a channel that receives every event this frame emits from now on.
    pub fn subscribe(&self) -> Receiver<NavigationEvent> {
        self.inner.events.subscribe()
    }

    // host

    /// Connects the frame to its host window; events sent through the returned sender are
    /// processed by [`poll`](Self::poll).
    ///
    /// Attaching again replaces the previous connection.
    pub fn attach(&self) -> HostSender {
        let (link, sender) = HostLink::new();
        *self.inner.host.lock() = Some(link);
        sender
    }

    pub fn detach(&self) {
        *self.inner.host.lock() = None;
    }

    pub fn is_attached(&self) -> bool {
        self.inner.host.lock().is_some()
    }

    /// Receives all host events from the queue and dispatches them.
    pub fn poll(&self) {
        let (events, connected) = match &*self.inner.host.lock() {
            Some(link) => link.drain(),
            None => return,
        };
        if !connected {
            debug!("host disconnected");
            self.detach();
        }
        for event in events {
            match event {
                HostEvent::VisibilityChanged(visible) => self.visibility_changed(visible),
            }
        }
    }

    /// Forwards a host visibility change to the current screen, and only to it.
    pub fn visibility_changed(&self, visible: bool) {
        let screen = match self.current_screen() {
            Some(screen) => screen,
            None => return,
        };
        trace!(visible, "visibility changed");
        let mut screen = screen.lock();
        screen.on_visibility_changed(visible);
        if visible {
            screen.on_resume();
        } else {
            screen.on_pause();
        }
    }

    // internals

    fn begin(&self, operation: &'static str) -> Option<NavigationGuard<'_>> {
        let guard = NavigationGuard::acquire(&self.inner);
        if guard.is_none() {
            debug!(operation, "navigation in progress; rejected");
        }
        guard
    }

    fn signal_back_button(&self, change: Option<bool>) {
        if let Some(visible) = change {
            trace!(visible, "back button visibility");
            self.inner.backend.set_back_button_visible(visible);
        }
    }

    /// New-mode navigation to `record`, which is not in the stack.
    async fn push(
        &self,
        record: Arc<ScreenRecord>,
        transition: Option<Arc<dyn Transition>>,
    ) -> Result<()> {
        let outgoing = {
            let mut state = self.inner.state.lock();
            state.stack.clear_forward_stack();
            state.stack.current().cloned()
        };
        self.navigate_impl(NavigationMode::New, outgoing, record, Target::Top, transition)
            .await
    }

    /// Back-mode navigation to the entry at `index`, then discards the forward stack.
    async fn pop_to(&self, index: usize) -> Result<()> {
        let (outgoing, slot) = {
            let state = self.inner.state.lock();
            let slot = match state.stack.get(index) {
                Some(record) => Arc::clone(record),
                None => return Ok(()),
            };
            (state.stack.current().cloned(), slot)
        };
        // a released record is swapped for a fresh one when the navigation commits
        let incoming = if slot.is_released() {
            let fresh = Arc::new(slot.renew());
            debug!(old = %slot.key(), new = %fresh.key(), "renewing released record");
            fresh
        } else {
            Arc::clone(&slot)
        };
        let key = incoming.key();

        let result = self
            .navigate_impl(
                NavigationMode::Back,
                outgoing,
                incoming,
                Target::Entry(slot.key()),
                None,
            )
            .await;

        let mut state = self.inner.state.lock();
        // entries below the cursor may have been removed in the meantime
        if state.stack.current().map(|record| record.key()) == Some(key) {
            let removed = state.stack.clear_forward_stack();
            if removed.len() > 1 {
                debug!(
                    skipped = removed.len() - 1,
                    "discarded intermediate entries without lifecycle callbacks"
                );
            }
        }
        result
    }

    async fn navigate_impl(
        &self,
        mode: NavigationMode,
        outgoing: Option<Arc<ScreenRecord>>,
        incoming: Arc<ScreenRecord>,
        target: Target,
        request_transition: Option<Arc<dyn Transition>>,
    ) -> Result<()> {
        let inner = &*self.inner;
        let from = outgoing.as_ref().map(|record| record.key());
        let to = incoming.key();
        debug!(?mode, ?from, %to, ?target, "navigating");

        inner.backend.set_hit_test_visible(false);

        let outgoing_screen = outgoing.as_ref().and_then(|record| record.instance());
        let before = mode.before_swap();
        if let (Some((leave, _)), Some(screen)) = (before, &outgoing_screen) {
            invoke(outgoing.as_deref(), screen, leave);
        }

        let incoming_screen = match incoming.materialize(&self.handle()) {
            Ok(screen) => screen,
            Err(err) => {
                warn!(%to, error = %err, "failed to materialize screen");
                // undo the pause so the current screen is left as it was
                if let (Some(_), Some(screen)) = (before, &outgoing_screen) {
                    invoke(outgoing.as_deref(), screen, Lifecycle::Resume);
                }
                inner.backend.set_hit_test_visible(true);
                return Err(err);
            }
        };
        if let Some((_, enter)) = before {
            invoke(Some(&*incoming), &incoming_screen, enter);
        }

        // the stack may have changed since the target was picked
        let committed = {
            let mut state = inner.state.lock();
            let committed = match target {
                Target::Top => {
                    let index = state.stack.len();
                    state.stack.change_current(Arc::clone(&incoming), index)
                }
                Target::Entry(slot) => match state.stack.index_of(slot) {
                    Some(index) => {
                        (slot == to || state.stack.replace_at(index, Arc::clone(&incoming)))
                            && state.stack.change_current(Arc::clone(&incoming), index)
                    }
                    None => false,
                },
            };
            committed.then(|| {
                (
                    state.stack.back_button_change(),
                    state.transition.clone(),
                    state.options.toolkit_transitions,
                )
            })
        };
        let (change, frame_transition, toolkit_transitions) = match committed {
            Some(commit) => commit,
            None => {
                warn!(?target, %to, "navigation target left the stack");
                // undo the pre-swap pair; the incoming screen never became current
                if before.is_some() {
                    if let Some(screen) = &outgoing_screen {
                        invoke(outgoing.as_deref(), screen, Lifecycle::Resume);
                    }
                    invoke(Some(&*incoming), &incoming_screen, Lifecycle::Stop);
                }
                inner.backend.set_hit_test_visible(true);
                let key = match target {
                    Target::Entry(slot) => slot,
                    Target::Top => to,
                };
                return Err(NavigationError::TargetRemoved(key));
            }
        };
        self.signal_back_button(change);
        inner
            .events
            .emit(NavigationEvent::CurrentChanged { from, to });
        inner
            .events
            .emit(NavigationEvent::Navigating { mode, from, to });

        let screen_transition = incoming_screen.lock().transition();
        let context = TransitionContext {
            mode,
            outgoing: outgoing.clone(),
            incoming: Arc::clone(&incoming),
            transition: transition::resolve(
                request_transition,
                screen_transition,
                frame_transition,
                toolkit_transitions,
            ),
        };
        let outgoing_visual = match (&outgoing, &outgoing_screen) {
            (Some(record), Some(screen)) => Some(Visual::new(record.key(), Arc::clone(screen))),
            _ => None,
        };
        let incoming_visual = Visual::new(to, Arc::clone(&incoming_screen));

        let swapped = coordinator::swap(
            &context,
            outgoing_visual,
            incoming_visual,
            &inner.content,
            &*inner.backend,
            &inner.animations,
        )
        .await;
        if let Err(err) = &swapped {
            warn!(?mode, %to, error = %err, "transition failed");
        }
        let expired = inner.animations.expire();
        if expired > 0 {
            trace!(expired, "discarded unused connected animations");
        }

        if let Some((leave, enter)) = mode.after_swap() {
            if let Some(screen) = &outgoing_screen {
                invoke(outgoing.as_deref(), screen, leave);
            }
            invoke(Some(&*incoming), &incoming_screen, enter);
        }

        inner.backend.set_hit_test_visible(true);

        if let (Some(record), Some(screen)) = (&outgoing, &outgoing_screen) {
            if record.key() != to {
                self.release_if_uncached(record, screen);
            }
        }

        swapped?;
        inner
            .events
            .emit(NavigationEvent::Navigated { mode, from, to });
        Ok(())
    }

    fn release_if_uncached(&self, record: &ScreenRecord, screen: &ScreenHandle) {
        let disable_cache = self.inner.state.lock().options.disable_cache;
        let cache_mode = screen.lock().cache_mode();
        if disable_cache || cache_mode == CacheMode::Disabled {
            trace!(key = %record.key(), "releasing screen");
            record.release();
        }
    }
}

fn invoke(record: Option<&ScreenRecord>, screen: &ScreenHandle, lifecycle: Lifecycle) {
    trace!(
        key = ?record.map(|record| record.key()),
        screen = record.map(|record| record.screen_type().name()),
        ?lifecycle,
        "lifecycle"
    );
    lifecycle.dispatch(&mut *screen.lock());
}

/// A non-owning reference to a [`Frame`], handed to screens when they are bound.
///
/// Every call fails with [`NavigationError::Detached`] once the frame is gone.
#[derive(Clone, Default)]
pub struct FrameHandle {
    inner: Weak<Inner>,
}

impl FrameHandle {
    /// A handle that is not connected to any frame.
    pub fn detached() -> FrameHandle {
        FrameHandle::default()
    }

    pub fn upgrade(&self) -> Option<Frame> {
        self.inner.upgrade().map(|inner| Frame { inner })
    }

    fn frame(&self) -> Result<Frame> {
        self.upgrade().ok_or(NavigationError::Detached)
    }

    pub fn can_go_back(&self) -> bool {
        self.upgrade().map_or(false, |frame| frame.can_go_back())
    }

    pub async fn navigate(
        &self,
        screen_type: ScreenType,
        parameter: Option<Parameter>,
    ) -> Result<bool> {
        self.frame()?.navigate(screen_type, parameter).await
    }

    /// Opens another screen on top of the calling one.
    pub async fn open(&self, screen_type: ScreenType, parameter: Option<Parameter>) -> Result<bool> {
        self.navigate(screen_type, parameter).await
    }

    pub async fn go_back(&self) -> Result<bool> {
        self.frame()?.go_back().await
    }

    /// Leaves the calling screen: goes back if possible, otherwise asks the host to close the
    /// window.
    pub async fn finish(&self) -> Result<bool> {
        let frame = self.frame()?;
        if frame.can_go_back() {
            frame.go_back().await
        } else {
            debug!("nothing to go back to; closing window");
            frame.inner.backend.close();
            Ok(true)
        }
    }
}

impl core::fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        let state = if self.inner.strong_count() > 0 {
            "attached"
        } else {
            "detached"
        };
        write!(f, "FrameHandle({})", state)
    }
}
