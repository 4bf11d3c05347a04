#![allow(dead_code)]

use async_trait::async_trait;
use paging::{
    handle, Backend, CacheMode, FrameHandle, InsertionMode, Parameter, Screen, ScreenType,
    Transition, TransitionError, Visual,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared, ordered log of everything that happened during a test.
#[derive(Debug, Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn new() -> Log {
        Log::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::replace(&mut *self.0.lock(), Vec::new())
    }

    /// Entries starting with the given prefix, in order.
    pub fn take_matching(&self, prefix: &str) -> Vec<String> {
        self.take()
            .into_iter()
            .filter(|entry| entry.starts_with(prefix))
            .collect()
    }
}

/// A screen that logs every lifecycle callback as `<name>.<callback>`.
#[derive(Debug)]
pub struct Logged {
    name: &'static str,
    log: Log,
    cache_mode: CacheMode,
    pub parameter: Option<Parameter>,
}

impl Screen for Logged {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn on_create(&mut self, parameter: Option<Parameter>) {
        self.parameter = parameter;
        self.log.push(format!("{}.on_create", self.name));
    }

    fn on_start(&mut self) {
        self.log.push(format!("{}.on_start", self.name));
    }

    fn on_restart(&mut self) {
        self.log.push(format!("{}.on_restart", self.name));
    }

    fn on_resume(&mut self) {
        self.log.push(format!("{}.on_resume", self.name));
    }

    fn on_pause(&mut self) {
        self.log.push(format!("{}.on_pause", self.name));
    }

    fn on_stop(&mut self) {
        self.log.push(format!("{}.on_stop", self.name));
    }

    fn on_close(&mut self) {
        self.log.push(format!("{}.on_close", self.name));
    }

    fn on_destroy(&mut self) {
        self.log.push(format!("{}.on_destroy", self.name));
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        self.log
            .push(format!("{}.on_visibility_changed({})", self.name, visible));
    }

    fn cache_mode(&self) -> CacheMode {
        self.cache_mode
    }
}

/// A screen type producing [`Logged`] screens; counts how many were built.
pub fn logged(name: &'static str, log: &Log) -> (ScreenType, Arc<AtomicUsize>) {
    logged_with(name, log, CacheMode::Required)
}

pub fn logged_with(
    name: &'static str,
    log: &Log,
    cache_mode: CacheMode,
) -> (ScreenType, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&built);
    let log = log.clone();
    let ty = ScreenType::from_fn(name, move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(handle(Logged {
            name,
            log: log.clone(),
            cache_mode,
            parameter: None,
        }))
    });
    (ty, built)
}

/// Like [`logged_with`], but every build after the first `builds` fails.
pub fn fragile(name: &'static str, log: &Log, cache_mode: CacheMode, builds: usize) -> ScreenType {
    let built = AtomicUsize::new(0);
    let log = log.clone();
    ScreenType::from_fn(name, move || {
        if built.fetch_add(1, Ordering::SeqCst) >= builds {
            return Err(format!("{} is gone", name).into());
        }
        Ok(handle(Logged {
            name,
            log: log.clone(),
            cache_mode,
            parameter: None,
        }))
    })
}

/// A screen that removes the stack entry at `index` from inside one of its callbacks.
#[derive(Debug)]
pub struct Trimmer {
    name: &'static str,
    log: Log,
    frame: FrameHandle,
    trim_on: &'static str,
    index: usize,
}

impl Trimmer {
    fn callback(&mut self, callback: &str) {
        self.log.push(format!("{}.{}", self.name, callback));
        if callback != self.trim_on {
            return;
        }
        if let Some(frame) = self.frame.upgrade() {
            let removed = frame.remove_at(self.index);
            self.log
                .push(format!("{}.remove_at({}) = {:?}", self.name, self.index, removed.ok()));
        }
    }
}

impl Screen for Trimmer {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }

    fn bind(&mut self, frame: FrameHandle) {
        self.frame = frame;
    }

    fn on_create(&mut self, _: Option<Parameter>) {
        self.callback("on_create");
    }

    fn on_start(&mut self) {
        self.callback("on_start");
    }

    fn on_resume(&mut self) {
        self.callback("on_resume");
    }

    fn on_pause(&mut self) {
        self.callback("on_pause");
    }

    fn on_stop(&mut self) {
        self.callback("on_stop");
    }

    fn on_close(&mut self) {
        self.callback("on_close");
    }

    fn on_destroy(&mut self) {
        self.callback("on_destroy");
    }
}

/// A screen type producing [`Trimmer`] screens that call `remove_at(index)` from `trim_on`.
pub fn trimmer(name: &'static str, log: &Log, trim_on: &'static str, index: usize) -> ScreenType {
    let log = log.clone();
    ScreenType::from_fn(name, move || {
        Ok(handle(Trimmer {
            name,
            log: log.clone(),
            frame: FrameHandle::detached(),
            trim_on,
            index,
        }))
    })
}

/// A transition that logs `<swap>` (or `<swap failed>`) and finishes immediately.
#[derive(Debug)]
pub struct LogTransition {
    pub log: Log,
    pub insertion_mode: InsertionMode,
    pub fail: bool,
}

impl LogTransition {
    pub fn new(log: &Log) -> Arc<LogTransition> {
        Arc::new(LogTransition {
            log: log.clone(),
            insertion_mode: InsertionMode::IncomingAbove,
            fail: false,
        })
    }

    pub fn failing(log: &Log) -> Arc<LogTransition> {
        Arc::new(LogTransition {
            log: log.clone(),
            insertion_mode: InsertionMode::IncomingAbove,
            fail: true,
        })
    }

    fn finish(&self) -> Result<(), TransitionError> {
        if self.fail {
            self.log.push("<swap failed>");
            Err(TransitionError::new("animation interrupted"))
        } else {
            self.log.push("<swap>");
            Ok(())
        }
    }
}

#[async_trait]
impl Transition for LogTransition {
    fn insertion_mode(&self) -> InsertionMode {
        self.insertion_mode
    }

    async fn on_start(&self, _: &Visual, _: Option<&Visual>) -> Result<(), TransitionError> {
        tokio::task::yield_now().await;
        self.finish()
    }

    async fn on_close(&self, _: &Visual, _: &Visual) -> Result<(), TransitionError> {
        tokio::task::yield_now().await;
        self.finish()
    }
}

/// A backend that logs every call.
#[derive(Debug, Clone, Default)]
pub struct RecordingBackend {
    pub log: Log,
}

impl Backend for RecordingBackend {
    fn insert_visual(&self, index: usize, visual: &Visual) {
        self.log.push(format!("insert({}, {})", index, visual.key()));
    }

    fn remove_visual(&self, visual: &Visual) {
        self.log.push(format!("remove({})", visual.key()));
    }

    fn set_hit_test_visible(&self, visible: bool) {
        self.log.push(format!("hit_test({})", visible));
    }

    fn set_back_button_visible(&self, visible: bool) {
        self.log.push(format!("back_button({})", visible));
    }

    fn close(&self) {
        self.log.push("close");
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
