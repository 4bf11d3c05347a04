use crate::error::{NavigationError, Result};
use crate::frame::FrameHandle;
use crate::screen::{Parameter, ScreenHandle, ScreenType};
use core::fmt;
use parking_lot::Mutex;
use std::sync::Arc;
use uuid::Uuid;

/// A unique identifier for a navigation request.
///
/// (this is just a UUID)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenKey(u32, u16, u16, [u8; 8]);

impl ScreenKey {
    pub(crate) fn new() -> ScreenKey {
        let uuid = Uuid::new_v4();
        let (a, b, c, d) = uuid.as_fields();
        ScreenKey(a, b, c, *d)
    }
}

impl fmt::Display for ScreenKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ScreenKey(a, b, c, d) = *self;
        write!(f, "{}", Uuid::from_fields(a, b, c, &d))
    }
}

enum Instance {
    /// Not created yet.
    Pending,
    Live(ScreenHandle),
    /// Released; will never be created again from this record.
    Released,
}

/// A stack entry: a requested screen and, once materialized, its live instance.
///
/// Every navigation request creates a new record with a new key, even if the same screen type was
/// requested before.
pub struct ScreenRecord {
    key: ScreenKey,
    screen_type: ScreenType,
    parameter: Option<Parameter>,
    instance: Mutex<Instance>,
}

impl ScreenRecord {
    pub fn new(screen_type: ScreenType, parameter: Option<Parameter>) -> ScreenRecord {
        ScreenRecord {
            key: ScreenKey::new(),
            screen_type,
            parameter,
            instance: Mutex::new(Instance::Pending),
        }
    }

    pub fn key(&self) -> ScreenKey {
        self.key
    }

    pub fn screen_type(&self) -> &ScreenType {
        &self.screen_type
    }

    pub fn parameter(&self) -> Option<&Parameter> {
        self.parameter.as_ref()
    }

    /// Returns the live instance, if there is one.
    pub fn instance(&self) -> Option<ScreenHandle> {
        match &*self.instance.lock() {
            Instance::Live(screen) => Some(Arc::clone(screen)),
            Instance::Pending | Instance::Released => None,
        }
    }

    /// If true, the instance has been released and this record can no longer be shown.
    pub fn is_released(&self) -> bool {
        matches!(*self.instance.lock(), Instance::Released)
    }

    /// Returns the live instance, creating it first if necessary.
    ///
    /// Creation binds the screen to the frame and calls `on_create` with the parameter; this
    /// happens at most once per record.
    pub(crate) fn materialize(&self, frame: &FrameHandle) -> Result<ScreenHandle> {
        match &*self.instance.lock() {
            Instance::Live(screen) => return Ok(Arc::clone(screen)),
            Instance::Released => return Err(NavigationError::Released(self.key)),
            Instance::Pending => (),
        }

        // the lock is not held here because on_create may call back into the frame
        let screen = self.screen_type.create()?;
        {
            let mut screen = screen.lock();
            screen.bind(frame.clone());
            tracing::trace!(screen = self.screen_type.name(), key = %self.key, "on_create");
            screen.on_create(self.parameter.clone());
        }

        *self.instance.lock() = Instance::Live(Arc::clone(&screen));
        Ok(screen)
    }

    /// Drops the record’s reference to its instance.
    ///
    /// Returns the instance if it was live.
    pub(crate) fn release(&self) -> Option<ScreenHandle> {
        match core::mem::replace(&mut *self.instance.lock(), Instance::Released) {
            Instance::Live(screen) => Some(screen),
            Instance::Pending | Instance::Released => None,
        }
    }

    /// Creates a fresh record for the same screen type and parameter.
    pub(crate) fn renew(&self) -> ScreenRecord {
        ScreenRecord::new(self.screen_type.clone(), self.parameter.clone())
    }
}

impl PartialEq for ScreenRecord {
    fn eq(&self, other: &ScreenRecord) -> bool {
        self.key == other.key
    }
}

impl Eq for ScreenRecord {}

impl fmt::Debug for ScreenRecord {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let state = match *self.instance.lock() {
            Instance::Pending => "pending",
            Instance::Live(_) => "live",
            Instance::Released => "released",
        };
        f.debug_struct("ScreenRecord")
            .field("key", &self.key)
            .field("screen_type", &self.screen_type)
            .field("instance", &state)
            .finish()
    }
}
