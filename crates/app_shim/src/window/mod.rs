//! Window handles, creation descriptions and the window registry

mod record;
mod registry;

pub use record::{WindowRecord, WindowState};
pub use registry::{IdAllocator, RecordKey, Registry, RegistryError};

use std::fmt;
use std::sync::Arc;

/// Called when a window receives a close request; return true to allow it
pub type CloseAttemptCallback = Arc<dyn Fn(WindowId) -> bool + Send + Sync>;

/// Called once when a window's destruction is confirmed
pub type CloseCallback = Arc<dyn Fn(WindowId) + Send + Sync>;

/// Public window handle
///
/// Signed 16-bit; valid handles are `1..=32767` and `0` means none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct WindowId(i16);

impl WindowId {
    /// The reserved "no window" handle
    pub const NONE: Self = Self(0);
    /// Smallest valid handle
    pub const MIN: Self = Self(1);
    /// Largest valid handle
    pub const MAX: Self = Self(i16::MAX);

    /// Wrap a raw handle value; non-positive values are not valid handles
    pub fn from_raw(raw: i16) -> Option<Self> {
        (raw > 0).then_some(Self(raw))
    }

    /// Raw handle value
    pub fn raw(self) -> i16 {
        self.0
    }

    /// Whether this is [`WindowId::NONE`]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Whether this is a usable handle
    pub fn is_some(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "window#{}", self.0)
    }
}

/// Parameters for a new window
#[derive(Clone)]
pub struct WindowDesc {
    /// Title / display name
    pub name: String,
    /// Initial top-left position; `None` lets the window system choose
    pub position: Option<(i32, i32)>,
    /// Initial client size in pixels
    pub size: (i32, i32),
    /// Whether the window is shown on creation
    pub visible: bool,
    /// Windows destroyed together with this one
    pub dependents: Vec<WindowId>,
    /// Close-request hook
    pub on_close_attempt: Option<CloseAttemptCallback>,
    /// Destruction hook
    pub on_close: Option<CloseCallback>,
}

impl WindowDesc {
    /// Describe an 800x600 visible window with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            position: None,
            size: (800, 600),
            visible: true,
            dependents: Vec::new(),
            on_close_attempt: None,
            on_close: None,
        }
    }

    /// Set initial position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.position = Some((x, y));
        self
    }

    /// Set initial size
    pub fn with_size(mut self, width: i32, height: i32) -> Self {
        self.size = (width, height);
        self
    }

    /// Set initial visibility
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Add a dependent window
    pub fn with_dependent(mut self, dependent: WindowId) -> Self {
        self.dependents.push(dependent);
        self
    }

    /// Install a close-request hook
    pub fn on_close_attempt(mut self, callback: impl Fn(WindowId) -> bool + Send + Sync + 'static) -> Self {
        self.on_close_attempt = Some(Arc::new(callback));
        self
    }

    /// Install a destruction hook
    pub fn on_close(mut self, callback: impl Fn(WindowId) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(callback));
        self
    }

    /// Check the description before any native call is made
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("window name cannot be empty".to_string());
        }
        let (width, height) = self.size;
        if width <= 0 || height <= 0 {
            return Err(format!("window size must be positive, got {width}x{height}"));
        }
        if let Some(bad) = self.dependents.iter().find(|id| id.is_none()) {
            return Err(format!("invalid dependent handle {bad}"));
        }
        Ok(())
    }
}

impl fmt::Debug for WindowDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowDesc")
            .field("name", &self.name)
            .field("position", &self.position)
            .field("size", &self.size)
            .field("visible", &self.visible)
            .field("dependents", &self.dependents)
            .field("on_close_attempt", &self.on_close_attempt.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_id_range() {
        assert_eq!(WindowId::from_raw(0), None);
        assert_eq!(WindowId::from_raw(-4), None);
        assert_eq!(WindowId::from_raw(i16::MAX), Some(WindowId::MAX));
        assert!(WindowId::NONE.is_none());
        assert!(WindowId::MIN.is_some());
    }

    #[test]
    fn test_desc_validation() {
        assert!(WindowDesc::new("main").validate().is_ok());
        assert!(WindowDesc::new("  ").validate().is_err());
        assert!(WindowDesc::new("flat").with_size(640, 0).validate().is_err());
        assert!(WindowDesc::new("negative").with_size(-1, 480).validate().is_err());
        assert!(WindowDesc::new("dep").with_dependent(WindowId::NONE).validate().is_err());
    }
}
