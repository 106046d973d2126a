//! Native platform layer
//!
//! The router talks to the window system only through [`NativeBackend`].
//! A backend is created on the router thread and never leaves it, since
//! native window managers require windows to be created, pumped and
//! destroyed on the thread that owns them.
//!
//! Backends:
//! - [`headless`]: in-memory window system driven by a
//!   [`HeadlessController`]; always available
//! - `glfw_backend`: real windows through GLFW (feature `glfw-backend`)

pub mod event;
#[cfg(feature = "glfw-backend")]
pub mod glfw_backend;
pub mod headless;
pub mod system_info;

pub use event::{NativeEvent, NativeEventKind, NativeHandle};
pub use headless::{HeadlessBackend, HeadlessController};
pub use system_info::SystemInfo;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Platform errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The window system could not be initialized
    #[error("Window system initialization failed: {0}")]
    InitializationFailed(String),

    /// A native window could not be created
    #[error("Native window creation failed: {0}")]
    WindowCreationFailed(String),

    /// A native window could not be destroyed
    #[error("Native window destruction failed: {0}")]
    WindowDestructionFailed(String),

    /// The backend does not know this handle
    #[error("Unknown native window {0}")]
    UnknownWindow(NativeHandle),

    /// The event source went away
    #[error("Native event source disconnected")]
    Disconnected,

    /// The router thread could not be started
    #[error("Failed to spawn event router thread: {0}")]
    ThreadSpawn(String),
}

/// Result type for platform operations
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Wakes a backend blocked in [`NativeBackend::pump`] from another thread
pub type Waker = Arc<dyn Fn() + Send + Sync>;

/// Builds a backend; invoked on the router thread each time it starts
pub type BackendFactory = Arc<dyn Fn() -> PlatformResult<Box<dyn NativeBackend>> + Send + Sync>;

/// Native window parameters handed to a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeWindowDesc {
    /// Title
    pub title: String,
    /// Initial position; `None` lets the window system choose
    pub position: Option<(i32, i32)>,
    /// Client size in pixels, both strictly positive
    pub size: (i32, i32),
    /// Shown on creation
    pub visible: bool,
}

/// Window-system backend owned by the router thread
///
/// # Destruction
/// A successful [`destroy_window`](Self::destroy_window) return is the
/// destroy confirmation; backends must not additionally report
/// [`NativeEventKind::Destroyed`] for windows the router destroyed.
/// `Destroyed` is only for windows the window system tore down itself.
pub trait NativeBackend {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Create a native window
    fn create_window(&mut self, desc: &NativeWindowDesc) -> PlatformResult<NativeHandle>;

    /// Destroy a native window
    fn destroy_window(&mut self, window: NativeHandle) -> PlatformResult<()>;

    /// A close request was refused; keep the window open
    fn cancel_close(&mut self, _window: NativeHandle) {}

    /// Wait up to `timeout` for native events and append them to `sink`
    fn pump(&mut self, timeout: Duration, sink: &mut Vec<NativeEvent>) -> PlatformResult<()>;

    /// Handle that interrupts a blocking [`pump`](Self::pump), if supported
    ///
    /// Backends without one are woken by the pump timeout only.
    fn waker(&self) -> Option<Waker> {
        None
    }
}
