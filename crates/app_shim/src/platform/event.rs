//! Native window-system events
//!
//! Backends translate whatever their window system reports into these
//! events; the router consumes nothing else.

use std::fmt;

use crate::input::{KeyCode, MouseButton};

/// Native window handle as reported by a backend
///
/// Opaque to everything above the platform layer. Distinct from
/// [`crate::WindowId`], which is what API callers hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NativeHandle(pub u64);

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "native:{:#x}", self.0)
    }
}

/// A single event for one native window
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    /// Window the event belongs to
    pub window: NativeHandle,
    /// What happened
    pub kind: NativeEventKind,
}

impl NativeEvent {
    /// Create an event for a window
    pub fn new(window: NativeHandle, kind: NativeEventKind) -> Self {
        Self { window, kind }
    }
}

/// Event payloads
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEventKind {
    /// The user asked to close the window (close button, Alt+F4)
    CloseRequested,
    /// The window system destroyed the window on its own
    Destroyed,
    /// Key pressed; `repeat` is the OS "key was already down" bit
    KeyDown {
        /// Virtual key code
        key: KeyCode,
        /// True for auto-repeat events
        repeat: bool,
    },
    /// Key released
    KeyUp {
        /// Virtual key code
        key: KeyCode,
    },
    /// Translated character input
    Character(char),
    /// Cursor moved inside the client area
    ///
    /// Marks this window as the hovered one and clears the flag on every
    /// other window, so backends need not send `MouseLeft` first.
    MouseMoved {
        /// Client-area x coordinate
        x: i32,
        /// Client-area y coordinate
        y: i32,
    },
    /// Mouse button changed state
    MouseButton {
        /// Button that changed
        button: MouseButton,
        /// New state
        pressed: bool,
    },
    /// Wheel rotated, in 1/120 notch units
    MouseWheel(i32),
    /// Cursor entered the client area
    MouseEntered,
    /// Cursor left the client area
    MouseLeft,
    /// Keyboard focus gained (true) or lost (false)
    Focus(bool),
    /// Window shown (true) or hidden (false)
    Visibility(bool),
    /// Window minimized (true) or restored (false)
    Minimized(bool),
    /// Window moved; top-left corner in screen coordinates
    Moved {
        /// Screen x coordinate
        x: i32,
        /// Screen y coordinate
        y: i32,
    },
    /// Client area resized
    Resized {
        /// New width in pixels
        width: i32,
        /// New height in pixels
        height: i32,
    },
}
