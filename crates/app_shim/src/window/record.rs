//! Per-window state records

use std::fmt;

use super::{CloseAttemptCallback, CloseCallback, WindowDesc, WindowId};
use crate::platform::NativeHandle;

/// Observable state of one window
///
/// This is what [`crate::Framework::window`] hands out as a snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowState {
    /// Public handle; [`WindowId::NONE`] if the handle space was exhausted
    pub id: WindowId,
    /// Backend handle
    pub native: NativeHandle,
    /// Display name
    pub name: String,
    /// Top-left position in screen coordinates
    pub position: (i32, i32),
    /// Client size in pixels
    pub size: (i32, i32),
    /// Cleared once destruction has been confirmed
    pub valid: bool,
    /// Has keyboard focus
    pub focused: bool,
    /// Is shown
    pub visible: bool,
    /// Is minimized
    pub minimized: bool,
    /// Cursor is inside the client area
    pub mouse_inside: bool,
}

/// Registry entry for one live window
pub struct WindowRecord {
    /// Observable state
    pub state: WindowState,
    /// Windows destroyed together with this one
    pub dependents: Vec<NativeHandle>,
    pub(crate) on_close_attempt: Option<CloseAttemptCallback>,
    pub(crate) on_close: Option<CloseCallback>,
    pub(crate) destroying: bool,
}

impl WindowRecord {
    /// Build a record for a freshly created native window
    pub fn new(id: WindowId, native: NativeHandle, desc: WindowDesc, dependents: Vec<NativeHandle>) -> Self {
        Self {
            state: WindowState {
                id,
                native,
                name: desc.name,
                position: desc.position.unwrap_or((0, 0)),
                size: desc.size,
                valid: true,
                focused: false,
                visible: desc.visible,
                minimized: false,
                mouse_inside: false,
            },
            dependents,
            on_close_attempt: desc.on_close_attempt,
            on_close: desc.on_close,
            destroying: false,
        }
    }

    /// Public handle
    pub fn id(&self) -> WindowId {
        self.state.id
    }

    /// Backend handle
    pub fn native(&self) -> NativeHandle {
        self.state.native
    }

    /// Whether the record can be looked up by id
    pub fn is_addressable(&self) -> bool {
        self.state.id.is_some()
    }

    /// Register a dependent window, ignoring duplicates
    pub fn add_dependent(&mut self, dependent: NativeHandle) -> bool {
        if self.dependents.contains(&dependent) {
            return false;
        }
        self.dependents.push(dependent);
        true
    }
}

impl fmt::Debug for WindowRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowRecord")
            .field("state", &self.state)
            .field("dependents", &self.dependents)
            .field("destroying", &self.destroying)
            .finish_non_exhaustive()
    }
}
