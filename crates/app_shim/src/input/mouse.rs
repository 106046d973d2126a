//! Mouse buttons and the shared mouse state

use bitflags::bitflags;
use std::sync::atomic::{AtomicI32, AtomicU8, Ordering};

/// Wheel delta reported for one notch
pub const WHEEL_NOTCH: i32 = 120;

/// A single mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
    /// First extra button (back)
    X1,
    /// Second extra button (forward)
    X2,
}

bitflags! {
    /// Set of held mouse buttons
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MouseButtons: u8 {
        /// Primary button
        const LEFT = 1 << 0;
        /// Secondary button
        const RIGHT = 1 << 1;
        /// Wheel button
        const MIDDLE = 1 << 2;
        /// First extra button
        const X1 = 1 << 3;
        /// Second extra button
        const X2 = 1 << 4;
    }
}

impl From<MouseButton> for MouseButtons {
    fn from(button: MouseButton) -> Self {
        match button {
            MouseButton::Left => Self::LEFT,
            MouseButton::Right => Self::RIGHT,
            MouseButton::Middle => Self::MIDDLE,
            MouseButton::X1 => Self::X1,
            MouseButton::X2 => Self::X2,
        }
    }
}

/// Mouse position, buttons and accumulated wheel delta
///
/// Same consistency model as the key bitset: each field is an atomic
/// written with relaxed ordering by the router thread.
#[derive(Debug, Default)]
pub struct MouseState {
    x: AtomicI32,
    y: AtomicI32,
    buttons: AtomicU8,
    wheel: AtomicI32,
}

impl MouseState {
    /// Create a cleared mouse state
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_position(&self, x: i32, y: i32) {
        self.x.store(x, Ordering::Relaxed);
        self.y.store(y, Ordering::Relaxed);
    }

    pub(crate) fn set_button(&self, button: MouseButton, pressed: bool) {
        let bits = MouseButtons::from(button).bits();
        if pressed {
            self.buttons.fetch_or(bits, Ordering::Relaxed);
        } else {
            self.buttons.fetch_and(!bits, Ordering::Relaxed);
        }
    }

    pub(crate) fn add_wheel(&self, delta: i32) {
        self.wheel.fetch_add(delta, Ordering::Relaxed);
    }

    pub(crate) fn release_buttons(&self) {
        self.buttons.store(0, Ordering::Relaxed);
    }

    /// Last reported cursor position in client coordinates
    pub fn position(&self) -> (i32, i32) {
        (self.x.load(Ordering::Relaxed), self.y.load(Ordering::Relaxed))
    }

    /// Buttons currently held
    pub fn buttons(&self) -> MouseButtons {
        MouseButtons::from_bits_truncate(self.buttons.load(Ordering::Relaxed))
    }

    /// Whether a button is held
    pub fn is_pressed(&self, button: MouseButton) -> bool {
        self.buttons().contains(button.into())
    }

    /// Wheel delta accumulated since the last [`take_wheel_delta`](Self::take_wheel_delta)
    pub fn wheel_delta(&self) -> i32 {
        self.wheel.load(Ordering::Relaxed)
    }

    /// Read and reset the accumulated wheel delta
    pub fn take_wheel_delta(&self) -> i32 {
        self.wheel.swap(0, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buttons_track_press_and_release() {
        let mouse = MouseState::new();
        mouse.set_button(MouseButton::Left, true);
        mouse.set_button(MouseButton::X2, true);
        assert_eq!(mouse.buttons(), MouseButtons::LEFT | MouseButtons::X2);

        mouse.set_button(MouseButton::Left, false);
        assert!(!mouse.is_pressed(MouseButton::Left));
        assert!(mouse.is_pressed(MouseButton::X2));
    }

    #[test]
    fn test_wheel_accumulates_until_taken() {
        let mouse = MouseState::new();
        mouse.add_wheel(WHEEL_NOTCH);
        mouse.add_wheel(-2 * WHEEL_NOTCH);
        assert_eq!(mouse.wheel_delta(), -WHEEL_NOTCH);
        assert_eq!(mouse.take_wheel_delta(), -WHEEL_NOTCH);
        assert_eq!(mouse.wheel_delta(), 0);
    }
}
