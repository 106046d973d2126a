//! Shared input state
//!
//! One [`InputState`] lives in each framework context. The router thread is
//! the only writer; any thread may poll it. Key and mouse reads are relaxed
//! atomic loads, which suits polled input but gives no snapshot consistency
//! across fields. The text buffer sits behind its own mutex.

mod keys;
mod mouse;
mod text;

pub use keys::{KeyBitset, KeyCode, KEY_COUNT};
pub use mouse::{MouseButton, MouseButtons, MouseState, WHEEL_NOTCH};
pub use text::TextBuffer;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::foundation::sync;

/// Keyboard, text and mouse state for one framework context
#[derive(Debug)]
pub struct InputState {
    keys: KeyBitset,
    mouse: MouseState,
    text_enabled: AtomicBool,
    text: Mutex<TextBuffer>,
}

impl InputState {
    /// Create input state with the given text buffer capacity
    pub fn new(text_capacity: usize) -> Self {
        Self {
            keys: KeyBitset::new(),
            mouse: MouseState::new(),
            text_enabled: AtomicBool::new(false),
            text: Mutex::new(TextBuffer::new(text_capacity)),
        }
    }

    /// Whether a key is currently held
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.contains(key)
    }

    /// The pressed-key bitset
    pub fn keys(&self) -> &KeyBitset {
        &self.keys
    }

    /// Mouse state
    pub fn mouse(&self) -> &MouseState {
        &self.mouse
    }

    /// Whether character events are being collected
    pub fn is_text_input_enabled(&self) -> bool {
        self.text_enabled.load(Ordering::Acquire)
    }

    /// Start or stop collecting character events
    pub fn set_text_input_enabled(&self, enabled: bool) {
        self.text_enabled.store(enabled, Ordering::Release);
    }

    /// Clear the text buffer and reset its cursor
    pub fn clear_text(&self) {
        sync::lock(&self.text).clear();
    }

    /// Current text-input contents
    pub fn text(&self) -> String {
        sync::lock(&self.text).text()
    }

    /// Current text-input write cursor
    pub fn text_cursor(&self) -> usize {
        sync::lock(&self.text).cursor()
    }

    /// Move the text-input write cursor
    pub fn set_text_cursor(&self, cursor: usize) {
        sync::lock(&self.text).set_cursor(cursor);
    }

    /// Key pressed; auto-repeat presses leave state untouched
    ///
    /// Returns true for a fresh press.
    pub(crate) fn key_down(&self, key: KeyCode, repeat: bool) -> bool {
        if repeat {
            return false;
        }
        self.keys.set(key)
    }

    pub(crate) fn key_up(&self, key: KeyCode) -> bool {
        self.keys.clear(key)
    }

    /// Focus left a window: nothing stays held
    pub(crate) fn release_all(&self) {
        self.keys.clear_all();
        self.mouse.release_buttons();
    }

    /// Character event; ignored unless text input is enabled
    pub(crate) fn character(&self, c: char) -> bool {
        if !self.is_text_input_enabled() {
            return false;
        }
        sync::lock(&self.text).apply(c)
    }

    pub(crate) fn mouse_moved(&self, x: i32, y: i32) {
        self.mouse.set_position(x, y);
    }

    pub(crate) fn mouse_button(&self, button: MouseButton, pressed: bool) {
        self.mouse.set_button(button, pressed);
    }

    pub(crate) fn mouse_wheel(&self, delta: i32) {
        self.mouse.add_wheel(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeat_key_down_is_suppressed() {
        let input = InputState::new(8);
        assert!(input.key_down(KeyCode::UP, false));
        assert!(!input.key_down(KeyCode::UP, true));
        assert!(input.key_up(KeyCode::UP));
        // A stray repeat after release must not re-press the key
        assert!(!input.key_down(KeyCode::UP, true));
        assert!(!input.is_key_pressed(KeyCode::UP));
    }

    #[test]
    fn test_release_all_clears_keys_and_buttons() {
        let input = InputState::new(8);
        input.key_down(KeyCode::SHIFT, false);
        input.mouse_button(MouseButton::Right, true);
        input.release_all();
        assert!(!input.is_key_pressed(KeyCode::SHIFT));
        assert!(input.mouse().buttons().is_empty());
    }

    #[test]
    fn test_disabled_text_input_ignores_characters() {
        let input = InputState::new(8);
        assert!(!input.character('x'));
        assert_eq!(input.text(), "");

        input.set_text_input_enabled(true);
        assert!(input.character('x'));
        assert!(input.character('y'));
        assert_eq!(input.text_cursor(), 2);

        input.set_text_input_enabled(false);
        assert!(!input.character('z'));
        assert_eq!(input.text(), "xy");

        input.set_text_input_enabled(true);
        input.clear_text();
        assert_eq!(input.text_cursor(), 0);
        assert_eq!(input.text(), "");
    }
}
