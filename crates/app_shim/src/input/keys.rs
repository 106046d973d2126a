//! Virtual key codes and the pressed-key bitset

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Number of addressable virtual key codes
pub const KEY_COUNT: usize = 256;

const WORDS: usize = KEY_COUNT / 64;

/// Virtual key code (Win32 VK numbering)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyCode(pub u8);

impl KeyCode {
    /// Backspace
    pub const BACKSPACE: Self = Self(0x08);
    /// Tab
    pub const TAB: Self = Self(0x09);
    /// Enter / Return
    pub const ENTER: Self = Self(0x0D);
    /// Either shift key
    pub const SHIFT: Self = Self(0x10);
    /// Either control key
    pub const CONTROL: Self = Self(0x11);
    /// Either alt key
    pub const ALT: Self = Self(0x12);
    /// Pause
    pub const PAUSE: Self = Self(0x13);
    /// Caps lock
    pub const CAPS_LOCK: Self = Self(0x14);
    /// Escape
    pub const ESCAPE: Self = Self(0x1B);
    /// Space bar
    pub const SPACE: Self = Self(0x20);
    /// Page up
    pub const PAGE_UP: Self = Self(0x21);
    /// Page down
    pub const PAGE_DOWN: Self = Self(0x22);
    /// End
    pub const END: Self = Self(0x23);
    /// Home
    pub const HOME: Self = Self(0x24);
    /// Left arrow
    pub const LEFT: Self = Self(0x25);
    /// Up arrow
    pub const UP: Self = Self(0x26);
    /// Right arrow
    pub const RIGHT: Self = Self(0x27);
    /// Down arrow
    pub const DOWN: Self = Self(0x28);
    /// Insert
    pub const INSERT: Self = Self(0x2D);
    /// Delete
    pub const DELETE: Self = Self(0x2E);
    /// F1; F2..F12 follow consecutively
    pub const F1: Self = Self(0x70);

    /// Key code for an ASCII letter or digit
    pub fn from_char(c: char) -> Option<Self> {
        let upper = c.to_ascii_uppercase();
        if upper.is_ascii_uppercase() || upper.is_ascii_digit() {
            Some(Self(upper as u8))
        } else {
            None
        }
    }

    /// Function key `F{n}` for n in 1..=24
    pub fn function(n: u8) -> Option<Self> {
        (1..=24).contains(&n).then(|| Self(Self::F1.0 + n - 1))
    }

    /// Index into the key bitset
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VK({:#04x})", self.0)
    }
}

/// Fixed 256-bit set of pressed keys
///
/// Written by the router thread only. Reads from other threads use relaxed
/// atomics: a single key's bit is never torn, but there is no ordering
/// between different keys or with mouse state.
#[derive(Debug, Default)]
pub struct KeyBitset {
    words: [AtomicU64; WORDS],
}

impl KeyBitset {
    /// Create an empty bitset
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(key: KeyCode) -> (usize, u64) {
        let index = key.index();
        (index / 64, 1_u64 << (index % 64))
    }

    /// Mark a key as pressed; returns true if it was not pressed before
    pub fn set(&self, key: KeyCode) -> bool {
        let (word, mask) = Self::slot(key);
        self.words[word].fetch_or(mask, Ordering::Relaxed) & mask == 0
    }

    /// Mark a key as released; returns true if it was pressed before
    pub fn clear(&self, key: KeyCode) -> bool {
        let (word, mask) = Self::slot(key);
        self.words[word].fetch_and(!mask, Ordering::Relaxed) & mask != 0
    }

    /// Whether a key is pressed
    pub fn contains(&self, key: KeyCode) -> bool {
        let (word, mask) = Self::slot(key);
        self.words[word].load(Ordering::Relaxed) & mask != 0
    }

    /// Release every key
    pub fn clear_all(&self) {
        for word in &self.words {
            word.store(0, Ordering::Relaxed);
        }
    }

    /// Number of keys currently pressed
    pub fn count(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.load(Ordering::Relaxed).count_ones() as usize)
            .sum()
    }

    /// Currently pressed keys in ascending order
    pub fn pressed(&self) -> Vec<KeyCode> {
        (0..=u8::MAX)
            .map(KeyCode)
            .filter(|&key| self.contains(key))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear_report_transitions() {
        let keys = KeyBitset::new();
        assert!(keys.set(KeyCode::SPACE));
        assert!(!keys.set(KeyCode::SPACE));
        assert!(keys.contains(KeyCode::SPACE));
        assert!(keys.clear(KeyCode::SPACE));
        assert!(!keys.clear(KeyCode::SPACE));
    }

    #[test]
    fn test_keys_in_different_words_are_independent() {
        let keys = KeyBitset::new();
        keys.set(KeyCode(0));
        keys.set(KeyCode(63));
        keys.set(KeyCode(64));
        keys.set(KeyCode(255));
        assert_eq!(keys.count(), 4);
        keys.clear(KeyCode(63));
        assert_eq!(keys.pressed(), vec![KeyCode(0), KeyCode(64), KeyCode(255)]);
    }

    #[test]
    fn test_clear_all() {
        let keys = KeyBitset::new();
        keys.set(KeyCode::ESCAPE);
        keys.set(KeyCode::F1);
        keys.clear_all();
        assert_eq!(keys.count(), 0);
    }

    #[test]
    fn test_key_code_helpers() {
        assert_eq!(KeyCode::from_char('a'), Some(KeyCode(b'A')));
        assert_eq!(KeyCode::from_char('7'), Some(KeyCode(b'7')));
        assert_eq!(KeyCode::from_char('-'), None);
        assert_eq!(KeyCode::function(12), Some(KeyCode(0x7B)));
        assert_eq!(KeyCode::function(0), None);
    }
}
