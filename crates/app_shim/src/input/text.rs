//! Bounded text-input buffer

/// Character buffer with a write cursor
///
/// Characters are inserted at the cursor. Backspace removes the character
/// before the cursor. Once `capacity` characters are held further input is
/// dropped.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    chars: Vec<char>,
    cursor: usize,
    capacity: usize,
}

const BACKSPACE: char = '\u{8}';

impl TextBuffer {
    /// Create an empty buffer holding at most `capacity` characters
    pub fn new(capacity: usize) -> Self {
        Self {
            chars: Vec::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Apply one character event; returns true if the buffer changed
    pub fn apply(&mut self, c: char) -> bool {
        match c {
            BACKSPACE => self.delete_before_cursor(),
            // carriage return, escape and friends are handled as keys
            c if c.is_control() => false,
            c => self.insert(c),
        }
    }

    fn insert(&mut self, c: char) -> bool {
        if self.chars.len() >= self.capacity {
            return false;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        true
    }

    fn delete_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Move the cursor, clamped to the buffer contents
    pub fn set_cursor(&mut self, cursor: usize) {
        self.cursor = cursor.min(self.chars.len());
    }

    /// Remove all text and reset the cursor
    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// Buffer contents
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Write cursor position
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of characters held
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    /// Whether the buffer holds no text
    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Maximum number of characters
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
