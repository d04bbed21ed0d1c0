/// Single-line text input with a character-indexed cursor
#[derive(Debug, Default, Clone)]
pub struct ChatInput {
    text: String,
    cursor: usize,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

impl ChatInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.char_count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_in_middle_with_multibyte() {
        let mut input = ChatInput::new();
        input.set_text("héllo");
        input.move_home();
        input.move_right();
        input.move_right();
        input.insert('✓');
        assert_eq!(input.text(), "hé✓llo");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn test_backspace_and_delete_at_edges() {
        let mut input = ChatInput::new();
        input.backspace();
        input.delete();
        assert!(input.is_empty());

        input.set_text("ab");
        input.delete();
        assert_eq!(input.text(), "ab");
        input.backspace();
        assert_eq!(input.text(), "a");
        input.move_home();
        input.delete();
        assert!(input.is_empty());
        assert_eq!(input.cursor(), 0);
    }

    #[test]
    fn test_cursor_is_clamped() {
        let mut input = ChatInput::new();
        input.set_text("xyz");
        input.move_right();
        assert_eq!(input.cursor(), 3);
        input.move_home();
        input.move_left();
        assert_eq!(input.cursor(), 0);
        input.move_end();
        assert_eq!(input.cursor(), 3);
    }
}
