//! Editable text buffer with a byte-offset cursor.
//!
//! Shared by the login fields and the note editor. All offsets are byte
//! offsets that always sit on a char boundary.

/// A text buffer plus cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    value: String,
    /// Cursor position as byte offset in value (0..=value.len())
    cursor: usize,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        let value = value.into();
        let cursor = value.len();
        Self { value, cursor }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn insert_str(&mut self, text: &str) {
        self.value.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// Insert as much of `text` as keeps the buffer within `limit` chars.
    /// Returns `false` if any of it was cut off.
    pub fn insert_str_within(&mut self, text: &str, limit: usize) -> bool {
        let room = limit.saturating_sub(self.value.chars().count());
        let end = text
            .char_indices()
            .nth(room)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        self.insert_str(&text[..end]);
        end == text.len()
    }

    /// Returns `true` if something was deleted.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_char_boundary(&self.value, self.cursor);
        self.value.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.value.len() {
            return false;
        }
        let next = next_char_boundary(&self.value, self.cursor);
        self.value.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) {
        self.cursor = prev_char_boundary(&self.value, self.cursor);
    }

    pub fn move_right(&mut self) {
        self.cursor = next_char_boundary(&self.value, self.cursor);
    }

    /// Start of the current line.
    pub fn move_home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    /// End of the current line.
    pub fn move_end(&mut self) {
        self.cursor = self.value[self.cursor..]
            .find('\n')
            .map(|i| self.cursor + i)
            .unwrap_or(self.value.len());
    }

    /// Move to the previous (`-1`) or next (`1`) logical line, keeping the
    /// column where possible. Returns `false` at the first/last line.
    pub fn move_vertically(&mut self, direction: i8) -> bool {
        let (row, col) = self.row_col();
        let target = if direction < 0 {
            match row.checked_sub(1) {
                Some(r) => r,
                None => return false,
            }
        } else {
            row + 1
        };

        let mut offset = 0;
        for (idx, line) in self.value.split('\n').enumerate() {
            if idx == target {
                let column_bytes = line
                    .char_indices()
                    .nth(col)
                    .map(|(i, _)| i)
                    .unwrap_or(line.len());
                self.cursor = offset + column_bytes;
                return true;
            }
            offset += line.len() + 1;
        }
        false
    }

    /// Zero-based (line, column-in-chars) of the cursor.
    pub fn row_col(&self) -> (usize, usize) {
        let before = &self.value[..self.cursor];
        let row = before.matches('\n').count();
        let start = self.line_start(self.cursor);
        let col = self.value[start..self.cursor].chars().count();
        (row, col)
    }

    fn line_start(&self, pos: usize) -> usize {
        self.value[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
    }
}

/// Find the byte offset of the previous character boundary before `pos` in `text`.
fn prev_char_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .char_indices()
        .next_back()
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Find the byte offset of the next character boundary after `pos` in `text`.
fn next_char_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .char_indices()
        .nth(1)
        .map(|(i, _)| pos + i)
        .unwrap_or(text.len())
}
