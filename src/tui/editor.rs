//! Minimal multi-line editor buffer: the single current source text, mutated
//! only by direct edits or wholesale snippet replacement.

#[derive(Debug, Clone)]
pub struct EditorBuffer {
    lines: Vec<String>,
    /// Cursor row (line index).
    row: usize,
    /// Cursor column as a character index into the current line.
    col: usize,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<String> = if text.is_empty() {
            vec![String::new()]
        } else {
            text.split('\n').map(|s| s.to_string()).collect()
        };
        Self {
            lines,
            row: 0,
            col: 0,
        }
    }

    /// Assemble the full source text.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// Full replacement (snippet selection), not a merge. Cursor returns to
    /// the origin.
    pub fn replace(&mut self, text: &str) {
        *self = Self::from_text(text);
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self) -> usize {
        self.lines[self.row].chars().count()
    }

    fn byte_index(line: &str, col: usize) -> usize {
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    pub fn insert_char(&mut self, c: char) {
        let at = Self::byte_index(&self.lines[self.row], self.col);
        self.lines[self.row].insert(at, c);
        self.col += 1;
    }

    pub fn insert_newline(&mut self) {
        let at = Self::byte_index(&self.lines[self.row], self.col);
        let rest = self.lines[self.row].split_off(at);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let at = Self::byte_index(&self.lines[self.row], self.col - 1);
            self.lines[self.row].remove(at);
            self.col -= 1;
        } else if self.row > 0 {
            // Merge with the previous line.
            let current = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len();
            self.lines[self.row].push_str(&current);
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len() {
            let at = Self::byte_index(&self.lines[self.row], self.col);
            self.lines[self.row].remove(at);
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len();
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len() {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self) {
        if self.row > 0 {
            self.row -= 1;
            self.col = self.col.min(self.line_len());
        }
    }

    pub fn move_down(&mut self) {
        if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = self.col.min(self.line_len());
        }
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_len();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_newline() {
        let mut ed = EditorBuffer::from_text("");
        for c in "ab".chars() {
            ed.insert_char(c);
        }
        ed.insert_newline();
        ed.insert_char('c');
        assert_eq!(ed.text(), "ab\nc");
        assert_eq!(ed.cursor(), (1, 1));
    }

    #[test]
    fn backspace_merges_lines() {
        let mut ed = EditorBuffer::from_text("ab\ncd");
        ed.move_down();
        ed.move_home();
        ed.backspace();
        assert_eq!(ed.text(), "abcd");
        assert_eq!(ed.cursor(), (0, 2));
    }

    #[test]
    fn delete_at_line_end_pulls_next_line_up() {
        let mut ed = EditorBuffer::from_text("ab\ncd");
        ed.move_end();
        ed.delete();
        assert_eq!(ed.text(), "abcd");
    }

    #[test]
    fn replace_is_wholesale() {
        let mut ed = EditorBuffer::from_text("old text");
        ed.move_end();
        ed.replace("print('new')");
        assert_eq!(ed.text(), "print('new')");
        assert_eq!(ed.cursor(), (0, 0));
    }

    #[test]
    fn vertical_moves_clamp_column() {
        let mut ed = EditorBuffer::from_text("longest line\nx");
        ed.move_end();
        ed.move_down();
        assert_eq!(ed.cursor(), (1, 1));
        ed.move_up();
        assert_eq!(ed.cursor(), (0, 1));
    }

    #[test]
    fn multibyte_chars_edit_cleanly() {
        let mut ed = EditorBuffer::from_text("héllo");
        ed.move_right();
        ed.move_right();
        ed.backspace();
        assert_eq!(ed.text(), "hllo");
    }
}
