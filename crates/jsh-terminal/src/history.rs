//! Command history.
//!
//! The log always ends in an empty placeholder standing for the line being
//! typed. Recall walks backwards and forwards over the log and remembers the
//! unsubmitted draft so that walking past the newest entry restores it.

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: usize,
    draft: String,
}

impl History {
    pub fn new() -> Self {
        Self {
            entries: vec![String::new()],
            cursor: 0,
            draft: String::new(),
        }
    }

    /// Record a submitted line. Blank lines are not recorded.
    pub fn record(&mut self, line: &str) -> bool {
        self.reset_cursor();
        if line.trim().is_empty() {
            return false;
        }
        if let Some(placeholder) = self.entries.last_mut() {
            *placeholder = line.to_string();
        }
        self.entries.push(String::new());
        self.reset_cursor();
        true
    }

    /// Submitted lines, oldest first, without the placeholder.
    pub fn lines(&self) -> &[String] {
        &self.entries[..self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The log as mirrored to the history file: every entry including the
    /// placeholder, joined by newlines.
    pub fn mirror_text(&self) -> String {
        self.entries.join("\n")
    }

    pub fn clear(&mut self) {
        self.entries = vec![String::new()];
        self.reset_cursor();
    }

    /// Step to the previous entry. `draft` is what the user has typed so far;
    /// it is kept when leaving the placeholder.
    pub fn recall_previous(&mut self, draft: &str) -> Option<&str> {
        if self.cursor == 0 {
            return None;
        }
        if self.cursor == self.placeholder() {
            self.draft = draft.to_string();
        }
        self.cursor -= 1;
        Some(&self.entries[self.cursor])
    }

    /// Step to the next entry. Stepping onto the placeholder returns the
    /// draft saved by [`Self::recall_previous`].
    pub fn recall_next(&mut self) -> Option<&str> {
        if self.cursor >= self.placeholder() {
            return None;
        }
        self.cursor += 1;
        if self.cursor == self.placeholder() {
            Some(&self.draft)
        } else {
            Some(&self.entries[self.cursor])
        }
    }

    fn placeholder(&self) -> usize {
        self.entries.len() - 1
    }

    fn reset_cursor(&mut self) {
        self.cursor = self.placeholder();
        self.draft.clear();
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
