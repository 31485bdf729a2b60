// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::Key;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    Editing,
    Submitted(String),
    Cancelled,
}

/// Command line with history.
///
/// `buffers` always ends with the live buffer. `index` addresses the buffer
/// on display; while it points into history the live text is left alone, and
/// the first edit detaches a copy of the browsed entry into a fresh live
/// buffer so history itself never changes under the caret. `caret` counts
/// characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    buffers: Vec<String>,
    index: usize,
    caret: usize,
}

impl Default for CommandLine {
    fn default() -> Self {
        Self {
            buffers: vec![String::new()],
            index: 0,
            caret: 0,
        }
    }
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        self.buffers.get(self.index).map_or("", String::as_str)
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn buffers(&self) -> &[String] {
        &self.buffers
    }

    pub fn is_browsing(&self) -> bool {
        self.index != self.live_index()
    }

    /// Submitted commands, oldest first.
    pub fn history(&self) -> &[String] {
        &self.buffers[..self.live_index()]
    }

    fn live_index(&self) -> usize {
        self.buffers.len() - 1
    }

    fn live_mut(&mut self) -> &mut String {
        let last = self.live_index();
        &mut self.buffers[last]
    }

    fn text_len(&self) -> usize {
        self.text().chars().count()
    }

    fn clamp_caret(&mut self) {
        self.caret = self.caret.min(self.text_len());
    }

    /// Called when command mode opens: address the live buffer, caret at its end.
    pub fn begin(&mut self) {
        self.index = self.live_index();
        self.caret = self.text_len();
    }

    /// Replaces the live text, as a bind does when it opens the command line.
    pub fn seed(&mut self, text: &str) {
        *self.live_mut() = text.to_owned();
        self.begin();
    }

    fn detach_for_edit(&mut self) {
        if self.is_browsing() {
            let browsed = self.buffers[self.index].clone();
            self.buffers.push(browsed);
            self.index = self.live_index();
            self.prune();
        }
    }

    /// Drops empty history entries; the live buffer is kept even when empty.
    fn prune(&mut self) {
        let live = self.live_index();
        let index = self.index;
        let mut position = 0;
        let mut removed_before_index = 0;
        self.buffers.retain(|buffer| {
            let keep = position == live || !buffer.is_empty();
            if !keep && position < index {
                removed_before_index += 1;
            }
            position += 1;
            keep
        });
        self.index = (index - removed_before_index).min(self.live_index());
    }

    fn byte_offset(&self, caret: usize) -> usize {
        let text = self.text();
        text.char_indices()
            .nth(caret)
            .map_or(text.len(), |(offset, _)| offset)
    }

    pub fn insert(&mut self, ch: char) {
        self.detach_for_edit();
        let offset = self.byte_offset(self.caret);
        self.live_mut().insert(offset, ch);
        self.caret += 1;
    }

    pub fn backspace(&mut self) {
        self.detach_for_edit();
        if self.caret == 0 {
            return;
        }
        let offset = self.byte_offset(self.caret - 1);
        self.live_mut().remove(offset);
        self.caret -= 1;
    }

    pub fn delete(&mut self) {
        self.detach_for_edit();
        if self.caret >= self.text_len() {
            return;
        }
        let offset = self.byte_offset(self.caret);
        self.live_mut().remove(offset);
    }

    pub fn move_left(&mut self) {
        self.caret = self.caret.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.caret = (self.caret + 1).min(self.text_len());
    }

    pub fn move_home(&mut self) {
        self.caret = 0;
    }

    pub fn move_end(&mut self) {
        self.caret = self.text_len();
    }

    pub fn history_up(&mut self) {
        if self.index > 0 {
            self.index -= 1;
            self.clamp_caret();
        }
    }

    pub fn history_down(&mut self) {
        if self.index < self.live_index() {
            self.index += 1;
            self.clamp_caret();
        }
    }

    /// Takes the displayed text as a command and opens a new empty live
    /// buffer. Empty text is a cancel.
    pub fn submit(&mut self) -> Option<String> {
        let text = self.text().to_owned();
        if text.is_empty() {
            self.cancel();
            return None;
        }

        self.buffers.push(String::new());
        self.index = self.live_index();
        self.caret = 0;
        self.prune();
        Some(text)
    }

    pub fn cancel(&mut self) {
        self.live_mut().clear();
        self.index = self.live_index();
        self.caret = 0;
        self.prune();
    }

    pub fn handle_key(&mut self, key: Key) -> LineOutcome {
        match key {
            Key::Enter => match self.submit() {
                Some(command) => LineOutcome::Submitted(command),
                None => LineOutcome::Cancelled,
            },
            Key::Esc => {
                self.cancel();
                LineOutcome::Cancelled
            }
            Key::Backspace => {
                self.backspace();
                LineOutcome::Editing
            }
            Key::Delete => {
                self.delete();
                LineOutcome::Editing
            }
            Key::Left => {
                self.move_left();
                LineOutcome::Editing
            }
            Key::Right => {
                self.move_right();
                LineOutcome::Editing
            }
            Key::Home => {
                self.move_home();
                LineOutcome::Editing
            }
            Key::End => {
                self.move_end();
                LineOutcome::Editing
            }
            Key::Up => {
                self.history_up();
                LineOutcome::Editing
            }
            Key::Down => {
                self.history_down();
                LineOutcome::Editing
            }
            Key::Char(ch) => {
                self.insert(ch);
                LineOutcome::Editing
            }
            Key::Tab => LineOutcome::Editing,
        }
    }

    /// First character shown when the line is `width` cells wide, leaving
    /// room for the prompt glyph and the caret.
    pub fn scroll_offset(&self, width: usize) -> usize {
        self.caret.saturating_sub(width.saturating_sub(3))
    }

    /// The displayed text starting at `offset` characters.
    pub fn visible_from(&self, offset: usize) -> &str {
        let start = self.byte_offset(offset);
        &self.text()[start..]
    }
}
