// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use time::OffsetDateTime;

use crate::{APP_NAME, BindTable, CommandLine, Key, LineOutcome, TaskEntry, ViewFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Normal,
    Details,
    Help,
    Command,
    Exit,
}

impl Mode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Details => "details",
            Self::Help => "help",
            Self::Command => "command",
            Self::Exit => "exit",
        }
    }
}

/// Count typed ahead of a command key in normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PendingCount {
    #[default]
    None,
    Count(usize),
    /// `l` was pressed once; a second `l` lists every tag.
    ListAll,
}

/// Work the state machine hands back to the run loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiRequest {
    Run(String),
    /// Leave command mode if the command that just ran did not switch modes.
    CloseCommandLine,
}

#[derive(Debug, Clone)]
pub struct UiState {
    mode: Mode,
    mode_stack: Vec<Mode>,
    pub selected: usize,
    /// First visible table row drawn under the title bar.
    pub table_scroll: usize,
    /// Lines of overlay text scrolled out of view in details and help.
    pub overlay_scroll: usize,
    pub pending: PendingCount,
    pub filter: ViewFilter,
    pub command_line: CommandLine,
    pub binds: BindTable,
    pub status_line: Option<String>,
    pub cursor_visible: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self::new(BindTable::defaults(), ViewFilter::default())
    }
}

impl UiState {
    pub fn new(binds: BindTable, filter: ViewFilter) -> Self {
        Self {
            mode: Mode::Normal,
            mode_stack: Vec::new(),
            selected: 0,
            table_scroll: 0,
            overlay_scroll: 0,
            pending: PendingCount::None,
            filter,
            command_line: CommandLine::new(),
            binds,
            status_line: Some(format!("Welcome to {APP_NAME}!")),
            cursor_visible: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn mode_stack(&self) -> &[Mode] {
        &self.mode_stack
    }

    pub fn is_running(&self) -> bool {
        self.mode != Mode::Exit
    }

    /// The mode painted beneath the command line, or the current mode.
    pub fn underlying_mode(&self) -> Mode {
        match self.mode {
            Mode::Command => self.mode_stack.last().copied().unwrap_or(Mode::Normal),
            mode => mode,
        }
    }

    /// Switches modes. The current mode is remembered unless it is command
    /// mode or unchanged, so command mode always returns to its caller.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode != self.mode && self.mode != Mode::Command {
            self.mode_stack.push(self.mode);
        }
        log::debug!("mode {} -> {}", self.mode.as_str(), mode.as_str());
        self.enter(mode);
    }

    /// Restores the mode on top of the stack, or normal mode when it is empty.
    pub fn return_to_previous(&mut self) {
        let previous = self.mode_stack.pop().unwrap_or(Mode::Normal);
        log::debug!("mode {} -> {} (return)", self.mode.as_str(), previous.as_str());
        self.enter(previous);
    }

    fn enter(&mut self, mode: Mode) {
        self.mode = mode;
        self.table_scroll = 0;
        self.overlay_scroll = 0;
        self.cursor_visible = mode == Mode::Command;
        if mode == Mode::Command {
            self.command_line.begin();
        }
    }

    pub fn enter_command(&mut self, seed: &str) {
        self.command_line.seed(seed);
        self.set_mode(Mode::Command);
    }

    pub fn close_command_line(&mut self) {
        if self.mode == Mode::Command {
            self.return_to_previous();
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_line = Some(message.into());
    }

    /// The one-shot status message; it is gone after this call.
    pub fn take_status(&mut self) -> Option<String> {
        self.status_line.take()
    }

    pub fn select(&mut self, index: usize, entry_count: usize) {
        self.selected = index.min(entry_count.saturating_sub(1));
    }

    pub fn select_next_visible(&mut self, entries: &[TaskEntry], now: OffsetDateTime) -> bool {
        match self.filter.next_visible(entries, self.selected, now) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    pub fn select_previous_visible(&mut self, entries: &[TaskEntry], now: OffsetDateTime) -> bool {
        match self.filter.previous_visible(entries, self.selected, now) {
            Some(index) => {
                self.selected = index;
                true
            }
            None => false,
        }
    }

    /// Keeps `visible_row` inside the `rows`-tall window below the title bar.
    pub fn clamp_table_scroll(&mut self, visible_row: usize, rows: usize) {
        if rows == 0 {
            self.table_scroll = visible_row;
        } else if visible_row < self.table_scroll {
            self.table_scroll = visible_row;
        } else if visible_row >= self.table_scroll + rows {
            self.table_scroll = visible_row + 1 - rows;
        }
    }

    /// Routes one key: binds first, then the current mode's handler.
    pub fn process_key(&mut self, key: Key, entry_count: usize) -> Vec<UiRequest> {
        if let Some(requests) = self.fire_binds(key) {
            return requests;
        }

        match self.mode {
            Mode::Normal => self.normal_input(key, entry_count),
            Mode::Details | Mode::Help => {
                self.overlay_input(key);
                Vec::new()
            }
            Mode::Command => self.command_input(key),
            Mode::Exit => Vec::new(),
        }
    }

    fn fire_binds(&mut self, key: Key) -> Option<Vec<UiRequest>> {
        let fired: Vec<(String, bool)> = self
            .binds
            .matching(key, self.mode)
            .map(|bind| (bind.command.clone(), bind.autoexec))
            .collect();
        if fired.is_empty() {
            return None;
        }

        self.pending = PendingCount::None;
        let mut requests = Vec::new();
        for (command, autoexec) in fired {
            if autoexec {
                requests.push(UiRequest::Run(command));
            } else {
                self.enter_command(&command);
            }
        }
        Some(requests)
    }

    fn normal_input(&mut self, key: Key, entry_count: usize) -> Vec<UiRequest> {
        if let Some(digit) = key.digit() {
            let count = match self.pending {
                PendingCount::Count(count) => count.saturating_mul(10).saturating_add(digit),
                PendingCount::None | PendingCount::ListAll => digit,
            };
            self.pending = PendingCount::Count(count);
            self.set_status(count.to_string());
            return Vec::new();
        }

        match key {
            Key::Char('g') => match self.pending {
                PendingCount::Count(count) => {
                    self.pending = PendingCount::None;
                    vec![UiRequest::Run(format!("g {count}"))]
                }
                PendingCount::None | PendingCount::ListAll => {
                    self.pending = PendingCount::Count(0);
                    self.set_status("g");
                    Vec::new()
                }
            },
            Key::Char('l') => match self.pending {
                PendingCount::None => {
                    self.pending = PendingCount::ListAll;
                    self.set_status("l");
                    Vec::new()
                }
                PendingCount::ListAll => {
                    self.pending = PendingCount::None;
                    vec![UiRequest::Run("list all".to_owned())]
                }
                PendingCount::Count(count) => {
                    self.pending = PendingCount::None;
                    vec![UiRequest::Run(format!("list {count}"))]
                }
            },
            Key::Char('G') => {
                self.pending = PendingCount::Count(entry_count.saturating_sub(1));
                self.set_status("G");
                Vec::new()
            }
            _ => {
                self.pending = PendingCount::None;
                Vec::new()
            }
        }
    }

    fn overlay_input(&mut self, key: Key) {
        match key {
            Key::Char('q') | Key::Esc => self.return_to_previous(),
            Key::Right => self.overlay_scroll = self.overlay_scroll.saturating_add(1),
            Key::Left => self.overlay_scroll = self.overlay_scroll.saturating_sub(1),
            Key::Char('=') => self.overlay_scroll = 0,
            _ => {}
        }
    }

    fn command_input(&mut self, key: Key) -> Vec<UiRequest> {
        match self.command_line.handle_key(key) {
            LineOutcome::Editing => Vec::new(),
            LineOutcome::Submitted(command) => {
                vec![UiRequest::Run(command), UiRequest::CloseCommandLine]
            }
            LineOutcome::Cancelled => vec![UiRequest::CloseCommandLine],
        }
    }
}
