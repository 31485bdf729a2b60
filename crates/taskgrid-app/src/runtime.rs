// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use time::OffsetDateTime;

use crate::{TagTable, TaskEntry, UiState};

/// Everything the interface needs from the task store, the configuration and
/// the command interpreter.
pub trait TaskRuntime {
    fn entries(&self) -> &[TaskEntry];
    fn tags(&self) -> &TagTable;
    fn config_text(&self, key: &str) -> String;
    fn config_int(&self, key: &str) -> i64;
    fn help_text(&self) -> &str;

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }

    fn tag_name(&self, tag: usize) -> String {
        self.tags().tag_name(tag)
    }

    /// Runs one command line. Failures are reported, never fatal.
    fn run_command(&mut self, ui: &mut UiState, command: &str) -> Result<()>;

    /// Flushes the task list. Called once, after the run loop ends.
    fn persist(&mut self) -> Result<()>;
}
