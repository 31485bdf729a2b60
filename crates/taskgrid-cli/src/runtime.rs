// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use taskgrid_app::{TagTable, TaskEntry, TaskList, TaskRuntime, UiState};
use taskgrid_db::Store;
use time::{OffsetDateTime, UtcOffset};

use crate::commands;

pub const HELP_TEXT: &str = include_str!("../doc/help.txt");

/// Serves the interface from a task list loaded out of the store.
pub struct StoreRuntime<'a> {
    store: &'a Store,
    list: TaskList,
    settings: BTreeMap<String, String>,
    offset: UtcOffset,
}

impl<'a> StoreRuntime<'a> {
    pub fn load(
        store: &'a Store,
        settings: BTreeMap<String, String>,
        offset: UtcOffset,
    ) -> Result<Self> {
        let list = store.load().context("load task list")?;
        Ok(Self {
            store,
            list,
            settings,
            offset,
        })
    }
}

impl TaskRuntime for StoreRuntime<'_> {
    fn entries(&self) -> &[TaskEntry] {
        &self.list.entries
    }

    fn tags(&self) -> &TagTable {
        &self.list.tags
    }

    fn config_text(&self, key: &str) -> String {
        self.settings.get(key).cloned().unwrap_or_default()
    }

    fn config_int(&self, key: &str) -> i64 {
        self.settings
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(-1)
    }

    fn help_text(&self) -> &str {
        HELP_TEXT
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    fn run_command(&mut self, ui: &mut UiState, command: &str) -> Result<()> {
        let now = self.now();
        commands::execute(&mut self.list, ui, now, command)
    }

    fn persist(&mut self) -> Result<()> {
        self.store.save(&self.list)
    }
}
