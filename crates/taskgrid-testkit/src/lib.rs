// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;
use std::path::PathBuf;
use taskgrid_app::{Mode, TagTable, TaskEntry, TaskList, TaskRuntime, UiState};
use time::{Duration, OffsetDateTime};

const TITLE_VERBS: [&str; 10] = [
    "Call", "Email", "Fix", "Buy", "Return", "Plan", "Review", "Clean", "Book", "Pay",
];

const TITLE_OBJECTS: [&str; 10] = [
    "dentist",
    "landlord",
    "bike tire",
    "groceries",
    "library books",
    "weekend trip",
    "pull request",
    "garage",
    "flights",
    "water bill",
];

pub const HELP_FIXTURE: &str = "taskgrid help\n\nj\tnext entry\nk\tprevious entry\n:\tcommand line\n";

/// Fixed clock shared by fixtures: 2026-02-19T12:34:56Z.
pub fn fixed_now() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp(1_771_504_496).unwrap_or(OffsetDateTime::UNIX_EPOCH)
}

pub fn fixture_datetime() -> &'static str {
    "2026-02-19T12:34:56Z"
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("taskgrid.db");
    Ok((dir, db_path))
}

pub fn entry_due_in(title: &str, offset: Duration, tag: usize) -> TaskEntry {
    TaskEntry::new(title, fixed_now() + offset, tag)
}

pub fn completed_entry(title: &str, offset: Duration, tag: usize) -> TaskEntry {
    let mut entry = entry_due_in(title, offset, tag);
    entry.completed = true;
    entry
}

/// One entry per status bucket relative to [`fixed_now`], split over two tags.
pub fn sample_task_list() -> TaskList {
    let mut tags = TagTable::default();
    tags.set_name(1, "work");

    let mut failed = entry_due_in("Renew passport", Duration::hours(-3), 0);
    failed.description = "Photos are in the desk drawer.".to_owned();

    TaskList {
        entries: vec![
            completed_entry("Water plants", Duration::hours(-20), 0),
            failed,
            entry_due_in("Send invoice", Duration::hours(6), 1),
            entry_due_in("Quarterly review", Duration::days(9), 1),
        ],
        tags,
    }
}

pub fn default_cvars() -> BTreeMap<String, String> {
    [
        ("cols", "tdi"),
        ("all_cols", "tldi"),
        ("charset.row_separator", "|"),
        ("charset.status_separator", "|"),
        ("charset.box_corner_1", "+"),
        ("charset.box_corner_2", "+"),
        ("charset.box_corner_3", "+"),
        ("charset.box_corner_4", "+"),
        ("charset.box_border_v", "|"),
        ("charset.box_border_h", "-"),
        ("charset.box_ui_line_h", "-"),
        ("colors.title", "6"),
        ("colors.background", "-1"),
        ("colors.entry_completed", "2"),
        ("colors.entry_coming", "3"),
        ("colors.entry_failed", "1"),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_owned(), value.to_owned()))
    .collect()
}

/// In-memory runtime that records what the interface asks of it.
#[derive(Debug, Clone)]
pub struct FakeRuntime {
    pub list: TaskList,
    pub cvars: BTreeMap<String, String>,
    pub help: String,
    pub now: OffsetDateTime,
    pub commands: Vec<String>,
    pub persist_count: usize,
}

impl FakeRuntime {
    pub fn new(list: TaskList) -> Self {
        Self {
            list,
            cvars: default_cvars(),
            help: HELP_FIXTURE.to_owned(),
            now: fixed_now(),
            commands: Vec::new(),
            persist_count: 0,
        }
    }
}

impl Default for FakeRuntime {
    fn default() -> Self {
        Self::new(sample_task_list())
    }
}

impl TaskRuntime for FakeRuntime {
    fn entries(&self) -> &[TaskEntry] {
        &self.list.entries
    }

    fn tags(&self) -> &TagTable {
        &self.list.tags
    }

    fn config_text(&self, key: &str) -> String {
        self.cvars.get(key).cloned().unwrap_or_default()
    }

    fn config_int(&self, key: &str) -> i64 {
        self.cvars
            .get(key)
            .and_then(|value| value.parse().ok())
            .unwrap_or(-1)
    }

    fn help_text(&self) -> &str {
        &self.help
    }

    fn now(&self) -> OffsetDateTime {
        self.now
    }

    fn run_command(&mut self, ui: &mut UiState, command: &str) -> Result<()> {
        self.commands.push(command.to_owned());
        let (verb, rest) = command.split_once(' ').unwrap_or((command, ""));
        match verb {
            "down" => {
                ui.select_next_visible(&self.list.entries, self.now);
            }
            "up" => {
                ui.select_previous_visible(&self.list.entries, self.now);
            }
            "q" => ui.set_mode(Mode::Exit),
            "details" => ui.set_mode(Mode::Details),
            "help" => ui.set_mode(Mode::Help),
            "echo" => ui.set_status(rest),
            "fail" => bail!("simulated failure"),
            _ => {}
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        self.persist_count += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Seeded generator for larger task lists.
#[derive(Debug, Clone)]
pub struct TaskFaker {
    rng: DeterministicRng,
}

impl TaskFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn title(&mut self) -> String {
        let verb = TITLE_VERBS[self.rng.int_n(TITLE_VERBS.len())];
        let object = TITLE_OBJECTS[self.rng.int_n(TITLE_OBJECTS.len())];
        format!("{verb} {object}")
    }

    /// An open entry due one to thirty days after [`fixed_now`].
    pub fn upcoming_entry(&mut self, tag: usize) -> TaskEntry {
        let days = 1 + self.rng.int_n(30) as i64;
        let title = self.title();
        entry_due_in(&title, Duration::days(days) + Duration::hours(1), tag)
    }

    pub fn upcoming_list(&mut self, count: usize) -> TaskList {
        TaskList {
            entries: (0..count).map(|_| self.upcoming_entry(0)).collect(),
            tags: TagTable::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FakeRuntime, TaskFaker, fixed_now, fixture_datetime, sample_task_list};
    use taskgrid_app::{Mode, StatusBucket, TaskRuntime, UiState};
    use time::format_description::well_known::Rfc3339;
    use time::OffsetDateTime;

    #[test]
    fn fixed_now_matches_fixture_datetime() {
        let parsed = OffsetDateTime::parse(fixture_datetime(), &Rfc3339).expect("rfc3339");
        assert_eq!(fixed_now(), parsed);
    }

    #[test]
    fn sample_list_covers_every_bucket() {
        let list = sample_task_list();
        let buckets: Vec<StatusBucket> = list
            .entries
            .iter()
            .map(|entry| entry.bucket(fixed_now()))
            .collect();
        assert_eq!(
            buckets,
            vec![
                StatusBucket::Completed,
                StatusBucket::Failed,
                StatusBucket::Coming,
                StatusBucket::Uncategorized,
            ]
        );
    }

    #[test]
    fn faker_is_deterministic_per_seed() {
        let left = TaskFaker::new(42).upcoming_list(5);
        let right = TaskFaker::new(42).upcoming_list(5);
        assert_eq!(left, right);
        assert!(
            left.entries
                .iter()
                .all(|entry| entry.bucket(fixed_now()) == StatusBucket::Uncategorized)
        );
    }

    #[test]
    fn fake_runtime_records_commands_and_reports_failures() {
        let mut runtime = FakeRuntime::default();
        let mut ui = UiState::default();

        runtime.run_command(&mut ui, "down").expect("down");
        assert_eq!(ui.selected, 1);
        assert!(runtime.run_command(&mut ui, "fail").is_err());
        runtime.run_command(&mut ui, "q").expect("quit");

        assert_eq!(ui.mode(), Mode::Exit);
        assert_eq!(runtime.commands, vec!["down", "fail", "q"]);
    }
}
