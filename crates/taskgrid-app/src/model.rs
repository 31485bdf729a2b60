// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use time::macros::format_description;
use time::{Duration, OffsetDateTime};

pub const APP_NAME: &str = "taskgrid";

/// Entries due within this window after "now" count as coming.
pub const COMING_WINDOW: Duration = Duration::DAY;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEntry {
    pub title: String,
    pub description: String,
    pub due: OffsetDateTime,
    pub tag: usize,
    pub completed: bool,
}

impl TaskEntry {
    pub fn new(title: impl Into<String>, due: OffsetDateTime, tag: usize) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due,
            tag,
            completed: false,
        }
    }

    pub fn bucket(&self, now: OffsetDateTime) -> StatusBucket {
        StatusBucket::classify(self, now)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusBucket {
    Completed,
    Failed,
    Coming,
    Uncategorized,
}

impl StatusBucket {
    pub const ALL: [Self; 4] = [
        Self::Uncategorized,
        Self::Completed,
        Self::Coming,
        Self::Failed,
    ];

    pub fn classify(entry: &TaskEntry, now: OffsetDateTime) -> Self {
        if entry.completed {
            Self::Completed
        } else if entry.due <= now {
            Self::Failed
        } else if entry.due <= now + COMING_WINDOW {
            Self::Coming
        } else {
            Self::Uncategorized
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Coming => "coming",
            Self::Uncategorized => "uncategorized",
        }
    }
}

/// Names of the lists that have one, keyed by tag id. Any other id is unnamed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagTable {
    names: BTreeMap<usize, String>,
}

impl TagTable {
    /// Builds a table from names listed by position; `names[3]` names tag 3.
    pub fn new(names: Vec<String>) -> Self {
        let mut table = Self::default();
        for (tag, name) in names.into_iter().enumerate() {
            table.set_name(tag, name);
        }
        table
    }

    /// Named tags in id order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.names.iter().map(|(tag, name)| (*tag, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn tag_name(&self, tag: usize) -> String {
        self.custom_name(tag)
            .map_or_else(|| tag.to_string(), str::to_owned)
    }

    pub fn custom_name(&self, tag: usize) -> Option<&str> {
        self.names.get(&tag).map(String::as_str)
    }

    /// Label used inside the list column: `3: work` or `List 3`.
    pub fn column_label(&self, tag: usize) -> String {
        match self.custom_name(tag) {
            Some(name) => format!("{tag}: {name}"),
            None => format!("List {tag}"),
        }
    }

    /// Label used by the status line and the details box: `List 3: work` or `List 3`.
    pub fn list_label(&self, tag: usize) -> String {
        match self.custom_name(tag) {
            Some(name) => format!("List {tag}: {name}"),
            None => format!("List {tag}"),
        }
    }

    /// Names `tag`. An empty name, or one equal to the id, unnames it.
    pub fn set_name(&mut self, tag: usize, name: impl Into<String>) {
        let name = name.into();
        if name.is_empty() || name == tag.to_string() {
            self.names.remove(&tag);
        } else {
            self.names.insert(tag, name);
        }
    }
}

/// Everything the store hands to the interface: the entries and the tag names.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskList {
    pub entries: Vec<TaskEntry>,
    pub tags: TagTable,
}

pub fn format_due(due: OffsetDateTime) -> String {
    due.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| String::from("????-??-?? ??:??"))
}

#[cfg(test)]
mod tests {
    use super::{StatusBucket, TagTable, TaskEntry, format_due};
    use time::{Duration, OffsetDateTime};

    fn at(seconds: i64) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(seconds).expect("valid timestamp")
    }

    #[test]
    fn due_now_is_failed_and_within_a_day_is_coming() {
        let now = at(1000);
        let failed = TaskEntry::new("a", at(1000), 0);
        let coming = TaskEntry::new("b", at(1000 + 43_200), 0);
        let later = TaskEntry::new("c", at(1000 + 172_800), 0);

        assert_eq!(failed.bucket(now), StatusBucket::Failed);
        assert_eq!(coming.bucket(now), StatusBucket::Coming);
        assert_eq!(later.bucket(now), StatusBucket::Uncategorized);
    }

    #[test]
    fn coming_window_boundary_is_inclusive() {
        let now = at(1000);
        let edge = TaskEntry::new("edge", now + Duration::DAY, 0);
        let past_edge = TaskEntry::new("past", now + Duration::DAY + Duration::SECOND, 0);

        assert_eq!(edge.bucket(now), StatusBucket::Coming);
        assert_eq!(past_edge.bucket(now), StatusBucket::Uncategorized);
    }

    #[test]
    fn completion_wins_over_due_time() {
        let now = at(5000);
        let mut entry = TaskEntry::new("done", at(10), 0);
        entry.completed = true;
        assert_eq!(entry.bucket(now), StatusBucket::Completed);
    }

    #[test]
    fn unnamed_tags_fall_back_to_list_number() {
        let tags = TagTable::new(vec!["0".to_owned(), "work".to_owned()]);

        assert_eq!(tags.tag_name(0), "0");
        assert_eq!(tags.tag_name(7), "7");
        assert_eq!(tags.column_label(0), "List 0");
        assert_eq!(tags.column_label(1), "1: work");
        assert_eq!(tags.column_label(9), "List 9");
        assert_eq!(tags.list_label(1), "List 1: work");
        assert_eq!(tags.list_label(4), "List 4");
    }

    #[test]
    fn naming_a_distant_tag_stores_only_that_name() {
        let mut tags = TagTable::default();
        tags.set_name(2, "home");
        tags.set_name(usize::MAX, "far away");

        assert_eq!(tags.len(), 2);
        assert_eq!(
            tags.iter().collect::<Vec<_>>(),
            vec![(2, "home"), (usize::MAX, "far away")]
        );
        assert_eq!(tags.custom_name(1), None);
        assert_eq!(tags.custom_name(2), Some("home"));
    }

    #[test]
    fn naming_a_tag_after_its_id_unnames_it() {
        let mut tags = TagTable::new(vec!["0".to_owned(), "work".to_owned()]);
        assert_eq!(tags.len(), 1);

        tags.set_name(1, "1");
        assert!(tags.is_empty());
        tags.set_name(3, "");
        assert!(tags.is_empty());
    }

    #[test]
    fn due_format_is_sixteen_columns() {
        let formatted = format_due(at(0));
        assert_eq!(formatted, "1970-01-01 00:00");
        assert_eq!(formatted.len(), 16);
    }
}
