// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::ops::BitOr;
use time::OffsetDateTime;

use crate::{StatusBucket, TaskEntry};

/// Bitmask of status buckets to show. Each flag is independent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusFilter(u16);

impl StatusFilter {
    pub const NONE: Self = Self(0);
    pub const UNCATEGORIZED: Self = Self(0x1);
    pub const COMPLETE: Self = Self(0x10);
    pub const COMING: Self = Self(0x100);
    pub const FAILED: Self = Self(0x1000);
    pub const ALL: Self = Self(0x1111);

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn toggled(self, flag: Self) -> Self {
        Self(self.0 ^ flag.0)
    }

    pub const fn for_bucket(bucket: StatusBucket) -> Self {
        match bucket {
            StatusBucket::Uncategorized => Self::UNCATEGORIZED,
            StatusBucket::Completed => Self::COMPLETE,
            StatusBucket::Coming => Self::COMING,
            StatusBucket::Failed => Self::FAILED,
        }
    }

    pub const fn includes(self, bucket: StatusBucket) -> bool {
        self.contains(Self::for_bucket(bucket))
    }

    pub const fn letter(bucket: StatusBucket) -> char {
        match bucket {
            StatusBucket::Uncategorized => 'U',
            StatusBucket::Completed => 'V',
            StatusBucket::Coming => 'C',
            StatusBucket::Failed => 'F',
        }
    }

    pub fn flag_for_letter(letter: char) -> Option<Self> {
        StatusBucket::ALL
            .into_iter()
            .find(|bucket| Self::letter(*bucket) == letter.to_ascii_uppercase())
            .map(Self::for_bucket)
    }

    /// Four characters in U/V/C/F order, `_` for each unset flag.
    pub fn mask_string(self) -> String {
        StatusBucket::ALL
            .into_iter()
            .map(|bucket| {
                if self.includes(bucket) {
                    Self::letter(bucket)
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Parses a mask such as `UVCF`, `U_C_` or `fc`. Underscores are ignored.
    pub fn parse_mask(raw: &str) -> Result<Self> {
        let mut filter = Self::NONE;
        for letter in raw.chars() {
            if letter == '_' {
                continue;
            }
            let Some(flag) = Self::flag_for_letter(letter) else {
                bail!("unknown status filter letter {letter:?}; use U, V, C or F");
            };
            filter = filter | flag;
        }
        Ok(filter)
    }
}

impl BitOr for StatusFilter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Default for StatusFilter {
    fn default() -> Self {
        Self::ALL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TagFilter {
    #[default]
    All,
    Tag(usize),
}

impl TagFilter {
    pub const fn matches(self, tag: usize) -> bool {
        match self {
            Self::All => true,
            Self::Tag(wanted) => wanted == tag,
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        match trimmed.parse::<usize>() {
            Ok(tag) => Ok(Self::Tag(tag)),
            Err(_) => bail!("invalid tag filter {trimmed:?}; use `all` or a list number"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ViewFilter {
    pub tag: TagFilter,
    pub status: StatusFilter,
}

impl ViewFilter {
    pub fn admits(&self, entry: &TaskEntry, now: OffsetDateTime) -> bool {
        self.tag.matches(entry.tag) && self.status.includes(entry.bucket(now))
    }

    /// Visibility by entry index. Nothing is visible in an empty list.
    pub fn is_visible(&self, entries: &[TaskEntry], index: usize, now: OffsetDateTime) -> bool {
        entries
            .get(index)
            .is_some_and(|entry| self.admits(entry, now))
    }

    pub fn visible_indices(&self, entries: &[TaskEntry], now: OffsetDateTime) -> Vec<usize> {
        entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| self.admits(entry, now))
            .map(|(index, _)| index)
            .collect()
    }

    /// First visible index after `from`, wrapping around to the start.
    pub fn next_visible(
        &self,
        entries: &[TaskEntry],
        from: usize,
        now: OffsetDateTime,
    ) -> Option<usize> {
        let visible = self.visible_indices(entries, now);
        visible
            .iter()
            .copied()
            .find(|index| *index > from)
            .or_else(|| visible.first().copied())
    }

    /// Last visible index before `from`, wrapping around to the end.
    pub fn previous_visible(
        &self,
        entries: &[TaskEntry],
        from: usize,
        now: OffsetDateTime,
    ) -> Option<usize> {
        let visible = self.visible_indices(entries, now);
        visible
            .iter()
            .rev()
            .copied()
            .find(|index| *index < from)
            .or_else(|| visible.last().copied())
    }
}
