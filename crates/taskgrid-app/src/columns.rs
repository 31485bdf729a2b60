// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use std::collections::BTreeMap;

use crate::{TagTable, TaskEntry, format_due};

/// Cells between two placed columns: one space, the separator glyph, one space.
pub const COLUMN_GAP: usize = 3;

/// `(terminal width, remaining width, column count) -> cell width`.
pub type WidthFn = fn(usize, usize, usize) -> usize;

/// `(entry, entry index, tag names) -> cell text`.
pub type ContentFn = fn(&TaskEntry, usize, &TagTable) -> String;

#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub title: &'static str,
    pub width: WidthFn,
    pub content: ContentFn,
}

impl ColumnSpec {
    pub fn render(&self, entry: &TaskEntry, index: usize, tags: &TagTable) -> String {
        (self.content)(entry, index, tags)
    }
}

/// One column as placed on a row by [`ColumnRegistry::layout`].
#[derive(Debug, Clone, Copy)]
pub struct PlacedColumn<'a> {
    pub code: char,
    pub spec: &'a ColumnSpec,
    pub x: usize,
    pub width: usize,
    /// Width that was still free when this column was placed.
    pub remaining: usize,
    /// Whether a separator is drawn right after this column.
    pub separator: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnRegistry {
    columns: BTreeMap<char, ColumnSpec>,
}

impl ColumnRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in column set: title, list, due, description and id.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register('t', "Task Title", |_, free, _| free / 4, |entry, _, _| {
            entry.title.clone()
        });
        registry.register('l', "List", |_, free, _| free / 10, |entry, _, tags| {
            tags.column_label(entry.tag)
        });
        registry.register('d', "Due", |_, _, _| 16, |entry, _, _| format_due(entry.due));
        registry.register('D', "Task description", |_, free, _| free, |entry, _, _| {
            entry.description.clone()
        });
        registry.register('i', "ID", |_, _, _| 3, |_, index, _| index.to_string());
        registry
    }

    pub fn register(
        &mut self,
        code: char,
        title: &'static str,
        width: WidthFn,
        content: ContentFn,
    ) {
        self.columns.insert(
            code,
            ColumnSpec {
                title,
                width,
                content,
            },
        );
    }

    pub fn lookup(&self, code: char) -> Result<&ColumnSpec> {
        self.columns
            .get(&code)
            .ok_or_else(|| anyhow!("no such column {code:?}"))
    }

    pub fn contains(&self, code: char) -> bool {
        self.columns.contains_key(&code)
    }

    /// Places the columns named by `codes` left to right across `total` cells.
    /// Unknown codes are skipped.
    pub fn layout(&self, codes: &str, total: usize) -> Vec<PlacedColumn<'_>> {
        let count = codes.chars().count();
        let mut placed = Vec::with_capacity(count);
        let mut x = 0;

        for (position, code) in codes.chars().enumerate() {
            if x >= total {
                break;
            }
            let spec = match self.lookup(code) {
                Ok(spec) => spec,
                Err(error) => {
                    log::debug!("skipping column: {error}");
                    continue;
                }
            };

            let remaining = total - x;
            let width = (spec.width)(total, remaining, count).min(remaining);
            let separator = position + 1 < count && x + width < total;
            placed.push(PlacedColumn {
                code,
                spec,
                x,
                width,
                remaining,
                separator,
            });
            x += width + COLUMN_GAP;
        }

        placed
    }
}
