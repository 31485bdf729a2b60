// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, params};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use taskgrid_app::{APP_NAME, TagTable, TaskEntry, TaskList};
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    ("tags", &["id", "name"]),
    (
        "entries",
        &["position", "title", "description", "due", "tag", "completed"],
    ),
];

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }
        Ok(())
    }

    pub fn load_entries(&self) -> Result<Vec<TaskEntry>> {
        let mut stmt = self
            .conn
            .prepare(
                "
                SELECT title, description, due, tag, completed
                FROM entries
                ORDER BY position ASC
                ",
            )
            .context("prepare entries query")?;
        let rows = stmt
            .query_map([], |row| {
                let due_raw: String = row.get(2)?;
                let tag: i64 = row.get(3)?;
                Ok(TaskEntry {
                    title: row.get(0)?,
                    description: row.get(1)?,
                    due: parse_due(&due_raw).map_err(to_sql_error)?,
                    tag: usize::try_from(tag)
                        .map_err(|_| to_sql_error(anyhow!("negative tag {tag}")))?,
                    completed: row.get::<_, i64>(4)? != 0,
                })
            })
            .context("query entries")?;

        rows.collect::<rusqlite::Result<Vec<_>>>()
            .context("collect entries")
    }

    pub fn load_tags(&self) -> Result<TagTable> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM tags ORDER BY id ASC")
            .context("prepare tags query")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))
            .context("query tags")?;

        let mut tags = TagTable::default();
        for row in rows {
            let (id, name) = row.context("read tag row")?;
            let id = usize::try_from(id).with_context(|| format!("invalid tag id {id}"))?;
            tags.set_name(id, name);
        }
        Ok(tags)
    }

    pub fn load(&self) -> Result<TaskList> {
        let list = TaskList {
            entries: self.load_entries()?,
            tags: self.load_tags()?,
        };
        log::info!(
            "loaded {} entries and {} tags",
            list.entries.len(),
            list.tags.len()
        );
        Ok(list)
    }

    /// Replaces everything stored with `list`, keeping entry order.
    pub fn save(&self, list: &TaskList) -> Result<()> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("begin save transaction")?;
        tx.execute("DELETE FROM entries", [])
            .context("clear entries")?;
        tx.execute("DELETE FROM tags", []).context("clear tags")?;

        for (position, entry) in list.entries.iter().enumerate() {
            tx.execute(
                "
                INSERT INTO entries (position, title, description, due, tag, completed)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
                params![
                    i64::try_from(position).context("entry position overflow")?,
                    entry.title,
                    entry.description,
                    format_due_rfc3339(entry.due)?,
                    i64::try_from(entry.tag).context("entry tag overflow")?,
                    entry.completed,
                ],
            )
            .with_context(|| format!("insert entry {position}"))?;
        }

        for (id, name) in list.tags.iter() {
            tx.execute(
                "INSERT INTO tags (id, name) VALUES (?, ?)",
                params![i64::try_from(id).context("tag id overflow")?, name],
            )
            .with_context(|| format!("insert tag {id}"))?;
        }

        tx.commit().context("commit save transaction")?;
        log::info!(
            "saved {} entries and {} tags",
            list.entries.len(),
            list.tags.len()
        );
        Ok(())
    }

    /// Fills an empty database with a few tasks around `now`.
    pub fn seed_demo_data(&self, now: OffsetDateTime) -> Result<()> {
        let existing: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .context("count entries")?;
        if existing > 0 {
            return Ok(());
        }

        let mut tags = TagTable::default();
        tags.set_name(1, "home");
        tags.set_name(2, "work");

        let demo = [
            ("Water the plants", "", Duration::hours(-30), 1, true),
            (
                "Renew car insurance",
                "Compare at least two quotes before renewing.",
                Duration::hours(-2),
                0,
                false,
            ),
            (
                "Send weekly report",
                "Numbers are in the shared sheet.\nCC the whole team.",
                Duration::hours(5),
                2,
                false,
            ),
            ("Book dentist appointment", "", Duration::hours(20), 1, false),
            (
                "Plan team offsite",
                "Venue shortlist, budget, agenda draft.",
                Duration::days(12),
                2,
                false,
            ),
            ("Fix the bike tire", "", Duration::days(3), 1, false),
        ];
        let entries = demo
            .into_iter()
            .map(|(title, description, offset, tag, completed)| TaskEntry {
                title: title.to_owned(),
                description: description.to_owned(),
                due: now + offset,
                tag,
                completed,
            })
            .collect();

        self.save(&TaskList { entries, tags })
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("TASKGRID_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow!("cannot resolve data directory; set TASKGRID_DB_PATH to a writable database path")
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("taskgrid.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    if path.is_empty() {
        bail!("database path must not be empty");
    }
    if path == ":memory:" {
        return Ok(());
    }

    if let Some(index) = path.find("://")
        && index > 0
    {
        let scheme = &path[..index];
        if scheme.chars().all(char::is_alphabetic) {
            bail!(
                "database path {path:?} looks like a URI ({scheme}://); pass a filesystem path instead"
            );
        }
    }

    if path.starts_with("file:") {
        bail!("database path {path:?} uses file: URI syntax; pass a plain filesystem path");
    }

    if path.contains('?') {
        bail!(
            "database path {path:?} contains '?'; remove query parameters and use a plain file path"
        );
    }

    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            bail!(
                "database is missing required table `{table}`; point [storage].db_path at a taskgrid database"
            );
        }

        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();
        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; point [storage].db_path at a taskgrid database",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

fn format_due_rfc3339(due: OffsetDateTime) -> Result<String> {
    due.format(&Rfc3339).context("format due timestamp")
}

fn parse_due(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339).with_context(|| format!("parse due timestamp {raw:?}"))
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
