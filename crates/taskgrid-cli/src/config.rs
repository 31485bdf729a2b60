// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use log::LevelFilter;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use taskgrid_app::{APP_NAME, Bind, BindTable, Key, ModeMask, StatusFilter, TagFilter, ViewFilter};

const CONFIG_VERSION: i64 = 1;
const DEFAULT_COLS: &str = "tdi";
const DEFAULT_ALL_COLS: &str = "tldi";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub storage: Storage,
    #[serde(default)]
    pub ui: Ui,
    #[serde(default)]
    pub charset: Charset,
    #[serde(default)]
    pub colors: Colors,
    #[serde(default)]
    pub log: Log,
    #[serde(default)]
    pub bind: Vec<BindConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage: Storage::default(),
            ui: Ui::default(),
            charset: Charset::default(),
            colors: Colors::default(),
            log: Log::default(),
            bind: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Storage {
    pub db_path: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Ui {
    pub cols: Option<String>,
    pub all_cols: Option<String>,
    pub tag_filter: Option<TagFilterSetting>,
    pub status_filter: Option<String>,
}

/// `tag_filter = "all"` or `tag_filter = 2`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagFilterSetting {
    Number(i64),
    Name(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Charset {
    pub row_separator: Option<String>,
    pub status_separator: Option<String>,
    pub box_corner_1: Option<String>,
    pub box_corner_2: Option<String>,
    pub box_corner_3: Option<String>,
    pub box_corner_4: Option<String>,
    pub box_border_v: Option<String>,
    pub box_border_h: Option<String>,
    pub box_ui_line_h: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Colors {
    pub title: Option<i64>,
    pub background: Option<i64>,
    pub entry_completed: Option<i64>,
    pub entry_coming: Option<i64>,
    pub entry_failed: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BindConfig {
    pub key: String,
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub modes: Vec<String>,
    pub autoexec: Option<bool>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("TASKGRID_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set TASKGRID_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` at the top of the file",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `taskgrid --print-example-config` for the current layout",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(db_path) = &self.storage.db_path {
            taskgrid_db::validate_db_path(db_path)?;
        }

        for (key, cols) in [("ui.cols", &self.ui.cols), ("ui.all_cols", &self.ui.all_cols)] {
            if let Some(cols) = cols
                && cols.trim().is_empty()
            {
                bail!("{key} in {} must name at least one column", path.display());
            }
        }

        self.view_filter()
            .with_context(|| format!("invalid [ui] filter in {}", path.display()))?;

        for (key, value) in self.color_values() {
            if let Some(code) = value
                && !(-1..=255).contains(&code)
            {
                bail!(
                    "colors.{key} in {} must be between -1 and 255, got {code}",
                    path.display()
                );
            }
        }

        self.log_level()
            .with_context(|| format!("invalid [log] level in {}", path.display()))?;
        self.binds()
            .with_context(|| format!("invalid [[bind]] entry in {}", path.display()))?;
        Ok(())
    }

    pub fn db_path(&self) -> Result<PathBuf> {
        match &self.storage.db_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => taskgrid_db::default_db_path(),
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter> {
        let raw = self.log.level.as_deref().unwrap_or("info");
        raw.parse()
            .map_err(|_| anyhow!("unknown log level {raw:?}; use error, warn, info, debug or trace"))
    }

    pub fn view_filter(&self) -> Result<ViewFilter> {
        let tag = match &self.ui.tag_filter {
            None => TagFilter::All,
            Some(TagFilterSetting::Name(name)) => TagFilter::parse(name)?,
            Some(TagFilterSetting::Number(number)) => {
                let tag = usize::try_from(*number)
                    .with_context(|| format!("tag_filter must not be negative, got {number}"))?;
                TagFilter::Tag(tag)
            }
        };
        let status = match &self.ui.status_filter {
            Some(mask) => StatusFilter::parse_mask(mask)?,
            None => StatusFilter::ALL,
        };
        Ok(ViewFilter { tag, status })
    }

    /// The configured binds, or the default set when none are configured.
    pub fn binds(&self) -> Result<BindTable> {
        if self.bind.is_empty() {
            return Ok(BindTable::defaults());
        }

        let mut table = BindTable::new();
        for bind in &self.bind {
            let key = Key::parse(&bind.key)?;
            let modes = if bind.modes.is_empty() {
                ModeMask::NORMAL
            } else {
                ModeMask::parse_names(&bind.modes)?
            };
            table.push(Bind::new(
                key,
                bind.command.clone(),
                modes,
                bind.autoexec.unwrap_or(true),
            ));
        }
        Ok(table)
    }

    /// Display settings keyed the way the interface asks for them.
    pub fn display_settings(&self) -> BTreeMap<String, String> {
        let charset = &self.charset;
        let text = [
            ("cols", self.ui.cols.as_deref(), DEFAULT_COLS),
            ("all_cols", self.ui.all_cols.as_deref(), DEFAULT_ALL_COLS),
            ("charset.row_separator", charset.row_separator.as_deref(), "│"),
            ("charset.status_separator", charset.status_separator.as_deref(), "|"),
            ("charset.box_corner_1", charset.box_corner_1.as_deref(), "┌"),
            ("charset.box_corner_2", charset.box_corner_2.as_deref(), "┐"),
            ("charset.box_corner_3", charset.box_corner_3.as_deref(), "└"),
            ("charset.box_corner_4", charset.box_corner_4.as_deref(), "┘"),
            ("charset.box_border_v", charset.box_border_v.as_deref(), "│"),
            ("charset.box_border_h", charset.box_border_h.as_deref(), "─"),
            ("charset.box_ui_line_h", charset.box_ui_line_h.as_deref(), "─"),
        ]
        .into_iter()
        .map(|(key, value, default)| (key.to_owned(), value.unwrap_or(default).to_owned()));

        let colors = self.color_values().into_iter().map(|(key, value)| {
            (
                format!("colors.{key}"),
                value.unwrap_or(default_color(key)).to_string(),
            )
        });

        text.chain(colors).collect()
    }

    fn color_values(&self) -> [(&'static str, Option<i64>); 5] {
        [
            ("title", self.colors.title),
            ("background", self.colors.background),
            ("entry_completed", self.colors.entry_completed),
            ("entry_coming", self.colors.entry_coming),
            ("entry_failed", self.colors.entry_failed),
        ]
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# taskgrid config\n# Place this file at: {}\n\nversion = 1\n\n[storage]\n# Optional. Default is platform data dir (for example ~/.local/share/taskgrid/taskgrid.db)\n# db_path = \"/absolute/path/to/taskgrid.db\"\n\n[ui]\n# t = title, l = list, d = due, D = description, i = index\ncols = \"{DEFAULT_COLS}\"\nall_cols = \"{DEFAULT_ALL_COLS}\"\ntag_filter = \"all\"\nstatus_filter = \"UVCF\"\n\n[charset]\nrow_separator = \"│\"\nstatus_separator = \"|\"\nbox_corner_1 = \"┌\"\nbox_corner_2 = \"┐\"\nbox_corner_3 = \"└\"\nbox_corner_4 = \"┘\"\nbox_border_v = \"│\"\nbox_border_h = \"─\"\nbox_ui_line_h = \"─\"\n\n[colors]\n# 256-color indices; -1 keeps the terminal default\ntitle = {}\nbackground = {}\nentry_completed = {}\nentry_coming = {}\nentry_failed = {}\n\n[log]\nlevel = \"info\"\n\n# Replaces the default binds when present.\n# [[bind]]\n# key = \"n\"\n# command = \"add +1d \"\n# modes = [\"normal\"]\n# autoexec = false\n",
            path.display(),
            default_color("title"),
            default_color("background"),
            default_color("entry_completed"),
            default_color("entry_coming"),
            default_color("entry_failed"),
        )
    }
}

fn default_color(key: &str) -> i64 {
    match key {
        "title" => 6,
        "entry_completed" => 2,
        "entry_coming" => 3,
        "entry_failed" => 1,
        _ => -1,
    }
}
