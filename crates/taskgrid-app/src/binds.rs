// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::ops::BitOr;

use crate::{Key, Mode};

/// Set of modes a bind applies in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModeMask(u8);

impl ModeMask {
    pub const NONE: Self = Self(0);
    pub const NORMAL: Self = Self(0x1);
    pub const DETAILS: Self = Self(0x2);
    pub const HELP: Self = Self(0x4);
    pub const COMMAND: Self = Self(0x8);
    pub const ALL: Self = Self(0xF);

    pub const fn for_mode(mode: Mode) -> Self {
        match mode {
            Mode::Normal => Self::NORMAL,
            Mode::Details => Self::DETAILS,
            Mode::Help => Self::HELP,
            Mode::Command => Self::COMMAND,
            Mode::Exit => Self::NONE,
        }
    }

    pub const fn contains(self, mode: Mode) -> bool {
        let flag = Self::for_mode(mode).0;
        flag != 0 && self.0 & flag == flag
    }

    pub fn parse_name(raw: &str) -> Result<Self> {
        let mask = match raw.trim().to_ascii_lowercase().as_str() {
            "normal" => Self::NORMAL,
            "details" => Self::DETAILS,
            "help" => Self::HELP,
            "command" => Self::COMMAND,
            "all" => Self::ALL,
            other => bail!("unknown mode {other:?}; use normal, details, help, command or all"),
        };
        Ok(mask)
    }

    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Self> {
        names
            .iter()
            .try_fold(Self::NONE, |mask, name| Ok(mask | Self::parse_name(name.as_ref())?))
    }
}

impl BitOr for ModeMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    pub key: Key,
    pub command: String,
    pub modes: ModeMask,
    /// Run the command right away instead of seeding the command line with it.
    pub autoexec: bool,
}

impl Bind {
    pub fn new(key: Key, command: impl Into<String>, modes: ModeMask, autoexec: bool) -> Self {
        Self {
            key,
            command: command.into(),
            modes,
            autoexec,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BindTable {
    binds: Vec<Bind>,
}

impl BindTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bind: Bind) {
        self.binds.push(bind);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bind> {
        self.binds.iter()
    }

    pub fn len(&self) -> usize {
        self.binds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.binds.is_empty()
    }

    /// Every bind for `key` in `mode`, in registration order.
    pub fn matching(&self, key: Key, mode: Mode) -> impl Iterator<Item = &Bind> {
        self.binds
            .iter()
            .filter(move |bind| bind.key == key && bind.modes.contains(mode))
    }

    /// Binds installed when the configuration supplies none.
    pub fn defaults() -> Self {
        let normal = ModeMask::NORMAL;
        let browse = ModeMask::NORMAL | ModeMask::DETAILS;
        let overlays = ModeMask::NORMAL | ModeMask::DETAILS | ModeMask::HELP;

        let mut table = Self::new();
        for (key, command, modes, autoexec) in [
            (Key::Char('j'), "down", browse, true),
            (Key::Down, "down", browse, true),
            (Key::Char('k'), "up", browse, true),
            (Key::Up, "up", browse, true),
            (Key::Char(':'), "", overlays, false),
            (Key::Char('?'), "help", normal, true),
            (Key::Char('d'), "details", normal, true),
            (Key::Enter, "details", normal, true),
            (Key::Char('q'), "q", normal, true),
            (Key::Char('a'), "add +1d ", normal, false),
            (Key::Char('x'), "toggle", browse, true),
            (Key::Char('D'), "del", normal, false),
            (Key::Char('u'), "filter u", normal, true),
            (Key::Char('v'), "filter v", normal, true),
            (Key::Char('c'), "filter c", normal, true),
            (Key::Char('f'), "filter f", normal, true),
        ] {
            table.push(Bind::new(key, command, modes, autoexec));
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::{Bind, BindTable, ModeMask};
    use crate::{Key, Mode};

    #[test]
    fn mask_contains_only_its_modes() {
        let mask = ModeMask::NORMAL | ModeMask::HELP;
        assert!(mask.contains(Mode::Normal));
        assert!(mask.contains(Mode::Help));
        assert!(!mask.contains(Mode::Details));
        assert!(!mask.contains(Mode::Command));
        assert!(!ModeMask::ALL.contains(Mode::Exit));
    }

    #[test]
    fn parse_names_combines_masks() {
        let mask = ModeMask::parse_names(&["normal", "Details"]).expect("valid names");
        assert_eq!(mask, ModeMask::NORMAL | ModeMask::DETAILS);
        assert_eq!(ModeMask::parse_names(&["all"]).ok(), Some(ModeMask::ALL));
        assert!(ModeMask::parse_names(&["visual"]).is_err());
    }

    #[test]
    fn every_matching_bind_is_returned_in_order() {
        let mut table = BindTable::new();
        table.push(Bind::new(Key::Char('x'), "first", ModeMask::NORMAL, true));
        table.push(Bind::new(Key::Char('x'), "details only", ModeMask::DETAILS, true));
        table.push(Bind::new(Key::Char('y'), "other key", ModeMask::ALL, true));
        table.push(Bind::new(Key::Char('x'), "second", ModeMask::ALL, false));

        let commands: Vec<&str> = table
            .matching(Key::Char('x'), Mode::Normal)
            .map(|bind| bind.command.as_str())
            .collect();
        assert_eq!(commands, vec!["first", "second"]);
    }

    #[test]
    fn default_binds_keep_command_mode_free_for_typing() {
        let table = BindTable::defaults();
        assert!(!table.is_empty());
        assert!(table.iter().all(|bind| !bind.modes.contains(Mode::Command)));
        assert_eq!(table.matching(Key::Char(':'), Mode::Details).count(), 1);
    }
}
