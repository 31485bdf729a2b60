// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use std::fmt;

/// Terminal-independent keystroke as seen by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Tab,
}

impl Key {
    /// Parses a key name as written in bind configuration: a single
    /// character, or one of `enter`, `esc`, `backspace`, `delete`, `left`,
    /// `right`, `up`, `down`, `home`, `end`, `tab`, `space`.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        if let (Some(only), None) = (chars.next(), chars.next()) {
            return Ok(Self::Char(only));
        }

        let key = match raw.to_ascii_lowercase().as_str() {
            "enter" | "return" => Self::Enter,
            "esc" | "escape" => Self::Esc,
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "left" => Self::Left,
            "right" => Self::Right,
            "up" => Self::Up,
            "down" => Self::Down,
            "home" => Self::Home,
            "end" => Self::End,
            "tab" => Self::Tab,
            "space" => Self::Char(' '),
            _ => bail!("unknown key {raw:?}"),
        };
        Ok(key)
    }

    pub fn digit(self) -> Option<usize> {
        match self {
            Self::Char(ch) => ch.to_digit(10).map(|digit| digit as usize),
            _ => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(' ') => f.write_str("space"),
            Self::Char(ch) => write!(f, "{ch}"),
            Self::Enter => f.write_str("enter"),
            Self::Esc => f.write_str("esc"),
            Self::Backspace => f.write_str("backspace"),
            Self::Delete => f.write_str("delete"),
            Self::Left => f.write_str("left"),
            Self::Right => f.write_str("right"),
            Self::Up => f.write_str("up"),
            Self::Down => f.write_str("down"),
            Self::Home => f.write_str("home"),
            Self::End => f.write_str("end"),
            Self::Tab => f.write_str("tab"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Key;

    #[test]
    fn parses_single_characters_and_names() {
        assert_eq!(Key::parse("j").ok(), Some(Key::Char('j')));
        assert_eq!(Key::parse(":").ok(), Some(Key::Char(':')));
        assert_eq!(Key::parse("Enter").ok(), Some(Key::Enter));
        assert_eq!(Key::parse("space").ok(), Some(Key::Char(' ')));
        assert!(Key::parse("hyper").is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for key in [Key::Char('x'), Key::Char(' '), Key::Esc, Key::Down] {
            assert_eq!(Key::parse(&key.to_string()).ok(), Some(key));
        }
    }
}
