// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use taskgrid_app::{Mode, StatusFilter, TagFilter, TaskEntry, TaskList, UiState};
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime};

/// Runs one command line against the task list and the interface state.
pub fn execute(
    list: &mut TaskList,
    ui: &mut UiState,
    now: OffsetDateTime,
    input: &str,
) -> Result<()> {
    let input = input.trim();
    let (verb, rest) = match input.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (input, ""),
    };

    match verb {
        "" => {}
        "q" | "exit" => ui.set_mode(Mode::Exit),
        "up" => {
            ui.select_previous_visible(&list.entries, now);
        }
        "down" => {
            ui.select_next_visible(&list.entries, now);
        }
        "g" => {
            let index = parse_number(rest, "g")?;
            ui.select(index, list.entries.len());
        }
        "list" => {
            ui.filter.tag = TagFilter::parse(rest)?;
            ui.table_scroll = 0;
        }
        "filter" => toggle_filter(ui, rest)?,
        "details" => ui.set_mode(Mode::Details),
        "help" => ui.set_mode(Mode::Help),
        "normal" => ui.set_mode(Mode::Normal),
        "add" => add_entry(list, ui, now, rest)?,
        "toggle" => {
            let entry = selected_entry(list, ui)?;
            entry.completed = !entry.completed;
        }
        "del" => {
            selected_entry(list, ui)?;
            let removed = list.entries.remove(ui.selected);
            log::debug!("deleted entry {:?}", removed.title);
            ui.select(ui.selected, list.entries.len());
            ui.set_status(format!("deleted {:?}", removed.title));
        }
        "title" => {
            if rest.is_empty() {
                bail!("title needs text");
            }
            selected_entry(list, ui)?.title = rest.to_owned();
        }
        "desc" => selected_entry(list, ui)?.description = rest.to_owned(),
        "due" => {
            let due = parse_due(rest, now)?;
            selected_entry(list, ui)?.due = due;
        }
        "tag" => {
            let tag = parse_number(rest, "tag")?;
            selected_entry(list, ui)?.tag = tag;
        }
        "name" => {
            let (raw_tag, label) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            let tag = parse_number(raw_tag, "name")?;
            let label = label.trim();
            if label.is_empty() {
                list.tags.set_name(tag, tag.to_string());
            } else {
                list.tags.set_name(tag, label);
            }
        }
        "echo" => ui.set_status(rest),
        other => bail!("unknown command {other:?}"),
    }
    Ok(())
}

/// Parses a due time: `YYYY-MM-DD` (end of that day), `YYYY-MM-DDTHH:MM`,
/// or `+N` with an optional `m`, `h`, `d` (default) or `w` unit.
pub fn parse_due(raw: &str, now: OffsetDateTime) -> Result<OffsetDateTime> {
    let raw = raw.trim();
    if let Some(relative) = raw.strip_prefix('+') {
        let offset = parse_relative(relative)?;
        return now
            .checked_add(offset)
            .ok_or_else(|| anyhow!("due out of range: \"+{relative}\""));
    }

    if let Ok(at) = PrimitiveDateTime::parse(
        raw,
        format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    ) {
        return Ok(at.assume_offset(now.offset()));
    }

    let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).with_context(
        || format!("invalid due {raw:?}; use YYYY-MM-DD, YYYY-MM-DDTHH:MM or +N[m|h|d|w]"),
    )?;
    let end_of_day = date.with_hms(23, 59, 0).context("build end of day")?;
    Ok(end_of_day.assume_offset(now.offset()))
}

fn parse_relative(raw: &str) -> Result<Duration> {
    let (digits, unit) = match raw.char_indices().last() {
        Some((index, unit)) if unit.is_ascii_alphabetic() => (&raw[..index], unit),
        _ => (raw, 'd'),
    };
    let amount: i64 = digits
        .parse()
        .with_context(|| format!("invalid relative due \"+{raw}\""))?;
    let unit_seconds = match unit {
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        'w' => 7 * 24 * 60 * 60,
        other => bail!("unknown due unit {other:?}; use m, h, d or w"),
    };
    let seconds = amount
        .checked_mul(unit_seconds)
        .ok_or_else(|| anyhow!("due out of range: \"+{raw}\""))?;
    Ok(Duration::seconds(seconds))
}

fn parse_number(raw: &str, verb: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .with_context(|| format!("{verb} needs a number, got {raw:?}"))
}

fn selected_entry<'a>(list: &'a mut TaskList, ui: &UiState) -> Result<&'a mut TaskEntry> {
    list.entries
        .get_mut(ui.selected)
        .ok_or_else(|| anyhow!("no entry selected"))
}

fn toggle_filter(ui: &mut UiState, letters: &str) -> Result<()> {
    let letters: Vec<char> = letters.chars().filter(|ch| !ch.is_whitespace()).collect();
    if letters.is_empty() {
        bail!("filter needs status letters (u, v, c, f)");
    }

    let mut status = ui.filter.status;
    for letter in letters {
        let flag = StatusFilter::flag_for_letter(letter)
            .ok_or_else(|| anyhow!("unknown status filter letter {letter:?}; use u, v, c or f"))?;
        status = status.toggled(flag);
    }
    ui.filter.status = status;
    ui.set_status(format!("filter {}", status.mask_string()));
    Ok(())
}

fn add_entry(list: &mut TaskList, ui: &mut UiState, now: OffsetDateTime, rest: &str) -> Result<()> {
    let (raw_due, text) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| anyhow!("usage: add <due> <title>[; description]"))?;
    let due = parse_due(raw_due, now)?;
    let (title, description) = text.split_once(';').unwrap_or((text, ""));
    let title = title.trim();
    if title.is_empty() {
        bail!("add needs a title");
    }

    let tag = match ui.filter.tag {
        TagFilter::All => 0,
        TagFilter::Tag(tag) => tag,
    };
    let mut entry = TaskEntry::new(title, due, tag);
    entry.description = description.trim().to_owned();
    log::debug!("adding entry {title:?} to list {tag}");
    list.entries.push(entry);
    ui.select(list.entries.len() - 1, list.entries.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{execute, parse_due};
    use anyhow::Result;
    use taskgrid_app::{Mode, StatusFilter, TagFilter, TaskList, UiState};
    use taskgrid_testkit::{fixed_now, sample_task_list};
    use time::macros::datetime;
    use time::{Duration, OffsetDateTime};

    fn run(list: &mut TaskList, ui: &mut UiState, input: &str) -> Result<()> {
        execute(list, ui, fixed_now(), input)
    }

    #[test]
    fn relative_due_offsets_from_now() -> Result<()> {
        let now = fixed_now();
        assert_eq!(parse_due("+30m", now)?, now + Duration::minutes(30));
        assert_eq!(parse_due("+2h", now)?, now + Duration::hours(2));
        assert_eq!(parse_due("+1d", now)?, now + Duration::DAY);
        assert_eq!(parse_due("+3", now)?, now + Duration::days(3));
        assert_eq!(parse_due("+1w", now)?, now + Duration::WEEK);
        Ok(())
    }

    #[test]
    fn absolute_due_uses_the_clock_offset() -> Result<()> {
        let now: OffsetDateTime = datetime!(2026-02-19 12:00 +2);
        assert_eq!(
            parse_due("2026-03-01T09:30", now)?,
            datetime!(2026-03-01 09:30 +2)
        );
        assert_eq!(parse_due("2026-03-01", now)?, datetime!(2026-03-01 23:59 +2));
        Ok(())
    }

    #[test]
    fn huge_relative_due_is_an_error() {
        let now = fixed_now();
        for raw in ["+99999999", "+9223372036854775807d", "+9223372036854775807m", "+99999999w"] {
            let error = parse_due(raw, now).expect_err("due past the calendar");
            assert!(
                error.to_string().contains("due out of range"),
                "unexpected message for {raw}: {error}"
            );
        }
    }

    #[test]
    fn out_of_range_due_leaves_the_list_untouched() {
        let mut list = sample_task_list();
        let mut ui = UiState::default();

        assert!(run(&mut list, &mut ui, "add +99999999 boom").is_err());
        assert!(run(&mut list, &mut ui, "due +99999999").is_err());
        assert_eq!(list, sample_task_list());
    }

    #[test]
    fn malformed_due_is_rejected() {
        let now = fixed_now();
        assert!(parse_due("tomorrow", now).is_err());
        assert!(parse_due("+3y", now).is_err());
        assert!(parse_due("+x", now).is_err());
        assert!(parse_due("2026-13-01", now).is_err());
    }

    #[test]
    fn add_appends_to_the_filtered_list_and_selects_it() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();
        ui.filter.tag = TagFilter::Tag(1);

        run(&mut list, &mut ui, "add +2h Call the bank; ask about fees")?;

        let added = list.entries.last().expect("added entry");
        assert_eq!(added.title, "Call the bank");
        assert_eq!(added.description, "ask about fees");
        assert_eq!(added.tag, 1);
        assert_eq!(added.due, fixed_now() + Duration::hours(2));
        assert_eq!(ui.selected, 4);
        Ok(())
    }

    #[test]
    fn add_under_all_lists_uses_list_zero() -> Result<()> {
        let mut list = TaskList::default();
        let mut ui = UiState::default();

        run(&mut list, &mut ui, "add +1d Pay rent")?;
        assert_eq!(list.entries[0].tag, 0);
        assert!(run(&mut list, &mut ui, "add +1d").is_err());
        assert!(run(&mut list, &mut ui, "add +1d ;only a description").is_err());
        Ok(())
    }

    #[test]
    fn edits_apply_to_the_selected_entry() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();
        ui.selected = 2;

        run(&mut list, &mut ui, "toggle")?;
        run(&mut list, &mut ui, "title Send the invoice")?;
        run(&mut list, &mut ui, "desc Net 30")?;
        run(&mut list, &mut ui, "tag 0")?;
        run(&mut list, &mut ui, "due +1w")?;

        let entry = &list.entries[2];
        assert!(entry.completed);
        assert_eq!(entry.title, "Send the invoice");
        assert_eq!(entry.description, "Net 30");
        assert_eq!(entry.tag, 0);
        assert_eq!(entry.due, fixed_now() + Duration::WEEK);
        assert!(run(&mut list, &mut ui, "title").is_err());
        Ok(())
    }

    #[test]
    fn delete_keeps_selection_in_bounds() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();
        ui.selected = 3;

        run(&mut list, &mut ui, "del")?;
        assert_eq!(list.entries.len(), 3);
        assert_eq!(ui.selected, 2);

        let mut empty = TaskList::default();
        ui.selected = 0;
        let error = run(&mut empty, &mut ui, "del").expect_err("nothing to delete");
        assert!(error.to_string().contains("no entry selected"));
        Ok(())
    }

    #[test]
    fn navigation_commands_move_between_visible_entries() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();
        ui.filter.tag = TagFilter::Tag(1);
        ui.selected = 2;

        run(&mut list, &mut ui, "down")?;
        assert_eq!(ui.selected, 3);
        run(&mut list, &mut ui, "down")?;
        assert_eq!(ui.selected, 2);
        run(&mut list, &mut ui, "up")?;
        assert_eq!(ui.selected, 3);

        run(&mut list, &mut ui, "g 99")?;
        assert_eq!(ui.selected, 3);
        run(&mut list, &mut ui, "g 1")?;
        assert_eq!(ui.selected, 1);
        assert!(run(&mut list, &mut ui, "g first").is_err());
        Ok(())
    }

    #[test]
    fn list_and_filter_change_the_view() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();

        run(&mut list, &mut ui, "list 1")?;
        assert_eq!(ui.filter.tag, TagFilter::Tag(1));
        run(&mut list, &mut ui, "list all")?;
        assert_eq!(ui.filter.tag, TagFilter::All);

        run(&mut list, &mut ui, "filter uv")?;
        assert_eq!(
            ui.filter.status,
            StatusFilter::COMING | StatusFilter::FAILED
        );
        assert_eq!(ui.take_status().as_deref(), Some("filter __CF"));
        run(&mut list, &mut ui, "filter u")?;
        assert!(ui.filter.status.contains(StatusFilter::UNCATEGORIZED));
        assert!(run(&mut list, &mut ui, "filter z").is_err());
        assert!(run(&mut list, &mut ui, "filter").is_err());
        Ok(())
    }

    #[test]
    fn mode_commands_switch_modes() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();

        run(&mut list, &mut ui, "details")?;
        assert_eq!(ui.mode(), Mode::Details);
        run(&mut list, &mut ui, "help")?;
        assert_eq!(ui.mode(), Mode::Help);
        run(&mut list, &mut ui, "normal")?;
        assert_eq!(ui.mode(), Mode::Normal);
        run(&mut list, &mut ui, "exit")?;
        assert_eq!(ui.mode(), Mode::Exit);
        Ok(())
    }

    #[test]
    fn name_labels_and_unlabels_lists() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();

        run(&mut list, &mut ui, "name 3 errands and chores")?;
        assert_eq!(list.tags.list_label(3), "List 3: errands and chores");
        run(&mut list, &mut ui, "name 1")?;
        assert_eq!(list.tags.list_label(1), "List 1");

        run(&mut list, &mut ui, "name 5000000 far")?;
        assert_eq!(list.tags.len(), 2);
        assert_eq!(list.tags.custom_name(5_000_000), Some("far"));
        Ok(())
    }

    #[test]
    fn echo_sets_status_and_unknown_verbs_fail() -> Result<()> {
        let mut list = sample_task_list();
        let mut ui = UiState::default();
        ui.take_status();

        run(&mut list, &mut ui, "echo  hello there ")?;
        assert_eq!(ui.take_status().as_deref(), Some("hello there"));
        run(&mut list, &mut ui, "   ")?;

        let error = run(&mut list, &mut ui, "frobnicate now").expect_err("unknown verb");
        assert!(error.to_string().contains("unknown command"));
        Ok(())
    }
}
