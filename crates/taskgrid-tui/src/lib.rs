// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod render;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use std::io;
use taskgrid_app::{ColumnRegistry, Key, Mode, TaskRuntime, UiRequest, UiState};

pub use render::{color, render};

pub fn run_app<R: TaskRuntime>(ui: &mut UiState, runtime: &mut R) -> Result<()> {
    let mut terminal = enter_terminal()?;
    let columns = ColumnRegistry::standard();

    let result = run_session(&mut terminal, ui, runtime, &columns, || {
        event::read().context("read event")
    });
    let restored = restore_terminal();
    result.and(restored)
}

/// Switches to raw mode and the alternate screen, undoing both if a later
/// step fails.
fn enter_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("enable raw mode")?;
    let setup = execute!(io::stdout(), terminal::EnterAlternateScreen)
        .context("enter alternate screen")
        .and_then(|()| {
            Terminal::new(CrosstermBackend::new(io::stdout())).context("create terminal")
        });
    setup.inspect_err(|_| {
        if let Err(error) = restore_terminal() {
            log::warn!("restore terminal after failed setup: {error:#}");
        }
    })
}

fn restore_terminal() -> Result<()> {
    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    Ok(())
}

/// Runs the interface until it exits or the event source fails, then saves
/// the task list exactly once either way.
pub fn run_session<B, R, E>(
    terminal: &mut Terminal<B>,
    ui: &mut UiState,
    runtime: &mut R,
    columns: &ColumnRegistry,
    next_event: E,
) -> Result<()>
where
    B: Backend,
    R: TaskRuntime,
    E: FnMut() -> Result<Event>,
{
    let result = event_loop(terminal, ui, runtime, columns, next_event);
    if let Err(error) = &result {
        log::error!("event loop stopped: {error:#}");
    }
    let persisted = runtime.persist().context("persist task list");
    result.and(persisted)
}

fn event_loop<B, R, E>(
    terminal: &mut Terminal<B>,
    ui: &mut UiState,
    runtime: &mut R,
    columns: &ColumnRegistry,
    mut next_event: E,
) -> Result<()>
where
    B: Backend,
    R: TaskRuntime,
    E: FnMut() -> Result<Event>,
{
    draw_frame(terminal, ui, runtime, columns)?;
    loop {
        match next_event()? {
            Event::Key(key) => handle_key_event(ui, runtime, key),
            Event::Resize(_, _) => {}
            _ => continue,
        }
        if !ui.is_running() {
            log::info!("exit requested");
            return Ok(());
        }
        draw_frame(terminal, ui, runtime, columns)?;
    }
}

/// Fixes up the selection, then repaints from scratch at the current size.
pub fn draw_frame<B: Backend, R: TaskRuntime>(
    terminal: &mut Terminal<B>,
    ui: &mut UiState,
    runtime: &mut R,
    columns: &ColumnRegistry,
) -> Result<()> {
    sync_selection(ui, runtime);
    let runtime = &*runtime;
    terminal
        .draw(|frame| render(frame, ui, runtime, columns))
        .context("draw frame")?;
    Ok(())
}

pub fn handle_key_event<R: TaskRuntime>(ui: &mut UiState, runtime: &mut R, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        ui.set_mode(Mode::Exit);
        return;
    }
    let Some(key) = translate_key(key) else {
        return;
    };

    let requests = ui.process_key(key, runtime.entries().len());
    for request in requests {
        match request {
            UiRequest::Run(command) => dispatch_command(ui, runtime, &command),
            UiRequest::CloseCommandLine => ui.close_command_line(),
        }
    }
}

pub fn translate_key(key: KeyEvent) -> Option<Key> {
    let translated = match key.code {
        KeyCode::Char(_)
            if key
                .modifiers
                .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            return None;
        }
        KeyCode::Char(ch) => Key::Char(ch),
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Esc,
        KeyCode::Backspace => Key::Backspace,
        KeyCode::Delete => Key::Delete,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,
        KeyCode::Tab => Key::Tab,
        _ => return None,
    };
    Some(translated)
}

/// Runs one command; a failure lands in the status slot.
pub fn dispatch_command<R: TaskRuntime>(ui: &mut UiState, runtime: &mut R, command: &str) {
    log::info!("command: {command}");
    if let Err(error) = runtime.run_command(ui, command) {
        log::warn!("command {command:?} failed: {error:#}");
        ui.set_status(format!("error: {error:#}"));
    }
}

/// Moves the selection forward with `down` until it lands on a visible entry.
pub fn sync_selection<R: TaskRuntime>(ui: &mut UiState, runtime: &mut R) {
    let count = runtime.entries().len();
    if count == 0 {
        ui.selected = 0;
        return;
    }
    ui.select(ui.selected, count);

    let is_visible =
        |ui: &UiState, runtime: &R| ui.filter.is_visible(runtime.entries(), ui.selected, runtime.now());
    if is_visible(ui, runtime) {
        return;
    }
    if ui
        .filter
        .visible_indices(runtime.entries(), runtime.now())
        .is_empty()
    {
        return;
    }

    for _ in 0..count {
        dispatch_command(ui, runtime, "down");
        if is_visible(ui, runtime) {
            return;
        }
    }

    let first = ui
        .filter
        .visible_indices(runtime.entries(), runtime.now())
        .first()
        .copied();
    if let Some(first) = first {
        ui.selected = first;
    }
}
