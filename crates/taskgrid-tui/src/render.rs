// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use taskgrid_app::{APP_NAME, ColumnRegistry, Mode, StatusBucket, TagFilter, TaskRuntime, UiState};

const BOX_LEFT: usize = 3;
const BOX_TOP: usize = 2;
const TEXT_LEFT: usize = 5;
const TITLE_ROW: usize = 4;
const DETAILS_TEXT_TOP: usize = 10;
const HELP_TEXT_TOP: usize = 8;
const HELP_TAB_STOP: usize = 20;
const TRUNCATION_MARKER: &str = "<- ... ->";

/// Character grid over the frame buffer. Writes outside the grid are dropped.
struct Canvas<'a> {
    buffer: &'a mut Buffer,
    area: Rect,
}

impl<'a> Canvas<'a> {
    fn new(buffer: &'a mut Buffer, area: Rect) -> Self {
        Self { buffer, area }
    }

    fn width(&self) -> usize {
        usize::from(self.area.width)
    }

    fn height(&self) -> usize {
        usize::from(self.area.height)
    }

    fn put(&mut self, x: usize, y: usize, text: &str, style: Style) {
        self.put_clipped(x, y, text, usize::MAX, style);
    }

    fn put_clipped(&mut self, x: usize, y: usize, text: &str, max: usize, style: Style) {
        if x >= self.width() || y >= self.height() || max == 0 {
            return;
        }
        let max = max.min(self.width() - x);
        // Both coordinates are below the u16 area bounds checked above.
        self.buffer.set_stringn(
            self.area.x + x as u16,
            self.area.y + y as u16,
            text,
            max,
            style,
        );
    }

    fn fill(&mut self, x: usize, y: usize, count: usize, style: Style) {
        let count = count.min(self.width().saturating_sub(x));
        self.put(x, y, &" ".repeat(count), style);
    }

    fn fill_row(&mut self, y: usize, style: Style) {
        self.fill(0, y, self.width(), style);
    }
}

/// Config lookups used while painting one frame.
struct Palette {
    row_separator: String,
    status_separator: String,
    corners: [String; 4],
    border_v: String,
    border_h: String,
    rule: String,
    title: Style,
    completed: Style,
    coming: Style,
    failed: Style,
}

impl Palette {
    fn load<R: TaskRuntime>(runtime: &R) -> Self {
        let background = color(runtime.config_int("colors.background"));
        let entry = |key: &str| {
            Style::default()
                .fg(color(runtime.config_int(key)))
                .bg(background)
                .add_modifier(Modifier::BOLD)
        };

        Self {
            row_separator: format!(" {} ", runtime.config_text("charset.row_separator")),
            status_separator: runtime.config_text("charset.status_separator"),
            corners: [
                runtime.config_text("charset.box_corner_1"),
                runtime.config_text("charset.box_corner_2"),
                runtime.config_text("charset.box_corner_3"),
                runtime.config_text("charset.box_corner_4"),
            ],
            border_v: runtime.config_text("charset.box_border_v"),
            border_h: runtime.config_text("charset.box_border_h"),
            rule: runtime.config_text("charset.box_ui_line_h"),
            title: Style::default()
                .fg(color(runtime.config_int("colors.title")))
                .bg(background)
                .add_modifier(Modifier::REVERSED | Modifier::BOLD),
            completed: entry("colors.entry_completed"),
            coming: entry("colors.entry_coming"),
            failed: entry("colors.entry_failed"),
        }
    }

    fn entry_style(&self, bucket: StatusBucket) -> Style {
        match bucket {
            StatusBucket::Completed => self.completed,
            StatusBucket::Failed => self.failed,
            StatusBucket::Coming => self.coming,
            StatusBucket::Uncategorized => Style::default(),
        }
    }
}

/// 256-color index, or the terminal default for anything outside `0..=255`.
pub fn color(code: i64) -> Color {
    u8::try_from(code).map_or(Color::Reset, Color::Indexed)
}

pub fn render<R: TaskRuntime>(
    frame: &mut Frame<'_>,
    ui: &mut UiState,
    runtime: &R,
    columns: &ColumnRegistry,
) {
    let area = frame.area();
    let palette = Palette::load(runtime);
    let mut canvas = Canvas::new(frame.buffer_mut(), area);

    match ui.mode() {
        Mode::Normal => paint_normal(&mut canvas, ui, runtime, columns, &palette),
        Mode::Details => paint_details(&mut canvas, ui, runtime, columns, &palette),
        Mode::Help => paint_help(&mut canvas, ui, runtime, columns, &palette),
        Mode::Command => {
            if let Some((x, y)) = paint_command(&mut canvas, ui, runtime, columns, &palette) {
                // The command line is painted inside the area, so both fit in u16.
                frame.set_cursor_position(Position::new(area.x + x as u16, area.y + y as u16));
            }
        }
        Mode::Exit => {}
    }
}

fn paint_normal<R: TaskRuntime>(
    canvas: &mut Canvas<'_>,
    ui: &mut UiState,
    runtime: &R,
    columns: &ColumnRegistry,
    palette: &Palette,
) {
    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 {
        return;
    }

    let codes = match ui.filter.tag {
        TagFilter::All => runtime.config_text("all_cols"),
        TagFilter::Tag(_) => runtime.config_text("cols"),
    };
    let placed = columns.layout(&codes, width);

    canvas.fill_row(0, palette.title);
    for column in &placed {
        canvas.put_clipped(column.x, 0, column.spec.title, column.width, palette.title);
        if column.separator {
            canvas.put(column.x + column.width, 0, &palette.row_separator, palette.title);
        }
    }

    let entries = runtime.entries();
    let tags = runtime.tags();
    let now = runtime.now();
    let visible = ui.filter.visible_indices(entries, now);
    let rows = height.saturating_sub(2);

    match visible.iter().position(|index| *index == ui.selected) {
        Some(row) => ui.clamp_table_scroll(row, rows),
        None => ui.table_scroll = ui.table_scroll.min(visible.len().saturating_sub(1)),
    }

    for (row, index) in visible.iter().copied().enumerate().skip(ui.table_scroll).take(rows) {
        let entry = &entries[index];
        let y = row - ui.table_scroll + 1;
        let mut style = palette.entry_style(entry.bucket(now));
        if index == ui.selected {
            style = style.add_modifier(Modifier::REVERSED);
        }

        canvas.fill_row(y, style);
        for column in &placed {
            let text = column.spec.render(entry, index, tags);
            canvas.put_clipped(column.x, y, &text, column.width, style);
            if column.separator {
                canvas.put(column.x + column.width, y, &palette.row_separator, style);
            }
        }
    }

    let status = status_text(ui, runtime, palette);
    let x = width.saturating_sub(1 + status.chars().count());
    canvas.put(x, height - 1, &status, Style::default());
}

/// Tag filter, status mask, selection and the one-shot message, which is
/// consumed here.
fn status_text<R: TaskRuntime>(ui: &mut UiState, runtime: &R, palette: &Palette) -> String {
    let separator = &palette.status_separator;
    let label = match ui.filter.tag {
        TagFilter::All => "All lists".to_owned(),
        TagFilter::Tag(tag) => runtime.tags().list_label(tag),
    };

    let mut status = format!("{label} {separator} {}", ui.filter.status.mask_string());
    let count = runtime.entries().len();
    if count > 0 {
        status.push_str(&format!(" {separator} {}/{}", ui.selected, count - 1));
    }
    if let Some(message) = ui.take_status().filter(|message| !message.is_empty()) {
        status.push_str(&format!(" {separator} {message}"));
    }
    status
}

/// Draws the overlay frame. Returns false when the grid is too small for it.
fn paint_box(canvas: &mut Canvas<'_>, palette: &Palette) -> bool {
    let (width, height) = (canvas.width(), canvas.height());
    if width < 2 * BOX_LEFT + 4 || height < 2 * BOX_TOP + 4 {
        return false;
    }
    let right = width - 4;
    let bottom = height - 3;
    let plain = Style::reset();

    canvas.put(BOX_LEFT, BOX_TOP, &palette.corners[0], plain);
    canvas.put(right, BOX_TOP, &palette.corners[1], plain);
    canvas.put(BOX_LEFT, bottom, &palette.corners[2], plain);
    canvas.put(right, bottom, &palette.corners[3], plain);

    for y in BOX_TOP + 1..bottom {
        canvas.put(BOX_LEFT, y, &palette.border_v, plain);
        canvas.put(right, y, &palette.border_v, plain);
        canvas.fill(BOX_LEFT + 1, y, right - BOX_LEFT - 1, plain);
    }
    for x in BOX_LEFT + 1..right {
        canvas.put(x, BOX_TOP, &palette.border_h, plain);
        canvas.put(x, bottom, &palette.border_h, plain);
    }
    true
}

fn paint_rule(canvas: &mut Canvas<'_>, y: usize, palette: &Palette) {
    for x in BOX_LEFT + 1..canvas.width().saturating_sub(4) {
        canvas.put(x, y, &palette.rule, Style::reset());
    }
}

/// Character-wraps `text` inside the overlay starting at row `top`, with the
/// first `scroll` lines hidden. Stops with a marker when the box is full.
fn paint_wrapped(
    canvas: &mut Canvas<'_>,
    text: &str,
    top: usize,
    scroll: usize,
    tab_stop: Option<usize>,
) {
    let right = canvas.width().saturating_sub(5);
    let bottom = canvas.height().saturating_sub(4);
    let style = Style::reset();
    let mut x = TEXT_LEFT;
    let mut line = 0usize;

    for ch in text.chars() {
        if x >= right {
            x = TEXT_LEFT;
            line += 1;
        }
        let y = (top + line).checked_sub(scroll);
        if y.is_some_and(|y| y >= bottom) {
            canvas.put(TEXT_LEFT, bottom, TRUNCATION_MARKER, style);
            break;
        }
        let shown = y.filter(|y| *y >= top);

        match (ch, tab_stop) {
            ('\n', _) => {
                x = TEXT_LEFT;
                line += 1;
            }
            ('\t', Some(stop)) => {
                x = if x < stop { stop } else { x + 1 };
            }
            _ => {
                if let Some(y) = shown {
                    let glyph = if ch == '\t' { ' ' } else { ch };
                    canvas.put(x, y, glyph.encode_utf8(&mut [0; 4]), style);
                }
                x += 1;
            }
        }
    }
}

fn paint_details<R: TaskRuntime>(
    canvas: &mut Canvas<'_>,
    ui: &mut UiState,
    runtime: &R,
    columns: &ColumnRegistry,
    palette: &Palette,
) {
    paint_normal(canvas, ui, runtime, columns, palette);
    if !paint_box(canvas, palette) {
        return;
    }
    let Some(entry) = runtime.entries().get(ui.selected) else {
        return;
    };

    let plain = Style::reset();
    canvas.put(TEXT_LEFT, TITLE_ROW, &entry.title, plain);
    paint_rule(canvas, TITLE_ROW + 2, palette);
    let meta = format!(
        "{} {} {}",
        taskgrid_app::format_due(entry.due),
        palette.status_separator,
        runtime.tags().list_label(entry.tag)
    );
    canvas.put(TEXT_LEFT, TITLE_ROW + 3, &meta, plain);
    paint_rule(canvas, TITLE_ROW + 4, palette);

    paint_wrapped(canvas, &entry.description, DETAILS_TEXT_TOP, ui.overlay_scroll, None);
}

fn paint_help<R: TaskRuntime>(
    canvas: &mut Canvas<'_>,
    ui: &mut UiState,
    runtime: &R,
    columns: &ColumnRegistry,
    palette: &Palette,
) {
    paint_normal(canvas, ui, runtime, columns, palette);
    if !paint_box(canvas, palette) {
        return;
    }

    let title = format!("{APP_NAME} v.{}", env!("CARGO_PKG_VERSION"));
    canvas.put(TEXT_LEFT, TITLE_ROW, &title, Style::reset());
    paint_rule(canvas, TITLE_ROW + 2, palette);

    paint_wrapped(
        canvas,
        runtime.help_text(),
        HELP_TEXT_TOP,
        ui.overlay_scroll,
        Some(HELP_TAB_STOP),
    );
}

/// Paints the mode beneath the command line, then the line itself.
/// Returns the caret cell.
fn paint_command<R: TaskRuntime>(
    canvas: &mut Canvas<'_>,
    ui: &mut UiState,
    runtime: &R,
    columns: &ColumnRegistry,
    palette: &Palette,
) -> Option<(usize, usize)> {
    match ui.underlying_mode() {
        Mode::Details => paint_details(canvas, ui, runtime, columns, palette),
        Mode::Help => paint_help(canvas, ui, runtime, columns, palette),
        _ => paint_normal(canvas, ui, runtime, columns, palette),
    }

    let (width, height) = (canvas.width(), canvas.height());
    if width == 0 || height == 0 {
        return None;
    }
    let y = height - 1;
    canvas.fill_row(y, Style::reset());

    let line = &ui.command_line;
    let offset = line.scroll_offset(width);
    canvas.put(0, y, &format!(":{}", line.visible_from(offset)), Style::reset());
    Some(((1 + line.caret() - offset).min(width - 1), y))
}

#[cfg(test)]
mod tests {
    use super::{color, render};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::style::{Color, Modifier};
    use taskgrid_app::{ColumnRegistry, Mode, StatusFilter, TagFilter, UiState};
    use taskgrid_testkit::{FakeRuntime, TaskFaker};

    fn draw(
        ui: &mut UiState,
        runtime: &FakeRuntime,
        width: u16,
        height: u16,
    ) -> Terminal<TestBackend> {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).expect("test terminal");
        let columns = ColumnRegistry::standard();
        terminal
            .draw(|frame| render(frame, ui, runtime, &columns))
            .expect("draw");
        terminal
    }

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
    }

    fn rows(terminal: &Terminal<TestBackend>) -> Vec<String> {
        let buffer = terminal.backend().buffer();
        (0..buffer.area.height).map(|y| row(buffer, y)).collect()
    }

    #[test]
    fn normal_view_shows_title_rows_and_status() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        let terminal = draw(&mut ui, &runtime, 120, 10);
        let lines = rows(&terminal);

        assert!(lines[0].starts_with("Task Title"));
        assert!(lines[0].contains(" | List"));
        assert!(lines[1].starts_with("Water plants"));
        assert!(lines[3].contains("1: work"));
        assert!(lines[4].contains("Quarterly review"));

        let status = "All lists | UVCF | 0/3 | Welcome to taskgrid!";
        let expected = format!("{}{status}", " ".repeat(120 - 1 - status.len()));
        assert_eq!(lines[9].trim_end(), expected);
        assert_eq!(ui.status_line, None);
    }

    #[test]
    fn status_message_is_shown_once() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        draw(&mut ui, &runtime, 80, 10);
        let second = draw(&mut ui, &runtime, 80, 10);

        assert!(rows(&second)[9].trim_end().ends_with("UVCF | 0/3"));
    }

    #[test]
    fn selected_row_is_reversed_and_status_colored() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        ui.selected = 1;
        let terminal = draw(&mut ui, &runtime, 60, 8);
        let buffer = terminal.backend().buffer();

        let failed = &buffer[(0, 2)];
        assert!(failed.modifier.contains(Modifier::REVERSED));
        assert!(failed.modifier.contains(Modifier::BOLD));
        assert_eq!(failed.fg, Color::Indexed(1));

        let completed = &buffer[(0, 1)];
        assert!(!completed.modifier.contains(Modifier::REVERSED));
        assert_eq!(completed.fg, Color::Indexed(2));

        let coming = &buffer[(0, 3)];
        assert_eq!(coming.fg, Color::Indexed(3));
    }

    #[test]
    fn one_tag_view_uses_the_single_list_columns() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        ui.filter.tag = TagFilter::Tag(1);
        ui.selected = 2;
        let terminal = draw(&mut ui, &runtime, 80, 8);
        let lines = rows(&terminal);

        assert!(!lines[0].contains("List"));
        assert!(lines[1].starts_with("Send invoice"));
        assert!(lines[2].starts_with("Quarterly review"));
        assert!(lines[3].trim().is_empty());
        assert!(lines[7].contains("List 1: work | UVCF | 2/3"));
    }

    #[test]
    fn hidden_buckets_are_not_drawn() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        ui.filter.status = StatusFilter::FAILED | StatusFilter::COMING;
        ui.selected = 1;
        let lines = rows(&draw(&mut ui, &runtime, 80, 8));

        assert!(lines[1].starts_with("Renew passport"));
        assert!(lines[2].starts_with("Send invoice"));
        assert!(lines[3].trim().is_empty());
        assert!(lines[7].contains("All lists | __CF | 1/3"));
    }

    #[test]
    fn table_scrolls_to_keep_selection_visible() {
        let runtime = FakeRuntime::new(TaskFaker::new(7).upcoming_list(30));
        let mut ui = UiState::default();
        ui.selected = 20;
        let height = 10;
        let terminal = draw(&mut ui, &runtime, 80, height);

        let window = usize::from(height) - 2;
        assert!(ui.table_scroll <= 20 && 20 - ui.table_scroll < window);
        let buffer = terminal.backend().buffer();
        let selected_y = (20 - ui.table_scroll + 1) as u16;
        assert!(buffer[(0, selected_y)].modifier.contains(Modifier::REVERSED));
        assert!(row(buffer, selected_y).contains(" 20 "));
    }

    #[test]
    fn details_overlay_wraps_description_and_marks_truncation() {
        let mut runtime = FakeRuntime::default();
        runtime.list.entries[1].description = "x".repeat(400);
        let mut ui = UiState::default();
        ui.selected = 1;
        ui.set_mode(Mode::Details);
        let lines = rows(&draw(&mut ui, &runtime, 40, 16));

        assert_eq!(&lines[2][3..4], "+");
        assert_eq!(&lines[2][36..37], "+");
        assert_eq!(&lines[4][5..19], "Renew passport");
        assert!(lines[7][5..].starts_with("2026-02-19 09:34 | List 0"));
        assert_eq!(&lines[10][5..35], "x".repeat(30));
        assert_eq!(&lines[11][5..35], "x".repeat(30));
        assert_eq!(&lines[12][5..14], "<- ... ->");
        assert_eq!(&lines[13][3..4], "+");
    }

    #[test]
    fn details_scroll_hides_leading_lines() {
        let mut runtime = FakeRuntime::default();
        runtime.list.entries[1].description = format!("{}{}", "a".repeat(30), "b".repeat(5));
        let mut ui = UiState::default();
        ui.selected = 1;
        ui.set_mode(Mode::Details);
        ui.overlay_scroll = 1;
        let lines = rows(&draw(&mut ui, &runtime, 40, 16));

        assert!(lines[10][5..].starts_with("bbbbb "));
        assert!(!lines[9].contains('a'));
    }

    #[test]
    fn details_with_no_entries_draws_an_empty_box() {
        let runtime = FakeRuntime::new(Default::default());
        let mut ui = UiState::default();
        ui.set_mode(Mode::Details);
        let lines = rows(&draw(&mut ui, &runtime, 40, 16));

        assert_eq!(&lines[2][3..4], "+");
        assert!(lines[4][4..36].trim().is_empty());
        assert!(lines[15].trim_end().ends_with("All lists | UVCF | Welcome to taskgrid!"));
    }

    #[test]
    fn help_overlay_expands_tabs_to_a_fixed_column() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        ui.set_mode(Mode::Help);
        let lines = rows(&draw(&mut ui, &runtime, 60, 20));

        assert!(lines[4][5..].starts_with("taskgrid v."));
        assert!(lines[8][5..].starts_with("taskgrid help"));
        assert_eq!(&lines[10][5..6], "j");
        assert_eq!(&lines[10][20..30], "next entry");
    }

    #[test]
    fn command_line_paints_over_the_calling_mode() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        ui.set_mode(Mode::Help);
        ui.enter_command("list 1");
        let mut terminal = draw(&mut ui, &runtime, 60, 20);
        let lines = rows(&terminal);

        assert!(lines[4][5..].starts_with("taskgrid v."));
        assert_eq!(lines[19].trim_end(), ":list 1");
        let cursor = terminal.get_cursor_position().expect("cursor");
        assert_eq!((cursor.x, cursor.y), (7, 19));
    }

    #[test]
    fn long_command_lines_scroll_horizontally() {
        let runtime = FakeRuntime::default();
        let mut ui = UiState::default();
        ui.enter_command(&"a".repeat(15));
        let mut terminal = draw(&mut ui, &runtime, 10, 6);
        let lines = rows(&terminal);

        assert_eq!(lines[5].trim_end(), format!(":{}", "a".repeat(7)));
        let cursor = terminal.get_cursor_position().expect("cursor");
        assert_eq!((cursor.x, cursor.y), (8, 5));
    }

    #[test]
    fn negative_and_out_of_range_colors_use_the_terminal_default() {
        assert_eq!(color(-1), Color::Reset);
        assert_eq!(color(256), Color::Reset);
        assert_eq!(color(208), Color::Indexed(208));
    }
}
