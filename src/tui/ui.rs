//! UI rendering

use super::app::{App, DialogField, FindDialog, Mode, VAR_ATTRS, View};
use super::help::{get_about_help, get_commands_help, get_help_text};
use dataview_core::{Alignment, CellRef};
use ratatui::{
    Frame,
    layout::{Alignment as TextAlignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
};

pub(crate) const HEADER_BAR_HEIGHT: u16 = 3;
pub(crate) const GRID_MIN_HEIGHT: u16 = 10;
pub(crate) const STATUS_BAR_HEIGHT: u16 = 1;
pub(crate) const ROW_HEADER_WIDTH: u16 = 5;
pub(crate) const GRID_COLUMN_SPACING: u16 = 1;

pub(crate) fn split_main_chunks(area: Rect) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_BAR_HEIGHT),
            Constraint::Min(GRID_MIN_HEIGHT),
            Constraint::Length(STATUS_BAR_HEIGHT),
        ])
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Horizontal extent of each visible data column: (column index, start x,
/// end x). Matches the table layout in [`draw_grid`].
fn visible_column_spans(app: &App, grid_area: Rect) -> Vec<(usize, u16, u16)> {
    let inner_x = grid_area.x.saturating_add(1);
    let inner_right = grid_area
        .x
        .saturating_add(grid_area.width.saturating_sub(1));
    let mut spans = Vec::new();

    let mut x = inner_x
        .saturating_add(ROW_HEADER_WIDTH)
        .saturating_add(GRID_COLUMN_SPACING);
    for offset in 0..app.visible_cols {
        let col = app.viewport_col + offset;
        let Some(name) = app.core.dataset.column_name(col) else {
            break;
        };
        let width = app.core.layout.width(name);
        let end = x.saturating_add(width);
        if x >= inner_right {
            break;
        }
        spans.push((col, x, end.min(inner_right)));
        x = end.saturating_add(GRID_COLUMN_SPACING);
    }
    spans
}

/// Map a mouse position to a data cell.
pub(crate) fn grid_cell_at(
    app: &App,
    grid_area: Rect,
    mouse_col: u16,
    mouse_row: u16,
) -> Option<(usize, usize)> {
    if grid_area.width < 3 || grid_area.height < 4 {
        return None;
    }

    let inner_y = grid_area.y.saturating_add(1);
    let inner_bottom = grid_area
        .y
        .saturating_add(grid_area.height.saturating_sub(1));

    // First inner row holds the column names, not data cells.
    if mouse_row <= inner_y || mouse_row >= inner_bottom {
        return None;
    }
    let rel_row = (mouse_row - inner_y - 1) as usize;
    if rel_row >= app.visible_rows {
        return None;
    }
    let row = app.viewport_row + rel_row;
    if row >= app.core.dataset.row_count() {
        return None;
    }

    for (col, start, end) in visible_column_spans(app, grid_area) {
        if mouse_col >= start && mouse_col < end {
            return Some((row, col));
        }
    }
    None
}

/// Map a mouse position on the header row to a column resize handle: the
/// spacing cell just past a column's right edge.
pub(crate) fn resize_handle_at(
    app: &App,
    grid_area: Rect,
    mouse_col: u16,
    mouse_row: u16,
) -> Option<usize> {
    if grid_area.width < 3 || grid_area.height < 2 {
        return None;
    }
    let header_y = grid_area.y.saturating_add(1);
    if mouse_row != header_y {
        return None;
    }
    for (col, _, end) in visible_column_spans(app, grid_area) {
        if mouse_col >= end && mouse_col < end.saturating_add(GRID_COLUMN_SPACING) {
            return Some(col);
        }
    }
    None
}

/// Draw the application UI
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = split_main_chunks(f.area());
    let grid_area = chunks[1];

    // Update visible dimensions based on the actual size before drawing.
    let available_height = grid_area.height.saturating_sub(3) as usize; // borders + header
    app.visible_rows = available_height.max(1);
    let available_width = grid_area
        .width
        .saturating_sub(ROW_HEADER_WIDTH + 2 + GRID_COLUMN_SPACING);
    app.visible_cols = count_fitting_columns(app, available_width);
    app.update_viewport();

    draw_header_bar(f, app, chunks[0]);
    match app.view {
        View::Data => draw_grid(f, app, grid_area),
        View::Variables => draw_variables(f, app, grid_area),
    }
    draw_status_bar(f, app, chunks[2]);

    if let Some(dialog) = app.find_dialog.clone() {
        draw_find_dialog(f, &dialog);
    }
    if app.help_modal {
        draw_help_modal(f, app);
    }
}

/// How many columns starting at the viewport fit into `width`.
fn count_fitting_columns(app: &App, width: u16) -> usize {
    let mut used: u16 = 0;
    let mut count = 0;
    for col in app.viewport_col..app.core.dataset.column_count() {
        let Some(name) = app.core.dataset.column_name(col) else {
            break;
        };
        let needed = app.core.layout.width(name) + GRID_COLUMN_SPACING;
        if used.saturating_add(needed) > width {
            break;
        }
        used += needed;
        count += 1;
    }
    count.max(1)
}

fn draw_header_bar(f: &mut Frame, app: &App, area: Rect) {
    let content = match app.mode {
        Mode::Edit => {
            let (label, buffer, cursor) = match app.view {
                View::Data => {
                    let label = cell_label(app);
                    let buffer = app
                        .core
                        .editing
                        .as_ref()
                        .map(|e| e.pending.clone())
                        .unwrap_or_default();
                    (label, buffer, app.edit_cursor)
                }
                View::Variables => {
                    let label = var_label(app);
                    let buffer = app
                        .var_edit
                        .as_ref()
                        .map(|e| e.pending.clone())
                        .unwrap_or_default();
                    (label, buffer, app.edit_cursor)
                }
            };
            let cursor = cursor.min(buffer.len());
            let (before, after) = buffer.split_at(cursor);
            format!("{}: {}│{}", label, before, after)
        }
        Mode::Command => {
            let cursor = app.command_cursor.min(app.command_buffer.len());
            let (before, after) = app.command_buffer.split_at(cursor);
            format!(":{}│{}", before, after)
        }
        Mode::Normal => match app.view {
            View::Data => match app.cursor() {
                Some(cell) => {
                    let value = app.core.dataset.value_at(cell).display();
                    let meta = app
                        .core
                        .selected_variable()
                        .map(|v| {
                            format!("{} {} w:{}", v.var_type.name(), v.measure.name(), v.width)
                        })
                        .unwrap_or_default();
                    format!("{}: {}  ({})", cell_label(app), value, meta)
                }
                None => "(no selection)".to_string(),
            },
            View::Variables => {
                let label = var_label(app);
                let value = app
                    .current_var_name()
                    .map(|name| app.var_attr_text(&name, app.var_attr))
                    .unwrap_or_default();
                format!("{}: {}", label, value)
            }
        },
    };

    let title = match app.mode {
        Mode::Edit => " Edit ",
        Mode::Command => " Command ",
        Mode::Normal => match app.view {
            View::Data => " Cell ",
            View::Variables => " Variable ",
        },
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(match app.mode {
            Mode::Edit => Color::Yellow,
            Mode::Command => Color::Cyan,
            Mode::Normal => Color::White,
        }));

    let paragraph = Paragraph::new(content).block(block);
    f.render_widget(paragraph, area);
}

/// "row:column" label for the selected cell, 1-based rows like the grid.
fn cell_label(app: &App) -> String {
    match app.cursor() {
        Some(cell) => {
            let name = app
                .core
                .dataset
                .column_name(cell.col)
                .unwrap_or("?");
            format!("{}:{}", cell.row + 1, name)
        }
        None => "-".to_string(),
    }
}

fn var_label(app: &App) -> String {
    let name = app.current_var_name().unwrap_or_else(|| "-".to_string());
    format!("{}.{}", name, VAR_ATTRS[app.var_attr].to_lowercase())
}

fn draw_grid(f: &mut Frame, app: &mut App, area: Rect) {
    let selection = app.cursor();
    let current_match = app.core.search.current_match();

    // Build header row
    let mut header_cells = vec![Cell::from(" ")]; // Corner
    for col in app.viewport_col..app.viewport_col + app.visible_cols {
        let Some(name) = app.core.dataset.column_name(col) else {
            break;
        };
        let style = if selection.is_some_and(|c| c.col == col) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        header_cells.push(Cell::from(name.to_string()).style(style));
    }
    let header = Row::new(header_cells).height(1);

    // Build data rows
    let mut rows = Vec::new();
    for row in app.viewport_row..app.viewport_row + app.visible_rows {
        if row >= app.core.dataset.row_count() {
            break;
        }

        let mut cells = Vec::new();

        // Row header (1-based, SPSS-style)
        let row_style = if selection.is_some_and(|c| c.row == row) {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        cells.push(Cell::from(format!("{}", row + 1)).style(row_style));

        for col in app.viewport_col..app.viewport_col + app.visible_cols {
            let Some(name) = app.core.dataset.column_name(col) else {
                break;
            };
            let cell_ref = CellRef::new(row, col);
            let value = app.core.dataset.value_at(cell_ref);
            let display = value.display();
            let variable = app.core.variable(name);

            let is_cursor = selection == Some(cell_ref);
            let is_current_match = current_match == Some(cell_ref);
            let is_match = app.core.search.matches.contains(&cell_ref);
            let is_missing = variable.is_some_and(|v| v.is_missing(value));

            let style = if is_cursor {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if is_current_match {
                Style::default().fg(Color::Black).bg(Color::Yellow)
            } else if is_match {
                Style::default().fg(Color::Yellow)
            } else if is_missing {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };

            let alignment = match variable.map(|v| v.alignment) {
                Some(Alignment::Right) => TextAlignment::Right,
                Some(Alignment::Center) => TextAlignment::Center,
                _ => TextAlignment::Left,
            };
            let line = Line::from(display).alignment(alignment);
            cells.push(Cell::from(line).style(style));
        }

        rows.push(Row::new(cells));
    }

    // Build column widths from the layout
    let mut widths = vec![Constraint::Length(ROW_HEADER_WIDTH)]; // Row header
    for col in app.viewport_col..app.viewport_col + app.visible_cols {
        let Some(name) = app.core.dataset.column_name(col) else {
            break;
        };
        widths.push(Constraint::Length(app.core.layout.width(name)));
    }

    let title = format!(
        " {} ({} rows x {} columns) ",
        app.core.dataset.name(),
        app.core.dataset.row_count(),
        app.core.dataset.column_count()
    );
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title(title))
        .column_spacing(GRID_COLUMN_SPACING);

    f.render_widget(table, area);
}

fn draw_variables(f: &mut Frame, app: &mut App, area: Rect) {
    let mut header_cells = Vec::new();
    for (attr, title) in VAR_ATTRS.iter().enumerate() {
        let style = if attr == app.var_attr {
            Style::default()
                .fg(Color::Black)
                .bg(Color::White)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        header_cells.push(Cell::from(*title).style(style));
    }
    let header = Row::new(header_cells).height(1);

    let mut rows = Vec::new();
    for row in app.var_viewport..app.var_viewport + app.visible_rows {
        let Some(name) = app.core.dataset.column_name(row).map(str::to_string) else {
            break;
        };
        let mut cells = Vec::new();
        for attr in 0..VAR_ATTRS.len() {
            let text = app.var_attr_text(&name, attr);
            let style = if row == app.var_row && attr == app.var_attr {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else if attr == 0 {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            cells.push(Cell::from(text).style(style));
        }
        rows.push(Row::new(cells));
    }

    let widths = [
        Constraint::Length(12), // Name
        Constraint::Length(8),  // Type
        Constraint::Length(6),  // Width
        Constraint::Length(8),  // Decimals
        Constraint::Length(14), // Label
        Constraint::Length(18), // Values
        Constraint::Length(16), // Missing
        Constraint::Length(7),  // Align
        Constraint::Length(8),  // Measure
        Constraint::Length(9),  // Role
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Variable View "),
        )
        .column_spacing(GRID_COLUMN_SPACING);

    f.render_widget(table, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let file_info = if let Some(ref path) = app.file_path {
        let modified_indicator = if app.core.modified { " [+]" } else { "" };
        format!("{}{}", path.display(), modified_indicator)
    } else if app.core.modified {
        "[New Dataset] [+]".to_string()
    } else {
        "[New Dataset]".to_string()
    };

    let match_info = if app.core.search.matches.is_empty() {
        String::new()
    } else {
        format!(
            "  |  match {}/{}",
            app.core.search.current + 1,
            app.core.search.matches.len()
        )
    };

    let status = if !app.status_message.is_empty() {
        app.status_message.clone()
    } else {
        format!(
            "{}{}  |  [{}]  |  {}",
            file_info,
            match_info,
            app.keymap.name(),
            app.keymap.status_hint()
        )
    };

    let style = if app.status_message.starts_with("Error") {
        Style::default().fg(Color::Red)
    } else if !app.status_message.is_empty() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let spans = vec![Span::styled(status, style)];
    let paragraph = Paragraph::new(Line::from(spans));
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn dialog_input_line(label: &str, text: &str, cursor: usize, focused: bool) -> Line<'static> {
    let cursor = cursor.min(text.len());
    let (before, after) = text.split_at(cursor);
    let content = if focused {
        format!("{} {}│{}", label, before, after)
    } else {
        format!("{} {}", label, text)
    };
    let style = if focused {
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(Span::styled(content, style))
}

fn draw_find_dialog(f: &mut Frame, dialog: &FindDialog) {
    let area = centered_rect(60, 40, f.area());
    let modal_style = Style::default().fg(Color::White).bg(Color::Black);

    let title = if dialog.replace {
        " Find & Replace "
    } else {
        " Find "
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Cyan))
        .style(modal_style);

    let mut lines = Vec::new();
    lines.push(dialog_input_line(
        "Find:   ",
        &dialog.term,
        dialog.term_cursor,
        dialog.focus == DialogField::Term,
    ));
    if dialog.replace {
        lines.push(dialog_input_line(
            "Replace:",
            &dialog.replacement,
            dialog.replacement_cursor,
            dialog.focus == DialogField::Replacement,
        ));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!(
            "[{}] Case sensitive (M-c)",
            if dialog.case_sensitive { "x" } else { " " }
        ),
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(""));
    let hint = if dialog.replace {
        "Enter:find  C-n/C-p:next/prev  C-r:replace  C-a:replace all  Tab:switch  Esc:close"
    } else {
        "Enter:find  C-n/C-p:next/prev  Esc:close"
    };
    lines.push(Line::from(Span::styled(
        hint,
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(modal_style)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn draw_help_modal(f: &mut Frame, app: &App) {
    let area = centered_rect(88, 88, f.area());

    let modal_style = Style::default().fg(Color::White).bg(Color::Black);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" About Dataview ")
        .border_style(Style::default().fg(Color::Green))
        .style(modal_style);

    let mut lines: Vec<Line> = Vec::new();

    for text in get_about_help() {
        let style = if text == "About Dataview" {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if text.starts_with("  ") {
            Style::default().fg(Color::White)
        } else {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    lines.push(Line::from(""));

    for text in get_help_text(&app.keymap) {
        let style = if text.starts_with("  ") {
            Style::default().fg(Color::White)
        } else {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    lines.push(Line::from(""));

    for text in get_commands_help() {
        let style = if text == "Commands" {
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if text.starts_with("  ") {
            Style::default().fg(Color::White)
        } else {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    let viewport_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(viewport_height);
    let effective_scroll = app.help_scroll.min(max_scroll);
    let scroll_y = u16::try_from(effective_scroll).unwrap_or(u16::MAX);

    let paragraph = Paragraph::new(lines)
        .block(block)
        .style(modal_style)
        .scroll((scroll_y, 0))
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataview_core::Dataset;
    use dataview_core::storage::csv::parse_csv_text;

    fn test_app() -> App {
        let dataset: Dataset =
            parse_csv_text("people.csv", "name,age\nada,36\ngrace,45\nlin,29\n").unwrap();
        let mut app = App::new(dataset);
        app.visible_rows = 10;
        app.visible_cols = 2;
        app
    }

    fn first_body_cell_point(grid_area: Rect) -> (u16, u16) {
        (
            grid_area.x + 1 + ROW_HEADER_WIDTH + GRID_COLUMN_SPACING,
            grid_area.y + 2,
        )
    }

    #[test]
    fn grid_cell_at_maps_first_visible_cell_to_viewport_origin() {
        let mut app = test_app();
        app.viewport_row = 1;
        let grid_area = Rect::new(0, 0, 80, 20);
        let (x, y) = first_body_cell_point(grid_area);
        assert_eq!(grid_cell_at(&app, grid_area, x, y), Some((1, 0)));
    }

    #[test]
    fn grid_cell_at_maps_second_column_with_custom_width() {
        let mut app = test_app();
        app.core.layout.set_width("name", 10);
        let grid_area = Rect::new(0, 0, 80, 20);
        let (first_x, y) = first_body_cell_point(grid_area);
        let second_col_start = first_x + 10 + GRID_COLUMN_SPACING;
        assert_eq!(
            grid_cell_at(&app, grid_area, second_col_start + 1, y),
            Some((0, 1))
        );
    }

    #[test]
    fn grid_cell_at_ignores_headers_and_spacing() {
        let app = test_app();
        let grid_area = Rect::new(0, 0, 80, 20);
        let (x, _) = first_body_cell_point(grid_area);
        // Column header row
        assert_eq!(grid_cell_at(&app, grid_area, x, grid_area.y + 1), None);
        // Row header column
        assert_eq!(grid_cell_at(&app, grid_area, grid_area.x + 2, grid_area.y + 2), None);
        // Spacing between columns
        let name_width = app.core.layout.width("name");
        let spacing_x = x + name_width;
        assert_eq!(grid_cell_at(&app, grid_area, spacing_x, grid_area.y + 2), None);
    }

    #[test]
    fn grid_cell_at_respects_row_bounds() {
        let app = test_app();
        let grid_area = Rect::new(0, 0, 80, 20);
        let (x, y) = first_body_cell_point(grid_area);
        // Three data rows; the fourth visible line maps to nothing.
        assert_eq!(grid_cell_at(&app, grid_area, x, y + 3), None);
    }

    #[test]
    fn resize_handle_hits_column_edge_on_header_row() {
        let app = test_app();
        let grid_area = Rect::new(0, 0, 80, 20);
        let (x, _) = first_body_cell_point(grid_area);
        let name_width = app.core.layout.width("name");
        let handle_x = x + name_width;
        let header_y = grid_area.y + 1;
        assert_eq!(resize_handle_at(&app, grid_area, handle_x, header_y), Some(0));
        // Same x on a body row is not a handle.
        assert_eq!(resize_handle_at(&app, grid_area, handle_x, header_y + 1), None);
        // Inside the column is not a handle.
        assert_eq!(resize_handle_at(&app, grid_area, x + 1, header_y), None);
    }

    #[test]
    fn count_fitting_columns_uses_layout_widths() {
        let mut app = test_app();
        app.core.layout.set_width("name", 20);
        app.core.layout.set_width("age", 20);
        // Both fit at 60, only one at 30.
        assert_eq!(count_fitting_columns(&app, 60), 2);
        assert_eq!(count_fitting_columns(&app, 30), 1);
        // Always at least one column so the grid is never empty.
        assert_eq!(count_fitting_columns(&app, 3), 1);
    }
}
