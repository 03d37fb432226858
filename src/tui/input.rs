use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent,
    MouseEventKind,
};
use ratatui::prelude::*;
use std::io;

use dataview_core::CellRef;

use super::actions::{ApplyResult, apply_action, handle_command_text, handle_edit_text,
    handle_text_input};
use super::app::{App, DialogField, Mode, View};
use super::keymap::translate;
use super::ui;

/// Keys while the find/replace dialog is open. The dialog captures all
/// input, so grid shortcuts and navigation are suppressed here by
/// construction.
fn handle_dialog_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Esc => {
            app.close_find_dialog();
            return;
        }
        KeyCode::Enter => {
            app.dialog_search();
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            if let Some(dialog) = app.find_dialog.as_mut()
                && dialog.replace
            {
                dialog.focus = match dialog.focus {
                    DialogField::Term => DialogField::Replacement,
                    DialogField::Replacement => DialogField::Term,
                };
            }
            return;
        }
        KeyCode::Char('c') if alt => {
            if let Some(dialog) = app.find_dialog.as_mut() {
                dialog.case_sensitive = !dialog.case_sensitive;
            }
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.next_match();
            return;
        }
        KeyCode::Char('p') if ctrl => {
            app.prev_match();
            return;
        }
        KeyCode::Char('r') if ctrl => {
            if app.find_dialog.as_ref().is_some_and(|d| d.replace) {
                app.dialog_replace_one();
            }
            return;
        }
        KeyCode::Char('a') if ctrl => {
            if app.find_dialog.as_ref().is_some_and(|d| d.replace) {
                app.dialog_replace_all();
            }
            return;
        }
        _ => {}
    }

    // Everything else is text entry into the focused field.
    if let Some(dialog) = app.find_dialog.as_mut() {
        match dialog.focus {
            DialogField::Term => {
                handle_text_input(&mut dialog.term, &mut dialog.term_cursor, key)
            }
            DialogField::Replacement => handle_text_input(
                &mut dialog.replacement,
                &mut dialog.replacement_cursor,
                key,
            ),
        }
    }
}

fn handle_mouse_event(app: &mut App, terminal_area: Rect, mouse: MouseEvent) {
    let [_header_area, grid_area, _status_area] = ui::split_main_chunks(terminal_area);

    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if app.find_dialog.is_some() || app.help_modal || app.view != View::Data {
                return;
            }
            // A press on a column boundary starts the exclusive resize drag.
            if app.mode == Mode::Normal
                && let Some(col) = ui::resize_handle_at(app, grid_area, mouse.column, mouse.row)
            {
                if let Some(name) = app.core.dataset.column_name(col).map(str::to_string) {
                    app.core.layout.begin_resize(&name, mouse.column);
                }
                return;
            }
            if let Some((row, col)) = ui::grid_cell_at(app, grid_area, mouse.column, mouse.row) {
                // Clicking away from an in-flight edit commits it (focus
                // loss), then the clicked cell becomes the selection.
                if app.mode == Mode::Edit {
                    app.commit_edit();
                }
                if app.mode != Mode::Normal {
                    return;
                }
                app.core.select(CellRef::new(row, col));
                app.update_viewport();
            }
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            app.core.layout.update_resize(mouse.column);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            // Release always ends the gesture, even when the cursor has
            // left the grid entirely.
            app.core.layout.end_resize();
        }
        _ => {}
    }
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        match event::read()? {
            Event::Key(key) => {
                // Only process key press events (Windows reports Press + Release)
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                // Help modal takes over input
                if app.help_modal {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') => app.close_help_modal(),
                        KeyCode::Down | KeyCode::Char('j') => app.scroll_help_by(1),
                        KeyCode::Up | KeyCode::Char('k') => app.scroll_help_by(-1),
                        KeyCode::PageDown => app.scroll_help_by(12),
                        KeyCode::PageUp => app.scroll_help_by(-12),
                        _ => {}
                    }
                    continue;
                }

                // Find/replace dialog takes over input
                if app.find_dialog.is_some() {
                    handle_dialog_key(app, key);
                    continue;
                }

                if let Some(action) = translate(&app.keymap, app.mode, key) {
                    if apply_action(app, action) == ApplyResult::Quit {
                        return Ok(());
                    }
                    continue;
                }

                // Text entry fallbacks (not bound in keymaps).
                match app.mode {
                    Mode::Edit => handle_edit_text(app, key),
                    Mode::Command => handle_command_text(app, key),
                    _ => {}
                }
            }
            Event::Mouse(mouse) => {
                let size = terminal.size()?;
                let terminal_area = Rect::new(0, 0, size.width, size.height);
                handle_mouse_event(app, terminal_area, mouse);
            }
            _ => {}
        }
    }
}
