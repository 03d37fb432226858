use crossterm::event::{self, KeyCode, KeyModifiers};

use super::app::{App, Mode, View};
use super::keymap::Action;

/// Handle text editing operations on a buffer with UTF-8 aware cursor movement.
pub(crate) fn handle_text_input(buffer: &mut String, cursor: &mut usize, key: event::KeyEvent) {
    match key.code {
        KeyCode::Left => {
            if *cursor > 0 {
                let mut new_pos = *cursor - 1;
                while new_pos > 0 && !buffer.is_char_boundary(new_pos) {
                    new_pos -= 1;
                }
                *cursor = new_pos;
            }
        }
        KeyCode::Right => {
            if *cursor < buffer.len() {
                let mut new_pos = *cursor + 1;
                while new_pos < buffer.len() && !buffer.is_char_boundary(new_pos) {
                    new_pos += 1;
                }
                *cursor = new_pos;
            }
        }
        KeyCode::Home => {
            *cursor = 0;
        }
        KeyCode::End => {
            *cursor = buffer.len();
        }
        KeyCode::Backspace => {
            if *cursor > 0 {
                let mut del_start = *cursor - 1;
                while del_start > 0 && !buffer.is_char_boundary(del_start) {
                    del_start -= 1;
                }
                buffer.drain(del_start..*cursor);
                *cursor = del_start;
            }
        }
        KeyCode::Delete => {
            if *cursor < buffer.len() {
                let mut del_end = *cursor + 1;
                while del_end < buffer.len() && !buffer.is_char_boundary(del_end) {
                    del_end += 1;
                }
                buffer.drain(*cursor..del_end);
            }
        }
        KeyCode::Char(c) => {
            if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT {
                buffer.insert(*cursor, c);
                *cursor += c.len_utf8();
            }
        }
        _ => {}
    }
}

/// Result of applying an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyResult {
    Continue,
    Quit,
}

/// Apply an action to the application state.
///
/// Returns `ApplyResult::Quit` if the application should exit.
pub fn apply_action(app: &mut App, action: Action) -> ApplyResult {
    match action {
        Action::Cancel => match app.mode {
            Mode::Edit => app.cancel_edit(),
            Mode::Command => {
                app.mode = Mode::Normal;
                app.command_buffer.clear();
                app.command_cursor = 0;
            }
            Mode::Normal => {}
        },

        Action::EnterEdit => app.enter_edit_mode(),
        Action::CommitEdit => app.commit_edit(),
        Action::EnterCommand => {
            app.mode = Mode::Command;
            app.command_buffer.clear();
            app.command_cursor = 0;
        }
        Action::ExecuteCommand => {
            if app.execute_command() {
                return ApplyResult::Quit;
            }
        }

        Action::Move(dx, dy) => match app.view {
            View::Data => app.move_cursor(dx, dy),
            View::Variables => app.move_var_cursor(dx, dy),
        },
        Action::Page(dir) => {
            let delta = app.visible_rows as i32 * dir;
            match app.view {
                View::Data => app.move_cursor(0, delta),
                View::Variables => app.move_var_cursor(0, delta),
            }
        }
        Action::HomeCol => match app.view {
            View::Data => app.move_cursor(i32::MIN / 2, 0),
            View::Variables => app.move_var_cursor(i32::MIN / 2, 0),
        },
        Action::EndCol => match app.view {
            View::Data => app.move_cursor(i32::MAX / 2, 0),
            View::Variables => app.move_var_cursor(i32::MAX / 2, 0),
        },

        Action::OpenFind => app.open_find_dialog(false),
        Action::OpenReplace => app.open_find_dialog(true),
        Action::NextMatch => app.next_match(),
        Action::PrevMatch => app.prev_match(),

        Action::ClearCell => app.clear_current_cell(),
        Action::YankCell => app.yank_cell(),
        Action::PasteCell => app.paste_cell(),

        Action::IncColWidth => app.increase_column_width(),
        Action::DecColWidth => app.decrease_column_width(),
        Action::ToggleView => app.toggle_view(),
        Action::Save => app.save_file(),
        Action::Help => app.help_modal = true,
    }
    ApplyResult::Continue
}

pub fn handle_edit_text(app: &mut App, key: event::KeyEvent) {
    let mut cursor = app.edit_cursor;
    if let Some(buffer) = app.active_edit_buffer() {
        handle_text_input(buffer, &mut cursor, key);
    }
    app.edit_cursor = cursor;
}

pub fn handle_command_text(app: &mut App, key: event::KeyEvent) {
    let mut cursor = app.command_cursor;
    let mut buffer = std::mem::take(&mut app.command_buffer);
    handle_text_input(&mut buffer, &mut cursor, key);
    app.command_buffer = buffer;
    app.command_cursor = cursor;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_text_input_insert_and_backspace() {
        let mut buffer = String::new();
        let mut cursor = 0;
        handle_text_input(&mut buffer, &mut cursor, key(KeyCode::Char('a')));
        handle_text_input(&mut buffer, &mut cursor, key(KeyCode::Char('b')));
        assert_eq!(buffer, "ab");
        assert_eq!(cursor, 2);
        handle_text_input(&mut buffer, &mut cursor, key(KeyCode::Backspace));
        assert_eq!(buffer, "a");
        assert_eq!(cursor, 1);
    }

    #[test]
    fn test_text_input_is_utf8_aware() {
        let mut buffer = "é".to_string();
        let mut cursor = buffer.len();
        handle_text_input(&mut buffer, &mut cursor, key(KeyCode::Left));
        assert_eq!(cursor, 0);
        handle_text_input(&mut buffer, &mut cursor, key(KeyCode::Delete));
        assert_eq!(buffer, "");
    }

    #[test]
    fn test_text_input_ignores_control_chars() {
        let mut buffer = String::new();
        let mut cursor = 0;
        let ctrl_a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        handle_text_input(&mut buffer, &mut cursor, ctrl_a);
        assert_eq!(buffer, "");
    }
}
