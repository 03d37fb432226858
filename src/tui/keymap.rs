//! Keymap translation layer.
//!
//! This keeps key handling separate from app behavior: the keymap turns a
//! key event into an [`Action`] for the current mode, and users can
//! override the built-in scheme with a TOML keymap file.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;

use super::app::Mode;

/// Available keybinding schemes: the built-in default, or a custom scheme
/// loaded from the user's keymaps.toml.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Keymap {
    Default,
    Custom(CustomKeymap),
}

impl Keymap {
    pub fn name(&self) -> &str {
        match self {
            Keymap::Default => "default",
            Keymap::Custom(custom) => &custom.name,
        }
    }

    pub fn status_hint(&self) -> String {
        match self {
            Keymap::Default => {
                "arrows:move  Enter:edit  C-f:find  C-h:replace  n/N:match  V:variables  :w:save  :q:quit"
                    .to_string()
            }
            Keymap::Custom(custom) => {
                format!("custom keymap: {}  :help for bindings", custom.name)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomKeymap {
    pub name: String,
    pub description: Option<String>,
    pub bindings: KeymapBindings,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeymapBindings {
    pub normal: Vec<Binding>,
    pub edit: Vec<Binding>,
    pub command: Vec<Binding>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Binding {
    pub combo: KeyCombo,
    pub action: Action,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    fn matches(&self, key: KeyEvent) -> bool {
        if self.code != key.code {
            return false;
        }
        if self.modifiers.is_empty() {
            return true;
        }
        key.modifiers.contains(self.modifiers)
    }

    pub fn display(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("C");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("M");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("S");
        }
        let key = match self.code {
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "S-Tab".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_string(),
            _ => "Unknown".to_string(),
        };
        if parts.is_empty() {
            key
        } else {
            format!("{}-{}", parts.join("-"), key)
        }
    }
}

impl CustomKeymap {
    fn translate(&self, mode: Mode, key: KeyEvent) -> Option<Action> {
        let bindings = self.bindings.for_mode(mode);
        bindings
            .iter()
            .filter(|binding| !binding.combo.modifiers.is_empty())
            .find(|binding| binding.combo.matches(key))
            .or_else(|| {
                bindings
                    .iter()
                    .filter(|binding| binding.combo.modifiers.is_empty())
                    .find(|binding| binding.combo.matches(key))
            })
            .map(|binding| binding.action.clone())
    }
}

impl KeymapBindings {
    fn for_mode(&self, mode: Mode) -> &Vec<Binding> {
        match mode {
            Mode::Normal => &self.normal,
            Mode::Edit => &self.edit,
            Mode::Command => &self.command,
        }
    }
}

/// Actions that can be triggered by key presses.
///
/// Actions decouple key handling from application logic. The keymap
/// translates key events into actions, which are then applied to the
/// application state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    /// Cancel current operation and return to Normal mode.
    Cancel,
    /// Enter Edit mode for the current cell (or variable attribute).
    EnterEdit,
    /// Commit the current edit and return to Normal mode.
    CommitEdit,
    /// Enter Command mode (`:` prompt).
    EnterCommand,
    /// Execute the command in the command buffer.
    ExecuteCommand,

    /// Move the selection by (dx, dy).
    Move(i32, i32),
    /// Page up (-1) or down (+1).
    Page(i32),
    /// Jump to the first column.
    HomeCol,
    /// Jump to the last column.
    EndCol,

    /// Open the Find dialog.
    OpenFind,
    /// Open the Find & Replace dialog.
    OpenReplace,
    /// Jump to the next search match.
    NextMatch,
    /// Jump to the previous search match.
    PrevMatch,

    /// Clear the current cell.
    ClearCell,
    /// Copy the current cell's text to the system clipboard.
    YankCell,
    /// Paste the system clipboard into the current cell.
    PasteCell,

    /// Increase current column width.
    IncColWidth,
    /// Decrease current column width.
    DecColWidth,
    /// Switch between the data view and the variable view.
    ToggleView,
    /// Save the dataset.
    Save,
    /// Open the help modal.
    Help,
}

/// Translate a key event to an action based on the current keymap and mode.
///
/// Returns `None` if the key has no binding in the current context.
pub fn translate(keymap: &Keymap, mode: Mode, key: KeyEvent) -> Option<Action> {
    match keymap {
        Keymap::Default => translate_default(mode, key),
        Keymap::Custom(custom) => custom.translate(mode, key),
    }
}

fn translate_default(mode: Mode, key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match mode {
        Mode::Normal => match key.code {
            // Find / replace shortcuts. Ctrl+H arrives as Ctrl+Backspace on
            // some terminals, so accept both spellings.
            KeyCode::Char('f') if ctrl => Some(Action::OpenFind),
            KeyCode::Char('h') if ctrl => Some(Action::OpenReplace),
            KeyCode::Backspace if ctrl => Some(Action::OpenReplace),
            KeyCode::Char('n') => Some(Action::NextMatch),
            KeyCode::Char('N') => Some(Action::PrevMatch),

            KeyCode::Up | KeyCode::Char('k') => Some(Action::Move(0, -1)),
            KeyCode::Down | KeyCode::Char('j') => Some(Action::Move(0, 1)),
            KeyCode::Left | KeyCode::Char('h') => Some(Action::Move(-1, 0)),
            KeyCode::Right | KeyCode::Char('l') => Some(Action::Move(1, 0)),
            KeyCode::Tab => Some(Action::Move(1, 0)),
            KeyCode::BackTab => Some(Action::Move(-1, 0)),

            KeyCode::PageUp => Some(Action::Page(-1)),
            KeyCode::PageDown => Some(Action::Page(1)),
            KeyCode::Home => Some(Action::HomeCol),
            KeyCode::End => Some(Action::EndCol),

            KeyCode::Enter | KeyCode::Char('i') => Some(Action::EnterEdit),
            KeyCode::Char('x') | KeyCode::Delete => Some(Action::ClearCell),
            KeyCode::Char(':') => Some(Action::EnterCommand),
            KeyCode::Char('y') => Some(Action::YankCell),
            KeyCode::Char('p') => Some(Action::PasteCell),
            KeyCode::Char('+') | KeyCode::Char('>') => Some(Action::IncColWidth),
            KeyCode::Char('-') | KeyCode::Char('<') => Some(Action::DecColWidth),
            KeyCode::Char('V') => Some(Action::ToggleView),
            KeyCode::Char('s') if ctrl => Some(Action::Save),
            KeyCode::Char('?') => Some(Action::Help),
            _ => None,
        },

        // Navigation keys are deliberately unbound while editing; the grid
        // state machine accepts them only in Normal mode.
        Mode::Edit => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::CommitEdit),
            _ => None,
        },

        Mode::Command => match key.code {
            KeyCode::Esc => Some(Action::Cancel),
            KeyCode::Enter => Some(Action::ExecuteCommand),
            _ => None,
        },
    }
}

#[derive(Debug, Deserialize)]
struct KeymapsFile {
    meta: Option<KeymapsMeta>,
    keymaps: Option<HashMap<String, KeymapFile>>,
}

#[derive(Debug, Deserialize)]
struct KeymapsMeta {
    default: Option<String>,
}

#[derive(Debug, Deserialize)]
struct KeymapFile {
    description: Option<String>,
    normal: Option<HashMap<String, String>>,
    edit: Option<HashMap<String, String>>,
    command: Option<HashMap<String, String>>,
}

pub fn load_keymap(requested: Option<&str>, keymap_file: Option<&PathBuf>) -> (Keymap, Vec<String>) {
    let mut warnings: Vec<String> = Vec::new();
    let config_path = keymap_file.cloned().or_else(user_keymaps_path);
    let mut file: Option<KeymapsFile> = None;

    if let Some(path) = config_path.as_ref() {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(content) => match toml::from_str::<KeymapsFile>(&content) {
                    Ok(parsed) => file = Some(parsed),
                    Err(err) => {
                        warnings.push(format!("Failed to parse {}: {}", path.display(), err))
                    }
                },
                Err(err) => warnings.push(format!("Failed to read {}: {}", path.display(), err)),
            }
        } else if keymap_file.is_some() {
            warnings.push(format!("Keymap file not found: {}", path.display()));
        }
    }

    let requested_name = requested.map(|name| name.trim()).filter(|s| !s.is_empty());
    let default_name = file
        .as_ref()
        .and_then(|f| f.meta.as_ref())
        .and_then(|m| m.default.as_ref())
        .map(|s| s.as_str());
    let target = requested_name.or(default_name).unwrap_or("default");

    if let Some(file) = file.as_ref() {
        if let Some(keymaps) = file.keymaps.as_ref() {
            if let Some(entry) = keymaps.get(target) {
                match build_custom_keymap(target, entry) {
                    Ok(custom) => return (Keymap::Custom(custom), warnings),
                    Err(errs) => {
                        warnings.extend(errs);
                    }
                }
            } else if requested_name.is_some() {
                warnings.push(format!(
                    "Keymap '{}' not found in {}",
                    target,
                    config_path
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "keymaps.toml".to_string())
                ));
            }
        }
    }

    if requested_name.is_some() && !target.eq_ignore_ascii_case("default") {
        warnings.push(format!(
            "Falling back to the built-in keymap for '{}'",
            target
        ));
    }
    (Keymap::Default, warnings)
}

fn user_keymaps_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "dataview")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("keymaps.toml");
    Some(path)
}

fn build_custom_keymap(name: &str, entry: &KeymapFile) -> Result<CustomKeymap, Vec<String>> {
    let mut errors: Vec<String> = Vec::new();

    let normal = parse_mode_bindings("normal", entry.normal.as_ref(), &mut errors);
    let edit = parse_mode_bindings("edit", entry.edit.as_ref(), &mut errors);
    let command = parse_mode_bindings("command", entry.command.as_ref(), &mut errors);

    if errors.is_empty() {
        Ok(CustomKeymap {
            name: name.to_string(),
            description: entry.description.clone(),
            bindings: KeymapBindings {
                normal,
                edit,
                command,
            },
        })
    } else {
        Err(errors)
    }
}

fn parse_mode_bindings(
    mode: &str,
    raw: Option<&HashMap<String, String>>,
    errors: &mut Vec<String>,
) -> Vec<Binding> {
    let mut bindings: Vec<Binding> = Vec::new();
    let Some(raw) = raw else {
        return bindings;
    };
    for (combo_str, action_str) in raw {
        match (parse_key_combo(combo_str), action_from_str(action_str)) {
            (Ok(combo), Some(action)) => bindings.push(Binding { combo, action }),
            (Ok(_), None) => errors.push(format!(
                "Invalid action '{}' in {} bindings",
                action_str, mode
            )),
            (Err(err), _) => errors.push(format!(
                "Invalid key '{}' in {} bindings: {}",
                combo_str, mode, err
            )),
        }
    }
    bindings
}

fn parse_key_combo(input: &str) -> Result<KeyCombo, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty key".to_string());
    }

    let parts: Vec<&str> = trimmed.split('-').collect();
    let (mods, key_part) = if parts.len() == 1 {
        (KeyModifiers::empty(), parts[0])
    } else {
        let (mod_parts, key_part) = parts.split_at(parts.len() - 1);
        let mut modifiers = KeyModifiers::empty();
        for part in mod_parts {
            let norm = part.trim().to_ascii_lowercase();
            match norm.as_str() {
                "c" | "ctrl" | "control" => modifiers.insert(KeyModifiers::CONTROL),
                "m" | "alt" | "meta" => modifiers.insert(KeyModifiers::ALT),
                "s" | "shift" => modifiers.insert(KeyModifiers::SHIFT),
                _ => {
                    return Err(format!("unknown modifier '{}'", part));
                }
            }
        }
        (modifiers, key_part[0])
    };

    let key = parse_key_code(key_part)?;
    Ok(KeyCombo {
        code: key,
        modifiers: mods,
    })
}

fn parse_key_code(input: &str) -> Result<KeyCode, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err("empty key".to_string());
    }
    let mut chars = trimmed.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(KeyCode::Char(c));
    }
    let norm = trimmed.to_ascii_lowercase();
    match norm.as_str() {
        "enter" => Ok(KeyCode::Enter),
        "esc" | "escape" => Ok(KeyCode::Esc),
        "backspace" => Ok(KeyCode::Backspace),
        "delete" => Ok(KeyCode::Delete),
        "tab" => Ok(KeyCode::Tab),
        "backtab" => Ok(KeyCode::BackTab),
        "home" => Ok(KeyCode::Home),
        "end" => Ok(KeyCode::End),
        "pageup" => Ok(KeyCode::PageUp),
        "pagedown" => Ok(KeyCode::PageDown),
        "left" => Ok(KeyCode::Left),
        "right" => Ok(KeyCode::Right),
        "up" => Ok(KeyCode::Up),
        "down" => Ok(KeyCode::Down),
        "space" => Ok(KeyCode::Char(' ')),
        _ => Err(format!("unknown key '{}'", input)),
    }
}

fn action_from_str(input: &str) -> Option<Action> {
    match input.trim().to_ascii_lowercase().as_str() {
        "cancel" => Some(Action::Cancel),
        "enter_edit" => Some(Action::EnterEdit),
        "commit_edit" => Some(Action::CommitEdit),
        "enter_command" => Some(Action::EnterCommand),
        "execute_command" => Some(Action::ExecuteCommand),
        "move_left" => Some(Action::Move(-1, 0)),
        "move_right" => Some(Action::Move(1, 0)),
        "move_up" => Some(Action::Move(0, -1)),
        "move_down" => Some(Action::Move(0, 1)),
        "page_up" => Some(Action::Page(-1)),
        "page_down" => Some(Action::Page(1)),
        "home_col" => Some(Action::HomeCol),
        "end_col" => Some(Action::EndCol),
        "open_find" => Some(Action::OpenFind),
        "open_replace" => Some(Action::OpenReplace),
        "next_match" => Some(Action::NextMatch),
        "prev_match" => Some(Action::PrevMatch),
        "clear_cell" => Some(Action::ClearCell),
        "yank_cell" => Some(Action::YankCell),
        "paste_cell" => Some(Action::PasteCell),
        "inc_col_width" => Some(Action::IncColWidth),
        "dec_col_width" => Some(Action::DecColWidth),
        "toggle_view" => Some(Action::ToggleView),
        "save" => Some(Action::Save),
        "help" => Some(Action::Help),
        _ => None,
    }
}
