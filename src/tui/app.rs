//! Application state and logic.
//!
//! This module contains the main [`App`] struct wrapping the core editing
//! [`Session`] with everything the terminal front end needs: viewport,
//! input buffers, modal dialog state, the variable view cursor and the
//! status line. The app operates in different [`Mode`]s (Normal, Edit,
//! Command); the find/replace dialog and the help modal capture input
//! while they are open.

use std::path::PathBuf;

use dataview_core::storage::{export_filename, load_path, write_csv};
use dataview_core::{CellRef, Dataset, Session};

use super::keymap::Keymap;

/// Modal editing state for the application.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Navigate the grid, execute single-key commands.
    Normal,
    /// Edit the contents of the current cell or variable attribute.
    Edit,
    /// Enter ex-style commands (`:w`, `:q`, etc.).
    Command,
}

/// Which table the app is showing: the data grid or variable metadata.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum View {
    Data,
    Variables,
}

/// Which input line of the find/replace dialog has focus.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DialogField {
    Term,
    Replacement,
}

/// State of the find / find-and-replace dialog.
#[derive(Clone, Debug)]
pub struct FindDialog {
    /// Whether the replacement line is shown (Ctrl+H vs Ctrl+F).
    pub replace: bool,
    pub term: String,
    pub term_cursor: usize,
    pub replacement: String,
    pub replacement_cursor: usize,
    pub case_sensitive: bool,
    pub focus: DialogField,
}

impl FindDialog {
    fn new(replace: bool, term: String) -> Self {
        let term_cursor = term.len();
        FindDialog {
            replace,
            term,
            term_cursor,
            replacement: String::new(),
            replacement_cursor: 0,
            case_sensitive: false,
            focus: DialogField::Term,
        }
    }
}

/// In-flight edit of one variable attribute in the variable view.
#[derive(Clone, Debug)]
pub struct VarEdit {
    pub row: usize,
    pub attr: usize,
    pub pending: String,
}

/// Attribute columns of the variable view, in display order.
pub const VAR_ATTRS: [&str; 10] = [
    "Name", "Type", "Width", "Decimals", "Label", "Values", "Missing", "Align", "Measure", "Role",
];

/// Main application state container.
pub struct App {
    /// The editing session (dataset, variables, selection, search, layout).
    pub core: Session,
    pub mode: Mode,
    pub view: View,
    /// Cursor position within the active edit buffer (byte offset).
    pub edit_cursor: usize,
    /// Command buffer for command mode.
    pub command_buffer: String,
    /// Cursor position within the command buffer (byte offset).
    pub command_cursor: usize,
    /// Where the dataset was loaded from, if anywhere.
    pub file_path: Option<PathBuf>,
    /// Status message to display.
    pub status_message: String,
    /// Viewport offset (row / column) for the data grid.
    pub viewport_row: usize,
    pub viewport_col: usize,
    /// Visible grid dimensions, updated by the renderer each frame.
    pub visible_rows: usize,
    pub visible_cols: usize,
    /// Variable view cursor: (variable index, attribute index) and scroll.
    pub var_row: usize,
    pub var_attr: usize,
    pub var_viewport: usize,
    pub var_edit: Option<VarEdit>,
    /// Find/replace dialog state (when open).
    pub find_dialog: Option<FindDialog>,
    /// Help modal state.
    pub help_modal: bool,
    pub help_scroll: usize,
    /// Active keymap.
    pub keymap: Keymap,
}

impl App {
    /// Create an application over an already-loaded dataset.
    pub fn new(dataset: Dataset) -> Self {
        let mut core = Session::new(dataset);
        // The engine leaves the selection unset until something selects a
        // cell; the TUI cursor starts at the origin when there is one.
        core.select(CellRef::new(0, 0));

        App {
            core,
            mode: Mode::Normal,
            view: View::Data,
            edit_cursor: 0,
            command_buffer: String::new(),
            command_cursor: 0,
            file_path: None,
            status_message: String::new(),
            viewport_row: 0,
            viewport_col: 0,
            visible_rows: 20,
            visible_cols: 8,
            var_row: 0,
            var_attr: 0,
            var_viewport: 0,
            var_edit: None,
            find_dialog: None,
            help_modal: false,
            help_scroll: 0,
            keymap: Keymap::Default,
        }
    }

    /// Create an app by loading a file (CSV or JSON by extension).
    pub fn with_file(path: Option<PathBuf>, keymap: Keymap) -> anyhow::Result<Self> {
        let dataset = match &path {
            Some(p) => load_path(p)?,
            None => Dataset::default(),
        };
        let mut app = Self::new(dataset);
        app.keymap = keymap;
        app.file_path = path;
        Ok(app)
    }

    // ----- navigation -----------------------------------------------------

    /// Move the data-grid selection, clamped by the engine.
    pub fn move_cursor(&mut self, dx: i32, dy: i32) {
        if self.core.move_selection(dx, dy) {
            self.update_viewport();
        }
    }

    pub fn cursor(&self) -> Option<CellRef> {
        self.core.selection
    }

    /// Update viewport to keep the selected cell visible.
    pub fn update_viewport(&mut self) {
        let Some(cell) = self.core.selection else {
            return;
        };

        if cell.col < self.viewport_col {
            self.viewport_col = cell.col;
        } else if cell.col >= self.viewport_col + self.visible_cols {
            self.viewport_col = cell.col - self.visible_cols + 1;
        }

        if cell.row < self.viewport_row {
            self.viewport_row = cell.row;
        } else if cell.row >= self.viewport_row + self.visible_rows {
            self.viewport_row = cell.row - self.visible_rows + 1;
        }
    }

    // ----- cell editing ---------------------------------------------------

    /// Enter edit mode for the current cell (data view) or the current
    /// attribute (variable view).
    pub fn enter_edit_mode(&mut self) {
        match self.view {
            View::Data => {
                if self.core.begin_edit() {
                    self.edit_cursor = self
                        .core
                        .editing
                        .as_ref()
                        .map(|e| e.pending.len())
                        .unwrap_or(0);
                    self.mode = Mode::Edit;
                }
            }
            View::Variables => self.enter_var_edit(),
        }
    }

    /// Commit the current edit.
    pub fn commit_edit(&mut self) {
        match self.view {
            View::Data => {
                match self.core.commit_edit() {
                    Ok(_) => self.status_message.clear(),
                    Err(e) => self.status_message = format!("Error: {}", e),
                }
                self.mode = Mode::Normal;
                self.edit_cursor = 0;
            }
            View::Variables => self.commit_var_edit(),
        }
    }

    /// Cancel the current edit without touching the dataset.
    pub fn cancel_edit(&mut self) {
        self.core.cancel_edit();
        self.var_edit = None;
        self.mode = Mode::Normal;
        self.edit_cursor = 0;
    }

    /// Clear the current cell (stores the empty value through the normal
    /// conversion path).
    pub fn clear_current_cell(&mut self) {
        let Some(cell) = self.core.selection else {
            return;
        };
        match self.core.edit_cell(cell, "") {
            Ok(_) => self.status_message.clear(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    // ----- clipboard ------------------------------------------------------

    /// Copy the current cell's display text to the system clipboard.
    pub fn yank_cell(&mut self) {
        let Some(cell) = self.core.selection else {
            return;
        };
        let text = self.core.dataset.value_at(cell).display();
        match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text)) {
            Ok(()) => self.status_message = "Yanked cell".to_string(),
            Err(e) => self.status_message = format!("Clipboard error: {}", e),
        }
    }

    /// Paste the system clipboard into the current cell, through the same
    /// conversion as a manual edit.
    pub fn paste_cell(&mut self) {
        let Some(cell) = self.core.selection else {
            return;
        };
        let text = match arboard::Clipboard::new().and_then(|mut cb| cb.get_text()) {
            Ok(text) => text,
            Err(e) => {
                self.status_message = format!("Clipboard error: {}", e);
                return;
            }
        };
        // A multi-line paste targets a single cell; keep the first line.
        let line = text.lines().next().unwrap_or("");
        match self.core.edit_cell(cell, line) {
            Ok(_) => self.status_message = "Pasted cell".to_string(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    // ----- help modal -----------------------------------------------------

    pub fn close_help_modal(&mut self) {
        self.help_modal = false;
        self.help_scroll = 0;
    }

    pub fn scroll_help_by(&mut self, delta: i32) {
        self.help_scroll = (self.help_scroll as i32 + delta).max(0) as usize;
    }

    // ----- find / replace -------------------------------------------------

    pub fn open_find_dialog(&mut self, replace: bool) {
        let term = self.core.search.term.clone();
        self.find_dialog = Some(FindDialog::new(replace, term));
    }

    pub fn close_find_dialog(&mut self) {
        self.find_dialog = None;
    }

    /// Run the search for the dialog's current term and jump to the first
    /// match.
    pub fn dialog_search(&mut self) {
        let Some(dialog) = self.find_dialog.clone() else {
            return;
        };
        let count = self.core.find(&dialog.term, dialog.case_sensitive);
        if count == 0 {
            self.status_message = "No matches".to_string();
        } else {
            self.status_message = format!("{} matches", count);
        }
        self.jump_to_current_match();
    }

    /// Select the cell at the current match, if any.
    pub fn jump_to_current_match(&mut self) {
        if let Some(cell) = self.core.search.current_match() {
            self.core.select(cell);
            self.update_viewport();
        }
    }

    pub fn next_match(&mut self) {
        match self.core.next_match() {
            Some(cell) => {
                self.core.select(cell);
                self.update_viewport();
                self.status_message = self.match_position();
            }
            None => self.status_message = "No matches".to_string(),
        }
    }

    pub fn prev_match(&mut self) {
        match self.core.prev_match() {
            Some(cell) => {
                self.core.select(cell);
                self.update_viewport();
                self.status_message = self.match_position();
            }
            None => self.status_message = "No matches".to_string(),
        }
    }

    fn match_position(&self) -> String {
        format!(
            "Match {}/{}",
            self.core.search.current + 1,
            self.core.search.matches.len()
        )
    }

    /// Whether the engine's match list reflects the dialog's inputs.
    fn search_is_stale(&self, dialog: &FindDialog) -> bool {
        self.core.search.term != dialog.term
            || self.core.search.case_sensitive != dialog.case_sensitive
    }

    /// Replace the first occurrence in the cell at the current match.
    pub fn dialog_replace_one(&mut self) {
        let Some(dialog) = self.find_dialog.clone() else {
            return;
        };
        if self.search_is_stale(&dialog) {
            self.core.find(&dialog.term, dialog.case_sensitive);
        }
        match self.core.replace_current(&dialog.replacement) {
            Ok(true) => {
                self.status_message = format!(
                    "Replaced; {} matches left",
                    self.core.search.matches.len()
                );
                self.jump_to_current_match();
            }
            Ok(false) => self.status_message = "No replacements".to_string(),
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    /// Replace every occurrence in every matching cell; reports the number
    /// of cells changed.
    pub fn dialog_replace_all(&mut self) {
        let Some(dialog) = self.find_dialog.clone() else {
            return;
        };
        if self.search_is_stale(&dialog) {
            self.core.find(&dialog.term, dialog.case_sensitive);
        }
        if self.core.search.matches.is_empty() {
            self.status_message = "No matches".to_string();
            return;
        }
        match self.core.replace_all(&dialog.replacement) {
            Ok(0) => self.status_message = "No replacements".to_string(),
            Ok(changed) => {
                self.status_message = format!("Replaced in {} cells", changed);
                self.jump_to_current_match();
            }
            Err(e) => self.status_message = format!("Error: {}", e),
        }
    }

    // ----- column width ---------------------------------------------------

    pub fn selected_column_width(&self) -> Option<u16> {
        let name = self.core.selected_column()?;
        Some(self.core.layout.width(name))
    }

    pub fn increase_column_width(&mut self) {
        if let Some(name) = self.core.selected_column().map(str::to_string) {
            let width = self.core.layout.width(&name);
            self.core.layout.set_width(&name, width.saturating_add(2));
        }
    }

    pub fn decrease_column_width(&mut self) {
        if let Some(name) = self.core.selected_column().map(str::to_string) {
            let width = self.core.layout.width(&name);
            self.core.layout.set_width(&name, width.saturating_sub(2));
        }
    }

    // ----- variable view --------------------------------------------------

    pub fn toggle_view(&mut self) {
        self.view = match self.view {
            View::Data => View::Variables,
            View::Variables => View::Data,
        };
        self.var_row = self.var_row.min(
            self.core.dataset.column_count().saturating_sub(1),
        );
    }

    /// Move the variable-view cursor over (attribute, variable) cells.
    pub fn move_var_cursor(&mut self, dx: i32, dy: i32) {
        let rows = self.core.dataset.column_count();
        if rows == 0 {
            return;
        }
        let max_row = rows as i32 - 1;
        let max_attr = VAR_ATTRS.len() as i32 - 1;
        self.var_row = (self.var_row as i32 + dy).clamp(0, max_row) as usize;
        self.var_attr = (self.var_attr as i32 + dx).clamp(0, max_attr) as usize;
        if self.var_row < self.var_viewport {
            self.var_viewport = self.var_row;
        } else if self.var_row >= self.var_viewport + self.visible_rows {
            self.var_viewport = self.var_row - self.visible_rows + 1;
        }
    }

    /// Name of the variable under the variable-view cursor.
    pub fn current_var_name(&self) -> Option<String> {
        self.core
            .dataset
            .column_name(self.var_row)
            .map(str::to_string)
    }

    /// Current display text of one variable attribute.
    pub fn var_attr_text(&self, name: &str, attr: usize) -> String {
        let Some(var) = self.core.variable(name) else {
            return String::new();
        };
        match attr {
            0 => var.name.clone(),
            1 => var.var_type.name().to_string(),
            2 => var.width.to_string(),
            3 => var.decimals.to_string(),
            4 => var.label.clone(),
            5 => var
                .value_labels
                .iter()
                .map(|(value, label)| format!("{}={}", value, label))
                .collect::<Vec<_>>()
                .join("; "),
            6 => var.missing.join(", "),
            7 => var.alignment.name().to_string(),
            8 => var.measure.name().to_string(),
            9 => var.role.name().to_string(),
            _ => String::new(),
        }
    }

    fn enter_var_edit(&mut self) {
        let Some(name) = self.current_var_name() else {
            return;
        };
        if self.var_attr == 0 {
            self.status_message = "Variable names are fixed".to_string();
            return;
        }
        let pending = self.var_attr_text(&name, self.var_attr);
        self.edit_cursor = pending.len();
        self.var_edit = Some(VarEdit {
            row: self.var_row,
            attr: self.var_attr,
            pending,
        });
        self.mode = Mode::Edit;
    }

    fn commit_var_edit(&mut self) {
        let Some(edit) = self.var_edit.take() else {
            self.mode = Mode::Normal;
            return;
        };
        self.mode = Mode::Normal;
        self.edit_cursor = 0;

        let Some(name) = self
            .core
            .dataset
            .column_name(edit.row)
            .map(str::to_string)
        else {
            return;
        };
        match apply_var_attr(&mut self.core, &name, edit.attr, &edit.pending) {
            Ok(()) => self.status_message.clear(),
            Err(message) => self.status_message = format!("Error: {}", message),
        }
    }

    /// The buffer being edited in Edit mode, if any (cell or attribute).
    pub fn active_edit_buffer(&mut self) -> Option<&mut String> {
        match self.view {
            View::Data => self.core.editing.as_mut().map(|e| &mut e.pending),
            View::Variables => self.var_edit.as_mut().map(|e| &mut e.pending),
        }
    }

    // ----- saving / exporting ---------------------------------------------

    /// Save the edited dataset back to its file as CSV. Only the grid is
    /// persisted; CSV does not round-trip variable metadata.
    pub fn save_file(&mut self) {
        let Some(path) = self.file_path.clone() else {
            self.status_message = "No file path. Use :w <path>".to_string();
            return;
        };
        match write_csv(&path, &self.core.dataset) {
            Ok(()) => {
                self.core.modified = false;
                self.status_message = format!("Saved to {}", path.display());
            }
            Err(e) => {
                self.status_message = format!("Error saving: {}", e);
            }
        }
    }

    /// Export to `<name>_edited.csv` (or an explicit path).
    pub fn export_csv(&mut self, path: Option<&str>) {
        let target = match path {
            Some(p) => PathBuf::from(p),
            None => PathBuf::from(export_filename(self.core.dataset.name())),
        };
        match write_csv(&target, &self.core.dataset) {
            Ok(()) => self.status_message = format!("Exported to {}", target.display()),
            Err(e) => self.status_message = format!("Export error: {}", e),
        }
    }

    // ----- commands -------------------------------------------------------

    /// Execute a command entered in command mode.
    ///
    /// Returns `true` if the application should quit, `false` otherwise.
    pub fn execute_command(&mut self) -> bool {
        let cmd = self.command_buffer.trim().to_string();
        self.command_buffer.clear();
        self.command_cursor = 0;
        self.mode = Mode::Normal;

        let parts: Vec<&str> = cmd.splitn(2, ' ').collect();
        let command = parts[0];
        let args = parts.get(1).map(|s| s.trim());

        match command {
            "q" => {
                if self.core.modified {
                    self.status_message =
                        "Unsaved changes! Use :q! to force quit or :wq to save and quit"
                            .to_string();
                    return false;
                }
                return true;
            }
            "q!" => {
                return true;
            }
            "w" | "save" => {
                if let Some(path) = args {
                    self.file_path = Some(PathBuf::from(path));
                }
                self.save_file();
            }
            "wq" => {
                self.save_file();
                if !self.core.modified {
                    return true;
                }
            }
            "export" => {
                self.export_csv(args);
            }
            "ar" | "addrow" => {
                self.core.add_row();
                self.status_message = format!("Row {} added", self.core.dataset.row_count());
            }
            "dr" | "deleterow" => {
                let index = match args {
                    Some(arg) => match arg.parse::<usize>() {
                        Ok(n) if n >= 1 => n - 1,
                        _ => {
                            self.status_message = "Usage: :deleterow [ROW]".to_string();
                            return false;
                        }
                    },
                    None => match self.core.selection {
                        Some(cell) => cell.row,
                        None => {
                            self.status_message = "No row selected".to_string();
                            return false;
                        }
                    },
                };
                match self.core.delete_row(index) {
                    Ok(_) => self.status_message = format!("Row {} deleted", index + 1),
                    Err(e) => self.status_message = format!("Error: {}", e),
                }
            }
            "ac" | "addvar" => match self.core.add_column() {
                Ok(_) => {
                    let name = self
                        .core
                        .dataset
                        .columns()
                        .last()
                        .cloned()
                        .unwrap_or_default();
                    self.status_message = format!("Variable {} added", name);
                }
                Err(e) => self.status_message = format!("Error: {}", e),
            },
            "dc" | "deletevar" => {
                let index = match args {
                    Some(name) => match self.core.dataset.column_index(name) {
                        Some(idx) => idx,
                        None => {
                            self.status_message = format!("No variable named {}", name);
                            return false;
                        }
                    },
                    None => match self.view {
                        View::Variables => self.var_row,
                        View::Data => match self.core.selection {
                            Some(cell) => cell.col,
                            None => {
                                self.status_message = "No column selected".to_string();
                                return false;
                            }
                        },
                    },
                };
                let name = self
                    .core
                    .dataset
                    .column_name(index)
                    .unwrap_or_default()
                    .to_string();
                match self.core.delete_column(index) {
                    Ok(_) => {
                        self.var_row = self
                            .var_row
                            .min(self.core.dataset.column_count().saturating_sub(1));
                        self.status_message = format!("Variable {} deleted", name);
                    }
                    Err(e) => self.status_message = format!("Error: {}", e),
                }
            }
            "goto" | "g" => {
                if let Some(arg) = args {
                    self.goto(arg);
                } else {
                    self.status_message = "Usage: :goto ROW [COL]".to_string();
                }
            }
            "colwidth" | "cw" => {
                self.set_column_width_command(args);
            }
            "find" | "f" => {
                if let Some(term) = args {
                    let count = self.core.find(term, false);
                    if count == 0 {
                        self.status_message = "No matches".to_string();
                    } else {
                        self.status_message = format!("{} matches", count);
                        self.jump_to_current_match();
                    }
                } else {
                    self.status_message = "Usage: :find TEXT".to_string();
                }
            }
            "vars" | "variables" => {
                self.view = View::Variables;
            }
            "data" => {
                self.view = View::Data;
            }
            "help" | "h" => {
                self.help_modal = true;
            }
            _ => {
                self.status_message = format!("Unknown command: {}", command);
            }
        }
        false
    }

    /// Jump to a 1-based row, optionally with a column name or number.
    fn goto(&mut self, arg: &str) {
        let parts: Vec<&str> = arg.split_whitespace().collect();
        let Some(row) = parts.first().and_then(|p| p.parse::<usize>().ok()) else {
            self.status_message = "Usage: :goto ROW [COL]".to_string();
            return;
        };
        if row < 1 || row > self.core.dataset.row_count() {
            self.status_message = "Row out of range".to_string();
            return;
        }
        let col = match parts.get(1) {
            Some(name) => match self.resolve_column(name) {
                Some(idx) => idx,
                None => {
                    self.status_message = format!("No variable named {}", name);
                    return;
                }
            },
            None => self.core.selection.map(|c| c.col).unwrap_or(0),
        };
        if self.core.select(CellRef::new(row - 1, col)) {
            self.update_viewport();
            self.status_message = format!("Jumped to row {}", row);
        }
    }

    fn resolve_column(&self, name: &str) -> Option<usize> {
        if let Some(idx) = self.core.dataset.column_index(name) {
            return Some(idx);
        }
        let n = name.parse::<usize>().ok()?;
        if n >= 1 && n <= self.core.dataset.column_count() {
            Some(n - 1)
        } else {
            None
        }
    }

    fn set_column_width_command(&mut self, args: Option<&str>) {
        let Some(args) = args else {
            self.status_message = "Usage: :colwidth [COL] WIDTH".to_string();
            return;
        };
        let parts: Vec<&str> = args.split_whitespace().collect();
        match parts.len() {
            1 => {
                let Ok(width) = parts[0].parse::<u16>() else {
                    self.status_message = "Invalid width".to_string();
                    return;
                };
                let Some(name) = self.core.selected_column().map(str::to_string) else {
                    self.status_message = "No column selected".to_string();
                    return;
                };
                self.core.layout.set_width(&name, width);
                self.status_message =
                    format!("Column width set to {}", self.core.layout.width(&name));
            }
            2 => {
                let Some(index) = self.resolve_column(parts[0]) else {
                    self.status_message = "Invalid column".to_string();
                    return;
                };
                let Ok(width) = parts[1].parse::<u16>() else {
                    self.status_message = "Invalid width".to_string();
                    return;
                };
                let name = self
                    .core
                    .dataset
                    .column_name(index)
                    .unwrap_or_default()
                    .to_string();
                self.core.layout.set_width(&name, width);
                self.status_message = format!(
                    "Column {} width set to {}",
                    name,
                    self.core.layout.width(&name)
                );
            }
            _ => self.status_message = "Usage: :colwidth [COL] WIDTH".to_string(),
        }
    }
}

/// Parse and apply one edited attribute value onto a variable. Returns a
/// user-facing message on invalid input; nothing is changed in that case.
fn apply_var_attr(
    core: &mut Session,
    name: &str,
    attr: usize,
    text: &str,
) -> Result<(), String> {
    use dataview_core::{Alignment, Measure, Role, VarType};

    let var = core
        .variable_mut(name)
        .ok_or_else(|| format!("no variable named {}", name))?;
    match attr {
        1 => {
            var.var_type = VarType::parse(text)
                .ok_or_else(|| "type must be numeric, string or date".to_string())?;
        }
        2 => {
            let width: usize = text
                .trim()
                .parse()
                .map_err(|_| "width must be a number".to_string())?;
            var.width = width.clamp(1, 50);
        }
        3 => {
            let decimals: usize = text
                .trim()
                .parse()
                .map_err(|_| "decimals must be a number".to_string())?;
            var.decimals = decimals.clamp(0, 10);
        }
        4 => {
            var.label = text.trim().to_string();
        }
        5 => {
            // "1=male; 2=female" -> value-label map; empty clears it.
            let mut labels = std::collections::BTreeMap::new();
            for entry in text.split(';').map(str::trim).filter(|e| !e.is_empty()) {
                let (value, label) = entry
                    .split_once('=')
                    .ok_or_else(|| format!("'{}' is not VALUE=LABEL", entry))?;
                labels.insert(value.trim().to_string(), label.trim().to_string());
            }
            var.value_labels = labels;
        }
        6 => {
            var.missing = text.split(',').map(|s| s.trim().to_string()).collect();
        }
        7 => {
            var.alignment = Alignment::parse(text)
                .ok_or_else(|| "alignment must be left, center or right".to_string())?;
        }
        8 => {
            var.measure = Measure::parse(text)
                .ok_or_else(|| "measure must be scale, ordinal or nominal".to_string())?;
        }
        9 => {
            var.role = Role::parse(text).ok_or_else(|| {
                "role must be input, target, both, none, partition or split".to_string()
            })?;
        }
        _ => return Err("attribute is read-only".to_string()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataview_core::Value;
    use dataview_core::storage::csv::parse_csv_text;
    use dataview_core::{Measure, VarType};

    pub(crate) fn sample_app() -> App {
        let dataset =
            parse_csv_text("people.csv", "name,age\nada,36\ngrace,45\nlin,29\n").unwrap();
        App::new(dataset)
    }

    #[test]
    fn test_new_selects_origin() {
        let app = sample_app();
        assert_eq!(app.cursor(), Some(CellRef::new(0, 0)));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_edit_cycle_through_app() {
        let mut app = sample_app();
        app.move_cursor(1, 0); // age column
        app.enter_edit_mode();
        assert_eq!(app.mode, Mode::Edit);
        assert_eq!(app.core.editing.as_ref().unwrap().pending, "36");

        app.core.editing.as_mut().unwrap().pending = "37".to_string();
        app.commit_edit();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(
            app.core.dataset.value_at(CellRef::new(0, 1)),
            &Value::Number(37.0)
        );
    }

    #[test]
    fn test_escape_cancels_edit() {
        let mut app = sample_app();
        app.enter_edit_mode();
        app.active_edit_buffer().unwrap().push_str("XXX");
        app.cancel_edit();
        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(
            app.core.dataset.value_at(CellRef::new(0, 0)),
            &Value::Text("ada".to_string())
        );
    }

    #[test]
    fn test_clear_current_cell() {
        let mut app = sample_app();
        app.clear_current_cell();
        assert_eq!(app.core.dataset.value_at(CellRef::new(0, 0)), &Value::Empty);
    }

    #[test]
    fn test_dialog_search_and_replace_all() {
        let mut app = sample_app();
        app.open_find_dialog(true);
        {
            let dialog = app.find_dialog.as_mut().unwrap();
            dialog.term = "a".to_string();
            dialog.replacement = "X".to_string();
            dialog.case_sensitive = true;
        }
        app.dialog_search();
        assert!(!app.core.search.matches.is_empty());
        app.dialog_replace_all();
        assert_eq!(app.status_message, "Replaced in 2 cells");
        assert_eq!(
            app.core.dataset.value_at(CellRef::new(0, 0)),
            &Value::Text("XdX".to_string())
        );
        assert_eq!(
            app.core.dataset.value_at(CellRef::new(1, 0)),
            &Value::Text("grXce".to_string())
        );
    }

    #[test]
    fn test_replace_all_without_matches_is_neutral() {
        let mut app = sample_app();
        app.open_find_dialog(true);
        app.find_dialog.as_mut().unwrap().term = "zzz".to_string();
        app.dialog_replace_all();
        assert_eq!(app.status_message, "No matches");
    }

    #[test]
    fn test_command_add_and_delete_row() {
        let mut app = sample_app();
        app.command_buffer = "addrow".to_string();
        app.execute_command();
        assert_eq!(app.core.dataset.row_count(), 4);
        assert_eq!(app.core.dataset.value(3, "age"), &Value::Number(0.0));

        app.command_buffer = "deleterow 4".to_string();
        app.execute_command();
        assert_eq!(app.core.dataset.row_count(), 3);
    }

    #[test]
    fn test_command_add_and_delete_variable() {
        let mut app = sample_app();
        app.command_buffer = "addvar".to_string();
        app.execute_command();
        assert_eq!(app.core.dataset.column_count(), 3);
        assert!(app.core.variable("VAR3").is_some());

        app.command_buffer = "dc VAR3".to_string();
        app.execute_command();
        assert_eq!(app.core.dataset.column_count(), 2);
    }

    #[test]
    fn test_quit_requires_force_when_modified() {
        let mut app = sample_app();
        app.core.edit_cell(CellRef::new(0, 0), "x").unwrap();
        app.command_buffer = "q".to_string();
        assert!(!app.execute_command());
        assert!(app.status_message.contains("Unsaved changes"));
        app.command_buffer = "q!".to_string();
        assert!(app.execute_command());
    }

    #[test]
    fn test_goto_command() {
        let mut app = sample_app();
        app.command_buffer = "goto 3 age".to_string();
        app.execute_command();
        assert_eq!(app.cursor(), Some(CellRef::new(2, 1)));
        app.command_buffer = "goto 99".to_string();
        app.execute_command();
        assert_eq!(app.status_message, "Row out of range");
    }

    #[test]
    fn test_var_attr_edit_applies() {
        let mut app = sample_app();
        app.view = View::Variables;
        app.var_row = 0; // "name"
        app.var_attr = 1; // Type
        app.enter_edit_mode();
        assert_eq!(app.mode, Mode::Edit);
        app.var_edit.as_mut().unwrap().pending = "date".to_string();
        app.commit_edit();
        assert_eq!(app.core.variable("name").unwrap().var_type, VarType::Date);
    }

    #[test]
    fn test_var_attr_invalid_input_is_rejected() {
        let mut app = sample_app();
        app.view = View::Variables;
        app.var_attr = 8; // Measure
        app.enter_edit_mode();
        app.var_edit.as_mut().unwrap().pending = "banana".to_string();
        app.commit_edit();
        assert!(app.status_message.starts_with("Error:"));
        // Inferred measure is untouched.
        assert_eq!(app.core.variable("name").unwrap().measure, Measure::Nominal);
    }

    #[test]
    fn test_var_value_labels_parse() {
        let mut app = sample_app();
        app.view = View::Variables;
        app.var_row = 1; // "age"
        app.var_attr = 5; // Values
        app.enter_edit_mode();
        app.var_edit.as_mut().unwrap().pending = "1=young; 2=old".to_string();
        app.commit_edit();
        let var = app.core.variable("age").unwrap();
        assert_eq!(var.value_labels.get("1").map(String::as_str), Some("young"));
        assert_eq!(app.var_attr_text("age", 5), "1=young; 2=old");
    }

    #[test]
    fn test_var_name_is_read_only() {
        let mut app = sample_app();
        app.view = View::Variables;
        app.var_attr = 0;
        app.enter_edit_mode();
        assert_eq!(app.mode, Mode::Normal);
        assert!(app.var_edit.is_none());
    }

    #[test]
    fn test_viewport_follows_cursor() {
        let mut app = sample_app();
        app.visible_rows = 2;
        app.core.select(CellRef::new(2, 0));
        app.update_viewport();
        assert_eq!(app.viewport_row, 1);
        app.core.select(CellRef::new(0, 0));
        app.update_viewport();
        assert_eq!(app.viewport_row, 0);
    }

    #[test]
    fn test_export_filename_default() {
        let mut app = sample_app();
        let target = std::env::temp_dir().join(format!(
            "dataview_export_{}_{:?}.csv",
            std::process::id(),
            std::thread::current().id(),
        ));
        struct Cleanup(std::path::PathBuf);
        impl Drop for Cleanup {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        let _cleanup = Cleanup(target.clone());

        app.export_csv(Some(target.to_str().unwrap()));
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.starts_with("name,age\n"));
        assert_eq!(export_filename("people.csv"), "people_edited.csv");
    }

    #[test]
    fn test_save_roundtrip_clears_modified() {
        let mut app = sample_app();
        let target = std::env::temp_dir().join(format!(
            "dataview_save_{}_{:?}.csv",
            std::process::id(),
            std::thread::current().id(),
        ));
        struct Cleanup(std::path::PathBuf);
        impl Drop for Cleanup {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.0);
            }
        }
        let _cleanup = Cleanup(target.clone());

        app.core.edit_cell(CellRef::new(0, 0), "edith").unwrap();
        assert!(app.core.modified);
        app.file_path = Some(target.clone());
        app.save_file();
        assert!(!app.core.modified);
        let written = std::fs::read_to_string(&target).unwrap();
        assert!(written.contains("edith"));
    }
}
