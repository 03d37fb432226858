//! Session operations: selection, the edit state machine, and structural
//! mutation of the dataset.

use super::{Change, EditState, Session};
use crate::dataset::{CellRef, Row};
use crate::error::Result;
use crate::value::{Value, parses_as_number};
use crate::variable::{VarType, Variable};

impl Session {
    // ----- selection ------------------------------------------------------

    /// Select a cell. Ignored while an edit is in flight or when the cell
    /// is out of range.
    pub fn select(&mut self, cell: CellRef) -> bool {
        if self.is_editing() || !self.dataset.contains(cell) {
            return false;
        }
        self.selection = Some(cell);
        true
    }

    /// Move the selection by (dx columns, dy rows), clamped to the grid.
    /// Moving past an edge leaves the selection unchanged; there is no
    /// wraparound. With nothing selected yet, the origin is selected.
    pub fn move_selection(&mut self, dx: i32, dy: i32) -> bool {
        if self.is_editing() || self.dataset.is_empty() {
            return false;
        }
        let Some(current) = self.selection else {
            self.selection = Some(CellRef::new(0, 0));
            return true;
        };
        let max_row = self.dataset.row_count() as i32 - 1;
        let max_col = self.dataset.column_count() as i32 - 1;
        let row = (current.row as i32 + dy).clamp(0, max_row) as usize;
        let col = (current.col as i32 + dx).clamp(0, max_col) as usize;
        let moved = CellRef::new(row, col);
        if moved == current {
            return false;
        }
        self.selection = Some(moved);
        true
    }

    // ----- editing --------------------------------------------------------

    /// Begin editing the selected cell, seeding the buffer with the cell's
    /// stringified value. Requires a selection and no edit in flight.
    pub fn begin_edit(&mut self) -> bool {
        if self.is_editing() {
            return false;
        }
        let Some(cell) = self.selection else {
            return false;
        };
        self.editing = Some(EditState {
            cell,
            pending: self.dataset.value_at(cell).display(),
        });
        true
    }

    /// Commit the in-flight edit through type-aware conversion; the edited
    /// cell stays selected.
    pub fn commit_edit(&mut self) -> Result<Change> {
        let Some(edit) = self.editing.take() else {
            return Ok(Change::None);
        };
        self.edit_cell(edit.cell, &edit.pending)
    }

    /// Discard the in-flight edit without touching the dataset.
    pub fn cancel_edit(&mut self) {
        self.editing = None;
    }

    /// Write raw text into a cell. A numeric-typed column stores the
    /// parsed number when the whole text is a finite number; anything else
    /// is stored verbatim, never as NaN and never as an error. The column
    /// type is not re-inferred.
    pub fn edit_cell(&mut self, cell: CellRef, raw: &str) -> Result<Change> {
        let var_type = self
            .dataset
            .column_name(cell.col)
            .and_then(|name| self.variables.get(name))
            .map(|v| v.var_type);
        let value = convert_input(var_type, raw);
        self.dataset.set_value(cell, value)?;
        self.modified = true;
        Ok(Change::Cell(cell))
    }

    // ----- structural mutation --------------------------------------------

    /// Append a row; numeric columns start at 0, everything else empty.
    pub fn add_row(&mut self) -> Change {
        let defaults: Row = self
            .dataset
            .columns()
            .iter()
            .map(|name| {
                let value = match self.variables.get(name).map(|v| v.var_type) {
                    Some(VarType::Numeric) => Value::Number(0.0),
                    _ => Value::Empty,
                };
                (name.clone(), value)
            })
            .collect();
        let index = self.dataset.push_row(defaults);
        self.modified = true;
        // Stored match coordinates may not survive structural changes.
        self.search.clear_matches();
        Change::Row(index)
    }

    /// Remove one row; later rows shift positionally only.
    pub fn delete_row(&mut self, index: usize) -> Result<Change> {
        self.dataset.remove_row(index)?;
        self.modified = true;
        self.search.clear_matches();

        // An edit on the removed row dies with it; edits below it follow
        // their row up.
        if self.editing.as_ref().is_some_and(|e| e.cell.row == index) {
            self.editing = None;
        } else if let Some(edit) = self.editing.as_mut()
            && edit.cell.row > index
        {
            edit.cell.row -= 1;
        }

        let rows = self.dataset.row_count();
        if rows == 0 {
            self.selection = None;
        } else if let Some(sel) = self.selection.as_mut() {
            if sel.row > index {
                sel.row -= 1;
            }
            if sel.row >= rows {
                sel.row = rows - 1;
            }
        }
        Ok(Change::All)
    }

    /// Append a fresh column named `VAR{n+1}` (n = current column count)
    /// with default string/nominal metadata, back-filled empty.
    ///
    /// The name is derived from the count alone, so deleting a column and
    /// adding a new one can produce a name that is still in use; that
    /// collision is rejected rather than overwriting the survivor.
    pub fn add_column(&mut self) -> Result<Change> {
        let name = format!("VAR{}", self.dataset.column_count() + 1);
        self.dataset.add_column(&name, Value::Empty)?;
        self.variables
            .insert(name.clone(), Variable::new_default(&name));
        self.layout.add_column(&name);
        self.modified = true;
        self.search.clear_matches();
        Ok(Change::All)
    }

    /// Drop a column (by position) from every row, with its variable and
    /// its layout entry.
    pub fn delete_column(&mut self, index: usize) -> Result<Change> {
        let name = self
            .dataset
            .column_name(index)
            .ok_or_else(|| crate::error::DataviewError::UnknownColumn(format!("#{}", index)))?
            .to_string();
        self.dataset.remove_column(&name)?;
        self.variables.remove(&name);
        self.layout.remove_column(&name);
        self.modified = true;
        self.search.clear_matches();

        if self.editing.as_ref().is_some_and(|e| e.cell.col == index) {
            self.editing = None;
        } else if let Some(edit) = self.editing.as_mut()
            && edit.cell.col > index
        {
            edit.cell.col -= 1;
        }

        let cols = self.dataset.column_count();
        if cols == 0 {
            self.selection = None;
        } else if let Some(sel) = self.selection.as_mut() {
            if sel.col > index {
                sel.col -= 1;
            }
            if sel.col >= cols {
                sel.col = cols - 1;
            }
        }
        Ok(Change::All)
    }
}

/// Conversion applied whenever raw text enters a cell: empty text stores
/// the empty value; a numeric column stores the parsed number when the
/// text is one; everything else is kept verbatim.
fn convert_input(var_type: Option<VarType>, raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Empty;
    }
    if var_type == Some(VarType::Numeric)
        && let Some(n) = parses_as_number(raw)
    {
        return Value::Number(n);
    }
    Value::Text(raw.to_string())
}
