//! Session state: one dataset plus all the interactive editing state that
//! surrounds it.
//!
//! A [`Session`] is the single owner of the dataset, the variable registry,
//! the selection, the in-flight edit and the match list. Every mutation is
//! a method call that returns a [`Change`] descriptor, so a renderer can
//! repaint exactly what moved. There are no hidden globals.

use std::collections::HashMap;

use crate::dataset::{CellRef, Dataset, Row};
use crate::layout::ColumnLayout;
use crate::variable::Variable;

use super::search::SearchState;

/// Which part of the grid a mutation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Change {
    /// Nothing observable changed.
    None,
    /// A single cell changed.
    Cell(CellRef),
    /// One row changed or was appended.
    Row(usize),
    /// Everything may have moved (structural mutation).
    All,
}

/// An in-flight cell edit. At most one exists per session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditState {
    pub cell: CellRef,
    /// Text being edited; applied on commit, discarded on cancel.
    pub pending: String,
}

/// Owned copy of the final data handed to the save callback. The caller
/// owns persistence; the session never writes this anywhere itself.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub variables: HashMap<String, Variable>,
}

/// One editing session over one dataset.
pub struct Session {
    pub dataset: Dataset,
    /// Per-column metadata, inferred once at load and user-editable after.
    pub variables: HashMap<String, Variable>,
    /// The active cell, if any. Unset until something selects one.
    pub selection: Option<CellRef>,
    /// The in-flight edit; mutually exclusive with navigation.
    pub editing: Option<EditState>,
    pub search: SearchState,
    pub layout: ColumnLayout,
    /// Whether the dataset differs from what was loaded or last saved.
    pub modified: bool,
}

impl Session {
    /// Open a session over a loaded dataset, inferring every column's
    /// variable from its values.
    pub fn new(dataset: Dataset) -> Self {
        let variables = dataset
            .columns()
            .iter()
            .map(|name| (name.clone(), Variable::infer(name, dataset.column_values(name))))
            .collect();
        let layout = ColumnLayout::seeded(dataset.columns());

        Session {
            dataset,
            variables,
            selection: None,
            editing: None,
            search: SearchState::default(),
            layout,
            modified: false,
        }
    }

    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.get(name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut Variable> {
        self.variables.get_mut(name)
    }

    /// Column name of the current selection.
    pub fn selected_column(&self) -> Option<&str> {
        self.dataset.column_name(self.selection?.col)
    }

    /// Variable of the currently selected column.
    pub fn selected_variable(&self) -> Option<&Variable> {
        self.variables.get(self.selected_column()?)
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Immutable copy of the final rows and variable map for the caller to
    /// persist however it likes.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            name: self.dataset.name().to_string(),
            columns: self.dataset.columns().to_vec(),
            rows: self.dataset.rows().to_vec(),
            variables: self.variables.clone(),
        }
    }
}
