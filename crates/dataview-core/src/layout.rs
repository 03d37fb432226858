//! Column display widths and the resize drag gesture.
//!
//! Widths are measured in character cells. Exactly one column may be in a
//! resize drag at a time; ending the gesture always clears the drag target,
//! wherever the cursor happens to be.

use std::collections::HashMap;

/// Narrowest a column can be dragged or set.
pub const MIN_COLUMN_WIDTH: u16 = 4;
/// Widest a column can be set explicitly. Drags are only clamped below.
pub const MAX_COLUMN_WIDTH: u16 = 50;

/// Tuned widths for commonly seen field names; anything else falls back to
/// a name-length heuristic.
const FIELD_DEFAULTS: &[(&str, u16)] = &[
    ("id", 6),
    ("age", 6),
    ("sex", 6),
    ("year", 6),
    ("score", 8),
    ("group", 8),
    ("value", 10),
    ("date", 12),
    ("name", 16),
    ("label", 16),
    ("email", 24),
];

/// State of an in-flight resize gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResizeDrag {
    pub column: String,
    pub start_x: u16,
    pub start_width: u16,
}

#[derive(Clone, Debug, Default)]
pub struct ColumnLayout {
    widths: HashMap<String, u16>,
    drag: Option<ResizeDrag>,
}

/// Default width for a column name: the static table first, then
/// `name length + 2` clamped to 8..=20.
pub fn default_width(name: &str) -> u16 {
    let lower = name.to_lowercase();
    for (field, width) in FIELD_DEFAULTS {
        if lower == *field {
            return *width;
        }
    }
    (name.len() as u16 + 2).clamp(8, 20)
}

impl ColumnLayout {
    pub fn seeded(columns: &[String]) -> Self {
        let widths = columns
            .iter()
            .map(|name| (name.clone(), default_width(name)))
            .collect();
        ColumnLayout { widths, drag: None }
    }

    pub fn width(&self, column: &str) -> u16 {
        match self.widths.get(column) {
            Some(w) => *w,
            None => default_width(column),
        }
    }

    pub fn set_width(&mut self, column: &str, width: u16) {
        let width = width.clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH);
        self.widths.insert(column.to_string(), width);
    }

    pub fn add_column(&mut self, column: &str) {
        self.widths
            .insert(column.to_string(), default_width(column));
    }

    pub fn remove_column(&mut self, column: &str) {
        self.widths.remove(column);
        // A drag on a column that no longer exists cannot continue.
        if self.drag.as_ref().is_some_and(|d| d.column == column) {
            self.drag = None;
        }
    }

    /// Begin a resize gesture. Ignored while another column is resizing:
    /// the drag target is exclusive.
    pub fn begin_resize(&mut self, column: &str, x: u16) {
        if self.drag.is_some() {
            return;
        }
        self.drag = Some(ResizeDrag {
            column: column.to_string(),
            start_x: x,
            start_width: self.width(column),
        });
    }

    /// Apply cursor motion to the dragged column. Returns the column that
    /// changed width, if a drag is active.
    pub fn update_resize(&mut self, x: u16) -> Option<String> {
        let drag = self.drag.as_ref()?;
        let delta = x as i32 - drag.start_x as i32;
        let width = (drag.start_width as i32 + delta).max(MIN_COLUMN_WIDTH as i32) as u16;
        let column = drag.column.clone();
        self.widths.insert(column.clone(), width);
        Some(column)
    }

    /// End the gesture. Always clears the drag target, regardless of where
    /// the cursor ended up.
    pub fn end_resize(&mut self) {
        self.drag = None;
    }

    pub fn resizing(&self) -> Option<&ResizeDrag> {
        self.drag.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_width_table_and_fallback() {
        assert_eq!(default_width("id"), 6);
        assert_eq!(default_width("Email"), 24);
        assert_eq!(default_width("x"), 8);
        assert_eq!(default_width("treatment_arm"), 15);
        assert_eq!(default_width("a_far_too_long_column_name"), 20);
    }

    #[test]
    fn test_set_width_clamps() {
        let mut layout = ColumnLayout::default();
        layout.set_width("a", 2);
        assert_eq!(layout.width("a"), MIN_COLUMN_WIDTH);
        layout.set_width("a", 200);
        assert_eq!(layout.width("a"), MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_drag_grows_and_shrinks() {
        let mut layout = ColumnLayout::default();
        layout.set_width("age", 10);
        layout.begin_resize("age", 40);
        assert_eq!(layout.update_resize(45).as_deref(), Some("age"));
        assert_eq!(layout.width("age"), 15);
        assert_eq!(layout.update_resize(37).as_deref(), Some("age"));
        assert_eq!(layout.width("age"), 7);
        layout.end_resize();
        assert!(layout.resizing().is_none());
    }

    #[test]
    fn test_drag_clamps_at_minimum() {
        let mut layout = ColumnLayout::default();
        layout.set_width("age", 6);
        layout.begin_resize("age", 100);
        layout.update_resize(0);
        assert_eq!(layout.width("age"), MIN_COLUMN_WIDTH);
    }

    #[test]
    fn test_drag_target_is_exclusive() {
        let mut layout = ColumnLayout::default();
        layout.begin_resize("a", 10);
        layout.begin_resize("b", 20);
        assert_eq!(layout.resizing().map(|d| d.column.as_str()), Some("a"));
    }

    #[test]
    fn test_end_resize_is_unconditional() {
        let mut layout = ColumnLayout::default();
        // Ending without a drag is a no-op, not a panic.
        layout.end_resize();
        layout.begin_resize("a", 10);
        // No motion at all; release still clears the target.
        layout.end_resize();
        assert!(layout.resizing().is_none());
    }

    #[test]
    fn test_update_without_drag_is_noop() {
        let mut layout = ColumnLayout::default();
        assert_eq!(layout.update_resize(55), None);
    }

    #[test]
    fn test_remove_column_cancels_its_drag() {
        let mut layout = ColumnLayout::default();
        layout.begin_resize("doomed", 10);
        layout.remove_column("doomed");
        assert!(layout.resizing().is_none());
    }
}
