//! Static help text for the help modal.

use super::keymap::Keymap;

pub fn get_about_help() -> Vec<String> {
    vec![
        "About Dataview".to_string(),
        "".to_string(),
        "  An SPSS-style data editor for the terminal: load a CSV or JSON".to_string(),
        "  dataset, edit cells and variable metadata, find and replace".to_string(),
        "  across the grid, and export the result as CSV.".to_string(),
        "".to_string(),
        "  The Data view shows the grid; the Variable view (V) shows one".to_string(),
        "  row per column with its type, label, width, decimals, missing".to_string(),
        "  tokens, alignment, measurement level and role.".to_string(),
    ]
}

pub fn get_help_text(keymap: &Keymap) -> Vec<String> {
    let mut lines = vec!["Keys".to_string()];
    match keymap {
        Keymap::Default => {
            lines.extend(
                [
                    "  Arrows / hjkl     Move the selection (clamped at the edges)",
                    "  Tab / Shift-Tab   Move across columns",
                    "  Enter / i         Edit the selected cell; Enter commits",
                    "  Esc               Cancel the edit or close a dialog",
                    "  C-f               Find",
                    "  C-h               Find & replace",
                    "  n / N             Next / previous match",
                    "  x / Delete        Clear the selected cell",
                    "  y / p             Copy / paste the cell via the clipboard",
                    "  + / -             Widen / narrow the selected column",
                    "  V                 Toggle the variable view",
                    "  C-s               Save",
                    "  :                 Command prompt",
                    "  ?                 This help",
                ]
                .map(String::from),
            );
        }
        Keymap::Custom(custom) => {
            for binding in custom
                .bindings
                .normal
                .iter()
                .chain(custom.bindings.edit.iter())
                .chain(custom.bindings.command.iter())
            {
                lines.push(format!(
                    "  {:<17} {:?}",
                    binding.combo.display(),
                    binding.action
                ));
            }
        }
    }
    lines
}

pub fn get_commands_help() -> Vec<String> {
    vec![
        "Commands".to_string(),
        "  :w [path]         Save (CSV) to the current or given path".to_string(),
        "  :wq               Save and quit".to_string(),
        "  :q / :q!          Quit / quit discarding changes".to_string(),
        "  :export [path]    Export to <name>_edited.csv or the given path".to_string(),
        "  :addrow           Append a row (numeric columns start at 0)".to_string(),
        "  :deleterow [n]    Delete row n (default: the selected row)".to_string(),
        "  :addvar           Append a variable (VAR{count+1})".to_string(),
        "  :dc [name]        Delete a variable".to_string(),
        "  :goto ROW [COL]   Jump to a cell".to_string(),
        "  :colwidth [c] w   Set a column's display width".to_string(),
        "  :find TEXT        Search (case-insensitive)".to_string(),
        "  :vars / :data     Switch views".to_string(),
        "  :help             This help".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_help_mentions_spec_shortcuts() {
        let lines = get_help_text(&Keymap::Default).join("\n");
        assert!(lines.contains("C-f"));
        assert!(lines.contains("C-h"));
        assert!(lines.contains("Tab"));
    }

    #[test]
    fn test_commands_help_lists_structural_ops() {
        let lines = get_commands_help().join("\n");
        assert!(lines.contains(":addrow"));
        assert!(lines.contains(":addvar"));
        assert!(lines.contains(":export"));
    }
}
