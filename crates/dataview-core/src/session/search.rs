//! Find and replace over the whole dataset.
//!
//! Matching is plain substring containment over stringified cells, scanned
//! row-major. Replacement goes through a regex built from the escaped
//! literal term, so metacharacters in the term never act as patterns, and
//! the replacement text is inserted without expansion.

use regex::{NoExpand, Regex};

use super::Session;
use crate::dataset::CellRef;
use crate::error::Result;

/// The last search and its results.
#[derive(Clone, Debug, Default)]
pub struct SearchState {
    pub term: String,
    pub case_sensitive: bool,
    /// Matching cells in row-major scan order.
    pub matches: Vec<CellRef>,
    /// Index into `matches`; navigation cycles with wraparound.
    pub current: usize,
}

impl SearchState {
    pub fn clear_matches(&mut self) {
        self.matches.clear();
        self.current = 0;
    }

    /// The cell at the current match index.
    pub fn current_match(&self) -> Option<CellRef> {
        self.matches.get(self.current).copied()
    }
}

impl Session {
    /// Scan the dataset and rebuild the match list, resetting the current
    /// match to the first. An empty term yields zero matches, which is a
    /// neutral outcome rather than an error. Returns the match count.
    pub fn find(&mut self, term: &str, case_sensitive: bool) -> usize {
        self.search.term = term.to_string();
        self.search.case_sensitive = case_sensitive;
        self.search.current = 0;
        self.search.matches.clear();

        if term.is_empty() {
            return 0;
        }

        let folded_term = if case_sensitive {
            term.to_string()
        } else {
            term.to_lowercase()
        };
        for row in 0..self.dataset.row_count() {
            for col in 0..self.dataset.column_count() {
                let cell = CellRef::new(row, col);
                let text = self.dataset.value_at(cell).display();
                let hit = if case_sensitive {
                    text.contains(&folded_term)
                } else {
                    text.to_lowercase().contains(&folded_term)
                };
                if hit {
                    self.search.matches.push(cell);
                }
            }
        }
        self.search.matches.len()
    }

    /// Advance to the next match, wrapping at the end.
    pub fn next_match(&mut self) -> Option<CellRef> {
        if self.search.matches.is_empty() {
            return None;
        }
        self.search.current = (self.search.current + 1) % self.search.matches.len();
        self.search.current_match()
    }

    /// Step back to the previous match, wrapping at the start.
    pub fn prev_match(&mut self) -> Option<CellRef> {
        let len = self.search.matches.len();
        if len == 0 {
            return None;
        }
        self.search.current = (self.search.current + len - 1) % len;
        self.search.current_match()
    }

    /// Replace the first occurrence of the term in the cell at the current
    /// match only. Returns whether a cell changed. The match list is
    /// refreshed afterwards, keeping the position at the first match at or
    /// after the replaced cell.
    pub fn replace_current(&mut self, replacement: &str) -> Result<bool> {
        let Some(cell) = self.search.current_match() else {
            return Ok(false);
        };
        let pattern = self.literal_pattern()?;
        let text = self.dataset.value_at(cell).display();
        let replaced = pattern.replace(&text, NoExpand(replacement));
        if replaced == text {
            return Ok(false);
        }
        let replaced = replaced.into_owned();
        self.edit_cell(cell, &replaced)?;
        self.refind_from(cell);
        Ok(true)
    }

    /// Replace every occurrence of the term in every currently matching
    /// cell, in one pass. Returns the number of cells changed (not the
    /// number of occurrences), then re-runs the search so the match list
    /// never reflects a stale dataset. Zero changes is a neutral outcome.
    pub fn replace_all(&mut self, replacement: &str) -> Result<usize> {
        if self.search.term.is_empty() || self.search.matches.is_empty() {
            return Ok(0);
        }
        let pattern = self.literal_pattern()?;
        let cells: Vec<CellRef> = self.search.matches.clone();
        let mut changed = 0;
        for cell in cells {
            let text = self.dataset.value_at(cell).display();
            let replaced = pattern.replace_all(&text, NoExpand(replacement));
            if replaced != text {
                let replaced = replaced.into_owned();
                self.edit_cell(cell, &replaced)?;
                changed += 1;
            }
        }
        let term = self.search.term.clone();
        self.find(&term, self.search.case_sensitive);
        Ok(changed)
    }

    /// Re-run the current search and park the match index on the first
    /// match at or after `cell` in scan order.
    fn refind_from(&mut self, cell: CellRef) {
        let term = self.search.term.clone();
        self.find(&term, self.search.case_sensitive);
        let at = self
            .search
            .matches
            .iter()
            .position(|m| (m.row, m.col) >= (cell.row, cell.col));
        self.search.current = at.unwrap_or(0);
    }

    /// Regex matching the search term literally: metacharacters escaped,
    /// case folding applied via the `(?i)` flag.
    fn literal_pattern(&self) -> Result<Regex> {
        let mut pattern = String::new();
        if !self.search.case_sensitive {
            pattern.push_str("(?i)");
        }
        pattern.push_str(&regex::escape(&self.search.term));
        Ok(Regex::new(&pattern)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{Dataset, Row};
    use crate::value::Value;

    fn session_with(cells: &[&[&str]]) -> Session {
        let columns: Vec<String> = (0..cells[0].len()).map(|i| format!("c{}", i)).collect();
        let rows = cells
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .zip(row.iter())
                    .map(|(col, text)| {
                        let value = if text.is_empty() {
                            Value::Empty
                        } else {
                            Value::Text(text.to_string())
                        };
                        (col.clone(), value)
                    })
                    .collect::<Row>()
            })
            .collect();
        Session::new(Dataset::new("t.csv", columns, rows))
    }

    #[test]
    fn test_find_scans_row_major() {
        let mut s = session_with(&[&["x", "ax"], &["xa", "y"]]);
        assert_eq!(s.find("x", true), 3);
        assert_eq!(
            s.search.matches,
            vec![CellRef::new(0, 0), CellRef::new(0, 1), CellRef::new(1, 0)]
        );
        assert_eq!(s.search.current, 0);
    }

    #[test]
    fn test_case_insensitive_matches_both_cases() {
        let mut s = session_with(&[&["Smith"], &["smith"], &["SMITH"], &["Jones"]]);
        assert_eq!(s.find("Smith", false), 3);
        assert_eq!(s.find("Smith", true), 1);
        assert_eq!(s.search.matches, vec![CellRef::new(0, 0)]);
    }

    #[test]
    fn test_literal_dot_is_not_a_wildcard() {
        let mut s = session_with(&[&["a.b"], &["axb"]]);
        assert_eq!(s.find("a.b", true), 1);
        assert_eq!(s.search.matches, vec![CellRef::new(0, 0)]);
        // Replacement is literal on both sides too.
        s.replace_current("a$1b").unwrap();
        assert_eq!(
            s.dataset.value_at(CellRef::new(0, 0)),
            &Value::Text("a$1b".to_string())
        );
        assert_eq!(
            s.dataset.value_at(CellRef::new(1, 0)),
            &Value::Text("axb".to_string())
        );
    }

    #[test]
    fn test_empty_term_is_neutral() {
        let mut s = session_with(&[&["anything"]]);
        assert_eq!(s.find("", true), 0);
        assert!(s.search.matches.is_empty());
        assert_eq!(s.replace_all("x").unwrap(), 0);
        assert_eq!(s.next_match(), None);
        assert_eq!(s.prev_match(), None);
    }

    #[test]
    fn test_match_navigation_cycles_with_wraparound() {
        let mut s = session_with(&[&["a"], &["a"], &["a"]]);
        s.find("a", true);
        assert_eq!(s.next_match(), Some(CellRef::new(1, 0)));
        assert_eq!(s.next_match(), Some(CellRef::new(2, 0)));
        assert_eq!(s.next_match(), Some(CellRef::new(0, 0)));
        assert_eq!(s.prev_match(), Some(CellRef::new(2, 0)));
    }

    #[test]
    fn test_replace_all_counts_cells_not_occurrences() {
        let mut s = session_with(&[&["banana"], &["apple"]]);
        s.find("a", true);
        let changed = s.replace_all("X").unwrap();
        assert_eq!(changed, 2);
        assert_eq!(
            s.dataset.value_at(CellRef::new(0, 0)),
            &Value::Text("bXnXnX".to_string())
        );
        assert_eq!(
            s.dataset.value_at(CellRef::new(1, 0)),
            &Value::Text("Xpple".to_string())
        );
    }

    #[test]
    fn test_replace_all_refreshes_match_list() {
        let mut s = session_with(&[&["aaa", "bbb"], &["aba", "ccc"]]);
        s.find("a", true);
        assert_eq!(s.search.matches.len(), 2);
        s.replace_all("z").unwrap();
        assert!(s.search.matches.is_empty());

        // Replacement that still matches keeps the refreshed list accurate.
        let mut s = session_with(&[&["cat"], &["catalog"]]);
        s.find("cat", true);
        s.replace_all("cart").unwrap();
        assert_eq!(s.find("cart", true), 2);
    }

    #[test]
    fn test_replace_all_zero_changes_is_neutral() {
        let mut s = session_with(&[&["abc"]]);
        s.find("zzz", true);
        assert_eq!(s.replace_all("x").unwrap(), 0);
    }

    #[test]
    fn test_replace_current_first_occurrence_only() {
        let mut s = session_with(&[&["banana"]]);
        s.find("an", true);
        assert!(s.replace_current("AN").unwrap());
        assert_eq!(
            s.dataset.value_at(CellRef::new(0, 0)),
            &Value::Text("bANana".to_string())
        );
    }

    #[test]
    fn test_replace_current_respects_case_flag() {
        let mut s = session_with(&[&["Banana"]]);
        s.find("ban", false);
        assert!(s.replace_current("x").unwrap());
        assert_eq!(
            s.dataset.value_at(CellRef::new(0, 0)),
            &Value::Text("xana".to_string())
        );

        let mut s = session_with(&[&["Banana"]]);
        assert_eq!(s.find("ban", true), 0);
        assert!(!s.replace_current("x").unwrap());
    }

    #[test]
    fn test_replace_current_advances_to_following_match() {
        let mut s = session_with(&[&["a"], &["a"], &["a"]]);
        s.find("a", true);
        s.replace_current("b").unwrap();
        // First cell no longer matches; the index parks on the next one.
        assert_eq!(s.search.matches.len(), 2);
        assert_eq!(s.search.current_match(), Some(CellRef::new(1, 0)));
    }

    #[test]
    fn test_replacement_goes_through_type_conversion() {
        // A numeric column whose cell text is rewritten to digits stays
        // numeric instead of degrading to text.
        let columns = vec!["n".to_string()];
        let rows = vec![
            Row::from([("n".to_string(), Value::Number(12.0))]),
            Row::from([("n".to_string(), Value::Number(120.0))]),
        ];
        let mut s = Session::new(Dataset::new("t.csv", columns, rows));
        s.find("12", true);
        let changed = s.replace_all("13").unwrap();
        assert_eq!(changed, 2);
        assert_eq!(s.dataset.value_at(CellRef::new(0, 0)), &Value::Number(13.0));
        assert_eq!(
            s.dataset.value_at(CellRef::new(1, 0)),
            &Value::Number(130.0)
        );
    }
}
