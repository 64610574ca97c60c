//! Per-column filter and sort applied to the result a tab is showing.
//!
//! The underlying `ResultSet` is never touched; the view only decides which
//! row indices are shown and in which order.

use std::collections::BTreeMap;

use crate::result::{ResultSet, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultView {
    /// Column index → lower-cased filter text.
    filters: BTreeMap<usize, String>,
    /// Only one column sorts at a time.
    sort: Option<(usize, SortOrder)>,
}

impl ResultView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose `column` contains `text` (case-insensitive). Empty text
    /// removes the filter.
    pub fn set_filter(&mut self, column: usize, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            self.filters.remove(&column);
        } else {
            self.filters.insert(column, text.to_lowercase());
        }
    }

    pub fn filter(&self, column: usize) -> Option<&str> {
        self.filters.get(&column).map(String::as_str)
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }

    pub fn sort(&self) -> Option<(usize, SortOrder)> {
        self.sort
    }

    /// Unsorted → ascending → descending → unsorted. Selecting another column
    /// starts again at ascending.
    pub fn cycle_sort(&mut self, column: usize) {
        self.sort = match self.sort {
            Some((c, SortOrder::Ascending)) if c == column => {
                Some((column, SortOrder::Descending))
            }
            Some((c, SortOrder::Descending)) if c == column => None,
            _ => Some((column, SortOrder::Ascending)),
        };
    }

    pub fn reset_sort(&mut self) {
        self.sort = None;
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.sort = None;
    }

    /// Indices of the rows to show, filtered then sorted.
    pub fn visible_rows(&self, result: &ResultSet) -> Vec<usize> {
        let mut rows: Vec<usize> = (0..result.rows.len())
            .filter(|&i| self.matches(&result.rows[i]))
            .collect();
        if let Some((column, order)) = self.sort {
            rows.sort_by(|&a, &b| {
                let ord = cell(result, a, column).sort_cmp(cell(result, b, column));
                match order {
                    SortOrder::Ascending => ord,
                    SortOrder::Descending => ord.reverse(),
                }
            });
        }
        rows
    }

    fn matches(&self, row: &[Value]) -> bool {
        self.filters.iter().all(|(&column, needle)| {
            row.get(column)
                .map(|v| v.to_string().to_lowercase().contains(needle.as_str()))
                .unwrap_or(false)
        })
    }

    /// Header text with sort and filter markers.
    pub fn header_label(&self, column: usize, name: &str) -> String {
        let mut label = name.to_string();
        match self.sort {
            Some((c, SortOrder::Ascending)) if c == column => label.push_str(" ▲"),
            Some((c, SortOrder::Descending)) if c == column => label.push_str(" ▼"),
            _ => {}
        }
        if self.filters.contains_key(&column) {
            label.push_str(" *");
        }
        label
    }
}

fn cell(result: &ResultSet, row: usize, column: usize) -> &Value {
    result.rows[row].get(column).unwrap_or(&Value::Null)
}
