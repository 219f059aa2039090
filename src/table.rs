//! Abstract tabular records exchanged with the engine.
//!
//! A [`Table`] is a header row plus uniformly shaped rows of [`Cell`]s.
//! Decoding from and encoding to files happens in [`crate::engine`]; the
//! filter and aggregation stages only ever see this representation.

use crate::amount::Amount;
use crate::error::{EngineError, Result};
use std::fmt;

/// A single value in a table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Missing or blank value.
    #[default]
    Empty,

    /// Text exactly as supplied (or trimmed, after normalization).
    Text(String),

    /// Numeric value produced by normalization or aggregation.
    Number(Amount),
}

impl Cell {
    /// Builds a cell from raw text, mapping the empty string to [`Cell::Empty`].
    pub fn from_raw(raw: &str) -> Self {
        if raw.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Returns the cell as text, or `None` if it is empty.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Cell::Empty => None,
            Cell::Text(s) => Some(s.clone()),
            Cell::Number(n) => Some(n.to_string()),
        }
    }

    /// Returns the cell as an amount; text is coerced and empty is zero.
    pub fn to_amount(&self) -> Amount {
        match self {
            Cell::Empty => Amount::ZERO,
            Cell::Text(s) => Amount::coerce(s),
            Cell::Number(n) => *n,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::from_raw(value)
    }
}

impl From<Amount> for Cell {
    fn from(value: Amount) -> Self {
        Cell::Number(value)
    }
}

/// A header row plus data rows.
///
/// # Invariants
///
/// - Every row has exactly `columns.len()` cells (enforced by [`Table::push_row`])
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the given header.
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Builds a table from string rows, mostly useful in tests and fixtures.
    pub fn from_rows<'a, R: AsRef<[&'a str]>>(columns: &[&str], rows: &[R]) -> Self {
        let mut table = Table::new(columns.iter().copied());
        for row in rows {
            table.push_row(row.as_ref().iter().map(|raw| Cell::from_raw(raw)).collect());
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Appends a row, padding with empty cells or truncating to the header width.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), Cell::Empty);
        self.rows.push(row);
    }

    /// Position of a column, if present.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Position of a column that an active rule depends on.
    pub fn require_column(&self, dataset: &'static str, name: &str) -> Result<usize> {
        self.find_column(name).ok_or_else(|| EngineError::MissingColumn {
            dataset,
            column: name.to_string(),
        })
    }

    /// Returns the cell at `row`, `column`, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&Cell> {
        let idx = self.find_column(column)?;
        self.rows.get(row).and_then(|r| r.get(idx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_raw_maps_empty() {
        assert_eq!(Cell::from_raw(""), Cell::Empty);
        assert_eq!(Cell::from_raw(" "), Cell::text(" "));
    }

    #[test]
    fn test_cell_to_amount() {
        assert_eq!(Cell::Empty.to_amount(), Amount::ZERO);
        assert_eq!(Cell::text("12.5").to_amount(), Amount::coerce("12.5"));
        assert_eq!(Cell::text("abc").to_amount(), Amount::ZERO);
        assert_eq!(Cell::Number(Amount::from(3)).to_amount(), Amount::from(3));
    }

    #[test]
    fn test_push_row_normalizes_width() {
        let mut table = Table::new(["a", "b", "c"]);
        table.push_row(vec![Cell::text("1")]);
        table.push_row(vec![
            Cell::text("1"),
            Cell::text("2"),
            Cell::text("3"),
            Cell::text("4"),
        ]);

        assert_eq!(table.rows()[0].len(), 3);
        assert_eq!(table.rows()[0][2], Cell::Empty);
        assert_eq!(table.rows()[1].len(), 3);
    }

    #[test]
    fn test_require_column_reports_name() {
        let table = Table::new(["Supplier"]);
        assert_eq!(table.require_column("invoice", "Supplier").unwrap(), 0);

        let err = table.require_column("invoice", "Currency").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MissingColumn { dataset: "invoice", ref column } if column == "Currency"
        ));
    }
}
