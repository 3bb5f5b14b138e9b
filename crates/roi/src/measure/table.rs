use std::io;
use std::path::Path;

use csv::Writer;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoiError};

/// Values of one named column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Column {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Numeric(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, row: usize) -> Option<Cell> {
        match self {
            Self::Numeric(values) => values.get(row).copied().map(Cell::Numeric),
            Self::Text(values) => values.get(row).cloned().map(Cell::Text),
        }
    }

    fn push(&mut self, cell: Cell) {
        match (self, cell) {
            (Self::Numeric(values), Cell::Numeric(value)) => values.push(value),
            (Self::Numeric(values), Cell::Text(text)) => values.push(text.trim().parse().unwrap_or(f64::NAN)),
            (Self::Text(values), cell) => values.push(cell.to_string()),
        }
    }

    fn pad_to(&mut self, rows: usize) {
        match self {
            Self::Numeric(values) => values.resize(rows, f64::NAN),
            Self::Text(values) => values.resize(rows, String::new()),
        }
    }
}

/// A single table value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Numeric(f64),
    Text(String),
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Numeric(value) => write!(f, "{value}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Self::Numeric(value)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Ordered table of named, typed columns.
///
/// Rows missing a column are padded with `NaN` or an empty string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultsTable {
    columns: Vec<(String, Column)>,
    rows: usize,
}

impl ResultsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, column)| column)
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|(n, _)| n == name)
    }

    /// Adds an empty numeric column unless one with that name exists
    pub fn add_numeric_column(&mut self, name: &str) {
        if self.column_index(name).is_none() {
            self.columns.push((name.to_string(), Column::Numeric(vec![f64::NAN; self.rows])));
        }
    }

    /// Adds an empty text column unless one with that name exists
    pub fn add_text_column(&mut self, name: &str) {
        if self.column_index(name).is_none() {
            self.columns.push((name.to_string(), Column::Text(vec![String::new(); self.rows])));
        }
    }

    /// Appends a row. Unknown columns are created with the type of their
    /// first cell.
    pub fn add_row<N, C>(&mut self, cells: impl IntoIterator<Item = (N, C)>)
    where
        N: AsRef<str>,
        C: Into<Cell>,
    {
        for (name, cell) in cells {
            let cell = cell.into();
            let index = match self.column_index(name.as_ref()) {
                Some(index) => index,
                None => {
                    match cell {
                        Cell::Numeric(_) => self.add_numeric_column(name.as_ref()),
                        Cell::Text(_) => self.add_text_column(name.as_ref()),
                    }
                    self.columns.len() - 1
                }
            };
            let column = &mut self.columns[index].1;
            // repeated names within one row keep the first value
            if column.len() == self.rows {
                column.push(cell);
            }
        }
        self.rows += 1;
        for (_, column) in &mut self.columns {
            column.pad_to(self.rows);
        }
    }

    /// Appends every row of `other`, matching columns by name
    pub fn append(&mut self, other: &ResultsTable) {
        for row in 0..other.rows {
            let cells: Vec<(&str, Cell)> = other
                .columns
                .iter()
                .filter_map(|(name, column)| column.cell(row).map(|cell| (name.as_str(), cell)))
                .collect();
            self.add_row(cells);
        }
    }

    pub fn cell(&self, name: &str, row: usize) -> Option<Cell> {
        self.column(name).and_then(|column| column.cell(row))
    }

    pub fn numeric(&self, name: &str, row: usize) -> Option<f64> {
        match self.column(name)? {
            Column::Numeric(values) => values.get(row).copied(),
            Column::Text(_) => None,
        }
    }

    pub fn text(&self, name: &str, row: usize) -> Option<&str> {
        match self.column(name)? {
            Column::Text(values) => values.get(row).map(String::as_str),
            Column::Numeric(_) => None,
        }
    }

    fn write_records<W: io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_record(self.column_names())?;
        for row in 0..self.rows {
            let record: Vec<String> = self
                .columns
                .iter()
                .map(|(_, column)| column.cell(row).map(|cell| cell.to_string()).unwrap_or_default())
                .collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// The table as CSV text with a header row
    pub fn to_csv(&self) -> Result<String> {
        let mut writer = Writer::from_writer(Vec::new());
        self.write_records(&mut writer)?;
        let bytes = writer.into_inner().map_err(|err| RoiError::Io(err.into_error()))?;
        String::from_utf8(bytes).map_err(|err| RoiError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut writer = Writer::from_path(path)?;
        self.write_records(&mut writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded() {
        let mut table = ResultsTable::new();
        table.add_row([("Name", Cell::from("a")), ("Area", Cell::from(4.0))]);
        table.add_row([("Area", Cell::from(9.0)), ("Mean", Cell::from(1.5))]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names().collect::<Vec<_>>(), vec!["Name", "Area", "Mean"]);
        assert_eq!(table.text("Name", 1), Some(""));
        assert!(table.numeric("Mean", 0).unwrap().is_nan());
        assert_eq!(table.numeric("Area", 1), Some(9.0));
    }

    #[test]
    fn append_matches_columns_by_name() {
        let mut a = ResultsTable::new();
        a.add_row([("Area", 1.0), ("Mean", 2.0)]);
        let mut b = ResultsTable::new();
        b.add_row([("Mean", 5.0), ("Max", 7.0)]);
        a.append(&b);
        assert_eq!(a.row_count(), 2);
        assert_eq!(a.numeric("Mean", 1), Some(5.0));
        assert!(a.numeric("Area", 1).unwrap().is_nan());
        assert_eq!(a.numeric("Max", 1), Some(7.0));
    }

    #[test]
    fn csv_output() {
        let mut table = ResultsTable::new();
        table.add_row([("Name", Cell::from("cell, 1")), ("Area", Cell::from(2.5))]);
        assert_eq!(table.to_csv().unwrap(), "Name,Area\n\"cell, 1\",2.5\n");
    }
}
