use crate::document::{Scalar, Value};
use indexmap::IndexMap;
use thiserror::Error;

/// Represents errors raised when a table operation would break its shape.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TableError {
    #[error("column \"{column}\" already exists in table \"{table}\"")]
    DuplicateColumn { table: String, column: String },
    #[error("column \"{column}\" does not exist in table \"{table}\"")]
    UnknownColumn { table: String, column: String },
    #[error("column \"{column}\" has {found} cells but table \"{table}\" has {expected} rows")]
    LengthMismatch {
        table: String,
        column: String,
        expected: usize,
        found: usize,
    },
}

/// A single cell of a table.
///
/// List cells only exist while the flattening engine has not reached its
/// fixed point.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Scalar(Scalar),
    List(Vec<Value>),
}

impl Cell {
    pub fn null() -> Self {
        Cell::Scalar(Scalar::Null)
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Cell::List(_))
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Cell::Scalar(s) => Some(s),
            Cell::List(_) => None,
        }
    }
}

macro_rules! cell_from_scalar {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Cell {
                fn from(v: $t) -> Self {
                    Cell::Scalar(v.into())
                }
            }
        )*
    };
}

cell_from_scalar!(&str, String, i64, f64, bool);

impl From<Scalar> for Cell {
    fn from(s: Scalar) -> Self {
        Cell::Scalar(s)
    }
}

/// A named column and its cells, one per row.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub cells: Vec<Cell>,
}

impl Column {
    pub fn new(name: &str, cells: Vec<Cell>) -> Self {
        Column {
            name: name.to_string(),
            cells,
        }
    }

    pub fn has_list_cells(&self) -> bool {
        self.cells.iter().any(Cell::is_list)
    }
}

/// A flat table identified by its path name.
///
/// All columns always hold exactly `row_count` cells. The row count is kept
/// separately so a table whose columns were all expanded away still knows
/// how many rows it had.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    row_count: usize,
    first_row_number: usize,
}

impl Table {
    /// Creates a new table without columns or rows.
    pub fn new(name: &str) -> Self {
        Table {
            name: name.to_string(),
            columns: Vec::new(),
            row_count: 0,
            first_row_number: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Returns true when any cell still holds a list.
    pub fn has_list_cells(&self) -> bool {
        self.columns.iter().any(Column::has_list_cells)
    }

    /// Appends a column.
    ///
    /// The first column of a table without columns fixes the row count.
    pub fn add_column(&mut self, name: &str, cells: Vec<Cell>) -> Result<(), TableError> {
        if self.column(name).is_some() {
            return Err(TableError::DuplicateColumn {
                table: self.name.clone(),
                column: name.to_string(),
            });
        }
        if self.columns.is_empty() {
            self.row_count = cells.len();
        } else if cells.len() != self.row_count {
            return Err(TableError::LengthMismatch {
                table: self.name.clone(),
                column: name.to_string(),
                expected: self.row_count,
                found: cells.len(),
            });
        }
        self.columns.push(Column::new(name, cells));
        Ok(())
    }

    /// Removes a column with all of its cells. The row count is unchanged.
    pub fn remove_column(&mut self, name: &str) -> Result<Column, TableError> {
        let position = self.position(name)?;
        Ok(self.columns.remove(position))
    }

    pub fn rename_column(&mut self, old: &str, new: &str) -> Result<(), TableError> {
        if old == new {
            return self.position(old).map(|_| ());
        }
        if self.column(new).is_some() {
            return Err(TableError::DuplicateColumn {
                table: self.name.clone(),
                column: new.to_string(),
            });
        }
        let position = self.position(old)?;
        self.columns[position].name = new.to_string();
        Ok(())
    }

    /// Appends one row given as field name → cell.
    ///
    /// Columns missing from the record receive a null cell; fields that are
    /// not yet columns become new columns, back-filled with nulls for the
    /// rows that came before.
    pub fn append_row(&mut self, record: IndexMap<String, Cell>) {
        let mut record = record;
        for column in self.columns.iter_mut() {
            let cell = record.shift_remove(&column.name).unwrap_or_else(Cell::null);
            column.cells.push(cell);
        }
        for (name, cell) in record {
            let mut cells = vec![Cell::null(); self.row_count];
            cells.push(cell);
            self.columns.push(Column { name, cells });
        }
        self.row_count += 1;
    }

    /// Returns the cells of row `index` (0-based) in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Cell>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.cells[index]).collect())
    }

    /// Renumbers the rows so the first row is number 1.
    pub fn reindex_from_one(&mut self) {
        self.first_row_number = 1;
    }

    /// Display numbers of the rows, in order.
    pub fn row_numbers(&self) -> std::ops::Range<usize> {
        self.first_row_number..self.first_row_number + self.row_count
    }

    fn position(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| TableError::UnknownColumn {
                table: self.name.clone(),
                column: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, Cell)]) -> IndexMap<String, Cell> {
        fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_add_column() {
        let mut table = Table::new("t");
        table
            .add_column("a", vec![Cell::from(1i64), Cell::from(2i64)])
            .unwrap();
        assert_eq!(table.row_count(), 2);

        assert_eq!(
            table.add_column("b", vec![Cell::from(1i64)]).unwrap_err(),
            TableError::LengthMismatch {
                table: "t".to_string(),
                column: "b".to_string(),
                expected: 2,
                found: 1,
            }
        );
        assert_eq!(
            table
                .add_column("a", vec![Cell::null(), Cell::null()])
                .unwrap_err(),
            TableError::DuplicateColumn {
                table: "t".to_string(),
                column: "a".to_string(),
            }
        );
    }

    #[test]
    fn test_append_row_union_of_fields() {
        let mut table = Table::new("items");
        table.append_row(record(&[("x", Cell::from(1i64))]));
        table.append_row(record(&[("y", Cell::from("b")), ("x", Cell::from(2i64))]));
        table.append_row(record(&[]));

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.column_names(), vec!["x", "y"]);
        assert_eq!(
            table.column("x").unwrap().cells,
            vec![Cell::from(1i64), Cell::from(2i64), Cell::null()]
        );
        assert_eq!(
            table.column("y").unwrap().cells,
            vec![Cell::null(), Cell::from("b"), Cell::null()]
        );
        assert!(table.columns().iter().all(|c| c.cells.len() == 3));
    }

    #[test]
    fn test_remove_column_keeps_rows() {
        let mut table = Table::new("t");
        table.append_row(record(&[("a", Cell::from(1i64))]));
        let removed = table.remove_column("a").unwrap();
        assert_eq!(removed.name, "a");
        assert_eq!(table.column_count(), 0);
        assert_eq!(table.row_count(), 1);
        assert!(matches!(
            table.remove_column("a"),
            Err(TableError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_rename_column() {
        let mut table = Table::new("t");
        table.append_row(record(&[("a", Cell::from(1i64)), ("b", Cell::from(2i64))]));
        table.rename_column("a", "alpha").unwrap();
        assert_eq!(table.column_names(), vec!["alpha", "b"]);
        assert!(table.rename_column("alpha", "b").is_err());
        assert!(table.rename_column("zzz", "c").is_err());
    }

    #[test]
    fn test_row_access_and_list_detection() {
        let mut table = Table::new("t");
        table.append_row(record(&[
            ("a", Cell::from("x")),
            ("tags", Cell::List(vec![Value::from("p")])),
        ]));
        assert!(table.has_list_cells());
        assert_eq!(table.row(0).unwrap()[0], &Cell::from("x"));
        assert!(table.row(1).is_none());
        table.remove_column("tags").unwrap();
        assert!(!table.has_list_cells());
    }

    #[test]
    fn test_reindex_is_idempotent() {
        let mut table = Table::new("t");
        table.append_row(record(&[("a", Cell::from(1i64))]));
        table.append_row(record(&[("a", Cell::from(2i64))]));
        assert_eq!(table.row_numbers().collect::<Vec<_>>(), vec![0, 1]);

        table.reindex_from_one();
        let once = table.clone();
        assert_eq!(table.row_numbers().collect::<Vec<_>>(), vec![1, 2]);

        table.reindex_from_one();
        assert_eq!(table, once);
    }
}
