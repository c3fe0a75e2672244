//! The flattening engine.
//!
//! A document is first projected into a single-row root table. Every
//! list-valued field of that row becomes its own table. After that, passes
//! are repeated until no table holds a list-valued cell: each list cell is
//! turned into a child table named `<table>.<column><row>` and the column it
//! came from is dropped from its parent.

use crate::document::{DocumentError, Value};
use crate::table::{Cell, Table, TableError};
use clap::ValueEnum;
use indexmap::IndexMap;
use std::collections::BTreeMap;
use thiserror::Error;

/// Name of the root table when the document has no single object-valued key.
pub const ROOT_TABLE_NAME: &str = "ROOT";

/// Flattened tables keyed by their path name. Iteration is in path order.
pub type Tables = BTreeMap<String, Table>;

/// The result of flattening one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Flattened {
    /// Path name given to the root table. The root table itself may have
    /// been omitted when it ended up without columns.
    pub root_name: String,
    pub tables: Tables,
}

/// Represents errors that can occur while flattening a document.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FlattenError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("list for table \"{table}\" (column \"{column}\") contains nested lists")]
    NestedList { table: String, column: String },
    #[error("list for table \"{table}\" (column \"{column}\") mixes scalars and objects")]
    MixedList { table: String, column: String },
    #[error("table \"{0}\" is derived more than once")]
    DuplicateTable(String),
}

/// What to do with tables that end up without any column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum EmptyTablePolicy {
    /// Leave them out of the result.
    #[default]
    Omit,
    /// Keep them as tables without columns.
    Emit,
}

#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    pub empty_tables: EmptyTablePolicy,
}

pub struct Flattener {
    options: FlattenOptions,
}

impl Flattener {
    pub fn new(options: FlattenOptions) -> Self {
        Flattener { options }
    }

    /// Flattens a document into tables that no longer contain lists.
    ///
    /// The document root must be an object.
    pub fn flatten(&self, document: Value) -> Result<Tables, FlattenError> {
        self.flatten_document(document).map(|flattened| flattened.tables)
    }

    /// Same as [`Flattener::flatten`], also reporting the root table name.
    pub fn flatten_document(&self, document: Value) -> Result<Flattened, FlattenError> {
        let fields = document.into_root_object()?;
        let preferred = root_table_name(&fields);

        let (root_name, mut tables) = split_first_level(&preferred, fields)?;
        let mut pass = 0;
        loop {
            pass += 1;
            let (expanded, next) = expand_pass(tables)?;
            tables = next;
            if expanded == 0 {
                break;
            }
            log::debug!("pass {}: expanded {} list cells", pass, expanded);
        }
        log::debug!("fixed point reached after {} passes, {} tables", pass, tables.len());

        if self.options.empty_tables == EmptyTablePolicy::Omit {
            tables.retain(|name, table| {
                let keep = table.column_count() > 0;
                if !keep {
                    log::debug!("omitting table \"{}\" without columns", name);
                }
                keep
            });
        }
        Ok(Flattened { root_name, tables })
    }
}

/// The document's only key if it holds an object, `ROOT` otherwise.
fn root_table_name(fields: &IndexMap<String, Value>) -> String {
    match fields.iter().next() {
        Some((key, Value::Object(_))) if fields.len() == 1 => key.clone(),
        _ => ROOT_TABLE_NAME.to_string(),
    }
}

/// Projects an object into one record. Nested objects become dotted column
/// names; lists are kept as list cells.
fn normalize_record(prefix: &str, fields: IndexMap<String, Value>, record: &mut IndexMap<String, Cell>) {
    for (key, value) in fields {
        let column = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            Value::Scalar(s) => {
                record.insert(column, Cell::Scalar(s));
            }
            Value::List(items) => {
                record.insert(column, Cell::List(items));
            }
            Value::Object(nested) => normalize_record(&column, nested, record),
        }
    }
}

/// Picks a root name that no first-level list column uses.
///
/// Derived names always contain a dot, so only first-level tables can
/// collide with a dotless root name.
fn unique_root_name(preferred: &str, record: &IndexMap<String, Cell>) -> String {
    let taken = |name: &str| matches!(record.get(name), Some(Cell::List(_)));
    let mut name = preferred.to_string();
    let mut suffix = 0;
    while taken(&name) {
        suffix += 1;
        name = format!("{}_{}", preferred, suffix);
    }
    if suffix > 0 {
        log::debug!("root table renamed to \"{}\": \"{}\" is a list field", name, preferred);
    }
    name
}

fn split_first_level(
    preferred: &str,
    fields: IndexMap<String, Value>,
) -> Result<(String, Tables), FlattenError> {
    let mut record = IndexMap::new();
    normalize_record("", fields, &mut record);
    let root_name = unique_root_name(preferred, &record);

    let mut tables = Tables::new();
    let mut root_record = IndexMap::new();
    for (column, cell) in record {
        match cell {
            Cell::List(items) => {
                let table = list_to_table(&column, &column, items)?;
                insert_table(&mut tables, table)?;
            }
            scalar => {
                root_record.insert(column, scalar);
            }
        }
    }

    let mut root = Table::new(&root_name);
    root.append_row(root_record);
    insert_table(&mut tables, root)?;
    Ok((root_name, tables))
}

/// Builds the table for one list.
///
/// Scalars give a single column named `column`, objects give one row each
/// with the union of their projected fields. An empty list gives a table
/// without columns.
fn list_to_table(name: &str, column: &str, items: Vec<Value>) -> Result<Table, FlattenError> {
    let has_list = items.iter().any(|v| matches!(v, Value::List(_)));
    let has_object = items.iter().any(|v| matches!(v, Value::Object(_)));
    let has_scalar = items.iter().any(|v| matches!(v, Value::Scalar(_)));

    if has_list {
        return Err(FlattenError::NestedList {
            table: name.to_string(),
            column: column.to_string(),
        });
    }
    if has_object && has_scalar {
        return Err(FlattenError::MixedList {
            table: name.to_string(),
            column: column.to_string(),
        });
    }

    let mut table = Table::new(name);
    if has_scalar {
        let cells = items
            .into_iter()
            .filter_map(|v| match v {
                Value::Scalar(s) => Some(Cell::Scalar(s)),
                _ => None,
            })
            .collect();
        table.add_column(column, cells)?;
    } else {
        for item in items {
            if let Value::Object(fields) = item {
                let mut record = IndexMap::new();
                normalize_record("", fields, &mut record);
                table.append_row(record);
            }
        }
    }
    Ok(table)
}

/// Runs one expansion pass and returns how many list cells it expanded,
/// together with the new set of tables.
fn expand_pass(tables: Tables) -> Result<(usize, Tables), FlattenError> {
    let mut next = Tables::new();
    let mut expanded = 0;

    for (name, mut table) in tables {
        let list_columns: Vec<String> = table
            .columns()
            .iter()
            .filter(|c| c.has_list_cells())
            .map(|c| c.name.clone())
            .collect();

        for column_name in list_columns {
            let column = table.remove_column(&column_name)?;
            for (index, cell) in column.cells.into_iter().enumerate() {
                if let Cell::List(items) = cell {
                    let child_name = format!("{}.{}{}", name, column_name, index + 1);
                    let child = list_to_table(&child_name, &column_name, items)?;
                    insert_table(&mut next, child)?;
                    expanded += 1;
                }
            }
        }
        insert_table(&mut next, table)?;
    }
    Ok((expanded, next))
}

fn insert_table(tables: &mut Tables, table: Table) -> Result<(), FlattenError> {
    let name = table.name().to_string();
    if tables.contains_key(&name) {
        return Err(FlattenError::DuplicateTable(name));
    }
    tables.insert(name, table);
    Ok(())
}
