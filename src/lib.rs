//! Flattens nested JSON, XML and YAML documents into relational tables and
//! writes them as XLSX worksheets.
//!
//! # Input types
//!
//! - `json`: any JSON document whose root is an object.
//! - `xml`: the root element becomes the single top-level key. Attributes are
//!   stored as `@name` fields, the text of elements with attributes or
//!   children as `#text`, and repeated child elements become lists.
//! - `yml`: any YAML document whose root is a mapping.
//!
//! # Output
//!
//! One worksheet per table, ordered by table path. Cell A1 holds the table
//! path (the document's first key on the root sheet), column C the row numbers (header `nr`) and the columns start at D.
//! Worksheet names are the registered table label or the path shortened to
//! 31 characters.
//!
//! ```rust
//! use datatoexcel_rs::convert::prepare_sheets;
//! use datatoexcel_rs::flatten::FlattenOptions;
//! use datatoexcel_rs::naming::NamingRegistry;
//! use datatoexcel_rs::parser::json::JsonParser;
//!
//! # fn main() -> anyhow::Result<()> {
//! let document = JsonParser::new().parse(r#"{"name": "A", "children": ["x", "y", "z"]}"#)?;
//! let sheets = prepare_sheets(document, &NamingRegistry::default(), &FlattenOptions::default())?;
//!
//! assert_eq!(sheets[0].table.name(), "ROOT");
//! assert_eq!(sheets[0].object_name, "name");
//! assert_eq!(sheets[1].object_name, "children");
//! assert_eq!(sheets[1].table.row_count(), 3);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod convert;
pub mod document;
pub mod flatten;
pub mod generator;
pub mod naming;
pub mod parser;
pub mod table;

pub use convert::{prepare_sheets, SheetView};
pub use document::{Scalar, Value};
pub use flatten::{EmptyTablePolicy, FlattenOptions, Flattener, Tables};
pub use naming::{create_short_name, NamingRegistry};
pub use table::{Cell, Column, Table};
