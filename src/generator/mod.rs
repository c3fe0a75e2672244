//! Output generators.
//!
//! Generators take the prepared sheet views and render them into an XLSX
//! workbook.

pub mod xlsx_tables;

pub use xlsx_tables::{XlsxTablesGenerator, XlsxTablesGeneratorOptions};
