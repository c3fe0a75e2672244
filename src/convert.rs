use crate::document::Value;
use crate::flatten::{FlattenError, FlattenOptions, Flattened, Flattener};
use crate::naming::NamingRegistry;
use crate::table::Table;

/// A flattened table together with the labels it is shown with.
///
/// The labels never change the table itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetView {
    /// Worksheet name: the registered table label or the shortened path.
    pub display_name: String,
    /// Object name written to cell A1: the raw path name, or the document's
    /// first key for the root table.
    pub object_name: String,
    /// One header per column, in column order.
    pub column_labels: Vec<String>,
    pub table: Table,
}

impl SheetView {
    pub fn new(table: Table, registry: &NamingRegistry) -> Self {
        let object_name = table.name().to_string();
        let column_labels = table
            .columns()
            .iter()
            .map(|c| registry.column_display_name(&c.name))
            .collect();
        SheetView {
            display_name: registry.table_display_name(&object_name),
            object_name,
            column_labels,
            table,
        }
    }
}

/// Flattens a document and returns one view per table, ordered by raw path
/// name, with rows numbered from 1.
pub fn prepare_sheets(
    document: Value,
    registry: &NamingRegistry,
    options: &FlattenOptions,
) -> Result<Vec<SheetView>, FlattenError> {
    let document_name = document
        .as_object()
        .and_then(|fields| fields.keys().next().cloned());
    let Flattened { root_name, tables } = Flattener::new(options.clone()).flatten_document(document)?;

    let sheets = tables
        .into_values()
        .map(|mut table| {
            table.reindex_from_one();
            let is_root = table.name() == root_name;
            let mut view = SheetView::new(table, registry);
            if let (true, Some(name)) = (is_root, &document_name) {
                view.object_name = name.clone();
            }
            view
        })
        .collect();
    Ok(sheets)
}
