use crate::{
    config::ColumnMapping,
    error::{Error, Result},
    table::Table,
};

/// Checks that every column the report needs is present in `table`.
///
/// Columns are checked in the order given by [`ColumnMapping::required`]:
/// date, quantity, price, manager, product name. The `total_sum` column is
/// not checked, since the report creates it.
///
/// # Errors
///
/// Returns [`Error::MissingColumn`] naming the first absent column.
pub fn validate(table: &Table, mapping: &ColumnMapping) -> Result<()> {
    match mapping.required().into_iter().find(|c| !table.has_column(c)) {
        Some(column) => Err(Error::MissingColumn {
            column: column.to_string(),
        }),
        None => Ok(()),
    }
}
