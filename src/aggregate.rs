use log::debug;

use std::collections::HashMap;

use crate::{
    amount::Amount,
    config::ColumnMapping,
    error::{Error, Result},
    report::{Report, Totals},
    table::{Cell, Table},
};

/// How many products the report lists.
pub const TOP_PRODUCTS: usize = 5;

/// Computes the line total (`quantity * price`) for every row, stores it as
/// the `total_sum` column, and sums it per manager and per product.
///
/// Both groupings are sorted by total, largest first; groups with equal
/// totals keep the order in which they first appear in `table`. Only the
/// [`TOP_PRODUCTS`] best-selling products are kept. Rows whose manager (or
/// product) cell is empty are left out of that grouping.
///
/// # Errors
///
/// Returns [`Error::InvalidNumericValue`] if a quantity or price is not a
/// number, and [`Error::MissingColumn`] if a mapped column is absent.
pub fn aggregate(table: &mut Table, mapping: &ColumnMapping) -> Result<Report> {
    let line_totals = line_totals(table, mapping)?;
    table.set_column(
        &mapping.total_sum,
        line_totals.into_iter().map(|t| Cell::Number(t.value())).collect(),
    );

    let managers = group_totals(table, &mapping.manager, &mapping.total_sum)?;
    let mut top_products = group_totals(table, &mapping.product_name, &mapping.total_sum)?;
    top_products.rows.truncate(TOP_PRODUCTS);
    debug!(
        "aggregated {} rows into {} managers, top {} products",
        table.len(),
        managers.rows.len(),
        top_products.rows.len()
    );
    Ok(Report {
        managers,
        top_products,
    })
}

fn column_index(table: &Table, name: &str) -> Result<usize> {
    table.column_index(name).ok_or_else(|| Error::MissingColumn {
        column: name.to_string(),
    })
}

fn line_totals(table: &Table, mapping: &ColumnMapping) -> Result<Vec<Amount>> {
    let qty = column_index(table, &mapping.quantity)?;
    let price = column_index(table, &mapping.price)?;
    table
        .rows()
        .iter()
        .enumerate()
        .map(|(i, row)| -> Result<Amount> {
            let number = |idx: usize, column: &str| {
                row[idx]
                    .as_number()
                    .map(Amount::new)
                    .ok_or_else(|| Error::InvalidNumericValue {
                        column: column.to_string(),
                        row: i + 1,
                        value: row[idx].to_string(),
                    })
            };
            Ok(number(qty, mapping.quantity.as_str())? * number(price, mapping.price.as_str())?)
        })
        .collect()
}

fn group_totals(table: &Table, key_column: &str, value_column: &str) -> Result<Totals> {
    let key = column_index(table, key_column)?;
    let value = column_index(table, value_column)?;
    let mut rows: Vec<(String, Amount)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in table.rows() {
        if row[key].is_empty() {
            continue;
        }
        let amount = Amount::new(row[value].as_number().unwrap_or_default());
        let name = row[key].to_string();
        match positions.get(&name) {
            Some(&pos) => rows[pos].1 += amount,
            None => {
                positions.insert(name.clone(), rows.len());
                rows.push((name, amount));
            }
        }
    }
    // Stable, so equal totals stay in first-seen order.
    rows.sort_by(|a, b| a.1.cmp_descending(&b.1));
    Ok(Totals {
        key_label: key_column.to_string(),
        value_label: value_column.to_string(),
        rows,
    })
}
