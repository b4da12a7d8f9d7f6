//! The (category, descriptor) listing shown alongside a terrain map.

use std::fmt::Write as _;

use serde::Serialize;

use crate::catalog::Catalog;
use crate::error::TerrainResult;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub category: &'static str,
    pub descriptor: &'static str,
}

/// One row per distinct selected descriptor, sorted by category.
///
/// Rows within a category keep catalog order.
pub fn selection_table<S: AsRef<str>>(
    selected: &[S],
    catalog: &Catalog,
) -> TerrainResult<Vec<TableRow>> {
    let mut rows: Vec<TableRow> = catalog
        .in_catalog_order(selected)?
        .into_iter()
        .filter_map(|name| catalog.get(name))
        .map(|d| TableRow {
            category: d.category,
            descriptor: d.name,
        })
        .collect();
    rows.sort_by_key(|row| row.category);
    Ok(rows)
}

/// Plain-text table with aligned columns.
pub fn format_table(rows: &[TableRow]) -> String {
    const CATEGORY: &str = "Category";
    const DESCRIPTOR: &str = "Descriptor";

    let width = rows
        .iter()
        .map(|row| row.category.len())
        .chain(std::iter::once(CATEGORY.len()))
        .max()
        .unwrap_or(CATEGORY.len());

    let mut out = String::new();
    let _ = writeln!(out, "{:<width$}  {}", CATEGORY, DESCRIPTOR);
    let _ = writeln!(out, "{}  {}", "-".repeat(width), "-".repeat(DESCRIPTOR.len()));
    for row in rows {
        let _ = writeln!(out, "{:<width$}  {}", row.category, row.descriptor);
    }
    out
}

pub fn table_json(rows: &[TableRow]) -> TerrainResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}
