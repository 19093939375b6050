//! Plain-text tables and JSON rendering for command results.

use serde::Serialize;

use stockroom_core::{InventoryError, InventoryResult, LocationId};
use stockroom_inventory::{Location, Stock, StockMovement};
use stockroom_products::Product;

/// Left-aligned text table with a header row.
#[derive(Debug)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<&'static str>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn render(&self) -> String {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.len()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(w) = widths.get_mut(i) {
                    *w = (*w).max(cell.chars().count());
                }
            }
        }

        let mut out = vec![line(self.headers.iter().copied(), &widths)];
        for row in &self.rows {
            out.push(line(row.iter().map(String::as_str), &widths));
        }
        out.join("\n")
    }
}

fn line<'a>(cells: impl Iterator<Item = &'a str>, widths: &[usize]) -> String {
    cells
        .zip(widths)
        .map(|(c, &w)| format!("{c:<w$}"))
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

fn location_cell(id: Option<LocationId>) -> String {
    id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Pretty JSON, or the text produced by `table`.
pub fn render<T: Serialize + ?Sized>(
    json: bool,
    value: &T,
    table: impl FnOnce() -> Table,
) -> InventoryResult<String> {
    if json {
        serde_json::to_string_pretty(value)
            .map_err(|e| InventoryError::internal(format!("failed to encode output: {e}")))
    } else {
        Ok(table().render())
    }
}

pub fn products(rows: &[Product]) -> Table {
    let mut t = Table::new(vec!["ID", "SKU", "NAME", "PRICE", "DESCRIPTION"]);
    for p in rows {
        t.row(vec![
            p.id.to_string(),
            p.sku.to_string(),
            p.name.clone(),
            p.price.to_string(),
            p.description.clone().unwrap_or_default(),
        ]);
    }
    t
}

pub fn locations(rows: &[Location]) -> Table {
    let mut t = Table::new(vec!["ID", "NAME", "CREATED"]);
    for l in rows {
        t.row(vec![l.id.to_string(), l.name.clone(), l.created_at.to_rfc3339()]);
    }
    t
}

pub fn stock(rows: &[Stock]) -> Table {
    let mut t = Table::new(vec!["PRODUCT", "LOCATION", "QUANTITY", "UPDATED"]);
    for s in rows {
        t.row(vec![
            s.product_id.to_string(),
            s.location_id.to_string(),
            s.quantity.to_string(),
            s.updated_at.to_rfc3339(),
        ]);
    }
    t
}

pub fn movements(rows: &[StockMovement]) -> Table {
    let mut t = Table::new(vec!["ID", "TYPE", "PRODUCT", "FROM", "TO", "QUANTITY", "AT"]);
    for m in rows {
        t.row(vec![
            m.id.to_string(),
            m.movement_type.to_string(),
            m.product_id.to_string(),
            location_cell(m.from_location_id),
            location_cell(m.to_location_id),
            m.quantity.to_string(),
            m.created_at.to_rfc3339(),
        ]);
    }
    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_padded_to_the_widest_cell() {
        let mut t = Table::new(vec!["NAME", "QTY"]);
        t.row(vec!["WH-01".into(), "5".into()]);
        t.row(vec!["A".into(), "120".into()]);
        assert_eq!(t.render(), "NAME   QTY\nWH-01  5\nA      120");
    }

    #[test]
    fn json_mode_ignores_the_table() {
        let out = render(true, &vec![1, 2], || panic!("table built in json mode")).unwrap();
        assert_eq!(out, "[\n  1,\n  2\n]");
    }
}
