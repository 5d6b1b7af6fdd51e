use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Table, TableColumn, TableStyle, Workbook};

use crate::coords;
use crate::sheet::{Cell, Sheet};

/// Materialize the finished sheets into an XLSX workbook. Each sheet becomes
/// a worksheet carrying one named table over its full extent, with the
/// banded medium style and readable column widths. Formula cells are stored
/// verbatim for the spreadsheet's evaluation engine.
pub fn write_workbook(path: &Path, sheets: &[(&Sheet, &str)]) -> Result<()> {
    let mut workbook = Workbook::new();
    for (sheet, table_name) in sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name())?;
        for (c, header) in sheet.headers().iter().enumerate() {
            ws.write_string(0, c as u16, header)?;
        }
        for (r, row) in sheet.rows().iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                match cell {
                    Cell::Text(s) => ws.write_string((r + 1) as u32, c as u16, s)?,
                    Cell::Int(v) => ws.write_number((r + 1) as u32, c as u16, *v as f64)?,
                    Cell::Formula(f) => ws.write_formula((r + 1) as u32, c as u16, f.as_str())?,
                };
            }
        }
        for (c, width) in sheet.column_widths().into_iter().enumerate() {
            ws.set_column_width(c as u16, width)?;
        }
        let columns: Vec<TableColumn> = sheet
            .headers()
            .iter()
            .map(|h| TableColumn::new().set_header(h))
            .collect();
        let table = Table::new()
            .set_name(*table_name)
            .set_style(TableStyle::Medium9)
            .set_columns(&columns);
        // A table needs at least one data row, even if the sheet has none.
        let last_row = sheet.rows().len().max(1) as u32;
        let last_col = sheet.headers().len().saturating_sub(1) as u16;
        ws.add_table(0, 0, last_row, last_col, &table)?;
        log::debug!(
            "table {} bound over A1:{}",
            table_name,
            coords::cell_coord(last_col as u32, last_row)
        );
    }
    workbook
        .save(path)
        .with_context(|| format!("unable to write workbook: {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_a_workbook_with_tables_and_formulas() {
        let mut networks = Sheet::new("Wireless Networks", &["BSSID", "WPA", "WPA2"]);
        networks.append(vec![Cell::text("AA:BB:CC:DD:EE:FF"), Cell::Int(1), Cell::Int(0)]);
        let mut totals = Sheet::new("Totals", &["Data Set", "Totals"]);
        totals.append(vec![
            Cell::text("Total WPAv1"),
            Cell::Formula("=SUM(Networks[WPA])".to_string()),
        ]);
        let p = std::env::temp_dir().join("netxml2xlsx_sink_test.xlsx");
        let _ = std::fs::remove_file(&p);
        write_workbook(&p, &[(&networks, "Networks"), (&totals, "Totals")]).unwrap();
        let meta = std::fs::metadata(&p).unwrap();
        assert!(meta.len() > 0);
        let _ = std::fs::remove_file(&p);
    }

    #[test]
    fn empty_sheets_still_produce_a_valid_table_range() {
        let networks = Sheet::new("Wireless Networks", &["BSSID", "WPA", "WPA2"]);
        let p = std::env::temp_dir().join("netxml2xlsx_empty_test.xlsx");
        let _ = std::fs::remove_file(&p);
        write_workbook(&p, &[(&networks, "Networks")]).unwrap();
        let _ = std::fs::remove_file(&p);
    }
}
