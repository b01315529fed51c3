use std::path::Path;

use anyhow::{Context, Result};
use calamine::{Data, Reader, open_workbook_auto};
use serde::Serialize;
use serde_json::Value;

/// Parsed contents of the first worksheet: the first row as headers, the
/// remaining rows as data.
#[derive(Debug, Serialize)]
pub struct SheetData {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Read the first worksheet of an `.xls`/`.xlsx` file. The first row is the
/// header row; every following row becomes an array of JSON scalars.
pub fn parse_first_sheet(path: &Path) -> Result<SheetData> {
    let mut workbook = open_workbook_auto(path)
        .with_context(|| format!("Failed to open workbook: {}", path.display()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow::anyhow!("Workbook has no sheets: {}", path.display()))?
        .context("Failed to read first worksheet")?;

    let mut rows_iter = range.rows();

    let headers = rows_iter
        .next()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .unwrap_or_default();

    let rows = rows_iter
        .map(|row| row.iter().map(cell_to_json).collect())
        .collect();

    Ok(SheetData { headers, rows })
}

fn cell_to_json(cell: &Data) -> Value {
    match cell {
        Data::Empty => Value::Null,
        Data::String(s) => Value::String(s.clone()),
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => {
            serde_json::Number::from_f64(dt.as_f64()).map_or(Value::Null, Value::Number)
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::String(s.clone()),
        Data::Error(_) => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;

    fn write_fixture(path: &Path) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Product").unwrap();
        sheet.write_string(0, 1, "Region").unwrap();
        sheet.write_string(0, 2, "Sales").unwrap();
        sheet.write_string(1, 0, "Widget").unwrap();
        sheet.write_string(1, 1, "North").unwrap();
        sheet.write_number(1, 2, 120.0).unwrap();
        sheet.write_string(2, 0, "Gadget").unwrap();
        sheet.write_string(2, 1, "South").unwrap();
        sheet.write_number(2, 2, 80.0).unwrap();
        workbook.save(path).unwrap();
    }

    #[test]
    fn test_parse_first_sheet() {
        let path = std::env::temp_dir().join(format!("chartarr-sheet-{}.xlsx", uuid::Uuid::new_v4()));
        write_fixture(&path);

        let data = parse_first_sheet(&path).unwrap();
        assert_eq!(data.headers, vec!["Product", "Region", "Sales"]);
        assert_eq!(data.rows.len(), 2);
        assert_eq!(data.rows[0][0], Value::String("Widget".to_string()));
        assert_eq!(data.rows[0][2], Value::from(120.0));

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_parse_missing_file() {
        let path = std::env::temp_dir().join("chartarr-no-such-file.xlsx");
        assert!(parse_first_sheet(&path).is_err());
    }
}
