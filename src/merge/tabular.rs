//! Spreadsheet row extraction
//!
//! Reads the first worksheet of an xlsx/xls/ods workbook. The first
//! non-empty row holds the column headers; every later row with at least one
//! non-empty cell becomes a `Row`.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};

use super::error::{MergeError, Result};
use super::types::Row;

/// Read all data rows of the first worksheet
pub fn read_rows(bytes: &[u8]) -> Result<Vec<Row>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| MergeError::InvalidTable(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| MergeError::InvalidTable("workbook has no worksheets".to_string()))?
        .map_err(|e| MergeError::InvalidTable(e.to_string()))?;

    let mut physical_rows = range
        .rows()
        .filter(|cells| cells.iter().any(|cell| !cell.is_empty()));

    let Some(header_cells) = physical_rows.next() else {
        tracing::debug!("First worksheet is empty");
        return Ok(Vec::new());
    };

    // Columns without a header can't be addressed by a placeholder
    let headers: Vec<(usize, String)> = header_cells
        .iter()
        .enumerate()
        .map(|(col, cell)| (col, cell_text(cell)))
        .filter(|(_, header)| !header.is_empty())
        .collect();

    let rows: Vec<Row> = physical_rows
        .map(|cells| {
            headers
                .iter()
                .map(|(col, header)| {
                    let value = cells.get(*col).map(cell_text).unwrap_or_default();
                    (header.clone(), value)
                })
                .collect()
        })
        .collect();

    tracing::debug!(columns = headers.len(), rows = rows.len(), "Read spreadsheet rows");

    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spreadsheet;
    use rust_xlsxwriter::Workbook;

    #[test]
    fn test_reads_rows_in_order() {
        let bytes = spreadsheet(&[&["name", "amount"], &["Ana", "50"], &["Ben", "75"]]);

        let rows = read_rows(&bytes).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Ana"));
        assert_eq!(rows[0].get("amount"), Some("50"));
        assert_eq!(rows[1].get("name"), Some("Ben"));
    }

    #[test]
    fn test_missing_cells_become_empty_strings() {
        let bytes = spreadsheet(&[&["name", "city", "zip"], &["Ana", "", "1000"], &["Ben"]]);

        let rows = read_rows(&bytes).unwrap();
        assert_eq!(rows[0].get("city"), Some(""));
        assert_eq!(rows[1].get("city"), Some(""));
        assert_eq!(rows[1].get("zip"), Some(""));
        assert_eq!(rows[1].len(), 3);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let bytes = spreadsheet(&[&["name"], &["Ana"], &[""], &[""], &["Ben"]]);

        let rows = read_rows(&bytes).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.get("name").unwrap()).collect();
        assert_eq!(names, vec!["Ana", "Ben"]);
    }

    #[test]
    fn test_numeric_cells_use_display_text() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "amount").unwrap();
        sheet.write_number(1, 0, 50.0).unwrap();
        sheet.write_number(2, 0, 12.5).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = read_rows(&bytes).unwrap();
        assert_eq!(rows[0].get("amount"), Some("50"));
        assert_eq!(rows[1].get("amount"), Some("12.5"));
    }

    #[test]
    fn test_only_first_sheet_is_read() {
        let mut workbook = Workbook::new();
        workbook.add_worksheet().write_string(0, 0, "first").unwrap();
        let second = workbook.add_worksheet();
        second.write_string(0, 0, "second").unwrap();
        second.write_string(1, 0, "value").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        assert!(read_rows(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_header_only_sheet_has_no_rows() {
        let bytes = spreadsheet(&[&["name", "amount"]]);
        assert!(read_rows(&bytes).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_headers_overwrite() {
        let bytes = spreadsheet(&[&["name", "name"], &["Ana", "Bea"]]);

        let rows = read_rows(&bytes).unwrap();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0].get("name"), Some("Bea"));
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let err = read_rows(b"this is not a workbook").unwrap_err();
        assert!(matches!(err, MergeError::InvalidTable(_)));
        assert!(err.is_input_error());
    }
}
