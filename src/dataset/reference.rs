//! Loading of auxiliary reference datasets (code lists, external reports).

use crate::dataset::csv::read_csv;
use crate::dataset::table::Table;
use crate::error::{ResultMessage, UpdError};
use crate::helpers::text::to_value;
use crate::spreadsheet::{Grid, Spreadsheet};
use std::path::Path;
use tracing::info;

/// Loads a reference file: CSV as is, spreadsheets from the named (or first) sheet.
/// The first row is the header in both cases.
pub fn load_reference(path: &Path, sheet: Option<&str>, fallback_code_page: u16) -> Result<Table, UpdError> {
    let name = path.to_string_lossy().to_string();
    let is_csv = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);

    let table = if is_csv {
        read_csv(path, fallback_code_page).with_prefix(&name)?
    } else {
        let grid = Spreadsheet::open(path)
            .and_then(|mut spreadsheet| spreadsheet.open_sheet_or_first(&name, sheet))
            .map_err(UpdError::from)
            .with_prefix(&name)?;
        grid_to_table(&grid)
    };
    info!("Loaded reference '{}': {} rows, {} columns", name, table.len(), table.columns.len());
    Ok(table)
}

/// Interprets a grid as a header row followed by data rows. Blank rows are skipped.
pub(crate) fn grid_to_table(grid: &Grid) -> Table {
    let name = format!("{}:{}", grid.source, grid.sheet);
    let Some(header) = grid.row(0) else {
        return Table::default().named(&name);
    };
    let columns = header
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let label = label.trim();
            if label.is_empty() {
                format!("Unnamed: {}", index)
            } else {
                label.to_owned()
            }
        })
        .collect();

    let mut table = Table::new(columns).named(&name);
    for row in 1..grid.height() {
        if grid.is_blank_row(row) {
            continue;
        }
        if let Some(cells) = grid.row(row) {
            table.push_row(cells.iter().map(|cell| to_value(cell)).collect());
        }
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::tests::{columns, row};
    use crate::spreadsheet::grid::tests::grid;

    #[test]
    fn header_and_rows_from_grid() {
        let grid = grid(&[
            &["Код", "", "Ставка"],
            &["123", "x", ""],
            &["", "", ""],
            &["456", "", "20"],
        ]);
        let table = grid_to_table(&grid);

        assert_eq!(table.columns, columns(&["Код", "Unnamed: 1", "Ставка"]));
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], row(&[Some("123"), Some("x"), None]));
        assert_eq!(table.rows[1], row(&[Some("456"), None, Some("20")]));
    }

    #[test]
    fn load_csv_reference() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("report.CSV");
        std::fs::write(&path, "Номер без разделителей,Клиент\nСФ001,Иванов\n").unwrap();

        let table = load_reference(&path, None, 1251).unwrap();
        assert_eq!(table.value(0, "Клиент"), Some("Иванов"));
    }

    #[test]
    fn fail_on_missing_reference() {
        assert!(load_reference(Path::new("missing/tnved.xlsx"), None, 1251).is_err());
    }
}
