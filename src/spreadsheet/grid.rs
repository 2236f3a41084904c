use crate::helpers::text::is_blank;
use crate::spreadsheet::cell::cell_text;
use calamine::Data;
use calamine::Range;

/// One worksheet rendered as a rectangular table of cell texts.
///
/// Row and column 0 always correspond to cell A1, regardless of where the
/// used range of the sheet starts. Blank cells are empty strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Grid {
    /// Source file the sheet was read from
    pub source: String,
    /// Sheet name
    pub sheet: String,
    rows: Vec<Vec<String>>,
    width: usize,
}

impl Grid {
    /// Builds a grid from explicit rows, padding short rows with blanks.
    pub fn from_rows(source: &str, sheet: &str, rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            source: source.to_owned(),
            sheet: sheet.to_owned(),
            rows,
            width,
        }
    }

    /// Builds a grid from a workbook range, keeping absolute cell positions.
    pub(crate) fn from_range(source: &str, sheet: &str, range: &Range<Data>) -> Self {
        let (Some(start), Some(end)) = (range.start(), range.end()) else {
            return Self::from_rows(source, sheet, Vec::new());
        };
        let (row_offset, column_offset) = (start.0 as usize, start.1 as usize);
        let height = end.0 as usize + 1;
        let width = end.1 as usize + 1;

        let mut rows = vec![vec![String::new(); width]; height];
        for (row, column, value) in range.used_cells() {
            if let Some(cell) = rows
                .get_mut(row_offset + row)
                .and_then(|cells| cells.get_mut(column_offset + column))
            {
                *cell = cell_text(value);
            }
        }
        Self {
            source: source.to_owned(),
            sheet: sheet.to_owned(),
            rows,
            width,
        }
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns all cells of a row, blanks included.
    pub fn row(&self, row: usize) -> Option<&[String]> {
        self.rows.get(row).map(Vec::as_slice)
    }

    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .map(String::as_str)
    }

    /// Returns the non-blank cells of a row, trimmed, in column order.
    pub fn non_blank(&self, row: usize) -> Vec<&str> {
        self.row(row)
            .unwrap_or_default()
            .iter()
            .filter(|cell| !is_blank(cell))
            .map(|cell| cell.trim())
            .collect()
    }

    /// A row is blank when none of its cells carries any text.
    pub fn is_blank_row(&self, row: usize) -> bool {
        self.row(row)
            .map(|cells| cells.iter().all(|cell| is_blank(cell)))
            .unwrap_or(true)
    }

    /// All cells of a row joined with `|` and lowercased, the form marker phrases are searched in.
    pub fn joined_lowercase(&self, row: usize) -> String {
        self.row(row)
            .map(|cells| cells.join("|").to_lowercase())
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Builds a grid from string slices, for tests across the crate.
    pub(crate) fn grid(rows: &[&[&str]]) -> Grid {
        let rows = rows
            .iter()
            .map(|row| row.iter().map(|cell| (*cell).to_owned()).collect())
            .collect();
        Grid::from_rows("test.xlsx", "Sheet1", rows)
    }

    #[test]
    fn pad_rows_to_rectangle() {
        let grid = grid(&[&["a"], &["b", "c", "d"], &[]]);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.row(0).unwrap(), &["a", "", ""]);
        assert_eq!(grid.cell(1, 2), Some("d"));
        assert_eq!(grid.cell(5, 0), None);
    }

    #[test]
    fn non_blank_cells() {
        let grid = grid(&[&["", " Продавец: ", "  ", "ООО Ромашка", "(2)"], &["", " "]]);
        assert_eq!(grid.non_blank(0), vec!["Продавец:", "ООО Ромашка", "(2)"]);
        assert!(grid.non_blank(1).is_empty());
        assert!(grid.is_blank_row(1));
        assert!(!grid.is_blank_row(0));
        assert!(grid.is_blank_row(10));
    }

    #[test]
    fn joined_row() {
        let grid = grid(&[&["Счет-фактура №", "", "15"]]);
        assert_eq!(grid.joined_lowercase(0), "счет-фактура №||15");
    }

    #[test]
    fn range_keeps_absolute_positions() {
        let mut range = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("А".to_owned()));
        range.set_value((3, 2), Data::Float(5.0));
        let grid = Grid::from_range("book.xlsx", "Лист1", &range);

        assert_eq!(grid.height(), 4);
        assert_eq!(grid.width(), 3);
        assert_eq!(grid.cell(2, 1), Some("А"));
        assert_eq!(grid.cell(3, 2), Some("5"));
        assert!(grid.is_blank_row(0));
    }
}
