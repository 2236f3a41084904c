use crate::config::{HeaderConfig, TableShape};
use crate::dataset::table::Table;
use crate::extraction::scanner::SheetMetadata;
use crate::extraction::segmenter::TableSegment;
use crate::extraction::ExtractionError;
use crate::helpers::text::to_value;
use crate::spreadsheet::cell::cell_position;
use crate::spreadsheet::Grid;
use tracing::debug;

/// Picks the header cells that belong to the vocabulary. A label repeated in
/// the header row is taken from its first column only.
fn header_columns(grid: &Grid, row: usize, headers: &HeaderConfig) -> Vec<(usize, String)> {
    let mut columns: Vec<(usize, String)> = Vec::new();
    for (index, cell) in grid.row(row).unwrap_or_default().iter().enumerate() {
        let label = cell.trim();
        if headers.contains(label) && !columns.iter().any(|(_, seen)| seen == label) {
            columns.push((index, label.to_owned()));
        }
    }
    columns
}

/// Extracts one segment as a table.
///
/// The header row decides the columns: only vocabulary labels are kept, in
/// sheet order. Data rows that are entirely empty, or whose must-have column
/// (by table shape) is empty, are dropped. The sheet metadata is then added
/// as constant columns.
pub fn extract(
    grid: &Grid,
    segment: &TableSegment,
    headers: &HeaderConfig,
    shape: TableShape,
    metadata: &SheetMetadata,
) -> Result<Table, ExtractionError> {
    if segment.start > segment.end || segment.end >= grid.height() {
        return Err(ExtractionError::SegmentOutOfRange {
            start: segment.start,
            end: segment.end,
            height: grid.height(),
        });
    }
    let columns = header_columns(grid, segment.start, headers);
    if columns.is_empty() {
        return Err(ExtractionError::NoRecognizedColumns { row: segment.start });
    }

    let name = format!(
        "{}:{} {}",
        grid.source,
        grid.sheet,
        cell_position(segment.start, columns[0].0)
    );
    let mut table = Table::new(columns.iter().map(|(_, label)| label.clone()).collect()).named(&name);
    let must_have = shape.must_have_index();

    for row in segment.data_rows() {
        let values: Vec<Option<String>> = columns
            .iter()
            .map(|(index, _)| grid.cell(row, *index).and_then(to_value))
            .collect();
        if values.iter().all(Option::is_none) {
            continue;
        }
        if values.len() > must_have && values[must_have].is_none() {
            debug!("Skip row {} of '{}': column '{}' is empty", row + 1, name, table.columns[must_have]);
            continue;
        }
        table.push_row(values);
    }

    metadata.apply(&mut table);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extraction::scanner::{MetadataValue, Resolution};
    use crate::spreadsheet::grid::tests::grid;

    fn seller(name: Option<&str>) -> SheetMetadata {
        SheetMetadata {
            values: vec![MetadataValue {
                column: "(2)".to_owned(),
                value: name.map(str::to_owned),
                resolution: if name.is_some() { Resolution::Strict } else { Resolution::Unresolved },
            }],
        }
    }

    fn sheet() -> Grid {
        grid(&[
            &["Продавец:", "ООО Ромашка", "(2)", "", "", "", "", ""],
            &["А", "Примечание", "1", "1а", "1б", "2", "2а", "1"],
            &["A-1", "x", "Болт", "-", "796", "шт", "", "dup"],
            &["A-2", "", "Гайка", "-", "", "шт", "", ""],
            &["", "", "", "", "", "", "", ""],
            &["", "итого", "", "", "", "", "", ""],
            &["A-3", "", "Шайба", "-", "796", "", "", ""],
        ])
    }

    #[test]
    fn keep_vocabulary_columns_and_attach_metadata() {
        let grid = sheet();
        let table = extract(
            &grid,
            &TableSegment { start: 1, end: 2 },
            &HeaderConfig::default(),
            TableShape::FourColumn,
            &seller(Some("ООО Ромашка")),
        )
        .unwrap();

        assert_eq!(table.columns, vec!["А", "1", "1а", "1б", "2", "2а", "(2)"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.value(0, "1"), Some("Болт"));
        assert_eq!(table.value(0, "2а"), None);
        assert_eq!(table.value(0, "(2)"), Some("ООО Ромашка"));
        assert_eq!(table.name, "test.xlsx:Sheet1 A2");
    }

    #[test]
    fn drop_rows_without_must_have_column() {
        let grid = sheet();
        let segment = TableSegment { start: 1, end: 6 };

        let four = extract(&grid, &segment, &HeaderConfig::default(), TableShape::FourColumn, &seller(None)).unwrap();
        assert_eq!(four.column_values("А"), Some(vec![Some("A-1"), Some("A-3")]));
        assert_eq!(four.column_values("(2)"), Some(vec![None, None]));

        let six = extract(&grid, &segment, &HeaderConfig::default(), TableShape::SixColumn, &seller(None)).unwrap();
        assert_eq!(six.len(), 0);
    }

    #[test]
    fn empty_segment_yields_empty_table() {
        let grid = sheet();
        let table = extract(
            &grid,
            &TableSegment { start: 1, end: 1 },
            &HeaderConfig::default(),
            TableShape::FourColumn,
            &SheetMetadata::default(),
        )
        .unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns.len(), 6);
    }

    #[test]
    fn reject_malformed_segments() {
        let grid = sheet();
        let headers = HeaderConfig::default();
        let metadata = SheetMetadata::default();

        let outside = extract(&grid, &TableSegment { start: 5, end: 9 }, &headers, TableShape::FourColumn, &metadata);
        assert!(matches!(outside, Err(ExtractionError::SegmentOutOfRange { height: 7, .. })));

        let no_header = extract(&grid, &TableSegment { start: 4, end: 5 }, &headers, TableShape::FourColumn, &metadata);
        assert!(matches!(no_header, Err(ExtractionError::NoRecognizedColumns { row: 4 })));
    }
}
