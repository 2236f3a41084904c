use crate::spreadsheet::Grid;
use tracing::debug;

/// Inclusive row range of one embedded table. `start` is the header row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TableSegment {
    pub start: usize,
    pub end: usize,
}

impl TableSegment {
    /// Rows below the header, possibly none.
    pub fn data_rows(&self) -> std::ops::RangeInclusive<usize> {
        self.start + 1..=self.end
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

fn is_header_row(grid: &Grid, row: usize, signature: &[String]) -> bool {
    let cells = grid.non_blank(row);
    !cells.is_empty() && signature.iter().all(|label| cells.contains(&label.as_str()))
}

/// Splits a grid into table segments.
///
/// A row holding every signature label opens a segment and closes the one
/// before it. A blank row closes the open segment, and the end of the grid
/// closes whatever is still open. Segments never overlap and come in row order.
pub fn segment(grid: &Grid, signature: &[String]) -> Vec<TableSegment> {
    let mut segments = Vec::new();
    let mut open: Option<usize> = None;

    for row in 0..grid.height() {
        if is_header_row(grid, row, signature) {
            if let Some(start) = open.replace(row) {
                segments.push(TableSegment { start, end: row - 1 });
            }
        } else if grid.is_blank_row(row) {
            if let Some(start) = open.take() {
                segments.push(TableSegment { start, end: row - 1 });
            }
        }
    }
    if let Some(start) = open {
        segments.push(TableSegment {
            start,
            end: grid.height() - 1,
        });
    }

    for segment in &segments {
        debug!(
            "Table on '{}:{}' rows {}..={}",
            grid.source, grid.sheet, segment.start, segment.end
        );
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HeaderConfig;
    use crate::spreadsheet::grid::tests::grid;

    const HEADER: &[&str] = &["А", "1", "1а", "1б", "2", "2а", "3"];

    fn signature() -> Vec<String> {
        HeaderConfig::default().signature().to_vec()
    }

    #[test]
    fn two_tables_separated_by_blank_row() {
        let grid = grid(&[
            &["Продавец:", "ООО Ромашка", "(2)"],
            HEADER,
            &["A-1", "Болт", "-", "796", "шт", "10", "5"],
            &["A-2", "Гайка", "-", "796", "шт", "20", "1"],
            &[],
            &["Итого"],
            HEADER,
            &["B-1", "Шайба", "-", "796", "шт", "3", "2"],
        ]);
        let segments = segment(&grid, &signature());

        assert_eq!(
            segments,
            vec![TableSegment { start: 1, end: 3 }, TableSegment { start: 6, end: 7 }]
        );
        assert_eq!(segments[0].data_rows().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn consecutive_headers_give_empty_segment() {
        let grid = grid(&[HEADER, HEADER, &["A-1", "Болт", "", "", "", "", ""], &["", ""]]);
        let segments = segment(&grid, &signature());

        assert_eq!(
            segments,
            vec![TableSegment { start: 0, end: 0 }, TableSegment { start: 1, end: 2 }]
        );
        assert!(segments[0].is_empty());
        assert_eq!(segments[0].data_rows().count(), 0);
    }

    #[test]
    fn no_header_no_segments() {
        let partial = grid(&[&["А", "1", "1а"], &["Продавец:", "ООО Ромашка"], &[]]);
        assert!(segment(&partial, &signature()).is_empty());
        assert!(segment(&grid(&[]), &signature()).is_empty());
    }

    #[test]
    fn header_cells_in_any_order_and_position() {
        let grid = grid(&[&["", "2а", " 2 ", "1б", "1а", "1", "А", "x"], &["a"]]);
        assert_eq!(segment(&grid, &signature()), vec![TableSegment { start: 0, end: 1 }]);
    }

    #[test]
    fn segments_are_ordered_and_disjoint() {
        let grid = grid(&[
            &[],
            HEADER,
            HEADER,
            &["1"],
            &[],
            &[],
            HEADER,
            &["2"],
            HEADER,
        ]);
        let segments = segment(&grid, &signature());
        assert_eq!(segments.len(), 4);
        for pair in segments.windows(2) {
            assert!(pair[0].end < pair[1].start);
        }
        assert!(segments.iter().all(|segment| segment.start <= segment.end));
    }
}
