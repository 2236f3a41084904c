use crate::config::{MetadataConfig, MetadataField};
use crate::dataset::table::Table;
use crate::helpers::text::contains_ignore_case;
use crate::spreadsheet::Grid;
use tracing::debug;

/// A row whose text contains a marker phrase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerMatch {
    /// File the row was read from
    pub source: String,
    /// 0-based row index within the sheet
    pub row: usize,
    /// Non-blank cells of the row, trimmed, in column order
    pub cells: Vec<String>,
}

impl MarkerMatch {
    /// Position of the first cell that contains the phrase. Falls back to the
    /// first cell when the phrase only matches across a cell boundary.
    fn marker_position(&self, phrase: &str) -> usize {
        self.cells
            .iter()
            .position(|cell| contains_ignore_case(cell, phrase))
            .unwrap_or(0)
    }

    /// The first non-blank cell after the cell holding the phrase.
    pub fn value_after(&self, phrase: &str) -> Option<&str> {
        self.cells
            .get(self.marker_position(phrase) + 1)
            .map(String::as_str)
    }

    /// Number of non-blank cells after the value cell.
    pub fn trailing_after_value(&self, phrase: &str) -> usize {
        self.cells
            .len()
            .saturating_sub(self.marker_position(phrase) + 2)
    }
}

/// Finds every row containing `phrase`, case-insensitively, in row order.
///
/// A row is searched as all of its cells joined with `|`, so the match is a
/// plain substring test over the whole row.
pub fn scan(grid: &Grid, phrase: &str) -> Vec<MarkerMatch> {
    let needle = phrase.to_lowercase();
    (0..grid.height())
        .filter(|row| grid.joined_lowercase(*row).contains(&needle))
        .map(|row| MarkerMatch {
            source: grid.source.clone(),
            row,
            cells: grid.non_blank(row).into_iter().map(str::to_owned).collect(),
        })
        .collect()
}

/// Which step of the fallback chain produced a metadata value.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Resolution {
    Strict,
    Loose,
    Override,
    Unresolved,
}

/// A resolved metadata value for one canonical column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataValue {
    pub column: String,
    pub value: Option<String>,
    pub resolution: Resolution,
}

/// Metadata found on one sheet, shared by every table of that sheet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SheetMetadata {
    pub values: Vec<MetadataValue>,
}

impl SheetMetadata {
    /// Number of fields none of the markers could resolve.
    pub fn unresolved(&self) -> usize {
        self.values
            .iter()
            .filter(|value| value.resolution == Resolution::Unresolved)
            .count()
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|value| value.column == column)
            .and_then(|value| value.value.as_deref())
    }

    /// Broadcasts every value to all rows of the table.
    pub fn apply(&self, table: &mut Table) {
        for value in &self.values {
            table.fill_column(&value.column, value.value.as_deref());
        }
    }
}

/// Resolves metadata fields through the strict, loose and override markers.
pub struct MetadataResolver<'a> {
    config: &'a MetadataConfig,
}

impl<'a> MetadataResolver<'a> {
    pub fn new(config: &'a MetadataConfig) -> Self {
        Self { config }
    }

    /// Resolves all configured fields against one sheet.
    pub fn resolve_sheet(&self, grid: &Grid) -> SheetMetadata {
        let values = self
            .config
            .fields
            .iter()
            .map(|field| self.resolve(grid, field))
            .collect();
        SheetMetadata { values }
    }

    /// Resolves one field. A field no marker can resolve is null, never an error.
    pub fn resolve(&self, grid: &Grid, field: &MetadataField) -> MetadataValue {
        let (value, resolution) = self
            .strict(grid, field)
            .map(|value| (Some(value), Resolution::Strict))
            .or_else(|| self.loose(grid, field))
            .unwrap_or((None, Resolution::Unresolved));
        debug!(
            "Metadata {} on '{}:{}': {:?} ({:?})",
            field.column, grid.source, grid.sheet, value, resolution
        );
        MetadataValue {
            column: field.column.clone(),
            value,
            resolution,
        }
    }

    /// The strict marker row must carry the value and a trailing field label.
    fn strict(&self, grid: &Grid, field: &MetadataField) -> Option<String> {
        let found = scan(grid, &field.strict).into_iter().next()?;
        if found.trailing_after_value(&field.strict) == 0 {
            return None;
        }
        found.value_after(&field.strict).map(str::to_owned)
    }

    fn loose(&self, grid: &Grid, field: &MetadataField) -> Option<(Option<String>, Resolution)> {
        let found = scan(grid, &field.loose).into_iter().next()?;
        let value = found.value_after(&field.loose)?;
        if contains_ignore_case(value, &self.config.override_token) {
            return self
                .override_value(grid)
                .map(|value| (Some(value), Resolution::Override));
        }
        Some((Some(value.to_owned()), Resolution::Loose))
    }

    fn override_value(&self, grid: &Grid) -> Option<String> {
        let marker = &self.config.override_marker;
        scan(grid, marker)
            .into_iter()
            .next()?
            .value_after(marker)
            .map(str::to_owned)
    }
}
