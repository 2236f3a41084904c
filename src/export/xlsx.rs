//! Minimal Office Open XML writer: one worksheet, inline strings, no styles.

use crate::dataset::table::Table;
use crate::error::{ResultMessage, UpdError};
use crate::helpers::xml::XmlWriter;
use crate::helpers::zip::ZipHelper;
use crate::spreadsheet::cell::cell_position;
use regex::Regex;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;
use zip::ZipWriter;

const MAIN_NAMESPACE: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const RELATIONSHIP_NAMESPACE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const PACKAGE_RELATIONSHIP_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const CONTENT_TYPES_NAMESPACE: &str = "http://schemas.openxmlformats.org/package/2006/content-types";

/// Plain decimals only: no leading zeros, no trailing fractional zeros, so
/// reading the number back gives the same text.
const NUMBER_PATTERN: &str = r"^-?(0|[1-9]\d*)(\.\d*[1-9])?$";

/// Longest numeric text stored as a number; longer values would lose digits.
const MAX_NUMBER_LEN: usize = 15;

/// Classifies cell text into numbers and strings.
struct NumberDetector {
    pattern: Regex,
}

impl NumberDetector {
    fn new() -> Result<Self, UpdError> {
        Ok(Self {
            pattern: Regex::new(NUMBER_PATTERN)?,
        })
    }

    fn is_number(&self, value: &str) -> bool {
        value.len() <= MAX_NUMBER_LEN && self.pattern.is_match(value)
    }
}

/// Writes the table as a single-sheet xlsx workbook: column names in the
/// first row, one row per record below. Nulls become empty cells.
pub fn export_table(table: &Table, path: &Path, sheet_name: &str) -> Result<(), UpdError> {
    let name = path.to_string_lossy().to_string();
    let detector = NumberDetector::new()?;
    let file = File::create(path).map_err(UpdError::from).with_prefix(&name)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));

    write_package(&mut zip, sheet_name)
        .and_then(|_| write_worksheet(&mut zip, table, &detector))
        .with_prefix(&name)?;
    let mut inner = zip.finish().map_err(UpdError::from).with_prefix(&name)?;
    inner.flush().map_err(UpdError::from).with_prefix(&name)?;

    info!("Exported {} rows to '{}'", table.len(), name);
    Ok(())
}

fn write_package<W: Write + std::io::Seek>(zip: &mut ZipWriter<W>, sheet_name: &str) -> Result<(), UpdError> {
    zip.xml_entry("[Content_Types].xml", |xml| {
        xml.start("Types", &[("xmlns", CONTENT_TYPES_NAMESPACE)])?;
        xml.empty(
            "Default",
            &[("Extension", "rels"), ("ContentType", "application/vnd.openxmlformats-package.relationships+xml")],
        )?;
        xml.empty("Default", &[("Extension", "xml"), ("ContentType", "application/xml")])?;
        xml.empty(
            "Override",
            &[
                ("PartName", "/xl/workbook.xml"),
                ("ContentType", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"),
            ],
        )?;
        xml.empty(
            "Override",
            &[
                ("PartName", "/xl/worksheets/sheet1.xml"),
                ("ContentType", "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"),
            ],
        )?;
        xml.end("Types")
    })?;

    zip.xml_entry("_rels/.rels", |xml| {
        xml.start("Relationships", &[("xmlns", PACKAGE_RELATIONSHIP_NAMESPACE)])?;
        xml.empty(
            "Relationship",
            &[
                ("Id", "rId1"),
                ("Type", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument"),
                ("Target", "xl/workbook.xml"),
            ],
        )?;
        xml.end("Relationships")
    })?;

    zip.xml_entry("xl/workbook.xml", |xml| {
        xml.start("workbook", &[("xmlns", MAIN_NAMESPACE), ("xmlns:r", RELATIONSHIP_NAMESPACE)])?;
        xml.start("sheets", &[])?;
        xml.empty("sheet", &[("name", sheet_name), ("sheetId", "1"), ("r:id", "rId1")])?;
        xml.end("sheets")?;
        xml.end("workbook")
    })?;

    zip.xml_entry("xl/_rels/workbook.xml.rels", |xml| {
        xml.start("Relationships", &[("xmlns", PACKAGE_RELATIONSHIP_NAMESPACE)])?;
        xml.empty(
            "Relationship",
            &[
                ("Id", "rId1"),
                ("Type", "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet"),
                ("Target", "worksheets/sheet1.xml"),
            ],
        )?;
        xml.end("Relationships")
    })
}

fn write_worksheet<W: Write + std::io::Seek>(
    zip: &mut ZipWriter<W>,
    table: &Table,
    detector: &NumberDetector,
) -> Result<(), UpdError> {
    zip.xml_entry("xl/worksheets/sheet1.xml", |xml| {
        xml.start("worksheet", &[("xmlns", MAIN_NAMESPACE)])?;
        xml.start("sheetData", &[])?;

        let header = table.columns.iter().map(|column| Some(column.as_str()));
        write_row(xml, 0, header, detector)?;
        for (index, row) in table.rows.iter().enumerate() {
            write_row(xml, index + 1, row.iter().map(|value| value.as_deref()), detector)?;
        }

        xml.end("sheetData")?;
        xml.end("worksheet")
    })
}

fn write_row<'v, W, I>(xml: &mut XmlWriter<W>, row: usize, values: I, detector: &NumberDetector) -> Result<(), UpdError>
where
    W: Write,
    I: Iterator<Item = Option<&'v str>>,
{
    let number = (row + 1).to_string();
    xml.start("row", &[("r", number.as_str())])?;
    for (column, value) in values.enumerate() {
        let Some(value) = value.filter(|value| !value.is_empty()) else {
            continue;
        };
        let position = cell_position(row, column);
        if detector.is_number(value) {
            xml.start("c", &[("r", position.as_str())])?;
            xml.text_element("v", &[], value)?;
        } else {
            xml.start("c", &[("r", position.as_str()), ("t", "inlineStr")])?;
            xml.start("is", &[])?;
            xml.text_element("t", &[("xml:space", "preserve")], value)?;
            xml.end("is")?;
        }
        xml.end("c")?;
    }
    xml.end("row")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::tests::{columns, row};
    use crate::spreadsheet::load_grids;

    #[test]
    fn detect_plain_numbers() {
        let detector = NumberDetector::new().unwrap();
        assert!(detector.is_number("796"));
        assert!(detector.is_number("-12.5"));
        assert!(detector.is_number("0"));
        assert!(!detector.is_number("007"));
        assert!(!detector.is_number("1.50"));
        assert!(!detector.is_number("1,5"));
        assert!(!detector.is_number("1234567890123456"));
        assert!(!detector.is_number("СФ00123"));
    }

    #[test]
    fn exported_workbook_reads_back() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("all_data_file.xlsx");
        let table = Table::with_rows(
            columns(&["А", "1", "9", "(2)"]),
            vec![
                row(&[Some("СФ-00123@"), Some("Болт <M8>"), Some("12.5"), Some("ООО \"Ромашка\"")]),
                row(&[Some("007"), None, Some("796"), None]),
            ],
        );
        export_table(&table, &path, "Данные").unwrap();

        let grids = load_grids(&path).unwrap();
        assert_eq!(grids.len(), 1);
        let grid = &grids[0];
        assert_eq!(grid.sheet, "Данные");
        assert_eq!(grid.row(0).unwrap(), &["А", "1", "9", "(2)"]);
        assert_eq!(grid.row(1).unwrap(), &["СФ-00123@", "Болт <M8>", "12.5", "ООО \"Ромашка\""]);
        assert_eq!(grid.row(2).unwrap(), &["007", "", "796", ""]);
    }
}
