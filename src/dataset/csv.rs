//! Delimited text codec for the accumulated dataset and CSV reference files.

use crate::dataset::table::Table;
use crate::error::UpdError;
use crate::helpers::encoding::decode_text;
use crate::helpers::text::to_value;
use std::fs;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Byte order mark written in front of the output so spreadsheet software
/// detects UTF-8 when opening the file directly.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parses CSV text whose first record is the header.
pub fn parse_csv(name: &str, text: &str) -> Result<Table, UpdError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());
    let columns = reader
        .headers()?
        .iter()
        .map(|header| header.to_owned())
        .collect();

    let mut table = Table::new(columns).named(name);
    for record in reader.records() {
        let record = record?;
        table.push_row(record.iter().map(to_value).collect());
    }
    Ok(table)
}

/// Reads a CSV file, detecting its text encoding.
pub fn read_csv(path: &Path, fallback_code_page: u16) -> Result<Table, UpdError> {
    let bytes = fs::read(path)?;
    let text = decode_text(&bytes, fallback_code_page)?;
    parse_csv(&path.to_string_lossy(), &text)
}

/// Writes a table as UTF-8 CSV with a BOM. Nulls are written as empty fields.
pub fn write_csv(path: &Path, table: &Table) -> Result<(), UpdError> {
    let mut file = BufWriter::new(File::create(path)?);
    file.write_all(UTF8_BOM)?;

    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(&table.columns)?;
    for row in &table.rows {
        writer.write_record(row.iter().map(|value| value.as_deref().unwrap_or("")))?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::table::tests::{columns, row};

    #[test]
    fn parse_nulls_and_quotes() {
        let table = parse_csv("mem", "А,2,(2)\nA-1,,\"ООО \"\"Ромашка\"\"\"\n").unwrap();
        assert_eq!(table.columns, columns(&["А", "2", "(2)"]));
        assert_eq!(table.rows[0], row(&[Some("A-1"), None, Some("ООО \"Ромашка\"")]));
    }

    #[test]
    fn parse_ragged_records() {
        let table = parse_csv("mem", "a,b,c\n1\n1,2,3,4\n").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0], row(&[Some("1"), None, None]));
        assert_eq!(table.rows[1], row(&[Some("1"), Some("2"), Some("3")]));
    }

    #[test]
    fn write_then_read_with_bom() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("data.csv");
        let table = Table::with_rows(
            columns(&["А", "10а"]),
            vec![row(&[Some("СФ00123"), None]), row(&[None, Some("КИТАЙ, Шанхай")])],
        );
        write_csv(&path, &table).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));

        let loaded = read_csv(&path, 1251).unwrap();
        assert_eq!(loaded.columns, table.columns);
        assert_eq!(loaded.rows, table.rows);
    }

    #[test]
    fn read_windows_1251_file() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("tnved.csv");
        // "Код,Вес\n1,2\n" in Windows-1251
        let mut bytes = vec![0xCA, 0xEE, 0xE4, b',', 0xC2, 0xE5, 0xF1, b'\n'];
        bytes.extend_from_slice(b"1,2\n");
        fs::write(&path, bytes).unwrap();

        let table = read_csv(&path, 1251).unwrap();
        assert_eq!(table.columns, columns(&["Код", "Вес"]));
        assert_eq!(table.value(0, "Вес"), Some("2"));
    }
}
