use crate::helpers::text::format_number;
use calamine::Data;
use chrono::NaiveDateTime;
use chrono::Timelike;

/// Renders a workbook cell as the text the scanner and segmenter compare against.
///
/// Empty cells become "", integral numbers lose their fractional part so a
/// header cell stored as the number 1 matches the label "1".
pub(crate) fn cell_text(value: &Data) -> String {
    match value {
        Data::Empty => String::new(),
        Data::String(text) => text.to_owned(),
        Data::Int(number) => number.to_string(),
        Data::Float(number) => format_number(*number),
        Data::DateTime(datetime) => datetime
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| format_number(datetime.as_f64())),
        other => other.to_string(),
    }
}

/// Formats a date-time as a date when it has no time component.
fn format_datetime(datetime: NaiveDateTime) -> String {
    let time = datetime.time();
    if time.hour() == 0 && time.minute() == 0 && time.second() == 0 {
        datetime.date().format("%Y-%m-%d").to_string()
    } else {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

/// Converts 0-based column index to Excel column letters (0 → "A", 26 → "AA").
pub(crate) fn column_letters(column: usize) -> String {
    let mut column = column + 1;
    let mut letters = Vec::new();
    while column > 0 {
        column -= 1;
        letters.push(char::from(b'A' + (column % 26) as u8));
        column /= 26;
    }
    letters.iter().rev().collect()
}

/// Convert 0-based row & column indexes to Excel-style cell position (e.g. "B3").
pub(crate) fn cell_position(row: usize, column: usize) -> String {
    format!("{}{}", column_letters(column), row + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_scalar_cells() {
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::String("1а".to_owned())), "1а");
        assert_eq!(cell_text(&Data::Int(14)), "14");
        assert_eq!(cell_text(&Data::Float(1.0)), "1");
        assert_eq!(cell_text(&Data::Float(1520.75)), "1520.75");
        assert_eq!(cell_text(&Data::Bool(true)), "true");
    }

    #[test]
    fn render_positions() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
        assert_eq!(cell_position(0, 0), "A1");
        assert_eq!(cell_position(9, 27), "AB10");
    }
}
