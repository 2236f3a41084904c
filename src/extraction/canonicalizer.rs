use crate::config::SchemaConfig;
use crate::dataset::table::Table;
use crate::error::UpdError;
use crate::helpers::text::{format_number, parse_number, to_value};
use regex::Regex;
use tracing::warn;

/// Brings extracted tables into the canonical schema.
pub struct Canonicalizer<'a> {
    schema: &'a SchemaConfig,
    strip: Regex,
}

impl<'a> Canonicalizer<'a> {
    pub fn new(schema: &'a SchemaConfig) -> Result<Self, UpdError> {
        Ok(Self {
            schema,
            strip: Regex::new(&schema.strip_pattern)?,
        })
    }

    /// Normalised identifier: separator characters removed, whitespace trimmed.
    pub fn derive_identifier(&self, raw: &str) -> Option<String> {
        to_value(self.strip.replace_all(raw, "").trim())
    }

    /// Returns the table with the derived identifier filled in, numeric
    /// columns normalised and every column of the canonical order present
    /// in that order. Applying it twice changes nothing.
    pub fn canonicalize(&self, table: &Table) -> Table {
        let mut table = table.clone();

        if let Some(identifier) = table.column_index(&self.schema.identifier_column) {
            let derived = table.ensure_column(&self.schema.derived_column);
            for row in &mut table.rows {
                row[derived] = row[identifier]
                    .as_deref()
                    .and_then(|raw| self.derive_identifier(raw));
            }
        }

        for column in &self.schema.numeric_columns {
            let Some(index) = table.column_index(column) else {
                continue;
            };
            let mut rejected = 0;
            for value in table.rows.iter_mut().filter_map(|row| row[index].as_mut()) {
                match parse_number(value) {
                    Some(number) => *value = format_number(number),
                    None => rejected += 1,
                }
            }
            if rejected > 0 {
                warn!("'{}': {} values of column '{}' are not numbers, kept as is", table.name, rejected, column);
            }
        }

        table.reindex(&self.schema.column_order)
    }
}
