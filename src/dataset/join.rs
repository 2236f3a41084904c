//! # Reference Joins
//!
//! Enrichment of the accumulated dataset from reference data: dictionary
//! lookup into one target column, left outer join adding several columns,
//! and placeholder replacement. A column that cannot be found is a setup
//! error and stops the run.
use crate::config::{LookupJoin, ReportJoin, SentinelReplacement};
use crate::dataset::column::ColumnRef;
use crate::dataset::table::Table;
use crate::helpers::text::{is_blank, normalize_key};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Join misconfiguration. Always fatal.
#[derive(Error, Debug)]
pub enum JoinError {
    #[error("Column {column} not found in {table}")]
    MissingColumn { column: String, table: String },

    #[error("Columns {columns:?} not found in {table}")]
    MissingColumns { columns: Vec<String>, table: String },
}

fn table_label(table: &Table, fallback: &str) -> String {
    if table.name.is_empty() {
        fallback.to_owned()
    } else {
        format!("'{}'", table.name)
    }
}

fn resolve(column: &ColumnRef, table: &Table, fallback: &str) -> Result<usize, JoinError> {
    column.resolve(table).ok_or_else(|| JoinError::MissingColumn {
        column: column.to_string(),
        table: table_label(table, fallback),
    })
}

/// Outcome counters of a lookup join.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LookupStats {
    pub matched: usize,
    pub unmatched: usize,
    pub dropped: usize,
}

/// Replaces the target column of every row with the reference value found
/// under the row's key.
///
/// Keys are compared after optional trimming and case folding. Duplicate
/// reference keys resolve to the last occurrence. Unmatched rows get a null
/// target, and are removed entirely when `keep_unmatched` is false.
pub fn join_reference(
    dataset: &Table,
    reference: &Table,
    lookup: &LookupJoin,
) -> Result<(Table, LookupStats), JoinError> {
    let self_key = resolve(&lookup.self_key, dataset, "dataset")?;
    let target = resolve(&lookup.target, dataset, "dataset")?;
    let reference_key = resolve(&lookup.reference_key, reference, "reference")?;
    let reference_value = resolve(&lookup.reference_value, reference, "reference")?;

    let normalize = |key: &str| normalize_key(key, lookup.case_sensitive, lookup.strip_spaces);
    let dictionary: HashMap<String, Option<&String>> = reference
        .rows
        .iter()
        .filter_map(|row| {
            let key = row[reference_key].as_deref().filter(|key| !is_blank(key))?;
            Some((normalize(key), row[reference_value].as_ref()))
        })
        .collect();
    debug!("Lookup dictionary holds {} keys", dictionary.len());

    let mut stats = LookupStats::default();
    let mut result = Table::new(dataset.columns.clone()).named(&dataset.name);
    for row in &dataset.rows {
        let found = row[self_key]
            .as_deref()
            .filter(|key| !is_blank(key))
            .and_then(|key| dictionary.get(&normalize(key)));
        let value = match found {
            Some(&value) => {
                stats.matched += 1;
                value.cloned()
            }
            None => {
                stats.unmatched += 1;
                None
            }
        };
        if value.is_none() && !lookup.keep_unmatched {
            stats.dropped += 1;
            continue;
        }
        let mut row = row.clone();
        row[target] = value;
        result.rows.push(row);
    }
    Ok((result, stats))
}

/// Left outer join adding `report.columns` from the reference table.
///
/// Every dataset row is kept; a key matching several reference rows yields
/// one output row per match. Blank keys never match. An added column that
/// already exists in the dataset is overwritten.
pub fn join_enrich(dataset: &Table, reference: &Table, report: &ReportJoin) -> Result<Table, JoinError> {
    let self_key = dataset
        .column_index(&report.self_key)
        .ok_or_else(|| JoinError::MissingColumn {
            column: format!("'{}'", report.self_key),
            table: table_label(dataset, "dataset"),
        })?;
    let reference_key = reference
        .column_index(&report.reference_key)
        .ok_or_else(|| JoinError::MissingColumn {
            column: format!("'{}'", report.reference_key),
            table: table_label(reference, "reference"),
        })?;
    let missing: Vec<String> = report
        .columns
        .iter()
        .filter(|column| reference.column_index(column).is_none())
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(JoinError::MissingColumns {
            columns: missing,
            table: table_label(reference, "reference"),
        });
    }

    let sources: Vec<usize> = report
        .columns
        .iter()
        .filter_map(|column| reference.column_index(column))
        .collect();
    let mut result = dataset.clone();
    let targets: Vec<usize> = report
        .columns
        .iter()
        .map(|column| result.ensure_column(column))
        .collect();

    let mut matches: HashMap<&str, Vec<&Vec<Option<String>>>> = HashMap::new();
    for row in &reference.rows {
        if let Some(key) = row[reference_key].as_deref().filter(|key| !is_blank(key)) {
            matches.entry(key).or_default().push(row);
        }
    }

    let mut rows = Vec::with_capacity(result.rows.len());
    for row in result.rows {
        let found = row[self_key]
            .as_deref()
            .filter(|key| !is_blank(key))
            .and_then(|key| matches.get(key));
        match found {
            Some(references) => {
                for reference_row in references {
                    let mut joined = row.clone();
                    for (source, target) in sources.iter().zip(&targets) {
                        joined[*target] = reference_row[*source].clone();
                    }
                    rows.push(joined);
                }
            }
            None => {
                let mut joined = row;
                for target in &targets {
                    joined[*target] = None;
                }
                rows.push(joined);
            }
        }
    }
    result.rows = rows;
    Ok(result)
}

/// Replaces placeholder values in one column. Returns the number of replaced cells.
pub fn replace_sentinels(dataset: &mut Table, replacement: &SentinelReplacement) -> Result<usize, JoinError> {
    let column = dataset
        .column_index(&replacement.column)
        .ok_or_else(|| JoinError::MissingColumn {
            column: format!("'{}'", replacement.column),
            table: table_label(dataset, "dataset"),
        })?;
    let mut replaced = 0;
    for row in &mut dataset.rows {
        let is_sentinel = row[column]
            .as_deref()
            .map(|value| replacement.sentinels.iter().any(|sentinel| sentinel == value.trim()))
            .unwrap_or(false);
        if is_sentinel {
            row[column] = Some(replacement.replacement.clone());
            replaced += 1;
        }
    }
    Ok(replaced)
}
