use crate::dataset::table::Table;
use serde::Deserialize;
use std::fmt::{Display, Formatter};

/// Reference to a table column, either by header name or by 0-based position.
///
/// Reference files are often exported with unstable or duplicated header
/// text, so joins accept positions as well as names.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ColumnRef {
    Index(usize),
    Name(String),
}

impl ColumnRef {
    /// Resolves the reference against a table's columns.
    pub fn resolve(&self, table: &Table) -> Option<usize> {
        match self {
            Self::Index(index) => (*index < table.columns.len()).then_some(*index),
            Self::Name(name) => table.column_index(name),
        }
    }
}

impl Display for ColumnRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{}", index),
            Self::Name(name) => write!(f, "'{}'", name),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<usize> for ColumnRef {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_by_name_and_index() {
        let table = Table::new(vec!["А".to_owned(), "1".to_owned()]);
        assert_eq!(ColumnRef::from("1").resolve(&table), Some(1));
        assert_eq!(ColumnRef::from(0).resolve(&table), Some(0));
        assert_eq!(ColumnRef::from(2).resolve(&table), None);
        assert_eq!(ColumnRef::from("2").resolve(&table), None);
        assert_eq!(ColumnRef::from(3).to_string(), "#3");
    }
}
