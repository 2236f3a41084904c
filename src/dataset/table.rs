/// An in-memory table of optional text values, addressed by column name.
///
/// Extracted UPD tables, the accumulated dataset and reference files all use
/// this shape. A `None` value is a null (missing) cell.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    /// Where the table came from, used in log messages
    pub name: String,
    /// Column names, in order
    pub columns: Vec<String>,
    /// Rows, each exactly `columns.len()` long
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Creates an empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            name: String::new(),
            columns,
            rows: Vec::new(),
        }
    }

    /// Creates a table from rows, padding or truncating them to the column count.
    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_owned();
        self
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with the given name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Appends a row, normalising its width.
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Returns the value at a row for a named column.
    pub fn value(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Returns all values of a named column, or `None` when the column is absent.
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let index = self.column_index(column)?;
        Some(self.rows.iter().map(|row| row[index].as_deref()).collect())
    }

    /// Returns the position of a column, appending an all-null one if absent.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        match self.column_index(name) {
            Some(index) => index,
            None => {
                self.columns.push(name.to_owned());
                for row in &mut self.rows {
                    row.push(None);
                }
                self.columns.len() - 1
            }
        }
    }

    /// Sets every row of a column to the same value, creating the column if needed.
    pub fn fill_column(&mut self, name: &str, value: Option<&str>) {
        let index = self.ensure_column(name);
        for row in &mut self.rows {
            row[index] = value.map(str::to_owned);
        }
    }

    /// Returns a table with exactly the given columns in the given order.
    ///
    /// Missing columns are added as nulls, columns not listed are dropped.
    pub fn reindex(&self, order: &[String]) -> Table {
        let positions: Vec<Option<usize>> = order.iter().map(|name| self.column_index(name)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                positions
                    .iter()
                    .map(|position| position.and_then(|index| row[index].clone()))
                    .collect()
            })
            .collect();
        Table {
            name: self.name.clone(),
            columns: order.to_vec(),
            rows,
        }
    }

    /// Appends the rows of another table, matching columns by name.
    pub fn append(&mut self, other: &Table) {
        let aligned = other.reindex(&self.columns);
        self.rows.extend(aligned.rows);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn columns(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    pub(crate) fn row(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|value| value.map(str::to_owned)).collect()
    }

    #[test]
    fn reindex_adds_missing_and_drops_unknown() {
        let table = Table::with_rows(
            columns(&["2", "А", "extra"]),
            vec![row(&[Some("шт"), Some("A-1"), Some("x")])],
        );
        let reindexed = table.reindex(&columns(&["А", "1", "2", "(5а)"]));

        assert_eq!(reindexed.columns, columns(&["А", "1", "2", "(5а)"]));
        assert_eq!(reindexed.rows[0], row(&[Some("A-1"), None, Some("шт"), None]));
    }

    #[test]
    fn append_aligns_by_name() {
        let mut target = Table::new(columns(&["a", "b"]));
        target.append(&Table::with_rows(columns(&["b"]), vec![row(&[Some("1")])]));
        target.append(&Table::with_rows(columns(&["b", "a"]), vec![row(&[Some("2"), Some("3")])]));

        assert_eq!(target.len(), 2);
        assert_eq!(target.rows[0], row(&[None, Some("1")]));
        assert_eq!(target.rows[1], row(&[Some("3"), Some("2")]));
    }

    #[test]
    fn fill_and_read_columns() {
        let mut table = Table::with_rows(columns(&["a"]), vec![row(&[Some("1")]), row(&[])]);
        table.fill_column("(2)", Some("ООО Ромашка"));

        assert_eq!(table.columns, columns(&["a", "(2)"]));
        assert_eq!(table.value(1, "(2)"), Some("ООО Ромашка"));
        assert_eq!(table.value(1, "a"), None);
        assert_eq!(
            table.column_values("(2)"),
            Some(vec![Some("ООО Ромашка"), Some("ООО Ромашка")])
        );
        assert_eq!(table.column_values("b"), None);
    }
}
