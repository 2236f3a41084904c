use crate::dataset::csv::{read_csv, write_csv};
use crate::dataset::table::Table;
use crate::error::{ResultMessage, UpdError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Running dataset persisted to a CSV file after every append.
///
/// All rows share the canonical column order. An existing output file is
/// picked up on open, so consecutive runs keep accumulating.
pub struct Accumulator {
    path: PathBuf,
    dataset: Table,
}

impl Accumulator {
    /// Opens the accumulator, loading rows already present at `path`.
    pub fn open(path: &Path, order: &[String], fallback_code_page: u16) -> Result<Self, UpdError> {
        let name = path.to_string_lossy().to_string();
        let dataset = if path.exists() {
            let existing = read_csv(path, fallback_code_page).with_prefix(&name)?;
            info!("Resuming '{}' with {} existing rows", name, existing.len());
            existing.reindex(order).named(&name)
        } else {
            Table::new(order.to_vec()).named(&name)
        };
        let accumulator = Self {
            path: path.to_owned(),
            dataset,
        };
        accumulator.persist()?;
        Ok(accumulator)
    }

    pub fn dataset(&self) -> &Table {
        &self.dataset
    }

    pub fn into_dataset(self) -> Table {
        self.dataset
    }

    /// Appends the rows of `table` in canonical order and persists the result.
    /// An empty table is a no-op. Returns the number of appended rows.
    pub fn append(&mut self, table: &Table) -> Result<usize, UpdError> {
        if table.is_empty() {
            debug!("Nothing to append from '{}'", table.name);
            return Ok(0);
        }
        self.dataset.append(table);
        self.persist()?;
        Ok(table.len())
    }

    /// Writes the dataset next to the target and renames it into place,
    /// so an interrupted write never leaves a truncated output behind.
    pub fn persist(&self) -> Result<(), UpdError> {
        persist_table(&self.path, &self.dataset)
    }
}

/// Atomically replaces the CSV at `path` with `table`.
pub fn persist_table(path: &Path, table: &Table) -> Result<(), UpdError> {
    let name = path.to_string_lossy().to_string();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(UpdError::from).with_prefix(&name)?;
    }
    let mut temporary = path.as_os_str().to_owned();
    temporary.push(".tmp");
    let temporary = PathBuf::from(temporary);

    let written = write_csv(&temporary, table).and_then(|_| fs::rename(&temporary, path).map_err(UpdError::from));
    if written.is_err() {
        let _ = fs::remove_file(&temporary);
    }
    written.with_prefix(&name)
}
