//! # Batch Pipeline
//!
//! Drives one run: discovers the input workbooks, pushes every sheet through
//! segmentation, metadata resolution, extraction and canonicalisation, appends
//! the results to the [`Accumulator`], then applies the configured enrichment
//! joins and writes the enriched CSV and xlsx outputs. The accumulated CSV
//! itself stays canonical so that the next run resumes from it unchanged.
//!
//! A workbook that cannot be opened, or a segment that cannot be extracted,
//! is logged and skipped. Only configuration and join errors stop the run.

use crate::config::Config;
use crate::dataset::accumulator::{persist_table, Accumulator};
use crate::dataset::join::{join_enrich, join_reference, replace_sentinels};
use crate::dataset::reference::load_reference;
use crate::dataset::table::Table;
use crate::error::UpdError;
use crate::export::export_table;
use crate::extraction::{extract, segment, Canonicalizer, MetadataResolver, TableSegment};
use crate::spreadsheet::{is_supported, load_grids, Grid};
use glob::glob;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Canonical tables found on one sheet.
#[derive(Clone, Debug, Default)]
pub struct SheetTables {
    pub tables: Vec<Table>,
    pub segments_skipped: usize,
    pub unresolved_metadata: usize,
}

/// What one input file contributed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FileReport {
    pub sheets: usize,
    pub tables: usize,
    pub rows: usize,
    pub segments_skipped: usize,
    pub unresolved_metadata: usize,
}

/// Totals of a run, reported whatever was skipped along the way.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_seen: usize,
    pub files_skipped: usize,
    pub tables: usize,
    pub rows: usize,
    pub segments_skipped: usize,
    pub unresolved_metadata: usize,
    pub output: PathBuf,
    pub enriched: PathBuf,
    pub export: Option<PathBuf>,
}

impl RunSummary {
    fn add(&mut self, report: &FileReport) {
        self.tables += report.tables;
        self.rows += report.rows;
        self.segments_skipped += report.segments_skipped;
        self.unresolved_metadata += report.unresolved_metadata;
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Processed {} files ({} skipped): {} tables, {} rows appended to '{}'",
            self.files_seen,
            self.files_skipped,
            self.tables,
            self.rows,
            self.output.display()
        )?;
        write!(
            f,
            "Skipped segments: {}, unresolved metadata fields: {}",
            self.segments_skipped, self.unresolved_metadata
        )?;
        write!(f, "\nEnriched dataset written to '{}'", self.enriched.display())?;
        if let Some(export) = &self.export {
            write!(f, "\nExported to '{}'", export.display())?;
        }
        Ok(())
    }
}

pub struct Pipeline<'a> {
    config: &'a Config,
    resolver: MetadataResolver<'a>,
    canonicalizer: Canonicalizer<'a>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Result<Self, UpdError> {
        config.validate()?;
        Ok(Self {
            config,
            resolver: MetadataResolver::new(&config.metadata),
            canonicalizer: Canonicalizer::new(&config.schema)?,
        })
    }

    /// Lists the input workbooks in path order, without duplicates.
    pub fn discover_inputs(&self) -> Result<Vec<PathBuf>, UpdError> {
        let input = &self.config.input;
        let mut paths = Vec::new();
        for pattern in &input.patterns {
            let pattern = input.directory.join(pattern);
            for entry in glob(&pattern.to_string_lossy())? {
                let path = entry?;
                if path.is_file() && is_supported(&path) {
                    paths.push(path);
                } else {
                    debug!("Ignore '{}'", path.display());
                }
            }
        }
        paths.sort();
        paths.dedup();
        Ok(paths)
    }

    /// Finds, extracts and canonicalises every table of one sheet.
    pub fn extract_tables(&self, grid: &Grid) -> SheetTables {
        let segments = segment(grid, self.config.headers.signature());
        if segments.is_empty() {
            debug!("No tables on '{}:{}'", grid.source, grid.sheet);
            return SheetTables::default();
        }
        self.extract_segments(grid, &segments)
    }

    /// Extracts the given segments of one sheet with its shared metadata.
    /// A segment that fails to extract is counted and skipped, the rest
    /// are still emitted.
    pub fn extract_segments(&self, grid: &Grid, segments: &[TableSegment]) -> SheetTables {
        let mut result = SheetTables::default();
        let metadata = self.resolver.resolve_sheet(grid);
        for segment in segments {
            match extract(grid, segment, &self.config.headers, self.config.table_shape, &metadata) {
                Ok(table) => {
                    for value in metadata.values.iter().filter(|value| value.value.is_none()) {
                        warn!("'{}': metadata column '{}' is unresolved", table.name, value.column);
                    }
                    result.unresolved_metadata += metadata.unresolved();
                    result.tables.push(self.canonicalizer.canonicalize(&table));
                }
                Err(e) => {
                    warn!(
                        "Skip table at rows {}..={} of '{}:{}': {}",
                        segment.start + 1,
                        segment.end + 1,
                        grid.source,
                        grid.sheet,
                        e
                    );
                    result.segments_skipped += 1;
                }
            }
        }
        result
    }

    /// Processes one workbook into the accumulator. Fails only when the
    /// workbook cannot be read or the output cannot be written.
    pub fn process_file(&self, path: &Path, accumulator: &mut Accumulator) -> Result<FileReport, UpdError> {
        let grids = load_grids(path)?;
        let mut report = FileReport {
            sheets: grids.len(),
            ..FileReport::default()
        };
        for grid in &grids {
            let sheet = self.extract_tables(grid);
            report.segments_skipped += sheet.segments_skipped;
            report.unresolved_metadata += sheet.unresolved_metadata;
            for table in &sheet.tables {
                let rows = accumulator.append(table)?;
                info!("Table '{}': {} rows", table.name, rows);
                report.tables += 1;
                report.rows += rows;
            }
        }
        Ok(report)
    }

    /// Applies the configured enrichment steps in order: lookup join,
    /// placeholder replacement, report join.
    pub fn enrich(&self, mut dataset: Table) -> Result<Table, UpdError> {
        let enrichment = &self.config.enrichment;
        let code_page = self.config.encoding.fallback_code_page;

        if let Some(lookup) = &enrichment.lookup {
            let reference = load_reference(&lookup.path, lookup.sheet.as_deref(), code_page)?;
            let (joined, stats) = join_reference(&dataset, &reference, lookup)?;
            info!(
                "Lookup '{}': {} matched, {} unmatched, {} dropped",
                lookup.path.display(),
                stats.matched,
                stats.unmatched,
                stats.dropped
            );
            dataset = joined;
        }

        if let Some(sentinels) = &enrichment.sentinels {
            let replaced = replace_sentinels(&mut dataset, sentinels)?;
            info!("Replaced {} placeholder values in column '{}'", replaced, sentinels.column);
        }

        if let Some(report) = &enrichment.report {
            let reference = load_reference(&report.path, report.sheet.as_deref(), code_page)?;
            dataset = join_enrich(&dataset, &reference, report)?;
            info!("Joined {} columns from '{}'", report.columns.len(), report.path.display());
        }
        Ok(dataset)
    }

    /// Runs the whole batch.
    pub fn run(&self) -> Result<RunSummary, UpdError> {
        let output = &self.config.output;
        let inputs = self.discover_inputs()?;
        if inputs.is_empty() {
            warn!("No input files in '{}'", self.config.input.directory.display());
        }

        let mut accumulator = Accumulator::open(&output.csv, &self.config.schema.column_order, self.config.encoding.fallback_code_page)?;
        let mut summary = RunSummary {
            files_seen: inputs.len(),
            output: output.csv.clone(),
            enriched: output.enriched_path(),
            ..RunSummary::default()
        };

        for path in &inputs {
            info!("Processing '{}'", path.display());
            match self.process_file(path, &mut accumulator) {
                Ok(report) => {
                    info!(
                        "'{}': {} sheets, {} tables, {} rows",
                        path.display(),
                        report.sheets,
                        report.tables,
                        report.rows
                    );
                    summary.add(&report);
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(UpdError::SpreadsheetError(e)) => {
                    warn!("Skip '{}': {}", path.display(), e);
                    summary.files_skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        let dataset = self.enrich(accumulator.into_dataset())?;
        persist_table(&summary.enriched, &dataset)?;

        if output.export {
            let xlsx = output.xlsx_path();
            export_table(&dataset, &xlsx, &output.sheet_name)?;
            summary.export = Some(xlsx);
        }
        Ok(summary)
    }
}
