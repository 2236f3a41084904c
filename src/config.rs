//! # Run Configuration
//!
//! Every table the pipeline relies on (header vocabulary, canonical column
//! order, marker phrases, join keys) lives here as plain data. A `Config` is
//! built once at startup, validated, and handed by reference to each stage,
//! so a different document family only needs a different TOML file.
use crate::dataset::column::ColumnRef;
use crate::error::UpdError;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Header labels recognised as table columns, in their natural UPD order.
/// The first six form the header signature.
const DEFAULT_VOCABULARY: [&str; 23] = [
    "А", "1", "1а", "1б", "2", "2а", "3", "4", "5", "6", "7", "8", "9", "10", "10а", "11", "12",
    "12а", "13", "14", "(5а)", "(2)", "(2б)",
];

const DEFAULT_DERIVED_COLUMN: &str = "(номер без @ и без -)";

const DEFAULT_COLUMN_ORDER: [&str; 24] = [
    "А",
    DEFAULT_DERIVED_COLUMN,
    "1",
    "1а",
    "1б",
    "2",
    "2а",
    "3",
    "4",
    "5",
    "6",
    "7",
    "8",
    "9",
    "10",
    "10а",
    "11",
    "12",
    "12а",
    "13",
    "14",
    "(5а)",
    "(2)",
    "(2б)",
];

const DEFAULT_REPORT_COLUMNS: [&str; 11] = [
    "Клиент",
    "Поставщик",
    "Бренд",
    "Номер",
    "Описание",
    "Тип оплаты",
    "Кол.",
    "Цена продажи",
    "Вес",
    "Адрес доставки",
    "Создал",
];

/// Configuration problems. Always fatal: they describe the setup, not the data.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {message}")]
    ReadFailed { path: String, message: String },

    #[error("Invalid config file '{path}': {message}")]
    ParseFailed { path: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// Complete pipeline configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: InputConfig,
    pub output: OutputConfig,
    pub headers: HeaderConfig,
    pub schema: SchemaConfig,
    pub metadata: MetadataConfig,
    pub table_shape: TableShape,
    pub encoding: EncodingConfig,
    pub enrichment: EnrichmentConfig,
}

impl Config {
    /// Loads the configuration from a TOML file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, UpdError> {
        let config = match path {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?;
                toml::from_str::<Config>(&content).map_err(|e| ConfigError::ParseFailed {
                    path: path.display().to_string(),
                    message: e.to_string(),
                })?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that the tables referenced by different sections agree with each other.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let headers = &self.headers;
        if headers.signature_len == 0 || headers.signature_len > headers.vocabulary.len() {
            return Err(ConfigError::Invalid(format!(
                "header signature length {} must be between 1 and the vocabulary size {}",
                headers.signature_len,
                headers.vocabulary.len()
            )));
        }

        let schema = &self.schema;
        let identifier = schema.position(&schema.identifier_column).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "identifier column '{}' is missing from the column order",
                schema.identifier_column
            ))
        })?;
        if schema.position(&schema.derived_column) != Some(identifier + 1) {
            return Err(ConfigError::Invalid(format!(
                "derived column '{}' must directly follow '{}' in the column order",
                schema.derived_column, schema.identifier_column
            )));
        }
        Regex::new(&schema.strip_pattern).map_err(|e| {
            ConfigError::Invalid(format!("strip pattern '{}': {}", schema.strip_pattern, e))
        })?;

        for field in &self.metadata.fields {
            if schema.position(&field.column).is_none() {
                return Err(ConfigError::Invalid(format!(
                    "metadata column '{}' is missing from the column order",
                    field.column
                )));
            }
        }
        Ok(())
    }
}

/// Where the UPD spreadsheets are picked up from.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    pub directory: PathBuf,
    /// Glob patterns relative to `directory`
    pub patterns: Vec<String>,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("upd"),
            patterns: strings(&["*.xls*", "*.ods"]),
        }
    }
}

/// Where the accumulated dataset goes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Canonical accumulated dataset, resumed on the next run
    pub csv: PathBuf,
    /// Enriched dataset, defaults to `<csv stem>_enriched.csv` next to the CSV
    pub enriched: Option<PathBuf>,
    /// Spreadsheet export path, defaults to the CSV path with an `.xlsx` extension
    pub xlsx: Option<PathBuf>,
    pub export: bool,
    pub sheet_name: String,
}

impl OutputConfig {
    pub fn enriched_path(&self) -> PathBuf {
        self.enriched.clone().unwrap_or_else(|| {
            let stem = self
                .csv
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.csv.with_file_name(format!("{}_enriched.csv", stem))
        })
    }

    pub fn xlsx_path(&self) -> PathBuf {
        self.xlsx
            .clone()
            .unwrap_or_else(|| self.csv.with_extension("xlsx"))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: PathBuf::from("all_data_file.csv"),
            enriched: None,
            xlsx: None,
            export: true,
            sheet_name: "Sheet1".to_owned(),
        }
    }
}

/// Header labels that identify and shape an embedded table.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderConfig {
    pub vocabulary: Vec<String>,
    /// How many leading vocabulary entries must all be present in a header row
    pub signature_len: usize,
}

impl HeaderConfig {
    pub fn signature(&self) -> &[String] {
        let len = self.signature_len.min(self.vocabulary.len());
        &self.vocabulary[..len]
    }

    pub fn contains(&self, label: &str) -> bool {
        self.vocabulary.iter().any(|header| header == label)
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            vocabulary: strings(&DEFAULT_VOCABULARY),
            signature_len: 6,
        }
    }
}

/// The canonical output schema.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    pub column_order: Vec<String>,
    /// Raw positional identifier the derived column is computed from
    pub identifier_column: String,
    pub derived_column: String,
    /// Characters matching this pattern are removed from the identifier
    pub strip_pattern: String,
    /// Columns normalised to plain decimal numbers
    pub numeric_columns: Vec<String>,
}

impl SchemaConfig {
    pub fn position(&self, column: &str) -> Option<usize> {
        self.column_order.iter().position(|name| name == column)
    }
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            column_order: strings(&DEFAULT_COLUMN_ORDER),
            identifier_column: "А".to_owned(),
            derived_column: DEFAULT_DERIVED_COLUMN.to_owned(),
            strip_pattern: "[@-]".to_owned(),
            numeric_columns: Vec::new(),
        }
    }
}

/// One metadata concept scraped from free text around the tables.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetadataField {
    /// Canonical column receiving the value
    pub column: String,
    /// Marker tried first; the row must also carry a trailing field label
    pub strict: String,
    /// Marker tried when the strict one finds nothing usable
    pub loose: String,
}

impl MetadataField {
    pub fn new(column: &str, strict: &str, loose: &str) -> Self {
        Self {
            column: column.to_owned(),
            strict: strict.to_owned(),
            loose: loose.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    pub fields: Vec<MetadataField>,
    /// A loose value containing this token is re-resolved from `override_marker`
    pub override_token: String,
    pub override_marker: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            fields: vec![
                MetadataField::new("(2)", "Продавец:", "Продавец"),
                MetadataField::new("(2б)", "ИНН/КПП продавца:", "ИНН/КПП продавца"),
                MetadataField::new("(5а)", "Документ об отгрузке", "Документ об отгрузке:"),
            ],
            override_token: "тот".to_owned(),
            override_marker: "Счет-фактура №".to_owned(),
        }
    }
}

/// Layout family of the embedded tables, deciding which positional column
/// must be filled for a data row to be kept.
#[derive(Copy, Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TableShape {
    #[default]
    FourColumn,
    SixColumn,
}

impl TableShape {
    pub const fn must_have_index(&self) -> usize {
        match self {
            Self::FourColumn => 3,
            Self::SixColumn => 5,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "4" | "four" | "four-column" => Some(Self::FourColumn),
            "6" | "six" | "six-column" => Some(Self::SixColumn),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EncodingConfig {
    /// Windows code page used for text files that are neither BOM-marked nor UTF-8
    pub fallback_code_page: u16,
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            fallback_code_page: 1251,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_lookup_self_key() -> ColumnRef {
    ColumnRef::Name(DEFAULT_DERIVED_COLUMN.to_owned())
}

fn default_lookup_target() -> ColumnRef {
    ColumnRef::Name("1б".to_owned())
}

fn default_lookup_reference_key() -> ColumnRef {
    ColumnRef::Index(0)
}

fn default_lookup_reference_value() -> ColumnRef {
    ColumnRef::Index(5)
}

/// Replace one dataset column by dictionary lookup into a reference file.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LookupJoin {
    pub path: PathBuf,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_lookup_self_key")]
    pub self_key: ColumnRef,
    #[serde(default = "default_lookup_target")]
    pub target: ColumnRef,
    #[serde(default = "default_lookup_reference_key")]
    pub reference_key: ColumnRef,
    #[serde(default = "default_lookup_reference_value")]
    pub reference_value: ColumnRef,
    #[serde(default = "default_true")]
    pub keep_unmatched: bool,
    #[serde(default)]
    pub case_sensitive: bool,
    #[serde(default = "default_true")]
    pub strip_spaces: bool,
}

impl LookupJoin {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            sheet: None,
            self_key: default_lookup_self_key(),
            target: default_lookup_target(),
            reference_key: default_lookup_reference_key(),
            reference_value: default_lookup_reference_value(),
            keep_unmatched: true,
            case_sensitive: false,
            strip_spaces: true,
        }
    }
}

/// Replace placeholder values of one column with a default.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SentinelReplacement {
    pub column: String,
    pub sentinels: Vec<String>,
    pub replacement: String,
}

impl Default for SentinelReplacement {
    fn default() -> Self {
        Self {
            column: "10а".to_owned(),
            sentinels: strings(&["-", "--", "----"]),
            replacement: "РОССИЯ".to_owned(),
        }
    }
}

fn default_report_self_key() -> String {
    DEFAULT_DERIVED_COLUMN.to_owned()
}

fn default_report_reference_key() -> String {
    "Номер без разделителей".to_owned()
}

fn default_report_columns() -> Vec<String> {
    strings(&DEFAULT_REPORT_COLUMNS)
}

/// Left-join named columns of an external report onto the dataset.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportJoin {
    pub path: PathBuf,
    #[serde(default)]
    pub sheet: Option<String>,
    #[serde(default = "default_report_self_key")]
    pub self_key: String,
    #[serde(default = "default_report_reference_key")]
    pub reference_key: String,
    #[serde(default = "default_report_columns")]
    pub columns: Vec<String>,
}

impl ReportJoin {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            sheet: None,
            self_key: default_report_self_key(),
            reference_key: default_report_reference_key(),
            columns: default_report_columns(),
        }
    }
}

/// Post-merge enrichment steps, applied in field order.
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    pub lookup: Option<LookupJoin>,
    pub sentinels: Option<SentinelReplacement>,
    pub report: Option<ReportJoin>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            lookup: None,
            sentinels: Some(SentinelReplacement::default()),
            report: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.headers.signature(), &["А", "1", "1а", "1б", "2", "2а"]);
        assert_eq!(config.schema.column_order.len(), 24);
        assert_eq!(config.schema.column_order[1], "(номер без @ и без -)");
    }

    #[test]
    fn parse_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            table_shape = "six-column"

            [input]
            directory = "upd_snab"

            [enrichment.lookup]
            path = "tnved/codes.xlsx"
            reference_value = 2

            [enrichment.report]
            path = "report.csv"
            columns = ["Клиент"]
            "#,
        )
        .unwrap();

        assert_eq!(config.table_shape, TableShape::SixColumn);
        assert_eq!(config.table_shape.must_have_index(), 5);
        assert_eq!(config.input.directory, PathBuf::from("upd_snab"));
        assert_eq!(config.input.patterns, vec!["*.xls*", "*.ods"]);

        let lookup = config.enrichment.lookup.unwrap();
        assert_eq!(lookup.reference_value, ColumnRef::Index(2));
        assert_eq!(lookup.reference_key, ColumnRef::Index(0));
        assert_eq!(lookup.target, ColumnRef::Name("1б".to_owned()));
        assert!(lookup.keep_unmatched);

        let report = config.enrichment.report.unwrap();
        assert_eq!(report.columns, vec!["Клиент"]);
        assert_eq!(report.reference_key, "Номер без разделителей");
        assert!(config.enrichment.sentinels.is_some());
    }

    #[test]
    fn reject_unknown_field() {
        let result: Result<Config, _> = toml::from_str("[input]\ndirectry = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn reject_misplaced_derived_column() {
        let mut config = Config::default();
        config.schema.column_order.swap(1, 2);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn reject_oversized_signature() {
        let mut config = Config::default();
        config.headers.signature_len = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upd.toml");
        fs::write(&path, "[input\ndirectory = 1\n").unwrap();
        let err = Config::load(Some(&path)).unwrap_err();

        assert!(matches!(err, UpdError::ConfigError(ConfigError::ParseFailed { .. })));
        assert!(err.is_fatal());
    }

    #[test]
    fn derive_output_paths_from_csv() {
        let mut output = OutputConfig::default();
        output.csv = PathBuf::from("out/all_data_file.csv");
        assert_eq!(output.enriched_path(), PathBuf::from("out/all_data_file_enriched.csv"));
        assert_eq!(output.xlsx_path(), PathBuf::from("out/all_data_file.xlsx"));

        output.enriched = Some(PathBuf::from("report/joined.csv"));
        assert_eq!(output.enriched_path(), PathBuf::from("report/joined.csv"));
    }

    #[test]
    fn parse_table_shape_alias() {
        assert_eq!(TableShape::parse("6"), Some(TableShape::SixColumn));
        assert_eq!(TableShape::parse("Four-Column"), Some(TableShape::FourColumn));
        assert_eq!(TableShape::parse("five"), None);
    }
}
