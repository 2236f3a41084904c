use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::error;
use upd_merge::config::{Config, LookupJoin, ReportJoin, TableShape};
use upd_merge::logging::init_logging;
use upd_merge::pipeline::Pipeline;

#[derive(Parser)]
#[command(name = "upd-merge")]
#[command(about = "Extract UPD tables from spreadsheets and merge them into one dataset")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory with the input workbooks
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Accumulated CSV output
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Enriched CSV output (defaults to the output path with an _enriched suffix)
    #[arg(long)]
    enriched: Option<PathBuf>,

    /// Spreadsheet export path (defaults to the output path with .xlsx)
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Do not export the dataset to xlsx
    #[arg(long)]
    no_export: bool,

    /// Tax-code reference file for the lookup join
    #[arg(long)]
    tax_codes: Option<PathBuf>,

    /// External report left-joined on the normalised identifier
    #[arg(long)]
    report: Option<PathBuf>,

    /// Table shape: four-column or six-column
    #[arg(long, value_parser = parse_shape)]
    shape: Option<TableShape>,

    /// More output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

fn parse_shape(value: &str) -> Result<TableShape, String> {
    TableShape::parse(value).ok_or_else(|| format!("unknown table shape '{}', expected four-column or six-column", value))
}

impl Cli {
    fn verbosity(&self) -> i8 {
        if self.quiet {
            -1
        } else {
            self.verbose.min(i8::MAX as u8) as i8
        }
    }

    /// Applies command line overrides on top of the file configuration.
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input.directory = input.clone();
        }
        if let Some(output) = &self.output {
            config.output.csv = output.clone();
        }
        if let Some(enriched) = &self.enriched {
            config.output.enriched = Some(enriched.clone());
        }
        if let Some(xlsx) = &self.xlsx {
            config.output.xlsx = Some(xlsx.clone());
        }
        if self.no_export {
            config.output.export = false;
        }
        if let Some(path) = &self.tax_codes {
            match &mut config.enrichment.lookup {
                Some(lookup) => lookup.path = path.clone(),
                None => config.enrichment.lookup = Some(LookupJoin::new(path.clone())),
            }
        }
        if let Some(path) = &self.report {
            match &mut config.enrichment.report {
                Some(report) => report.path = path.clone(),
                None => config.enrichment.report = Some(ReportJoin::new(path.clone())),
            }
        }
        if let Some(shape) = self.shape {
            config.table_shape = shape;
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    let pipeline = Pipeline::new(&config).context("Invalid configuration")?;
    let summary = pipeline.run().context("Run aborted")?;
    println!("{}", summary);
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity());

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
