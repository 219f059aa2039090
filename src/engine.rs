//! Engine façade and CSV boundary.
//!
//! [`PayablesEngine::process`] runs the whole computation over in-memory
//! tables: normalize, resolve balances, filter, aggregate. Every column an
//! active rule needs is checked before any stage runs, so a call either
//! produces both outputs or fails without producing either.
//!
//! [`read_table`], [`write_table`] and [`PayablesEngine::write_outputs`] are
//! the file-facing helpers used by the CLI.

use crate::aggregate::{aggregate, Reducer};
use crate::balance::BalanceResolver;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::filter::FilterPipeline;
use crate::record::RecordNormalizer;
use crate::table::{Cell, Table};
use csv::ReaderBuilder;
use log::{debug, info};
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::PathBuf;

/// The two results of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessOutput {
    /// Invoice rows that passed every enabled rule, normalized, in input order.
    pub filtered: Table,

    /// One row per supplier group.
    pub summary: Table,
}

/// The payables filter-and-summary engine.
///
/// Holds only a validated configuration; no state carries over between
/// [`process`](Self::process) calls.
#[derive(Debug, Clone)]
pub struct PayablesEngine {
    config: EngineConfig,
}

impl PayablesEngine {
    /// Creates an engine, validating the configuration up front.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(PayablesEngine { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Filters `invoices` and summarises the survivors per supplier.
    ///
    /// `balances` is only read when the balance exclusion rule is enabled.
    ///
    /// # Errors
    ///
    /// [`crate::EngineError::MissingColumn`] if either table lacks a column
    /// an active rule or the grouping needs, and
    /// [`crate::EngineError::AmountOverflow`] if a balance net or a summary
    /// sum leaves the decimal range.
    pub fn process(&self, invoices: &Table, balances: &Table) -> Result<ProcessOutput> {
        let config = &self.config;
        let pipeline = FilterPipeline::new(&config.filters);
        let reducers = config.grouping.reducers()?;

        pipeline.check_schema(invoices, &config.columns)?;
        for column in &config.grouping.by {
            invoices.require_column("invoice", column)?;
        }
        for spec in &config.grouping.aggregations {
            invoices.require_column("invoice", &spec.column)?;
        }

        let normalizer = RecordNormalizer::new(&config.columns);

        let exclusions = if pipeline.uses_balances() {
            BalanceResolver::resolve(&normalizer.balances(balances)?)?
        } else {
            debug!("Balance exclusion disabled, balance data not consulted");
            HashSet::new()
        };

        let summed: Vec<&str> = config
            .grouping
            .aggregations
            .iter()
            .zip(&reducers)
            .filter(|(_, reducer)| **reducer == Reducer::Sum)
            .map(|(spec, _)| spec.column.as_str())
            .collect();

        let records = normalizer.invoices(invoices, &summed);
        let total = records.len();
        let kept = pipeline.apply(records, &exclusions);
        info!("{} of {} invoice row(s) passed all rules", kept.len(), total);

        let mut filtered = Table::new(invoices.columns().iter().cloned());
        for record in kept {
            filtered.push_row(record.cells);
        }

        let summary = aggregate(&filtered, &config.grouping)?;

        Ok(ProcessOutput { filtered, summary })
    }

    /// Writes both outputs into the configured folder, creating it if needed.
    ///
    /// Returns the filtered and summary file paths.
    pub fn write_outputs(&self, output: &ProcessOutput) -> Result<(PathBuf, PathBuf)> {
        let settings = &self.config.output;
        fs::create_dir_all(&settings.output_folder)?;

        let (filtered_path, summary_path) = settings.output_paths();

        write_table(
            &output.filtered,
            BufWriter::new(File::create(&filtered_path)?),
            settings.accounting_format,
        )?;
        info!("Saved filtered data to {}", filtered_path.display());

        write_table(
            &output.summary,
            BufWriter::new(File::create(&summary_path)?),
            settings.accounting_format,
        )?;
        info!("Saved summary data to {}", summary_path.display());

        Ok((filtered_path, summary_path))
    }
}

/// One-shot form of [`PayablesEngine::process`].
pub fn process(invoices: &Table, balances: &Table, config: &EngineConfig) -> Result<ProcessOutput> {
    PayablesEngine::new(config.clone())?.process(invoices, balances)
}

/// Reads a CSV export into a [`Table`].
///
/// `header_row` is the zero-based line holding the column names; lines above
/// it are skipped. Header names are trimmed, data cells are kept verbatim.
/// Input with no header line yields an empty table.
pub fn read_table<R: Read>(reader: R, header_row: usize) -> Result<Table> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut records = csv_reader.records();

    for _ in 0..header_row {
        if records.next().transpose()?.is_none() {
            return Ok(Table::default());
        }
    }

    let header = match records.next().transpose()? {
        Some(header) => header,
        None => return Ok(Table::default()),
    };

    let mut table = Table::new(header.iter().map(str::trim));
    for result in records {
        let record = result?;
        table.push_row(record.iter().map(Cell::from_raw).collect());
    }

    debug!(
        "Read {} row(s) with {} column(s)",
        table.len(),
        table.columns().len()
    );
    Ok(table)
}

/// Writes a [`Table`] as CSV.
///
/// With `accounting` set, numeric cells are rendered as `1,234.00`,
/// `(1,234.00)` and `-`; otherwise with two plain decimals.
pub fn write_table<W: Write>(table: &Table, writer: W, accounting: bool) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.columns())?;
    for row in table.rows() {
        csv_writer.write_record(row.iter().map(|cell| match cell {
            Cell::Number(amount) if accounting => amount.to_accounting(),
            other => other.to_string(),
        }))?;
    }

    csv_writer.flush()?;
    Ok(())
}
