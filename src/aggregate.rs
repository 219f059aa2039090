//! Grouping and per-column reduction of filtered records.

use crate::amount::Amount;
use crate::config::GroupingConfig;
use crate::error::{EngineError, Result};
use crate::table::{Cell, Table};
use log::{debug, info};
use std::collections::HashMap;
use std::str::FromStr;

/// Aggregation function applied to one column of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Value from the earliest record of the group, in input order.
    First,

    /// Arithmetic sum; empty and non-numeric cells count as zero.
    Sum,
}

impl Reducer {
    pub fn name(&self) -> &'static str {
        match self {
            Reducer::First => "first",
            Reducer::Sum => "sum",
        }
    }

    fn accumulator(&self) -> Accumulator {
        match self {
            Reducer::First => Accumulator::First(None),
            Reducer::Sum => Accumulator::Sum(Amount::ZERO),
        }
    }
}

impl FromStr for Reducer {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Reducer::First),
            "sum" => Ok(Reducer::Sum),
            _ => Err(EngineError::InvalidConfig(format!(
                "unsupported aggregation function '{}' (expected 'first' or 'sum')",
                s
            ))),
        }
    }
}

/// Running state of one output column within one group.
enum Accumulator {
    First(Option<Cell>),
    Sum(Amount),
}

impl Accumulator {
    /// Returns `None` if a running sum overflows.
    fn feed(&mut self, cell: &Cell) -> Option<()> {
        match self {
            Accumulator::First(slot) => {
                if slot.is_none() {
                    *slot = Some(cell.clone());
                }
            }
            Accumulator::Sum(total) => *total = total.checked_add(cell.to_amount())?,
        }
        Some(())
    }

    fn finish(self) -> Cell {
        match self {
            Accumulator::First(slot) => slot.unwrap_or_default(),
            Accumulator::Sum(total) => Cell::Number(total),
        }
    }
}

/// Groups `records` by the configured key and reduces each group to one row.
///
/// Groups appear in the order their key is first seen. The summary header is
/// the grouping columns followed by one column per aggregation. Rows whose
/// key has an empty cell belong to no group and are left out.
///
/// # Errors
///
/// - [`EngineError::InvalidConfig`] for an unsupported reducer
/// - [`EngineError::MissingColumn`] if a grouping or aggregation column is absent
/// - [`EngineError::AmountOverflow`] if a group's sum leaves the decimal range
pub fn aggregate(records: &Table, grouping: &GroupingConfig) -> Result<Table> {
    let reducers = grouping.reducers()?;

    let key_columns = grouping
        .by
        .iter()
        .map(|column| records.require_column("invoice", column))
        .collect::<Result<Vec<_>>>()?;
    let value_columns = grouping
        .aggregations
        .iter()
        .map(|spec| records.require_column("invoice", &spec.column))
        .collect::<Result<Vec<_>>>()?;

    let mut index: HashMap<Vec<Cell>, usize> = HashMap::new();
    let mut groups: Vec<(Vec<Cell>, Vec<Accumulator>)> = Vec::new();
    let mut keyless = 0usize;

    for row in records.rows() {
        let key: Vec<Cell> = key_columns.iter().map(|&i| row[i].clone()).collect();
        if key.iter().any(Cell::is_empty) {
            keyless += 1;
            continue;
        }

        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, reducers.iter().map(Reducer::accumulator).collect()));
            groups.len() - 1
        });

        let (key, accumulators) = &mut groups[slot];
        let key = &*key;
        for ((acc, &col), spec) in accumulators
            .iter_mut()
            .zip(&value_columns)
            .zip(&grouping.aggregations)
        {
            acc.feed(&row[col]).ok_or_else(|| {
                EngineError::AmountOverflow(format!(
                    "column '{}' for group {}",
                    spec.column,
                    display_key(key)
                ))
            })?;
        }
    }

    if keyless > 0 {
        debug!("{} row(s) with an empty grouping key left out of the summary", keyless);
    }

    let header = grouping
        .by
        .iter()
        .map(String::as_str)
        .chain(grouping.aggregations.iter().map(|spec| spec.output_name()));
    let mut summary = Table::new(header);

    for (key, accumulators) in groups {
        let mut row = key;
        row.extend(accumulators.into_iter().map(Accumulator::finish));
        summary.push_row(row);
    }

    info!(
        "Grouped {} row(s) into {} summary row(s) by {}",
        records.len(),
        summary.len(),
        grouping.by.join(", ")
    );

    Ok(summary)
}

fn display_key(key: &[Cell]) -> String {
    key.iter().map(Cell::to_string).collect::<Vec<_>>().join(" / ")
}
