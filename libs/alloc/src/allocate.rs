//! The allocation pass.

use labplan_table::Table;
use serde::Serialize;
use tracing::debug;

use crate::{AllocError, AllocationResult, ColumnNames, ReagentRow, TargetVolume};

/// Compute dispense volumes for every row, in order.
///
/// `remaining` is `target - total` clamped at zero. A row whose reagents
/// already exceed the target is returned with `remaining == 0`.
pub fn allocate(rows: &[ReagentRow], target: TargetVolume) -> Vec<AllocationResult> {
    rows.iter()
        .map(|row| {
            let total = row.total();
            AllocationResult {
                component_a: row.component_a,
                component_b: row.component_b,
                total,
                remaining: (target.as_ul() - total).max(0.0),
            }
        })
        .collect()
}

/// Convert table rows into reagent rows.
///
/// Both columns are checked for presence before any cell is read. The first
/// cell that is blank, not a number, not finite or negative aborts the batch.
pub fn rows_from_table(table: &Table, columns: &ColumnNames) -> Result<Vec<ReagentRow>, AllocError> {
    table
        .require_columns(&[columns.component_a.as_str(), columns.component_b.as_str()])
        .map_err(AllocError::Validation)?;

    table
        .records()
        .map(|record| -> Result<ReagentRow, AllocError> {
            let volume = |column: &str| {
                // Presence was checked above.
                let raw = record.get(column).unwrap_or_default();
                parse_volume(record.index(), column, raw)
            };
            Ok(ReagentRow::new(
                volume(&columns.component_a)?,
                volume(&columns.component_b)?,
            ))
        })
        .collect()
}

/// Read reagent rows from `table` and allocate them against `target`.
pub fn allocate_table(
    table: &Table,
    columns: &ColumnNames,
    target: TargetVolume,
) -> Result<Allocation, AllocError> {
    let rows = rows_from_table(table, columns)?;
    let allocation = Allocation {
        target,
        results: allocate(&rows, target),
    };
    debug!(
        rows = allocation.len(),
        target_ul = target.as_ul(),
        overfilled = allocation.overfilled().len(),
        "allocation complete"
    );
    Ok(allocation)
}

fn parse_volume(row: usize, column: &str, raw: &str) -> Result<f64, AllocError> {
    let conversion = |reason: &str| AllocError::Conversion {
        row,
        column: column.to_string(),
        value: raw.to_string(),
        reason: reason.to_string(),
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(conversion("blank cell"));
    }
    let value: f64 = trimmed.parse().map_err(|_| conversion("not a number"))?;
    if !value.is_finite() {
        return Err(conversion("not finite"));
    }
    if value < 0.0 {
        return Err(conversion("negative"));
    }
    Ok(value)
}

/// An allocation run: the target and one result per well.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub target: TargetVolume,
    pub results: Vec<AllocationResult>,
}

impl Allocation {
    /// Allocate `rows` against `target`.
    pub fn new(rows: &[ReagentRow], target: TargetVolume) -> Self {
        Self {
            target,
            results: allocate(rows, target),
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Indices of wells whose reagents alone exceed the target.
    pub fn overfilled(&self) -> Vec<usize> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, result)| result.is_overfilled(self.target))
            .map(|(index, _)| index)
            .collect()
    }

    /// Volume drawn from each source across the run.
    pub fn totals(&self) -> ReagentTotals {
        self.results
            .iter()
            .fold(ReagentTotals::default(), |acc, result| ReagentTotals {
                component_a: acc.component_a + result.component_a,
                component_b: acc.component_b + result.component_b,
                diluent: acc.diluent + result.remaining,
            })
    }
}

/// Summed volumes (µL) per source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ReagentTotals {
    pub component_a: f64,
    pub component_b: f64,
    pub diluent: f64,
}
