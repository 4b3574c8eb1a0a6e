//! Per-line value extraction
//!
//! A telemetry line carries `name,value` token pairs at arbitrary positions
//! after the timestamp. Values are found by locating the first token equal to
//! the parameter name and taking the field right after it.

use crate::types::{Catalog, LogRow, OutputRow, ParameterEntry, SelectionSet};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Text written for a column whose value is not on the line
pub const DEFAULT_VALUE: &str = "0";

/// Name of the first output column
pub const TIMESTAMP_COLUMN: &str = "Timestamp";

/// How a parameter's name token is matched on a line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MatchMode {
    /// Match the member name anywhere on the line
    #[default]
    Anywhere,
    /// Only match on lines that also carry the group name as a token
    GroupGated,
}

/// What to write when a column has no value on the current line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MissingValue {
    #[default]
    Zero,
    /// Repeat the last value seen for the column
    HoldLast,
}

/// Columns to extract, fixed before the pass starts
#[derive(Debug, Clone)]
pub struct ExtractionPlan {
    columns: Vec<ParameterEntry>,
    match_mode: MatchMode,
    missing_value: MissingValue,
    last_values: Vec<String>,
}

impl ExtractionPlan {
    /// Build the column list in catalog order.
    ///
    /// The selection only holds catalog members, so every selected pair is
    /// reached exactly once.
    pub fn new(
        catalog: &Catalog,
        selection: &SelectionSet,
        match_mode: MatchMode,
        missing_value: MissingValue,
    ) -> Self {
        let mut columns: Vec<ParameterEntry> = Vec::new();
        for entry in catalog.entries() {
            if selection.contains(&entry.group, &entry.member) && !columns.contains(entry) {
                columns.push(entry.clone());
            }
        }

        let last_values = vec![DEFAULT_VALUE.to_string(); columns.len()];
        Self {
            columns,
            match_mode,
            missing_value,
            last_values,
        }
    }

    pub fn columns(&self) -> &[ParameterEntry] {
        &self.columns
    }

    /// `Timestamp` followed by one `group.member` name per column
    pub fn header(&self) -> Vec<String> {
        std::iter::once(TIMESTAMP_COLUMN.to_string())
            .chain(self.columns.iter().map(ParameterEntry::column_name))
            .collect()
    }

    /// Extract one output row from a log line
    pub fn extract(&mut self, row: &LogRow<'_>) -> OutputRow {
        let mut values = Vec::with_capacity(self.columns.len());

        for (index, column) in self.columns.iter().enumerate() {
            let gated_out =
                self.match_mode == MatchMode::GroupGated && !row.has_token(&column.group);
            let found = if gated_out {
                None
            } else {
                row.value_of(&column.member)
            };

            let value = match (found, self.missing_value) {
                (Some(value), MissingValue::HoldLast) => {
                    self.last_values[index] = value.to_string();
                    value.to_string()
                }
                (Some(value), MissingValue::Zero) => value.to_string(),
                (None, MissingValue::HoldLast) => self.last_values[index].clone(),
                (None, MissingValue::Zero) => DEFAULT_VALUE.to_string(),
            };
            values.push(value);
        }

        OutputRow {
            timestamp: row.timestamp().to_string(),
            values,
        }
    }

    /// Look up a value in an extracted row by column name
    pub fn value<'r>(&self, row: &'r OutputRow, column: &str) -> Option<&'r str> {
        if column == TIMESTAMP_COLUMN {
            return Some(&row.timestamp);
        }
        let index = self.columns.iter().position(|c| c.column_name() == column)?;
        row.values.get(index).map(String::as_str)
    }
}
