//! Metadata query responses and their conversion to plain value lists.
//!
//! Data sources answer `SHOW ...` statements with the InfluxDB JSON shape:
//!
//! ```json
//! {"results": [{"statement_id": 0, "series": [
//!     {"name": "cpu", "columns": ["key", "value"], "values": [["host", "srv-1"], ["host", "srv-2"]]}
//! ]}]}
//! ```
//!
//! Which column holds the interesting value depends on the statement, see
//! [`value_column_for`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{Result, TempVarError};

/// Full response to one metadata query request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaQueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
}

/// Result of a single statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_id: Option<u64>,
    #[serde(default)]
    pub series: Vec<Series>,
    /// Error reported by the data source for this statement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One tabular series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl MetaQueryResponse {
    /// A response holding one series with a single column.
    pub fn single_column<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = values.into_iter().map(|v| vec![Value::String(v.into())]).collect();

        Self {
            results: vec![StatementResult {
                statement_id: Some(0),
                series: vec![Series {
                    name: None,
                    columns: vec![column.to_string()],
                    values: rows,
                }],
                error: None,
            }],
        }
    }

    /// A response reporting `message` as a statement error.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            results: vec![StatementResult {
                statement_id: Some(0),
                series: Vec::new(),
                error: Some(message.into()),
            }],
        }
    }
}

/// The column holding values for the statement `query`, when the statement
/// kind determines it.
///
/// Returns `None` for custom statements; those fall back to a `value` column
/// or the first column other than `time`.
pub fn value_column_for(query: &str) -> Option<&'static str> {
    let statement = Regex::new(
        r"(?i)^\s*SHOW\s+(DATABASES|MEASUREMENTS|RETENTION\s+POLICIES|TAG\s+KEYS|TAG\s+VALUES|FIELD\s+KEYS|SERIES)\b",
    )
    .ok()?;
    let kind = statement.captures(query)?.get(1)?.as_str();
    let kind = kind.split_whitespace().collect::<Vec<_>>().join(" ").to_uppercase();

    let column = match kind.as_str() {
        "DATABASES" | "MEASUREMENTS" | "RETENTION POLICIES" => "name",
        "TAG KEYS" => "tagKey",
        "TAG VALUES" => "value",
        "FIELD KEYS" => "fieldKey",
        "SERIES" => "key",
        _ => return None,
    };
    Some(column)
}

/// Flatten `response` to the distinct values of its value column, in order of
/// first appearance across all statements and series.
///
/// # Errors
///
/// - [`TempVarError::MetaQueryError`] when a statement reports an error
/// - [`TempVarError::MalformedResponse`] when a series lacks the value column
///   or a row is too short
pub fn parse_meta_query(query: &str, response: &MetaQueryResponse) -> Result<Vec<String>> {
    let known_column = value_column_for(query);
    let mut values: Vec<String> = Vec::new();

    for result in &response.results {
        if let Some(message) = &result.error {
            return Err(TempVarError::MetaQueryError {
                query: query.to_string(),
                message: message.clone(),
            });
        }

        for series in &result.series {
            let index = column_index(series, known_column).ok_or_else(|| {
                TempVarError::MalformedResponse {
                    query: query.to_string(),
                    reason: format!(
                        "series {} has no value column (columns: {})",
                        series.name.as_deref().unwrap_or("<unnamed>"),
                        series.columns.join(", ")
                    ),
                }
            })?;

            for row in &series.values {
                let cell = row.get(index).ok_or_else(|| TempVarError::MalformedResponse {
                    query: query.to_string(),
                    reason: format!("row has {} cells, expected at least {}", row.len(), index + 1),
                })?;

                if let Some(value) = cell_to_string(cell)
                    && !values.contains(&value)
                {
                    values.push(value);
                }
            }
        }
    }

    Ok(values)
}

fn column_index(series: &Series, known_column: Option<&str>) -> Option<usize> {
    let position = |name: &str| series.columns.iter().position(|c| c == name);

    match known_column {
        Some(column) => position(column),
        None => position("value").or_else(|| series.columns.iter().position(|c| c != "time")),
    }
}

// Nulls carry no selectable value and are skipped.
fn cell_to_string(cell: &Value) -> Option<String> {
    match cell {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
