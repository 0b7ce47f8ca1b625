//! Tabular inputs and outputs
//!
//! Team statistics, play-by-play rows, and the JSON-lines prompt/answer
//! records exchanged with the judge.

pub mod plays;
pub mod records;
pub mod team_summary;

pub use plays::PlayRow;
pub use records::{AnswerRecord, PromptRecord};
pub use team_summary::{Metric, TeamStat, TeamTable, METRIC_COUNT};

use crate::{OffenseError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Create the parent directory of an output path if needed
pub fn ensure_parent<P: AsRef<Path>>(path: P) -> Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Read every row of a CSV file with a fixed schema.
///
/// `required` columns are checked against the header first; any that are
/// absent are reported together as a configuration error naming `table`.
pub fn read_csv<T: DeserializeOwned, P: AsRef<Path>>(
    path: P,
    table: &str,
    required: &[&str],
) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(path.as_ref())?;
    let headers = reader.headers()?.clone();
    let missing: Vec<&str> = required
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .collect();
    if !missing.is_empty() {
        return Err(OffenseError::Configuration(format!(
            "These required columns are missing in {}: {:?}",
            table, missing
        )));
    }

    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Write rows to a CSV file, header taken from the field names
pub fn write_csv<T: Serialize, P: AsRef<Path>>(path: P, rows: &[T]) -> Result<()> {
    ensure_parent(&path)?;
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Render a float the same way on every run
pub(crate) fn format_value(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        String::new()
    }
}
