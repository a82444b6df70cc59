//! Download format for the loss/accuracy series.
//!
//! A run is exported as a JSON array of `{epoch, loss, accuracy}` records: epochs count
//! from 1, loss is the raw value and accuracy is scaled to a percentage.

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// File name the export is offered under.
pub const EXPORT_FILE_NAME: &str = "neural-nexus-training-metrics.json";

/// One exported epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub epoch: usize,
    pub loss: f64,
    /// Accuracy in percent.
    pub accuracy: f64,
}

/// Pairs `loss` and `accuracy` by index into records.
///
/// One record is produced per loss value; an epoch without an accuracy value exports
/// an accuracy of 0.
pub fn records(loss: &[f64], accuracy: &[f64]) -> Vec<MetricRecord> {
    loss.iter()
        .enumerate()
        .map(|(i, &loss)| MetricRecord {
            epoch: i + 1,
            loss,
            accuracy: accuracy.get(i).map_or(0.0, |a| a * 100.0),
        })
        .collect()
}

/// Serializes records as pretty-printed JSON.
///
/// # Errors
/// Returns an error if serialization fails.
pub fn to_json(records: &[MetricRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Parses records previously produced by [`to_json`].
///
/// # Errors
/// Returns an error if `json` is not an array of records.
pub fn from_json(json: &str) -> Result<Vec<MetricRecord>> {
    Ok(serde_json::from_str(json)?)
}

/// Writes records to `path` as JSON.
///
/// # Errors
/// Returns an error if the file cannot be written.
pub fn write_json<P: AsRef<Path>>(path: P, records: &[MetricRecord]) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, to_json(records)?)?;
    log::info!("exported {} epochs to {}", records.len(), path.display());
    Ok(())
}

/// Reads records from a JSON file written by [`write_json`].
///
/// # Errors
/// Returns an error if the file cannot be read or parsed.
pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Vec<MetricRecord>> {
    from_json(&fs::read_to_string(path)?)
}
