//! Dataset export.
//!
//! Aggregations return plain data; turning them into chart-ready series or
//! JSON files on disk is this separate, explicit step.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::models::{KindHistograms, SeriesData};

/// Bucket granularity of an exported dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Hour,
    Date,
}

impl TimeUnit {
    pub fn label(&self) -> &'static str {
        match self {
            TimeUnit::Hour => "hour",
            TimeUnit::Date => "date",
        }
    }
}

impl std::fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Flatten per-kind histograms into an ordered list of named series, the
/// shape any table/chart renderer can consume directly.
pub fn to_series(histograms: &KindHistograms) -> Vec<SeriesData> {
    histograms
        .iter()
        .map(|(kind, data)| SeriesData {
            name: kind.slug().to_string(),
            data: data.clone(),
        })
        .collect()
}

/// Write one `<kind>_<unit>.json` file per kind into `dir`, replacing any
/// previous files. Returns the written paths.
pub fn write_datasets(
    histograms: &KindHistograms,
    unit: TimeUnit,
    dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create dataset directory: {}", dir.display()))?;

    let mut written = Vec::new();
    for (kind, histogram) in histograms {
        // Bucket labels land under the unit name ("hour" or "date"), values
        // in a parallel array.
        let mut dataset = serde_json::Map::new();
        dataset.insert(
            unit.label().to_string(),
            serde_json::to_value(histogram.keys().collect::<Vec<_>>())?,
        );
        dataset.insert(
            "values".to_string(),
            serde_json::to_value(histogram.values().collect::<Vec<_>>())?,
        );

        let path = dir.join(format!("{}_{}.json", kind.slug(), unit));
        let body = serde_json::to_string(&dataset)?;
        fs::write(&path, body)
            .with_context(|| format!("Failed to write dataset: {}", path.display()))?;
        written.push(path);
    }

    info!(count = written.len(), dir = %dir.display(), "datasets exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::hour_buckets;
    use crate::models::EventKind;

    fn histograms() -> KindHistograms {
        let mut result = KindHistograms::new();
        let mut accepted = hour_buckets();
        *accepted.get_mut("08").unwrap() = 5;
        result.insert(EventKind::AcceptedPassword, accepted);
        result.insert(EventKind::FailedPassword, hour_buckets());
        result
    }

    #[test]
    fn test_to_series_keeps_kind_order_and_data() {
        let series = to_series(&histograms());
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].name, "accepted_password");
        assert_eq!(series[1].name, "failed_password");
        assert_eq!(series[0].data["08"], 5);
    }

    #[test]
    fn test_write_datasets_creates_one_file_per_kind() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_datasets(&histograms(), TimeUnit::Hour, dir.path()).unwrap();

        assert_eq!(paths.len(), 2);
        assert!(dir.path().join("accepted_password_hour.json").exists());
        assert!(dir.path().join("failed_password_hour.json").exists());

        let body = fs::read_to_string(dir.path().join("accepted_password_hour.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["hour"][8], "08");
        assert_eq!(parsed["values"][8], 5);
        assert_eq!(parsed["hour"].as_array().unwrap().len(), 24);
    }

    #[test]
    fn test_write_datasets_overwrites_previous_files() {
        let dir = tempfile::tempdir().unwrap();
        write_datasets(&histograms(), TimeUnit::Hour, dir.path()).unwrap();

        let mut updated = KindHistograms::new();
        updated.insert(EventKind::AcceptedPassword, hour_buckets());
        write_datasets(&updated, TimeUnit::Hour, dir.path()).unwrap();

        let body = fs::read_to_string(dir.path().join("accepted_password_hour.json")).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(parsed["values"][8], 0);
    }
}
