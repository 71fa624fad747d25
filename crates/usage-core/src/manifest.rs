//! Record of a completed batch run
//!
//! Lists what each output was built from so later readers can tell which
//! reports the current files came from.

use crate::convert::{ConversionSummary, ReportKind};
use crate::error::{Error, Result};
use crate::output::write_atomic;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Outputs written by one batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// When the last output was persisted
    pub completed_at: DateTime<Utc>,
    pub outputs: Vec<ConversionSummary>,
}

impl Manifest {
    /// Create a manifest stamped with the current time
    pub fn new(outputs: Vec<ConversionSummary>) -> Self {
        Self {
            completed_at: Utc::now(),
            outputs,
        }
    }

    /// Load a manifest from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the manifest to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, content.as_bytes())
    }

    /// Outputs of the given kind
    pub fn outputs_of(&self, kind: ReportKind) -> impl Iterator<Item = &ConversionSummary> {
        self.outputs.iter().filter(move |o| o.kind == kind)
    }

    /// Total records and species written
    pub fn total_items(&self) -> usize {
        self.outputs.iter().map(|o| o.items).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn summary(kind: ReportKind, output: &str, items: usize) -> ConversionSummary {
        ConversionSummary {
            kind,
            input: PathBuf::from("reports/in.txt"),
            output: PathBuf::from(output),
            items,
        }
    }

    #[test]
    fn test_manifest_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.json");
        let manifest = Manifest::new(vec![
            summary(ReportKind::Leaderboard, "usage.txt", 120),
            summary(ReportKind::Detailed, "detailed.xml", 40),
        ]);

        manifest.save(&path).unwrap();
        let loaded = Manifest::load(&path).unwrap();

        assert_eq!(loaded, manifest);
    }

    #[test]
    fn test_manifest_queries() {
        let manifest = Manifest::new(vec![
            summary(ReportKind::Leaderboard, "usage.txt", 120),
            summary(ReportKind::Leaderboard, "lead.txt", 80),
            summary(ReportKind::Detailed, "detailed.xml", 40),
        ]);

        assert_eq!(manifest.outputs_of(ReportKind::Leaderboard).count(), 2);
        assert_eq!(manifest.total_items(), 240);
    }

    #[test]
    fn test_manifest_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Manifest::load(dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }
}
