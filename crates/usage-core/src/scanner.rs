//! Directory scanner for discovering usage report files

use crate::convert::ReportKind;
use crate::error::{Error, Result};
use crate::sections::{strip_wrapper, SEPARATOR};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A report file recognized during a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredReport {
    pub path: PathBuf,
    pub kind: ReportKind,
}

/// Result of scanning directories
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Root directories that were scanned
    pub roots: Vec<PathBuf>,
    /// Recognized reports, sorted by path
    pub reports: Vec<DiscoveredReport>,
    /// Number of text files examined
    pub total_files: usize,
}

impl ScanResult {
    /// Reports of the given kind
    pub fn of_kind(&self, kind: ReportKind) -> Vec<&DiscoveredReport> {
        self.reports.iter().filter(|r| r.kind == kind).collect()
    }
}

/// Scan one or more directories for `.txt` usage reports
pub fn scan_reports<P: AsRef<Path>>(roots: &[P]) -> Result<ScanResult> {
    let mut reports = Vec::new();
    let mut total_files = 0;

    for root in roots {
        let root = root.as_ref();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file() || !path.extension().is_some_and(|ext| ext == "txt") {
                continue;
            }
            total_files += 1;

            let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
                path: path.to_path_buf(),
                source: e,
            })?;
            match classify_report(&content) {
                Some(kind) => {
                    debug!("{} looks like a {} report", path.display(), kind);
                    reports.push(DiscoveredReport {
                        path: path.to_path_buf(),
                        kind,
                    });
                }
                None => debug!("Skipping {}", path.display()),
            }
        }
    }

    reports.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(ScanResult {
        roots: roots.iter().map(|r| r.as_ref().to_path_buf()).collect(),
        reports,
        total_files,
    })
}

/// Guess the report format from its contents
///
/// A separator line marks a detailed report; otherwise any line starting
/// with `|` marks a leaderboard.
pub fn classify_report(content: &str) -> Option<ReportKind> {
    let mut has_rows = false;
    for line in content.lines() {
        if strip_wrapper(line) == SEPARATOR {
            return Some(ReportKind::Detailed);
        }
        has_rows |= line.trim_start().starts_with('|');
    }
    has_rows.then_some(ReportKind::Leaderboard)
}
