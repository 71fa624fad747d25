//! End-to-end conversion of report files
//!
//! A conversion is split into two steps: `prepare_*` reads and renders the
//! output fully in memory, and [`PendingOutput::persist`] writes it. The
//! batch runner prepares and stages every job before committing any of them.

use crate::error::Result;
use crate::leaderboard::{parse_leaderboard, render_leaderboard};
use crate::output::{stage_atomic, write_atomic, StagedFile};
use crate::sections::TrailingPolicy;
use crate::tree::{parse_detailed, StatsTree};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// The two supported report formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    /// Pipe-delimited overall or lead usage ranking
    Leaderboard,
    /// Boxed per-species breakdown
    Detailed,
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportKind::Leaderboard => write!(f, "leaderboard"),
            ReportKind::Detailed => write!(f, "detailed"),
        }
    }
}

/// Output encoding for the detailed statistics tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeFormat {
    #[default]
    Markup,
    Json,
}

impl fmt::Display for TreeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeFormat::Markup => write!(f, "markup"),
            TreeFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for TreeFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "markup" | "xml" => Ok(TreeFormat::Markup),
            "json" => Ok(TreeFormat::Json),
            _ => Err(format!("unknown format '{}', expected markup or json", s)),
        }
    }
}

/// Options for the detailed pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetailedOptions {
    pub trailing: TrailingPolicy,
    pub format: TreeFormat,
}

/// What a finished conversion produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionSummary {
    pub kind: ReportKind,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Records written (leaderboard) or species written (detailed)
    pub items: usize,
}

/// A rendered output that has not been written yet
#[derive(Debug, Clone)]
pub struct PendingOutput {
    pub summary: ConversionSummary,
    pub bytes: Vec<u8>,
}

impl PendingOutput {
    /// Write the rendered bytes to the target path
    pub fn persist(self) -> Result<ConversionSummary> {
        write_atomic(&self.summary.output, &self.bytes)?;
        Ok(self.summary)
    }

    /// Write the rendered bytes next to the target without replacing it
    pub fn stage(self) -> Result<(ConversionSummary, StagedFile)> {
        let staged = stage_atomic(&self.summary.output, &self.bytes)?;
        Ok((self.summary, staged))
    }
}

/// Render a statistics tree in the requested format
pub fn render_tree(tree: &StatsTree, format: TreeFormat) -> Result<Vec<u8>> {
    match format {
        TreeFormat::Markup => Ok(crate::markup::serialize(&tree.to_element()).into_bytes()),
        TreeFormat::Json => {
            let mut bytes = serde_json::to_vec_pretty(tree)?;
            bytes.push(b'\n');
            Ok(bytes)
        }
    }
}

/// Parse and render a leaderboard report without writing it
pub fn prepare_leaderboard(input: &Path, output: &Path) -> Result<PendingOutput> {
    let records = parse_leaderboard(input)?;
    info!(
        "Parsed {} records from {}",
        records.len(),
        input.display()
    );

    Ok(PendingOutput {
        bytes: render_leaderboard(&records)?,
        summary: ConversionSummary {
            kind: ReportKind::Leaderboard,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            items: records.len(),
        },
    })
}

/// Parse and render a detailed report without writing it
pub fn prepare_detailed(
    input: &Path,
    output: &Path,
    options: &DetailedOptions,
) -> Result<PendingOutput> {
    let tree = parse_detailed(input, options.trailing)?;
    info!(
        "Parsed {} species from {}",
        tree.entity_count(),
        input.display()
    );

    Ok(PendingOutput {
        bytes: render_tree(&tree, options.format)?,
        summary: ConversionSummary {
            kind: ReportKind::Detailed,
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            items: tree.entity_count(),
        },
    })
}

/// Convert a leaderboard report to a tab-delimited file
pub fn convert_leaderboard<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
) -> Result<ConversionSummary> {
    prepare_leaderboard(input.as_ref(), output.as_ref())?.persist()
}

/// Convert a detailed report to a markup or JSON tree
pub fn convert_detailed<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    options: &DetailedOptions,
) -> Result<ConversionSummary> {
    prepare_detailed(input.as_ref(), output.as_ref(), options)?.persist()
}
