//! usage-core: Core library for converting usage statistics reports
//!
//! This library provides functionality to:
//! - Parse pipe-delimited usage leaderboards and write them as tab-delimited text
//! - Split boxed per-species detailed reports into sections
//! - Build a typed statistics tree and render it as nested markup or JSON
//! - Run batches of conversions with all-or-nothing output
//! - Scan directories for report files

pub mod batch;
pub mod convert;
pub mod entry;
pub mod error;
pub mod leaderboard;
pub mod manifest;
pub mod markup;
pub mod names;
pub mod output;
pub mod scanner;
pub mod sections;
pub mod tree;

pub use batch::{run_batch, BatchFile, BatchReport, DetailedJob, LeaderboardJob};
pub use convert::{
    convert_detailed, convert_leaderboard, render_tree, ConversionSummary, DetailedOptions,
    ReportKind, TreeFormat,
};
pub use entry::{parse_entry, CategoryEntry};
pub use error::{Error, Result};
pub use leaderboard::{
    parse_leaderboard, parse_leaderboard_str, read_leaderboard_tsv, render_leaderboard,
    write_leaderboard, UsageRecord,
};
pub use manifest::Manifest;
pub use markup::{parse_markup, serialize, Element};
pub use names::normalize;
pub use scanner::{classify_report, scan_reports, DiscoveredReport, ScanResult};
pub use sections::{split_sections, EntityBlock, Section, TrailingPolicy};
pub use tree::{build_tree, parse_detailed, parse_detailed_str, Category, StatsTree};
