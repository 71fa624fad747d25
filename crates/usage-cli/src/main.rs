//! Usage statistics converter CLI
//!
//! Command-line tool for converting usage leaderboards and detailed
//! per-species reports into tab-delimited text and nested markup.

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use usage_core::{
    classify_report, convert_detailed, convert_leaderboard, parse_detailed_str,
    parse_leaderboard_str, read_leaderboard_tsv, run_batch, scan_reports, BatchFile,
    DetailedOptions, ReportKind, TrailingPolicy, TreeFormat,
};

#[derive(Parser)]
#[command(name = "usage-cli")]
#[command(about = "Usage statistics report converter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a pipe-delimited leaderboard to tab-delimited text
    Leaderboard {
        /// Leaderboard report to read
        #[arg(short, long)]
        input: PathBuf,

        /// Tab-delimited file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Convert a detailed per-species report to a statistics tree
    Detailed {
        /// Detailed report to read
        #[arg(short, long)]
        input: PathBuf,

        /// Tree file to write
        #[arg(short, long)]
        output: PathBuf,

        /// Output format (markup or json)
        #[arg(long, default_value = "markup")]
        format: TreeFormat,

        /// Handling of a final block without a closing separator (reject, drop or close)
        #[arg(long, default_value = "reject")]
        trailing: TrailingPolicy,
    },

    /// Run every conversion listed in a batch file
    Batch {
        /// Path to batch file (JSON); the built-in file names are used if omitted
        #[arg(short, long)]
        batch: Option<PathBuf>,
    },

    /// Create a batch file template with the built-in file names
    CreateBatch {
        /// Output path for the batch file
        #[arg(short, long)]
        output: PathBuf,

        /// Manifest path to record in the template
        #[arg(long)]
        manifest: Option<PathBuf>,
    },

    /// Scan directories for report files
    Scan {
        /// Root directories to scan
        #[arg(short, long, required = true)]
        root: Vec<PathBuf>,
    },

    /// Parse and display a single report file
    Parse {
        /// Path to report file
        #[arg(short, long)]
        file: PathBuf,

        /// Maximum number of rows or species to display
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> usage_core::Result<()> {
    match command {
        Commands::Leaderboard { input, output } => cmd_leaderboard(&input, &output),
        Commands::Detailed {
            input,
            output,
            format,
            trailing,
        } => cmd_detailed(&input, &output, DetailedOptions { trailing, format }),
        Commands::Batch { batch } => cmd_batch(batch.as_deref()),
        Commands::CreateBatch { output, manifest } => cmd_create_batch(&output, manifest),
        Commands::Scan { root } => cmd_scan(&root),
        Commands::Parse { file, limit } => cmd_parse(&file, limit),
    }
}

fn cmd_leaderboard(input: &Path, output: &Path) -> usage_core::Result<()> {
    let summary = convert_leaderboard(input, output)?;
    println!(
        "Converted {} records from {} to {}",
        summary.items,
        input.display(),
        output.display()
    );
    Ok(())
}

fn cmd_detailed(input: &Path, output: &Path, options: DetailedOptions) -> usage_core::Result<()> {
    let summary = convert_detailed(input, output, &options)?;
    println!(
        "Converted {} species from {} to {} ({})",
        summary.items,
        input.display(),
        output.display(),
        options.format
    );
    Ok(())
}

fn cmd_batch(batch_path: Option<&Path>) -> usage_core::Result<()> {
    let batch = match batch_path {
        Some(path) => BatchFile::load(path)?,
        None => {
            debug!("No batch file given, using built-in file names");
            BatchFile::default()
        }
    };

    println!(
        "Running batch with {} leaderboard(s){}",
        batch.leaderboards.len(),
        if batch.detailed.is_some() {
            " and detailed statistics"
        } else {
            ""
        }
    );

    let report = run_batch(&batch)?;

    println!();
    println!("Batch complete:");
    for summary in &report.outputs {
        println!(
            "  {} -> {} ({} {})",
            summary.input.display(),
            summary.output.display(),
            summary.items,
            match summary.kind {
                ReportKind::Leaderboard => "records",
                ReportKind::Detailed => "species",
            }
        );
    }
    if let Some(manifest) = &report.manifest {
        println!("  manifest: {}", manifest.display());
    }

    Ok(())
}

fn cmd_create_batch(output: &Path, manifest: Option<PathBuf>) -> usage_core::Result<()> {
    let batch = BatchFile {
        manifest,
        ..BatchFile::default()
    };

    batch.save(output)?;
    println!("Created batch file: {}", output.display());
    println!();
    println!("Edit the file to configure your batch, then run:");
    println!("  usage-cli batch --batch {}", output.display());

    Ok(())
}

fn cmd_scan(roots: &[PathBuf]) -> usage_core::Result<()> {
    let result = scan_reports(roots)?;

    println!("Scanned {} root(s):", result.roots.len());
    for root in &result.roots {
        println!("  {}", root.display());
    }
    println!();
    println!(
        "Found {} reports in {} text files",
        result.reports.len(),
        result.total_files
    );

    for report in &result.reports {
        println!("  [{}] {}", report.kind, report.path.display());
    }

    Ok(())
}

fn cmd_parse(file: &Path, limit: usize) -> usage_core::Result<()> {
    let content = fs::read_to_string(file).map_err(|e| usage_core::Error::FileRead {
        path: file.to_path_buf(),
        source: e,
    })?;

    println!("File: {}", file.display());

    match classify_report(&content) {
        Some(ReportKind::Leaderboard) => {
            let records = parse_leaderboard_str(&content)?;
            println!("Kind: leaderboard");
            println!("Records: {}", records.len());
            println!();

            for record in records.iter().take(limit) {
                println!(
                    "{}\t{}",
                    usage_core::normalize(&record.name),
                    record.percentage
                );
            }
            if records.len() > limit {
                println!("... ({} more rows)", records.len() - limit);
            }
        }
        Some(ReportKind::Detailed) => {
            let tree = parse_detailed_str(&content, TrailingPolicy::Close)?;
            println!("Kind: detailed");
            println!("Species: {}", tree.entity_count());
            println!();

            for entity in tree.entities.iter().take(limit) {
                let categories: Vec<String> = entity
                    .categories
                    .iter()
                    .map(|c| format!("{} ({})", c.category.singular(), c.entries.len()))
                    .collect();
                println!("{}\t{}", entity.name, categories.join(", "));
            }
            if tree.entity_count() > limit {
                println!("... ({} more species)", tree.entity_count() - limit);
            }
        }
        None if content.contains('\t') => {
            let records = read_leaderboard_tsv(&content)?;
            println!("Kind: converted leaderboard");
            println!("Records: {}", records.len());
            println!();

            for record in records.iter().take(limit) {
                println!("{}\t{}", record.name, record.percentage);
            }
            if records.len() > limit {
                println!("... ({} more rows)", records.len() - limit);
            }
        }
        None => println!("Kind: unrecognized"),
    }

    Ok(())
}
