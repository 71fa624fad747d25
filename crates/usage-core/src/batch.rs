//! Batch configuration and runner
//!
//! A batch file lists every conversion of one run:
//!
//! ```json
//! {
//!   "leaderboards": [
//!     { "name": "overall", "input": "reports/usage.txt", "output": "settings/usage.txt" }
//!   ],
//!   "detailed": { "input": "reports/moveset.txt", "output": "settings/detailed.xml" },
//!   "manifest": "settings/manifest.json"
//! }
//! ```
//!
//! Relative paths resolve against the directory holding the batch file.

use crate::convert::{
    prepare_detailed, prepare_leaderboard, ConversionSummary, DetailedOptions, PendingOutput,
    TreeFormat,
};
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::output::write_atomic;
use crate::sections::TrailingPolicy;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// One leaderboard conversion, e.g. "overall" or "lead"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardJob {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl LeaderboardJob {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// The detailed report conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailedJob {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub trailing: TrailingPolicy,
    #[serde(default)]
    pub format: TreeFormat,
}

impl DetailedJob {
    pub fn options(&self) -> DetailedOptions {
        DetailedOptions {
            trailing: self.trailing,
            format: self.format,
        }
    }
}

/// A batch file describing all conversions of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFile {
    #[serde(default)]
    pub leaderboards: Vec<LeaderboardJob>,
    #[serde(default)]
    pub detailed: Option<DetailedJob>,
    /// Where to record the run manifest, if anywhere
    #[serde(default)]
    pub manifest: Option<PathBuf>,
}

impl Default for BatchFile {
    /// The fixed file names of the legacy batch script
    fn default() -> Self {
        Self {
            leaderboards: vec![
                LeaderboardJob::new("overall", "reports/usage.txt", "settings/usage.txt"),
                LeaderboardJob::new("lead", "reports/leads.txt", "settings/lead.txt"),
            ],
            detailed: Some(DetailedJob {
                input: PathBuf::from("reports/moveset.txt"),
                output: PathBuf::from("settings/detailed.xml"),
                trailing: TrailingPolicy::default(),
                format: TreeFormat::default(),
            }),
            manifest: None,
        }
    }
}

impl BatchFile {
    /// Load a batch file from JSON, resolving relative paths against its directory
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let batch: BatchFile = serde_json::from_str(&content)?;

        match path.parent() {
            Some(base) => Ok(batch.resolved_against(base)),
            None => Ok(batch),
        }
    }

    /// Save the batch file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut content = serde_json::to_string_pretty(self)?;
        content.push('\n');
        write_atomic(path, content.as_bytes())
    }

    /// Prefix every relative path with `base`
    pub fn resolved_against(mut self, base: &Path) -> Self {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        for job in &mut self.leaderboards {
            resolve(&mut job.input);
            resolve(&mut job.output);
        }
        if let Some(job) = self.detailed.as_mut() {
            resolve(&mut job.input);
            resolve(&mut job.output);
        }
        if let Some(manifest) = self.manifest.as_mut() {
            resolve(manifest);
        }
        self
    }

    /// Every path this batch writes, in job order
    pub fn outputs(&self) -> Vec<&Path> {
        let mut outputs: Vec<&Path> = self
            .leaderboards
            .iter()
            .map(|j| j.output.as_path())
            .collect();
        outputs.extend(self.detailed.iter().map(|j| j.output.as_path()));
        outputs.extend(self.manifest.as_deref());
        outputs
    }

    /// Every path this batch reads, in job order
    pub fn inputs(&self) -> Vec<&Path> {
        let mut inputs: Vec<&Path> = self
            .leaderboards
            .iter()
            .map(|j| j.input.as_path())
            .collect();
        inputs.extend(self.detailed.iter().map(|j| j.input.as_path()));
        inputs
    }

    /// Fail if two jobs would write the same file or a job would overwrite an input
    ///
    /// Paths are compared after lexical normalization, so `./a/b.txt` and
    /// `a/x/../b.txt` name the same file.
    pub fn validate(&self) -> Result<()> {
        let inputs: HashSet<PathBuf> = self.inputs().into_iter().map(normalize_path).collect();

        let mut seen = HashSet::new();
        for output in self.outputs() {
            let normalized = normalize_path(output);
            if inputs.contains(&normalized) {
                return Err(Error::OutputIsInput(output.to_path_buf()));
            }
            if !seen.insert(normalized) {
                return Err(Error::DuplicateOutput(output.to_path_buf()));
            }
        }
        Ok(())
    }
}

/// Resolve `.` and `..` components without touching the filesystem
fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Result of a completed batch
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub outputs: Vec<ConversionSummary>,
    pub manifest: Option<PathBuf>,
}

/// Run every job of a batch
///
/// All inputs are parsed, rendered and staged next to their targets before
/// the first target is replaced. A parse, render or staging failure leaves
/// every target untouched; only a failed rename during the final commit can
/// leave the earlier targets already replaced.
pub fn run_batch(batch: &BatchFile) -> Result<BatchReport> {
    batch.validate()?;

    let mut pending: Vec<PendingOutput> = Vec::new();
    for job in &batch.leaderboards {
        info!("Preparing '{}' leaderboard", job.name);
        pending.push(prepare_leaderboard(&job.input, &job.output)?);
    }
    if let Some(job) = &batch.detailed {
        info!("Preparing detailed statistics");
        pending.push(prepare_detailed(&job.input, &job.output, &job.options())?);
    }

    let staged = pending
        .into_iter()
        .map(PendingOutput::stage)
        .collect::<Result<Vec<_>>>()?;

    let mut outputs = Vec::with_capacity(staged.len());
    for (summary, file) in staged {
        file.commit()?;
        outputs.push(summary);
    }

    if let Some(path) = &batch.manifest {
        Manifest::new(outputs.clone()).save(path)?;
    }

    Ok(BatchReport {
        outputs,
        manifest: batch.manifest.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::SEPARATOR;

    fn write_inputs(dir: &Path) {
        fs::create_dir_all(dir.join("reports")).unwrap();
        fs::write(
            dir.join("reports/usage.txt"),
            "| Rank | Pokemon | Usage |\n| 1 | Giratina | 20.0% |\n",
        )
        .unwrap();
        fs::write(
            dir.join("reports/leads.txt"),
            "| Rank | Pokemon | Usage |\n| 1 | Azelf | 12.0% |\n| 2 | Deoxys | 8.0% |\n",
        )
        .unwrap();
        let sep = format!(" +{}+ \n", SEPARATOR);
        fs::write(
            dir.join("reports/moveset.txt"),
            format!("{sep} | Azelf | \n{sep} | Moves | \n | Explosion 90.00% | \n{sep}{sep}"),
        )
        .unwrap();
    }

    #[test]
    fn test_default_batch_names() {
        let batch = BatchFile::default();

        assert_eq!(batch.leaderboards[0].name, "overall");
        assert_eq!(batch.leaderboards[1].name, "lead");
        assert_eq!(batch.outputs().len(), 3);
        assert!(batch.validate().is_ok());
    }

    #[test]
    fn test_batch_file_serialization() {
        let batch = BatchFile::default();

        let json = serde_json::to_string_pretty(&batch).unwrap();
        let loaded: BatchFile = serde_json::from_str(&json).unwrap();

        assert_eq!(loaded, batch);
    }

    #[test]
    fn test_batch_file_optional_fields() {
        let json = r#"{ "detailed": { "input": "a.txt", "output": "b.xml" } }"#;
        let batch: BatchFile = serde_json::from_str(json).unwrap();

        assert!(batch.leaderboards.is_empty());
        let detailed = batch.detailed.unwrap();
        assert_eq!(detailed.trailing, TrailingPolicy::Reject);
        assert_eq!(detailed.format, TreeFormat::Markup);
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("batch.json");
        BatchFile::default().save(&path).unwrap();

        let loaded = BatchFile::load(&path).unwrap();

        assert_eq!(loaded.leaderboards[0].input, dir.path().join("reports/usage.txt"));
        assert_eq!(
            loaded.detailed.unwrap().output,
            dir.path().join("settings/detailed.xml")
        );
    }

    #[test]
    fn test_duplicate_output_rejected() {
        let mut batch = BatchFile::default();
        batch.leaderboards[1].output = batch.leaderboards[0].output.clone();

        assert!(matches!(batch.validate(), Err(Error::DuplicateOutput(_))));
    }

    #[test]
    fn test_duplicate_output_after_normalization() {
        let mut batch = BatchFile::default();
        batch.leaderboards[1].output = PathBuf::from("./settings/usage.txt");
        assert!(matches!(batch.validate(), Err(Error::DuplicateOutput(_))));

        batch.leaderboards[1].output = PathBuf::from("settings/backup/../usage.txt");
        assert!(matches!(batch.validate(), Err(Error::DuplicateOutput(_))));
    }

    #[test]
    fn test_output_overwriting_input_rejected() {
        let mut batch = BatchFile::default();
        batch.leaderboards[0].output = PathBuf::from("reports/./leads.txt");

        match batch.validate() {
            Err(Error::OutputIsInput(path)) => {
                assert_eq!(path, PathBuf::from("reports/./leads.txt"));
            }
            other => panic!("expected OutputIsInput, got {:?}", other),
        }
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path(Path::new("./a/./b")), PathBuf::from("a/b"));
        assert_eq!(normalize_path(Path::new("a/b/../c")), PathBuf::from("a/c"));
        assert_eq!(normalize_path(Path::new("../a")), PathBuf::from("../a"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
    }

    #[test]
    fn test_run_batch() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        let mut batch = BatchFile::default().resolved_against(dir.path());
        batch.manifest = Some(dir.path().join("settings/manifest.json"));

        let report = run_batch(&batch).unwrap();

        assert_eq!(report.outputs.len(), 3);
        assert_eq!(
            fs::read_to_string(dir.path().join("settings/usage.txt")).unwrap(),
            "Giratina-A\t20.0%\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("settings/lead.txt")).unwrap(),
            "Azelf\t12.0%\nDeoxys-M\t8.0%\n"
        );
        let detailed = fs::read_to_string(dir.path().join("settings/detailed.xml")).unwrap();
        assert!(detailed.contains("<name>Explosion</name>"));

        let manifest = Manifest::load(report.manifest.unwrap()).unwrap();
        assert_eq!(manifest.outputs, report.outputs);
    }

    #[test]
    fn test_run_batch_fails_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        fs::write(
            dir.path().join("reports/moveset.txt"),
            format!(" +{}+ \n | Azelf | \n +{}+ \n", SEPARATOR, SEPARATOR),
        )
        .unwrap();
        let batch = BatchFile::default().resolved_against(dir.path());

        let result = run_batch(&batch);

        assert!(matches!(result, Err(Error::UnterminatedEntity { .. })));
        assert!(!dir.path().join("settings").exists());
    }

    #[test]
    fn test_run_batch_staging_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        write_inputs(dir.path());
        fs::write(dir.path().join("blocker"), "not a directory").unwrap();
        let mut batch = BatchFile::default().resolved_against(dir.path());
        if let Some(job) = batch.detailed.as_mut() {
            job.output = dir.path().join("blocker/detailed.xml");
        }

        let result = run_batch(&batch);

        assert!(matches!(result, Err(Error::FileWrite { .. })));
        assert!(!dir.path().join("settings/usage.txt").exists());
        assert!(!dir.path().join("settings/lead.txt").exists());
        let settings = dir.path().join("settings");
        if settings.exists() {
            assert_eq!(fs::read_dir(&settings).unwrap().count(), 0);
        }
    }
}
