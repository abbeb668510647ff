//! JSON persistence for comparison results.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use tracematch_compare::{ComparisonResult, ScoreSummary};

use crate::IoError;
use crate::domain::ExperimentName;

/// Writes comparison results to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_comparison.json`,
/// `{experiment}_batch.json`, and `{experiment}_summary.json`.
pub struct ResultWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

#[derive(Serialize)]
struct ComparisonArtifact<'a> {
    experiment: &'a str,
    comparison: &'a ComparisonResult,
}

#[derive(Serialize)]
struct BatchArtifact<'a> {
    experiment: &'a str,
    comparisons: &'a [ComparisonResult],
}

#[derive(Deserialize)]
struct StoredComparison {
    comparison: ComparisonResult,
}

#[derive(Deserialize)]
struct StoredBatch {
    comparisons: Vec<ComparisonResult>,
}

/// Per-channel line of a [`ComparisonSummary`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSummary {
    /// Reference channel name.
    pub reference: String,
    /// Evaluation channel name.
    pub evaluation: String,
    /// Score statistics, absent for an empty score curve.
    pub score: Option<ScoreSummary>,
}

/// Compact scalar view of a [`ComparisonResult`] without any curves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Comparison name.
    pub comparison: String,
    /// Mean of the aggregate curve.
    pub average: Option<f64>,
    /// One entry per channel pair, in result order.
    pub channels: Vec<ChannelSummary>,
}

impl ComparisonSummary {
    /// Summarize a finished comparison.
    #[must_use]
    pub fn from_result(result: &ComparisonResult) -> Self {
        Self {
            comparison: result.name().to_owned(),
            average: result.result_average(),
            channels: result
                .channel_results()
                .iter()
                .map(|c| ChannelSummary {
                    reference: c.reference.name.clone(),
                    evaluation: c.evaluation.name.clone(),
                    score: c.summary(),
                })
                .collect(),
        }
    }
}

impl ResultWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    fn artifact_path(&self, kind: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{kind}.json", self.experiment.as_str()))
    }

    /// Write one comparison result to `{experiment}_comparison.json`.
    ///
    /// Every curve is stored in full; [`read_comparison`] restores it bit for bit.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] if encoding fails, or [`IoError::WriteFile`]
    /// if the file cannot be written.
    #[instrument(skip_all, fields(comparison = %result.name()))]
    pub fn write_comparison(&self, result: &ComparisonResult) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("comparison");
        let artifact = ComparisonArtifact {
            experiment: self.experiment.as_str(),
            comparison: result,
        };
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "comparison result written");
        Ok(path)
    }

    /// Write several comparison results to `{experiment}_batch.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] if encoding fails, or [`IoError::WriteFile`]
    /// if the file cannot be written.
    #[instrument(skip_all, fields(n = results.len()))]
    pub fn write_batch(&self, results: &[ComparisonResult]) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("batch");
        let artifact = BatchArtifact {
            experiment: self.experiment.as_str(),
            comparisons: results,
        };
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "batch results written");
        Ok(path)
    }

    /// Write scalar summaries to `{experiment}_summary.json`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Json`] if encoding fails, or [`IoError::WriteFile`]
    /// if the file cannot be written.
    #[instrument(skip_all)]
    pub fn write_summary(&self, summaries: &[ComparisonSummary]) -> Result<PathBuf, IoError> {
        let path = self.artifact_path("summary");
        write_json(&path, &summaries)?;
        info!(path = %path.display(), "summary written");
        Ok(path)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, IoError> {
    let content = fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    serde_json::from_str(&content).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a result written by [`ResultWriter::write_comparison`].
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file cannot be read, or
/// [`IoError::Json`] if it is not a comparison artifact.
pub fn read_comparison(path: &Path) -> Result<ComparisonResult, IoError> {
    read_json::<StoredComparison>(path).map(|stored| stored.comparison)
}

/// Read results written by [`ResultWriter::write_batch`].
///
/// # Errors
///
/// Returns [`IoError::FileNotFound`] if the file cannot be read, or
/// [`IoError::Json`] if it is not a batch artifact.
pub fn read_batch(path: &Path) -> Result<Vec<ComparisonResult>, IoError> {
    read_json::<StoredBatch>(path).map(|stored| stored.comparisons)
}
