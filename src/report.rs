use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The runner could not treat the input as an image. Expected for
    /// stray files in a source folder; never fatal.
    InputNotRecognized,
    /// Any other extraction failure: I/O, corrupt file, runner fault.
    Extraction,
    /// Extraction succeeded but the text artifact could not be written.
    Persistence,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub detail: String,
}

/// Outcome of exactly one job. The orchestrator produces one of these per
/// descriptor, index-aligned with the input list under either strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobResult {
    pub input_path: PathBuf,
    pub succeeded: bool,
    pub elapsed_seconds: f64,
    /// Present only for a successful non-stats job.
    pub artifact_path: Option<PathBuf>,
    pub failure: Option<JobFailure>,
}

impl JobResult {
    pub fn success(input_path: PathBuf, elapsed_seconds: f64, artifact_path: Option<PathBuf>) -> Self {
        Self {
            input_path,
            succeeded: true,
            elapsed_seconds,
            artifact_path,
            failure: None,
        }
    }

    pub fn failed(
        input_path: PathBuf,
        elapsed_seconds: f64,
        kind: FailureKind,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            input_path,
            succeeded: false,
            elapsed_seconds,
            artifact_path: None,
            failure: Some(JobFailure {
                kind,
                detail: detail.into(),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub started: String,
    pub finished: String,
    pub total_elapsed_seconds: f64,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<JobResult>,
}

impl RunReport {
    pub fn new(
        started: String,
        finished: String,
        total_elapsed_seconds: f64,
        results: Vec<JobResult>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.succeeded).count();
        let failed = results.len() - succeeded;
        Self {
            started,
            finished,
            total_elapsed_seconds,
            succeeded,
            failed,
            results,
        }
    }
}
