use crate::{
    config::Config,
    engine::{ExtractError, ExtractIn, ExtractOut, Extractor},
    job::JobDescriptor,
    policy::StatsMode,
    report::{FailureKind, JobResult},
    util::ensure_dir,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Execution strategy for one whole batch. Chosen before dispatch, never
/// mixed within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Sequential,
    Parallel { workers: usize },
}

impl Strategy {
    /// Parallel with one worker per available hardware thread.
    pub fn parallel_auto() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Strategy::Parallel { workers }
    }
}

/// Drives a list of job descriptors to completion against one extraction
/// engine. Holds the run-wide configuration; jobs only ever see it by
/// shared reference.
pub struct Orchestrator<E: Extractor> {
    cfg: Config,
    engine: E,
}

impl<E: Extractor> Orchestrator<E> {
    pub fn new(cfg: &Config, engine: E) -> Self {
        Self {
            cfg: cfg.clone(),
            engine,
        }
    }

    /// Run every job and return one result per descriptor, index-aligned
    /// with the input list under either strategy. Blocks until the batch
    /// is complete. Per-job failures are contained in their results; the
    /// only fatal error is failing to build the worker pool.
    pub fn run_batch(&self, jobs: &[JobDescriptor], strategy: Strategy) -> Result<Vec<JobResult>> {
        match strategy {
            Strategy::Sequential => {
                info!("sequential batch: {} job(s)", jobs.len());
                Ok(jobs.iter().map(|job| self.run_job(job)).collect())
            }
            Strategy::Parallel { workers } => {
                let workers = workers.max(1);
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .build()
                    .with_context(|| "building worker pool")?;
                info!(
                    "parallel batch: {} job(s) across {} worker(s)",
                    jobs.len(),
                    workers
                );
                // Indexed collect keeps result order equal to input order
                // even though completion order across workers is arbitrary.
                Ok(pool.install(|| jobs.par_iter().map(|job| self.run_job(job)).collect()))
            }
        }
    }

    /// One job, start to finish. Never fails outward: every error becomes
    /// a failed result so a bad input cannot abort the batch or disturb a
    /// neighboring job.
    fn run_job(&self, job: &JobDescriptor) -> JobResult {
        let started = Instant::now();

        let req = ExtractIn {
            input_image: job.input_path.display().to_string(),
            stats_enabled: job.stats_mode.is_enabled(),
            stats_dir: match &job.stats_mode {
                StatsMode::Enabled { sink } => Some(sink.display().to_string()),
                StatsMode::Disabled => None,
            },
            ocr: self.cfg.ocr.clone(),
            stats: self.cfg.stats.clone(),
        };

        let out = match self.engine.extract(&req) {
            Ok(out) => out,
            Err(ExtractError::NotAnImage { .. }) => {
                debug!("not an image: {}", job.input_path.display());
                return JobResult::failed(
                    job.input_path.clone(),
                    started.elapsed().as_secs_f64(),
                    FailureKind::InputNotRecognized,
                    "not a recognizable image",
                );
            }
            Err(err) => {
                warn!("extraction failed for {}: {err}", job.input_path.display());
                return JobResult::failed(
                    job.input_path.clone(),
                    started.elapsed().as_secs_f64(),
                    FailureKind::Extraction,
                    err.to_string(),
                );
            }
        };

        if !out.warnings.is_empty() {
            debug!("runner warnings for {}: {:?}", job.input_path.display(), out.warnings);
        }

        let artifact = if job.stats_mode.is_enabled() {
            // Diagnostic run: the runner owns whatever it wrote under the
            // sink; nothing is persisted or verified here.
            None
        } else {
            match self.persist_text(job, &out) {
                Ok(path) => Some(path),
                Err(err) => {
                    warn!(
                        "persisting output failed for {}: {err:#}",
                        job.input_path.display()
                    );
                    return JobResult::failed(
                        job.input_path.clone(),
                        started.elapsed().as_secs_f64(),
                        FailureKind::Persistence,
                        format!("{err:#}"),
                    );
                }
            }
        };

        JobResult::success(
            job.input_path.clone(),
            started.elapsed().as_secs_f64(),
            artifact,
        )
    }

    fn persist_text(&self, job: &JobDescriptor, out: &ExtractOut) -> Result<PathBuf> {
        ensure_dir(&job.target_folder)?;
        let path = job.target_folder.join(&self.cfg.output.text_filename);
        std::fs::write(&path, &out.text)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(path)
    }
}
