use crate::policy::{self, StatsMode};
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One isolated unit of OCR work: a single input bound to a resolved
/// output destination and the run-wide stats toggle. The shared
/// configuration is held by the orchestrator and passed by reference, so
/// descriptors stay cheap to clone and hand across worker threads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub input_path: PathBuf,
    pub stats_mode: StatsMode,
    pub target_folder: PathBuf,
}

/// Expand an ordered input list into an ordered descriptor list.
///
/// Paths that do not exist or are not readable are still wrapped; the
/// failure surfaces later as a failed job result instead of blocking the
/// whole batch here.
pub fn expand(inputs: &[PathBuf], base_out: &Path, stats_flag: bool) -> Vec<JobDescriptor> {
    inputs
        .iter()
        .map(|input| {
            let target_folder = policy::resolve_target(input, base_out);
            let stats_mode = policy::decide_stats(stats_flag, &target_folder);
            JobDescriptor {
                input_path: input.clone(),
                stats_mode,
                target_folder,
            }
        })
        .collect()
}

/// Expand a source argument into concrete input files: a file is taken
/// as-is, a directory contributes its regular files sorted by name.
pub fn gather_inputs(source: &Path) -> Result<Vec<PathBuf>> {
    if source.is_file() {
        return Ok(vec![source.to_path_buf()]);
    }
    if source.is_dir() {
        let mut files: Vec<PathBuf> = std::fs::read_dir(source)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.is_file())
            .collect();
        files.sort();
        return Ok(files);
    }
    Err(anyhow!("source path not found: {}", source.display()))
}
