use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Per-run toggle between a normal text run and a diagnostic run.
///
/// `Enabled` carries the folder the extraction runner should write its
/// diagnostic artifacts into. The orchestrator itself writes nothing in
/// that mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum StatsMode {
    Disabled,
    Enabled { sink: PathBuf },
}

impl StatsMode {
    pub fn is_enabled(&self) -> bool {
        matches!(self, StatsMode::Enabled { .. })
    }
}

/// Target folder for one input: `base_output_dir / basename(input_path)`.
///
/// Caveat: two inputs sharing a basename alias to the same folder. That is
/// the inherited behavior and is deliberately not detected here.
pub fn resolve_target(input_path: &Path, base_output_dir: &Path) -> PathBuf {
    match input_path.file_name() {
        Some(name) => base_output_dir.join(name),
        None => base_output_dir.join(input_path),
    }
}

pub fn decide_stats(stats_flag: bool, target_folder: &Path) -> StatsMode {
    if stats_flag {
        StatsMode::Enabled {
            sink: target_folder.to_path_buf(),
        }
    } else {
        StatsMode::Disabled
    }
}
