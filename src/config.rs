use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub global: Global,
    #[serde(default)]
    pub paths: Paths,
    #[serde(default)]
    pub engine: Engine,
    #[serde(default)]
    pub ocr: Ocr,
    #[serde(default)]
    pub stats: Stats,
    #[serde(default)]
    pub output: Output,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub debug: Debug,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        let cfg: Config = toml::from_str(&raw).with_context(|| "parsing TOML")?;
        Ok(cfg)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            global: Default::default(),
            paths: Default::default(),
            engine: Default::default(),
            ocr: Default::default(),
            stats: Default::default(),
            output: Default::default(),
            logging: Default::default(),
            debug: Default::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Global {
    pub print_summary: bool,
    pub use_parallel: bool,
    pub max_workers: usize,
}
impl Default for Global {
    fn default() -> Self {
        Self {
            print_summary: true,
            use_parallel: false,
            max_workers: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paths {
    pub out_dir: String,
    pub scripts_dir: String,
}
impl Default for Paths {
    fn default() -> Self {
        Self {
            out_dir: "out".into(),
            scripts_dir: "scripts".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Engine {
    pub python_exe: String,
    /// Per-job deadline enforced at the runner process boundary. 0 disables it.
    pub extract_timeout_seconds: u64,
    #[serde(default)]
    pub env: std::collections::BTreeMap<String, String>,
}
impl Default for Engine {
    fn default() -> Self {
        Self {
            python_exe: "auto".into(),
            extract_timeout_seconds: 0,
            env: Default::default(),
        }
    }
}

/// Extraction tuning forwarded to the OCR runner verbatim. The orchestrator
/// never interprets these fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ocr {
    pub language: String,
    pub min_letter_height_px: u32,
    pub space_width_ratio: f32,
    pub binarize_threshold: u32,
    pub deskew: bool,
    pub denoise: bool,
}
impl Default for Ocr {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            min_letter_height_px: 6,
            space_width_ratio: 0.35,
            binarize_threshold: 0,
            deskew: true,
            denoise: false,
        }
    }
}

/// Diagnostic-run tuning, likewise forwarded opaquely.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stats {
    pub draw_overlays: bool,
    pub overlay_color: [u8; 3],
    pub save_intermediate_images: bool,
    pub histogram_bins: u32,
}
impl Default for Stats {
    fn default() -> Self {
        Self {
            draw_overlays: true,
            overlay_color: [0, 0, 255],
            save_intermediate_images: false,
            histogram_bins: 64,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub text_filename: String,
    pub clean_out_dir: bool,
    pub write_report_json: bool,
    pub report_filename: String,
}
impl Default for Output {
    fn default() -> Self {
        Self {
            text_filename: "output.txt".into(),
            clean_out_dir: false,
            write_report_json: true,
            report_filename: "report.json".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logging {
    pub level: String,
    pub json: bool,
    pub write_to_file: bool,
    pub file_path: String,
}
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
            write_to_file: true,
            file_path: "".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Debug {
    pub keep_python_stderr: bool,
    pub dump_effective_config: bool,
}
impl Default for Debug {
    fn default() -> Self {
        Self {
            keep_python_stderr: true,
            dump_effective_config: false,
        }
    }
}
