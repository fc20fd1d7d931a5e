use crate::config;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineDiag {
    pub python_exe: String,
    pub python_version: String,
    pub bookocr_version: Option<String>,
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request handed to the runner. The `ocr` and `stats` sections are
/// forwarded verbatim from the config; only the runner interprets them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractIn {
    pub input_image: String,
    pub stats_enabled: bool,
    pub stats_dir: Option<String>,
    pub ocr: config::Ocr,
    pub stats: config::Stats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractOut {
    pub ok: bool,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub meta: serde_json::Value,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_kind: Option<String>,
}
