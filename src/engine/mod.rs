pub mod python;
pub mod types;

use anyhow::Result;
use std::path::PathBuf;
use thiserror::Error;

pub use types::{EngineDiag, ExtractIn, ExtractOut};

/// Failure channel of the extraction boundary. The orchestrator
/// discriminates on the variant, never on message text.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("not a recognizable image: {path}")]
    NotAnImage { path: PathBuf },
    #[error("extraction timed out after {seconds}s")]
    Timeout { seconds: u64 },
    #[error("ocr runner failed: {detail}")]
    Process { detail: String },
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("decoding runner output: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The opaque OCR capability. `Send + Sync` so one instance can serve all
/// workers of a parallel batch; implementations must not require any
/// per-call mutable state.
pub trait Extractor: Send + Sync {
    fn doctor(&self) -> Result<EngineDiag>;
    fn extract(&self, req: &ExtractIn) -> Result<ExtractOut, ExtractError>;
}
