use super::{Extractor, types::*};
use crate::config::Config;
use anyhow::{Context, Result, anyhow};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::ExtractError;

const RUNNER_SCRIPT: &str = "ocr_runner.py";

/// Bridges to the Python `bookocr` package through a one-shot subprocess
/// per call: request JSON on stdin, response JSON on stdout. Spawning per
/// job keeps concurrently running extractions fully isolated from each
/// other.
pub struct PythonEngine {
    cfg: Config,
    script: PathBuf,
    python_exe: PathBuf,
}

impl PythonEngine {
    pub fn new(cfg: &Config) -> Result<Self> {
        let script = PathBuf::from(&cfg.paths.scripts_dir).join(RUNNER_SCRIPT);
        if !script.exists() {
            return Err(anyhow!("missing runner script: {}", script.display()));
        }
        let python_exe = resolve_python_exe(&cfg.engine.python_exe);
        Ok(Self {
            cfg: cfg.clone(),
            script,
            python_exe,
        })
    }

    fn run_json<I: serde::Serialize, O: for<'de> serde::Deserialize<'de>>(
        &self,
        input: &I,
        timeout_seconds: Option<u64>,
    ) -> Result<O, ExtractError> {
        debug!(
            "python run {} timeout={:?}",
            self.script.display(),
            timeout_seconds
        );
        let mut cmd = Command::new(&self.python_exe);
        cmd.arg(&self.script);
        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        for (k, v) in &self.cfg.engine.env {
            cmd.env(k, v);
        }

        let mut child = cmd.spawn()?;

        {
            let mut stdin = child.stdin.take().ok_or_else(|| ExtractError::Process {
                detail: "runner stdin unavailable".into(),
            })?;
            let bytes = serde_json::to_vec(input)?;
            use std::io::Write;
            stdin.write_all(&bytes)?;
            stdin.flush().ok();
        }

        let output = if let Some(secs) = timeout_seconds {
            wait_with_timeout(&mut child, Duration::from_secs(secs))?
        } else {
            child.wait_with_output()?
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Process {
                detail: format!("runner exited with {}: {}", output.status, stderr.trim()),
            });
        }

        if self.cfg.debug.keep_python_stderr && !output.stderr.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("runner stderr: {}", stderr.trim());
        }

        let out: O = serde_json::from_slice(&output.stdout)?;
        Ok(out)
    }
}

impl Extractor for PythonEngine {
    fn doctor(&self) -> Result<EngineDiag> {
        let diag: EngineDiag = self
            .run_json(&serde_json::json!({"cmd": "doctor"}), Some(60))
            .with_context(|| "ocr runner doctor failed")?;
        Ok(diag)
    }

    fn extract(&self, req: &ExtractIn) -> Result<ExtractOut, ExtractError> {
        let timeout = match self.cfg.engine.extract_timeout_seconds {
            0 => None,
            secs => Some(secs),
        };
        let out: ExtractOut =
            self.run_json(&serde_json::json!({"cmd": "extract", "req": req}), timeout)?;

        if !out.ok {
            if out.error_kind.as_deref() == Some("not_an_image") {
                return Err(ExtractError::NotAnImage {
                    path: PathBuf::from(&req.input_image),
                });
            }
            return Err(ExtractError::Process {
                detail: out
                    .error
                    .unwrap_or_else(|| "runner returned ok=false".to_string()),
            });
        }
        Ok(out)
    }
}

fn resolve_python_exe(raw: &str) -> PathBuf {
    let raw = raw.trim();
    if raw.is_empty() || raw.eq_ignore_ascii_case("auto") {
        if let Ok(env_val) = std::env::var("PAGE_MILL_PYTHON") {
            let p = expand_tilde(&env_val);
            if p.exists() {
                return p;
            }
        }
        return PathBuf::from("python3");
    }
    expand_tilde(raw)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> Result<Output, ExtractError> {
    // Drain pipes while waiting so a chatty runner can't deadlock on a
    // full stdout/stderr buffer.
    let stdout_reader = child.stdout.take();
    let stderr_reader = child.stderr.take();

    let stdout_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut out) = stdout_reader {
            out.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let stderr_thread = std::thread::spawn(move || -> std::io::Result<Vec<u8>> {
        let mut buf = Vec::new();
        if let Some(mut err) = stderr_reader {
            err.read_to_end(&mut buf)?;
        }
        Ok(buf)
    });

    let join_pipe =
        |handle: std::thread::JoinHandle<std::io::Result<Vec<u8>>>| -> Result<Vec<u8>, ExtractError> {
            handle
                .join()
                .map_err(|_| ExtractError::Process {
                    detail: "pipe reader thread panicked".into(),
                })?
                .map_err(ExtractError::Io)
        };

    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            let stdout = join_pipe(stdout_thread)?;
            let stderr = join_pipe(stderr_thread)?;
            return Ok(Output {
                status,
                stdout,
                stderr,
            });
        }

        if start.elapsed() > timeout {
            warn!("ocr runner timed out after {:?}", timeout);
            let _ = child.kill();
            let _ = child.wait();
            let _ = join_pipe(stdout_thread);
            let _ = join_pipe(stderr_thread);
            return Err(ExtractError::Timeout {
                seconds: timeout.as_secs(),
            });
        }

        std::thread::sleep(Duration::from_millis(50));
    }
}
