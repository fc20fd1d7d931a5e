use crate::{
    config::Config,
    engine::{Extractor, python::PythonEngine},
    job,
    orchestrator::{Orchestrator, Strategy},
    report::{FailureKind, JobResult, RunReport},
    util::{display_name, ensure_dir, now_rfc3339},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "page-mill")]
#[command(about = "Batch image OCR orchestrator (extraction engine + output policy + worker pool)")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./page-mill.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the Python interpreter and the bookocr package are usable.
    Doctor {},
    /// Show the job descriptors a run would execute, without executing.
    Plan {
        /// Source image file or folder of images.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Plan a diagnostic run instead of a text run.
        #[arg(long)]
        stats: bool,
    },
    /// OCR every input and persist per-image results.
    Run {
        /// Source image file or folder of images.
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out_dir: Option<PathBuf>,
        /// Collect diagnostic statistics instead of text output.
        #[arg(long)]
        stats: bool,
        /// Run jobs on a bounded worker pool instead of sequentially.
        #[arg(long)]
        parallel: bool,
        /// Worker count for --parallel. 0 uses the available parallelism.
        #[arg(long)]
        workers: Option<usize>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg_path = resolve_config_path(args.config.as_deref())?;
    let cfg = Config::load(&cfg_path)?;

    match &args.cmd {
        Command::Doctor {} => {
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
            doctor(&cfg)
        }
        Command::Plan {
            input,
            out_dir,
            stats,
        } => {
            let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;
            plan(&cfg, input, out_dir.as_deref(), *stats)
        }
        Command::Run {
            input,
            out_dir,
            stats,
            parallel,
            workers,
        } => run(&args, &cfg, input, out_dir.as_deref(), *stats, *parallel, *workers),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = user {
        return Ok(p.to_path_buf());
    }
    let default = PathBuf::from("page-mill.toml");
    if default.exists() {
        Ok(default)
    } else {
        Ok(PathBuf::from("page-mill.example.toml"))
    }
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::File::create(path)
            .with_context(|| format!("create log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.out_dir).join("page-mill.log"))
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = PythonEngine::new(cfg)?;
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn plan(cfg: &Config, input: &Path, out_override: Option<&Path>, stats: bool) -> Result<()> {
    let out_root = resolve_out_root(cfg, out_override);
    let inputs = job::gather_inputs(input)?;
    let jobs = job::expand(&inputs, &out_root, stats);
    println!("{}", serde_json::to_string_pretty(&jobs)?);
    Ok(())
}

fn run(
    args: &Args,
    cfg: &Config,
    input: &Path,
    out_override: Option<&Path>,
    stats: bool,
    parallel: bool,
    workers: Option<usize>,
) -> Result<()> {
    let inputs = job::gather_inputs(input)?;
    if inputs.is_empty() {
        return Err(anyhow!("no input files under: {}", input.display()));
    }

    let out_root = resolve_out_root(cfg, out_override);

    // Clearing a stale output tree is the caller's job, never the
    // orchestrator's.
    if cfg.output.clean_out_dir && out_root.exists() {
        std::fs::remove_dir_all(&out_root)
            .with_context(|| format!("clearing out dir: {}", out_root.display()))?;
    }
    ensure_dir(&out_root)?;

    let log_path = resolve_log_path(cfg);
    let _guard = init_logging(args, cfg, log_path.as_deref())?;

    if cfg.debug.dump_effective_config {
        let raw = toml::to_string(cfg).unwrap_or_default();
        std::fs::write(out_root.join("effective-config.toml"), raw)?;
    }

    let jobs = job::expand(&inputs, &out_root, stats);
    info!(
        "run: {} job(s) stats={} out={}",
        jobs.len(),
        stats,
        out_root.display()
    );

    let strategy = if parallel || cfg.global.use_parallel {
        match workers.unwrap_or(cfg.global.max_workers) {
            0 => Strategy::parallel_auto(),
            n => Strategy::Parallel { workers: n },
        }
    } else {
        Strategy::Sequential
    };

    let engine = PythonEngine::new(cfg)?;
    let orchestrator = Orchestrator::new(cfg, engine);

    let started = now_rfc3339();
    let total_timer = Instant::now();
    let results = orchestrator.run_batch(&jobs, strategy)?;
    let total_elapsed = total_timer.elapsed().as_secs_f64();

    for result in &results {
        print_result_line(result);
    }
    println!("Total time:   {:.3} sec", total_elapsed);

    let report = RunReport::new(started, now_rfc3339(), total_elapsed, results);

    if cfg.output.write_report_json {
        std::fs::write(
            out_root.join(&cfg.output.report_filename),
            serde_json::to_string_pretty(&report)?,
        )?;
    }

    if cfg.global.print_summary {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "succeeded": report.succeeded,
                "failed": report.failed,
                "total_seconds": report.total_elapsed_seconds,
                "out_dir": out_root,
            }))?
        );
    }

    Ok(())
}

fn print_result_line(result: &JobResult) {
    let name = display_name(&result.input_path);
    match &result.failure {
        None => println!(" > {}:   {:.3} sec", name, result.elapsed_seconds),
        Some(f) if f.kind == FailureKind::InputNotRecognized => {
            println!(" > {}:   Not an image", name)
        }
        Some(f) => println!(" > {}:   failed ({})", name, f.detail),
    }
}

fn resolve_out_root(cfg: &Config, out_override: Option<&Path>) -> PathBuf {
    out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir))
}
