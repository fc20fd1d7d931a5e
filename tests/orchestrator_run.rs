use page_mill::{
    config::Config,
    engine::{EngineDiag, ExtractError, ExtractIn, ExtractOut, Extractor},
    job::{self, JobDescriptor},
    orchestrator::{Orchestrator, Strategy},
    policy::StatsMode,
    report::FailureKind,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Succeeds for `.png` inputs, reports everything else as not an image,
/// and fails with a process error when the file name contains "corrupt".
/// Each success carries a distinct generation number so overwrites are
/// observable.
struct StubExtractor {
    calls: AtomicUsize,
}

impl StubExtractor {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl Extractor for StubExtractor {
    fn doctor(&self) -> anyhow::Result<EngineDiag> {
        Ok(EngineDiag {
            python_exe: "stub".into(),
            python_version: "0".into(),
            bookocr_version: None,
            ok: true,
            error: None,
        })
    }

    fn extract(&self, req: &ExtractIn) -> Result<ExtractOut, ExtractError> {
        let path = Path::new(&req.input_image);
        if req.input_image.contains("corrupt") {
            return Err(ExtractError::Process {
                detail: "runner crashed".into(),
            });
        }
        if path.extension().and_then(|e| e.to_str()) != Some("png") {
            return Err(ExtractError::NotAnImage {
                path: path.to_path_buf(),
            });
        }
        let generation = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExtractOut {
            ok: true,
            text: format!("text generation {}", generation),
            warnings: vec![],
            meta: serde_json::Value::Null,
            error: None,
            error_kind: None,
        })
    }
}

fn run_jobs(jobs: &[JobDescriptor], strategy: Strategy) -> Vec<page_mill::report::JobResult> {
    let orchestrator = Orchestrator::new(&Config::default(), StubExtractor::new());
    orchestrator.run_batch(jobs, strategy).unwrap()
}

#[test]
fn results_align_with_inputs_under_both_strategies() {
    let out = tempfile::tempdir().unwrap();
    let inputs = vec![
        PathBuf::from("a.png"),
        PathBuf::from("missing.xyz"),
        PathBuf::from("c.png"),
    ];
    let jobs = job::expand(&inputs, out.path(), false);

    for strategy in [Strategy::Sequential, Strategy::Parallel { workers: 4 }] {
        let results = run_jobs(&jobs, strategy);
        assert_eq!(results.len(), inputs.len());
        for (result, input) in results.iter().zip(&inputs) {
            assert_eq!(&result.input_path, input);
            assert!(result.elapsed_seconds >= 0.0);
        }
        assert!(results[0].succeeded);
        assert!(!results[1].succeeded);
        assert!(results[2].succeeded);
        assert_eq!(
            results[1].failure.as_ref().unwrap().kind,
            FailureKind::InputNotRecognized
        );
    }
}

#[test]
fn sequential_and_parallel_agree_positionally() {
    let out = tempfile::tempdir().unwrap();
    let inputs: Vec<PathBuf> = (0..8)
        .map(|i| {
            if i % 3 == 0 {
                PathBuf::from(format!("bad-{i}.txt"))
            } else {
                PathBuf::from(format!("page-{i}.png"))
            }
        })
        .collect();
    let jobs = job::expand(&inputs, out.path(), true);

    let seq = run_jobs(&jobs, Strategy::Sequential);
    let par = run_jobs(&jobs, Strategy::Parallel { workers: 3 });
    assert_eq!(seq.len(), par.len());
    for (s, p) in seq.iter().zip(&par) {
        assert_eq!(s.input_path, p.input_path);
        assert_eq!(s.succeeded, p.succeeded);
    }
}

#[test]
fn one_process_failure_does_not_abort_the_batch() {
    let out = tempfile::tempdir().unwrap();
    let inputs = vec![
        PathBuf::from("a.png"),
        PathBuf::from("corrupt.png"),
        PathBuf::from("c.png"),
    ];
    let jobs = job::expand(&inputs, out.path(), false);

    let results = run_jobs(&jobs, Strategy::Parallel { workers: 2 });
    assert_eq!(results.iter().filter(|r| r.succeeded).count(), 2);
    assert_eq!(
        results[1].failure.as_ref().unwrap().kind,
        FailureKind::Extraction
    );
}

#[test]
fn artifact_is_written_and_overwritten() {
    let out = tempfile::tempdir().unwrap();
    let inputs = vec![PathBuf::from("page.png")];
    let jobs = job::expand(&inputs, out.path(), false);
    let orchestrator = Orchestrator::new(&Config::default(), StubExtractor::new());

    let first = orchestrator
        .run_batch(&jobs, Strategy::Sequential)
        .unwrap();
    let artifact = first[0].artifact_path.clone().unwrap();
    assert_eq!(artifact, out.path().join("page.png").join("output.txt"));
    let before = std::fs::read_to_string(&artifact).unwrap();

    let second = orchestrator
        .run_batch(&jobs, Strategy::Sequential)
        .unwrap();
    assert!(second[0].succeeded);
    let after = std::fs::read_to_string(&artifact).unwrap();
    assert_ne!(before, after, "rerun must overwrite, not append");
    assert!(!after.contains(&before));
}

#[test]
fn stats_mode_suppresses_the_text_artifact() {
    let out = tempfile::tempdir().unwrap();
    let inputs = vec![PathBuf::from("page.png")];
    let jobs = job::expand(&inputs, out.path(), true);

    let results = run_jobs(&jobs, Strategy::Sequential);
    assert!(results[0].succeeded);
    assert!(results[0].artifact_path.is_none());
    assert!(!out.path().join("page.png").join("output.txt").exists());
}

#[test]
fn empty_batch_completes_immediately() {
    for strategy in [Strategy::Sequential, Strategy::Parallel { workers: 2 }] {
        let results = run_jobs(&[], strategy);
        assert!(results.is_empty());
    }
}

#[test]
fn unwritable_target_is_a_persistence_failure() {
    let out = tempfile::tempdir().unwrap();
    // A regular file where the target folder should go makes the
    // directory creation fail after a successful extraction.
    std::fs::write(out.path().join("page.png"), b"in the way").unwrap();

    let jobs = vec![JobDescriptor {
        input_path: PathBuf::from("page.png"),
        stats_mode: StatsMode::Disabled,
        target_folder: out.path().join("page.png"),
    }];

    let results = run_jobs(&jobs, Strategy::Sequential);
    assert!(!results[0].succeeded);
    assert_eq!(
        results[0].failure.as_ref().unwrap().kind,
        FailureKind::Persistence
    );
    assert!(results[0].artifact_path.is_none());
}
