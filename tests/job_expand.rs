use page_mill::job::{expand, gather_inputs};
use page_mill::policy::StatsMode;
use std::path::{Path, PathBuf};

#[test]
fn expansion_preserves_input_order() {
    let inputs = vec![
        PathBuf::from("c.png"),
        PathBuf::from("a.png"),
        PathBuf::from("b.png"),
    ];
    let jobs = expand(&inputs, Path::new("out"), false);
    assert_eq!(jobs.len(), inputs.len());
    for (job, input) in jobs.iter().zip(&inputs) {
        assert_eq!(&job.input_path, input);
        assert_eq!(job.stats_mode, StatsMode::Disabled);
    }
    assert_eq!(jobs[1].target_folder, PathBuf::from("out/a.png"));
}

#[test]
fn unreadable_paths_are_still_wrapped() {
    // Missing inputs become failed results at run time, not expansion errors.
    let inputs = vec![PathBuf::from("/definitely/not/here.png")];
    let jobs = expand(&inputs, Path::new("out"), false);
    assert_eq!(jobs.len(), 1);
}

#[test]
fn empty_input_list_yields_no_jobs() {
    let jobs = expand(&[], Path::new("out"), true);
    assert!(jobs.is_empty());
}

#[test]
fn stats_flag_binds_each_target_as_sink() {
    let inputs = vec![PathBuf::from("a.png"), PathBuf::from("b.png")];
    let jobs = expand(&inputs, Path::new("out"), true);
    assert_eq!(
        jobs[0].stats_mode,
        StatsMode::Enabled {
            sink: PathBuf::from("out/a.png")
        }
    );
    assert_eq!(
        jobs[1].stats_mode,
        StatsMode::Enabled {
            sink: PathBuf::from("out/b.png")
        }
    );
}

#[test]
fn gather_from_file_returns_that_file() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("one.png");
    std::fs::write(&file, b"x").unwrap();
    assert_eq!(gather_inputs(&file).unwrap(), vec![file]);
}

#[test]
fn gather_from_dir_lists_files_sorted() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("b.png"), b"x").unwrap();
    std::fs::write(dir.path().join("a.png"), b"x").unwrap();
    std::fs::create_dir(dir.path().join("nested")).unwrap();

    let inputs = gather_inputs(dir.path()).unwrap();
    assert_eq!(
        inputs,
        vec![dir.path().join("a.png"), dir.path().join("b.png")]
    );
}

#[test]
fn gather_from_missing_path_errors() {
    assert!(gather_inputs(Path::new("/definitely/not/here")).is_err());
}
