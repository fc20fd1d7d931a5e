use page_mill::config::Config;

#[test]
fn parse_example_config() {
    let raw = include_str!("../page-mill.example.toml");
    let cfg: Config = toml::from_str(raw).expect("parse TOML");
    assert!(!cfg.paths.out_dir.is_empty());
    assert_eq!(cfg.output.text_filename, "output.txt");
    assert_eq!(cfg.engine.extract_timeout_seconds, 0);
}

#[test]
fn empty_toml_uses_defaults() {
    let cfg: Config = toml::from_str("").expect("parse empty TOML");
    assert_eq!(cfg.paths.out_dir, "out");
    assert!(!cfg.global.use_parallel);
    assert_eq!(cfg.global.max_workers, 0);
    assert_eq!(cfg.output.text_filename, "output.txt");
}
