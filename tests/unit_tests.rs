use clap::Parser;
use growth_sim::{load_config, OutputOpts};
use std::path::PathBuf;

#[test]
fn test_output_opts_defaults() {
    let opts = OutputOpts::try_parse_from(["growth-sim"]).unwrap();
    assert_eq!(opts.output_dir, PathBuf::from("output"));
    assert!(opts.config.is_none());

    let config = opts.load_config().unwrap();
    assert_eq!(config.server_count, 4);
}

#[test]
fn test_output_opts_flags() {
    let opts = OutputOpts::try_parse_from([
        "growth-sim",
        "--output-dir",
        "/tmp/fleet",
        "--config",
        "fleet.yaml",
    ])
    .unwrap();
    assert_eq!(opts.output_dir, PathBuf::from("/tmp/fleet"));
    assert_eq!(opts.config, Some(PathBuf::from("fleet.yaml")));
}

#[test]
fn test_load_config_from_file() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("fleet.yaml");
    let yaml = growth_core::BUILTIN_CONFIG_YAML.replace("server_count: 4", "server_count: 6");
    std::fs::write(&path, yaml).unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.resolve_servers().unwrap().len(), 6);
}

#[test]
fn test_load_config_reports_path() {
    let err = load_config(Some(std::path::Path::new("/nonexistent/fleet.yaml"))).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("fleet.yaml"));
}

#[test]
fn test_unknown_pattern_in_config() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("fleet.yaml");
    let yaml = growth_core::BUILTIN_CONFIG_YAML
        .replace("pattern: growing_fast", "pattern: exploding");
    std::fs::write(&path, yaml).unwrap();

    let err = load_config(Some(&path)).unwrap_err();
    let sim_error = err.downcast_ref::<growth_core::SimError>().unwrap();
    assert_eq!(sim_error.kind(), "PatternError");
}
