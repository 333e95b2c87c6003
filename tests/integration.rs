//! Integration tests for the blocklist-combiner binary.
//!
//! None of these touch the network: the pipeline runs with `--skip-fetch`
//! against raw directories prepared in a temp dir.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run the binary and return its output
fn run_combiner(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_blocklist-combiner"))
        .args(args)
        .output()
        .expect("Failed to execute blocklist-combiner")
}

/// Write a config whose work and output dirs live under `root`
fn write_config(root: &Path, extra: &str) -> PathBuf {
    let path = root.join("config.yaml");
    let yaml = format!(
        "work_dir: {}\noutput_dir: {}\n{}",
        root.join("Temp").display(),
        root.join("out").display(),
        extra
    );
    fs::write(&path, yaml).unwrap();
    path
}

fn write_raw(root: &Path, source: &str, name: &str, content: &str) {
    let dir = root.join("Temp").join(source);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(name), content).unwrap();
}

#[test]
fn test_version_command() {
    let output = run_combiner(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("blocklist-combiner"));
}

#[test]
fn test_help_command() {
    let output = run_combiner(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("merge"));
    assert!(stdout.contains("combine"));
}

#[test]
fn test_merge_without_dirs_is_usage_error() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("merged");
    let output = run_combiner(&["merge", "-o", out.to_str().unwrap()]);

    assert!(!output.status.success());
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Usage"));
    assert!(!out.exists());
}

#[test]
fn test_merge_command() {
    let temp = TempDir::new().unwrap();
    let a = temp.path().join("a");
    let b = temp.path().join("b");
    let out = temp.path().join("merged");
    fs::create_dir_all(&a).unwrap();
    fs::create_dir_all(&b).unwrap();
    fs::write(a.join("ads.txt"), "x.com\ny.com\n").unwrap();
    fs::write(b.join("ADS.txt"), "y.com\nz.com\n").unwrap();
    fs::write(b.join("porn.txt"), "p.com\n").unwrap();

    let config = temp.path().join("absent.yaml");
    let output = run_combiner(&[
        "--config",
        config.to_str().unwrap(),
        "merge",
        a.to_str().unwrap(),
        b.to_str().unwrap(),
        "--output",
        out.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "{:?}", output);
    assert_eq!(
        fs::read_to_string(out.join("ads.txt")).unwrap(),
        "x.com\ny.com\nz.com\n"
    );
    assert_eq!(fs::read_to_string(out.join("porn.txt")).unwrap(), "p.com\n");
}

#[test]
fn test_run_skip_fetch_end_to_end() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");
    write_raw(temp.path(), "ut1", "ads.txt", "0.0.0.0 foo.com\n# comment\n");
    write_raw(temp.path(), "blp", "publicite.txt", "bar.com\n");
    write_raw(temp.path(), "fm", "child.txt", "never.com\n");

    let output = run_combiner(&[
        "--config",
        config.to_str().unwrap(),
        "run",
        "--skip-fetch",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let ads = fs::read_to_string(temp.path().join("out/ads1.txt")).unwrap();
    assert_eq!(ads, "# Ads Part 1\n0.0.0.0 bar.com\n0.0.0.0 foo.com\n");
    assert!(!temp.path().join("out/child1.txt").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Total unique domains protected: 2"));
}

#[test]
fn test_combine_json_report() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "split_output: false\n");
    write_raw(temp.path(), "ut1", "drogue.txt", "a.com\nb.com\n");
    write_raw(temp.path(), "fm", "drugs.txt", "b.com\nc.com\n");

    let output = run_combiner(&[
        "--quiet",
        "--config",
        config.to_str().unwrap(),
        "combine",
        "--format",
        "json",
    ]);
    assert!(output.status.success(), "{:?}", output);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_domains"], 3);
    assert_eq!(report["categories"][0]["category"], "drugs");

    let drugs = fs::read_to_string(temp.path().join("out/drugs.txt")).unwrap();
    assert!(drugs.starts_with("# Drugs\n"));
    // The blp directory was never created: reported, not fatal
    assert_eq!(report["skipped"][0]["reason"], "directory_unavailable");
}

#[test]
fn test_combine_replaces_stale_output() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");
    write_raw(temp.path(), "ut1", "ads.txt", "a.com\n");
    fs::create_dir_all(temp.path().join("out")).unwrap();
    fs::write(temp.path().join("out/ads2.txt"), "# Ads Part 2\n0.0.0.0 stale.com\n").unwrap();

    let output = run_combiner(&["--config", config.to_str().unwrap(), "combine"]);
    assert!(output.status.success(), "{:?}", output);

    assert!(temp.path().join("out/ads1.txt").exists());
    assert!(!temp.path().join("out/ads2.txt").exists());
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "max_partition_bytes: 0\n");

    let output = run_combiner(&["--config", config.to_str().unwrap(), "combine"]);
    assert!(!output.status.success());
}

#[test]
fn test_init_command() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("blocklist-combiner.yaml");

    let output = run_combiner(&["--config", path.to_str().unwrap(), "init"]);
    assert!(output.status.success());
    assert!(path.exists());

    let again = run_combiner(&["--config", path.to_str().unwrap(), "init"]);
    assert!(!again.status.success());
}
