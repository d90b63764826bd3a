use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("mdsnippet")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plain"))
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("sanitize"));
}

#[test]
fn test_plain_from_stdin() {
    cargo_bin_cmd!("mdsnippet")
        .args(["plain", "-"])
        .write_stdin("# Title\n\nSome **bold** text\n")
        .assert()
        .success()
        .stdout("Title\n\nSome bold text\n\n");
}

#[test]
fn test_plain_from_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("note.md");
    fs::write(&path, "- *one*\n- two").unwrap();

    cargo_bin_cmd!("mdsnippet")
        .arg("plain")
        .arg(&path)
        .assert()
        .success()
        .stdout("one\ntwo\n");
}

#[test]
fn test_missing_input_file_fails_with_context() {
    let dir = tempdir().unwrap();
    cargo_bin_cmd!("mdsnippet")
        .arg("plain")
        .arg(dir.path().join("absent.md"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.md"));
}

#[test]
fn test_render_prints_span_json() {
    let output = cargo_bin_cmd!("mdsnippet")
        .args(["render", "-"])
        .write_stdin("# Hi\n\n[link](https://example.com)")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let spans: serde_json::Value = serde_json::from_slice(&output).unwrap();
    let spans = spans.as_array().unwrap();
    assert_eq!(spans.len(), 3);
    assert_eq!(spans[0]["text"], "Hi");
    assert_eq!(spans[0]["font"]["weight"], "semibold");
    assert_eq!(spans[1]["role"], "block_separator");
    assert_eq!(spans[2]["link"], "https://example.com");
}

#[test]
fn test_render_without_links() {
    cargo_bin_cmd!("mdsnippet")
        .args(["render", "-", "--no-links"])
        .write_stdin("[link](https://example.com)")
        .assert()
        .success()
        .stdout(predicate::str::contains("example.com").not());
}

#[test]
fn test_snapshot_writes_png() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("note.png");

    cargo_bin_cmd!("mdsnippet")
        .args(["snapshot", "-", "--width", "160", "--output"])
        .arg(&out)
        .write_stdin("**Groceries**\n\nmilk, eggs, bread")
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 160x"));

    let png = fs::read(&out).unwrap();
    assert_eq!(&png[1..4], b"PNG");
}

#[test]
fn test_snapshot_rejects_zero_width() {
    let dir = tempdir().unwrap();
    cargo_bin_cmd!("mdsnippet")
        .args(["snapshot", "-", "--width", "0", "--output"])
        .arg(dir.path().join("never.png"))
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("width must be a positive"));
}

#[test]
fn test_sanitize_strips_and_describes() {
    cargo_bin_cmd!("mdsnippet")
        .args(["sanitize", "-"])
        .write_stdin("a\u{200D}b")
        .assert()
        .success()
        .stdout("ab");

    cargo_bin_cmd!("mdsnippet")
        .args(["sanitize", "-", "--describe"])
        .write_stdin("a\u{200D}b")
        .assert()
        .success()
        .stdout("filtered=1 U+200D format=1 U+200D\n");
}

#[test]
fn test_config_file_overrides_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mdsnippet.toml");
    fs::write(&path, "base_font_size = 12.0\n\n[snapshot]\ncache_capacity = 4\n").unwrap();

    cargo_bin_cmd!("mdsnippet")
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("base_font_size = 12.0"))
        .stdout(predicate::str::contains("cache_capacity = 4"))
        .stdout(predicate::str::contains("max_nesting_depth = 32"));
}

#[test]
fn test_malformed_config_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    fs::write(&path, "base_font_size = [").unwrap();

    cargo_bin_cmd!("mdsnippet")
        .arg("--config")
        .arg(&path)
        .args(["plain", "-"])
        .write_stdin("x")
        .assert()
        .failure()
        .stderr(predicate::str::contains("load config"));
}

#[test]
fn test_snapshot_over_pixel_limit_fails() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("small.toml");
    fs::write(&config, "[snapshot]\nmax_bitmap_pixels = 10\n").unwrap();
    let out = dir.path().join("never.png");

    cargo_bin_cmd!("mdsnippet")
        .arg("--config")
        .arg(&config)
        .args(["snapshot", "-", "--width", "100", "--output"])
        .arg(&out)
        .write_stdin("text")
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds 10 pixels"));

    assert!(!out.exists());
}
