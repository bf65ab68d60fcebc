//! Integration tests for CLI commands.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const SCRIPT: &str = "Given I have a 'number' named 'x'\nThen print 'x'";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

fn create_condition(dir: &Path) -> PathBuf {
    write(
        dir,
        "condition.json",
        &json!({"script": SCRIPT, "data": {}, "keys": {"keyring": {}}}).to_string(),
    )
}

fn run_cli(args: &[&str]) -> (bool, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_scriptcond"))
        .args(args)
        .output()
        .expect("Failed to execute CLI");

    let stdout = String::from_utf8(output.stdout).unwrap();
    let stderr = String::from_utf8(output.stderr).unwrap();
    let success = output.status.success();

    (success, stdout, stderr)
}

#[test]
fn test_fingerprint_command() {
    let temp_dir = TempDir::new().unwrap();
    let condition = create_condition(temp_dir.path());

    let (success, stdout, _) = run_cli(&["fingerprint", condition.to_str().unwrap()]);
    assert!(success);
    assert!(stdout.contains("ni:///sha-256;"));
    assert!(stdout.contains("fpt=zenroom-sha-256&cost=131072"));
}

#[test]
fn test_fingerprint_json_ignores_data() {
    let temp_dir = TempDir::new().unwrap();
    let plain = create_condition(temp_dir.path());
    let with_data = write(
        temp_dir.path(),
        "with_data.json",
        &json!({"script": SCRIPT, "data": {"x": 42}}).to_string(),
    );

    let (ok_a, out_a, _) = run_cli(&["fingerprint", plain.to_str().unwrap(), "--json"]);
    let (ok_b, out_b, _) = run_cli(&["fingerprint", with_data.to_str().unwrap(), "--json"]);
    assert!(ok_a && ok_b);
    let a: Value = serde_json::from_str(&out_a).unwrap();
    let b: Value = serde_json::from_str(&out_b).unwrap();
    assert_eq!(a["uri"], b["uri"]);
    assert_eq!(a["type_id"], 5);
    assert_eq!(a["fingerprint"]["alg"], "sha-256");
}

#[test]
fn test_fingerprint_checks_published_values() {
    let temp_dir = TempDir::new().unwrap();
    let condition = create_condition(temp_dir.path());
    let path = condition.to_str().unwrap();

    let (_, out, _) = run_cli(&["fingerprint", path, "--json"]);
    let shown: Value = serde_json::from_str(&out).unwrap();
    let digest = format!("sha-256;{}", shown["fingerprint"]["b64"].as_str().unwrap());
    let binary = shown["condition"].as_str().unwrap().to_string();
    assert!(binary.starts_with("a527"));

    let (ok, _, _) = run_cli(&["fingerprint", path, "--expect", &digest]);
    assert!(ok);
    let (ok, _, _) = run_cli(&["fingerprint", path, "--expect-binary", &binary]);
    assert!(ok);

    let other = "sha-256;ungWv48Bz-pBQUDeXa4iI7ADYaOWF3qctBD_YfIAFa0";
    let (ok, _, stderr) = run_cli(&["fingerprint", path, "--expect", other]);
    assert!(!ok);
    assert!(stderr.contains("fingerprint mismatch"));

    let (ok, _, stderr) = run_cli(&["fingerprint", path, "--expect", "sha-256;short"]);
    assert!(!ok);
    assert!(stderr.contains("invalid fingerprint"));
}

#[test]
fn test_fingerprint_rejects_non_string_script() {
    let temp_dir = TempDir::new().unwrap();
    let bad = write(temp_dir.path(), "bad.json", r#"{"script": 7}"#);

    let (success, _, stderr) = run_cli(&["fingerprint", bad.to_str().unwrap()]);
    assert!(!success);
    assert!(stderr.contains("Error"));
}

#[test]
fn test_payload_command() {
    let temp_dir = TempDir::new().unwrap();
    let condition = create_condition(temp_dir.path());

    let (success, stdout, _) = run_cli(&["payload", condition.to_str().unwrap(), "--der"]);
    assert!(success);
    let payload: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(payload["script"], SCRIPT);
    assert_eq!(payload["data"], "{}");
    assert_eq!(payload["keys"], r#"{"keyring":{}}"#);
    assert!(payload["der"].as_str().unwrap().starts_with("a5"));
}

#[test]
fn test_canonicalize_command() {
    let temp_dir = TempDir::new().unwrap();
    let input = write(temp_dir.path(), "input.json", r#"{"b": 1, "a": [true, null]}"#);

    let (success, stdout, _) = run_cli(&["canonicalize", input.to_str().unwrap()]);
    assert!(success);
    assert_eq!(stdout.trim(), r#"{"a":[true,null],"b":1}"#);
}

#[cfg(unix)]
#[test]
fn test_sign_and_validate_with_configured_engine() {
    let temp_dir = TempDir::new().unwrap();
    let condition = create_condition(temp_dir.path());
    let script = write(temp_dir.path(), "sign.zen", "Then print data");
    let config = write(
        temp_dir.path(),
        "scriptcond.toml",
        r#"
[executor]
program = "sh"
args = ["-c", "sed -e 's/\"result\":{[^}]*},//' -e 's/,\"result\":{[^}]*}//' \"$1\"", "engine", "{data}"]
"#,
    );
    let message = write(
        temp_dir.path(),
        "message.json",
        r#"{"asset":{"data":{"x":1}}}"#,
    );

    let (success, stdout, stderr) = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "sign",
        "--condition",
        condition.to_str().unwrap(),
        "--script",
        script.to_str().unwrap(),
        "--message",
        message.to_str().unwrap(),
    ]);
    assert!(success, "sign failed: {stderr}");
    let mut signed: Value = serde_json::from_str(stdout.trim()).unwrap();
    assert_eq!(signed["metadata"]["data"], json!({"x": 1}));

    signed["metadata"]["result"] = json!({"x": 1});
    let signed_path = write(temp_dir.path(), "signed.json", &signed.to_string());
    let (success, stdout, _) = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "validate",
        "--condition",
        condition.to_str().unwrap(),
        "--message",
        signed_path.to_str().unwrap(),
        "--strict",
    ]);
    assert!(success);
    assert_eq!(stdout.trim(), "valid");

    signed["metadata"]["result"] = json!({"x": 2});
    let tampered = write(temp_dir.path(), "tampered.json", &signed.to_string());
    let (success, stdout, _) = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "validate",
        "--condition",
        condition.to_str().unwrap(),
        "--message",
        tampered.to_str().unwrap(),
        "--strict",
    ]);
    assert!(!success);
    assert_eq!(stdout.trim(), "invalid");
}
