//! Process-backed executor tests. These use `sh` as a stand-in engine.
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;

use scriptcond_core::{
    CommandExecutor, ConditionError, ExecutorConfig, ScriptExecutor, ScriptLogs,
    ScriptableCondition,
};
use serde_json::{json, Value};

fn sh(script: &str, timeout_ms: u64) -> CommandExecutor {
    CommandExecutor::new(ExecutorConfig {
        program: PathBuf::from("sh"),
        args: vec![
            "-c".to_string(),
            script.to_string(),
            "engine".to_string(),
            "{script}".to_string(),
            "{data}".to_string(),
            "{keys}".to_string(),
        ],
        timeout_ms,
    })
}

#[tokio::test]
async fn stdout_is_result_and_stderr_is_logs() {
    let executor = sh(r#"cat "$2"; echo "[*] read $(wc -c < "$1") script bytes" >&2"#, 0);
    let output = executor
        .execute("Given nothing", "{}", r#"{"x":1}"#)
        .await
        .unwrap();

    let result: Value = serde_json::from_str(&output.result).unwrap();
    assert_eq!(result, json!({"x": 1}));
    match output.logs {
        ScriptLogs::Lines(lines) => {
            assert_eq!(lines.len(), 1);
            assert!(lines[0].starts_with("[*] read"));
            assert!(lines[0].ends_with("script bytes"));
        }
        other => panic!("unexpected logs: {other:?}"),
    }
}

#[tokio::test]
async fn keys_file_is_passed_through() {
    let executor = sh(r#"cat "$3""#, 0);
    let output = executor
        .execute("s", r#"{"keyring":{"eddsa":"k"}}"#, "{}")
        .await
        .unwrap();
    assert_eq!(output.result, r#"{"keyring":{"eddsa":"k"}}"#);
}

#[tokio::test]
async fn non_zero_exit_is_an_execution_error() {
    let executor = sh(r#"echo "[!] Zencode parser error" >&2; exit 3"#, 0);
    let err = executor.execute("s", "{}", "{}").await.unwrap_err();
    assert!(err.message().contains("[!] Zencode parser error"));
}

#[tokio::test]
async fn non_utf8_output_is_an_execution_error() {
    let executor = sh(r#"printf '{"x":"\377"}'"#, 0);
    let err = executor.execute("s", "{}", "{}").await.unwrap_err();
    assert!(err.message().contains("not UTF-8"));
}

#[tokio::test]
async fn missing_program_is_an_execution_error() {
    let executor = CommandExecutor::new(ExecutorConfig {
        program: PathBuf::from("/nonexistent/zenroom"),
        ..ExecutorConfig::default()
    });
    let err = executor.execute("s", "{}", "{}").await.unwrap_err();
    assert!(err.message().starts_with("failed to spawn"));
}

#[tokio::test]
async fn timeout_is_enforced_when_configured() {
    let executor = sh("sleep 5", 100);
    let err = executor.execute("s", "{}", "{}").await.unwrap_err();
    assert!(err.message().contains("timed out"));
}

#[tokio::test]
async fn sign_and_validate_through_a_process() {
    // Echo the data minus the `result` member.
    let engine = r#"sed -e 's/"result":{[^}]*},//' -e 's/,"result":{[^}]*}//' "$2""#;
    let mut condition = ScriptableCondition::new(Arc::new(sh(engine, 0)));
    condition.set_script("Given I have a 'number' named 'x'\nThen print 'x'");

    let signed = condition
        .sign(r#"{"asset":{"data":{"x":1}}}"#, "Then print data", &json!({}))
        .await
        .unwrap();
    let mut signed: Value = serde_json::from_str(&signed).unwrap();
    assert_eq!(signed["metadata"]["data"], json!({"x": 1}));

    signed["metadata"]["result"] = json!({"x": 1});
    assert!(condition.validate(&signed.to_string()).await.unwrap());

    signed["metadata"]["result"] = json!({"x": 2});
    assert!(!condition.validate(&signed.to_string()).await.unwrap());
}

#[tokio::test]
async fn engine_failure_surfaces_from_sign() {
    let mut condition = ScriptableCondition::new(Arc::new(sh("exit 1", 0)));
    condition.set_script("s");
    assert!(matches!(
        condition.sign("{}", "s", &json!({})).await,
        Err(ConditionError::Execution(_))
    ));
}
