// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn captures_stdout_and_exit_code() {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg("echo hello; exit 0");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "echo")
        .await
        .unwrap();
    assert!(output.success());
    assert_eq!(output.stdout.trim(), "hello");
    assert!(output.stderr.is_empty());
}

#[tokio::test]
async fn captures_nonzero_exit_and_stderr() {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg("echo oops >&2; exit 3");
    let output = run_with_timeout(cmd, Duration::from_secs(5), "failing")
        .await
        .unwrap();
    assert!(!output.success());
    assert_eq!(output.exit_code, 3);
    assert_eq!(output.stderr.trim(), "oops");
}

#[tokio::test]
async fn times_out_and_reports_label() {
    let mut cmd = Command::new("sleep");
    cmd.arg("30");
    let err = run_with_timeout(cmd, Duration::from_millis(50), "sleepy")
        .await
        .unwrap_err();
    match err {
        SubprocessError::Timeout { label, timeout_ms } => {
            assert_eq!(label, "sleepy");
            assert_eq!(timeout_ms, 50);
        }
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn spawn_failure_is_reported() {
    let cmd = Command::new("definitely-not-a-real-binary-xyz");
    let err = run_with_timeout(cmd, Duration::from_secs(1), "missing")
        .await
        .unwrap_err();
    assert!(matches!(err, SubprocessError::Spawn { .. }));
    assert!(err.to_string().contains("missing"));
}

#[test]
fn byte_len_counts_both_streams() {
    let output = CommandOutput {
        exit_code: 0,
        stdout: "abc".to_string(),
        stderr: "de".to_string(),
    };
    assert_eq!(output.byte_len(), 5);
}
