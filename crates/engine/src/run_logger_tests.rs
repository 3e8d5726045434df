// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn append_creates_parent_and_appends_lines() {
    let dir = tempfile::tempdir().unwrap();
    let logger = RunLogger::new(dir.path().join("logs"));
    logger.append("shellcheck", "first");
    logger.append("shellcheck", "second");

    let contents = std::fs::read_to_string(logger.log_path("shellcheck")).unwrap();
    assert_eq!(contents, "first\nsecond\n");
}

#[test]
fn append_output_writes_streams_and_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    let logger = RunLogger::new(dir.path());
    let output = CommandOutput {
        exit_code: 2,
        stdout: "warning: foo\n".to_string(),
        stderr: "error: bar\n".to_string(),
    };
    logger.append_output("yamllint", &output);

    let contents = std::fs::read_to_string(logger.log_path("yamllint")).unwrap();
    assert!(contents.contains("warning: foo"));
    assert!(contents.contains("error: bar"));
    assert!(contents.contains("exit code: 2"));
}

#[test]
fn logs_are_scoped_per_linter_id() {
    let dir = tempfile::tempdir().unwrap();
    let logger = RunLogger::new(dir.path());
    logger.append("a", "alpha");
    logger.append("b", "beta");
    assert_eq!(std::fs::read_to_string(logger.log_path("a")).unwrap(), "alpha\n");
    assert_eq!(std::fs::read_to_string(logger.log_path("b")).unwrap(), "beta\n");
}

#[test]
fn write_failure_does_not_propagate() {
    // log_dir is a file, so creating the log must fail quietly
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("occupied");
    std::fs::write(&blocker, "x").unwrap();
    let logger = RunLogger::new(&blocker);
    logger.append("any", "line");
}
