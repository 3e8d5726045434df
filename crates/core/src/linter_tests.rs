// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    pass = { LintStatus::Pass, true },
    skipped = { LintStatus::Skipped, true },
    fail = { LintStatus::Fail, false },
    error = { LintStatus::Error, false },
)]
fn status_success_classification(status: LintStatus, success: bool) {
    assert_eq!(status.is_success(), success);
}

#[test]
fn status_serializes_uppercase() {
    let json = serde_json::to_string(&LintStatus::Skipped).unwrap();
    assert_eq!(json, "\"SKIPPED\"");
}

#[test]
fn config_builder_defaults() {
    let config = LinterConfig::new("shellcheck", "shellcheck");
    assert_eq!(config.name, "shellcheck");
    assert_eq!(config.timeout, DEFAULT_LINTER_TIMEOUT);
    assert!(config.args.is_empty());
    assert!(config.skip_check.is_none());
    assert!(config.expected_version.is_none());
}

#[test]
fn config_builder_chains() {
    let config = LinterConfig::new("hadolint", "hadolint")
        .name("Hadolint")
        .args(["--no-color"])
        .timeout(Duration::from_secs(5))
        .expect_version("2.12", VersionProbe::new("hadolint", ["--version"]));
    assert_eq!(config.name, "Hadolint");
    assert_eq!(config.args, vec!["--no-color"]);
    assert_eq!(config.timeout, Duration::from_secs(5));
    assert_eq!(config.expected_version.as_deref(), Some("2.12"));
    assert!(config.version_probe.is_some());
}

#[test]
fn debug_masks_skip_check_as_presence_flag() {
    struct Never;
    #[async_trait]
    impl SkipCheck for Never {
        async fn should_skip(&self) -> Option<String> {
            None
        }
    }
    let config = LinterConfig::new("x", "x").skip_check(Arc::new(Never));
    let debug = format!("{:?}", config);
    assert!(debug.contains("skip_check: true"), "got: {debug}");
}

#[test]
fn result_inherits_identity_from_config() {
    let config = LinterConfig::new("yamllint", "yamllint").name("YAML Lint");
    let result = LinterResult::new(&config, LintStatus::Pass);
    assert_eq!(result.id, "yamllint");
    assert_eq!(result.name, "YAML Lint");
    assert_eq!(result.status, LintStatus::Pass);
    assert_eq!(result.duration_ms, 0);
    assert!(result.error.is_none());
}
