//! Uninstall integration tests

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_uninstall_when_not_installed() {
    TestEnv::new()
        .berth()
        .arg("uninstall")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("not installed"));
}

#[test]
fn test_uninstall_defaults_to_keeping_everything() {
    let env = TestEnv::new();
    env.mark_installed();

    env.berth()
        .arg("uninstall")
        .assert()
        .success()
        .stdout(predicate::str::contains("Uninstall cancelled."));

    assert!(env.app_home.join(".installed").is_file());
}
