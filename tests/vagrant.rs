//! End-to-end test against a running Vagrant machine.
//!
//! Requires Vagrant, `ssh` and a `default` machine that is up, and
//! reaches Piwik at `PIWIK_BASE_URL` (e.g. `http://192.168.33.10`).
//! Skipped in normal `cargo test` runs unless the `integration`
//! feature is enabled.

#![cfg(feature = "integration")]

use piwik_deploy::{PiwikConfig, Runbook, Target, TaskOutcome};

#[test]
fn install_then_uninstall_on_vagrant() {
    let target = Target::vagrant("").expect("vagrant ssh-config failed");
    assert_eq!(target.user, "root");

    let config = PiwikConfig::from_env().expect("invalid Piwik configuration");
    let runbook = Runbook::new()
        .with_target(target)
        .with_config(config)
        .assume_yes(true);

    assert_eq!(runbook.install().expect("install failed"), TaskOutcome::Completed);
    assert_eq!(runbook.uninstall().expect("uninstall failed"), TaskOutcome::Completed);
}
