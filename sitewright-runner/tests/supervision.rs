//! Process-group supervision against real process trees
//!
//! These tests inspect /proc and therefore only run on Linux.

#![cfg(target_os = "linux")]

mod common;

use sitewright_runner::{CommandSpec, KillOutcome, ProcessSupervisor, SupervisorError};
use std::time::Duration;

use common::{live_group_members, wait_for_group_gone, wait_for_group_size};

/// Leader shell -> nested shell -> sleep, plus a second sleep under the leader.
/// Trailing `true`s keep the shells from exec-ing into their last command.
const TREE: &str = "/bin/sh -c 'sleep 60; true' & sleep 60; true";

fn tree() -> CommandSpec {
    CommandSpec::new("/bin/sh", std::env::temp_dir()).args(["-c", TREE])
}

#[tokio::test]
async fn test_timeout_kills_every_descendant() {
    let supervisor = ProcessSupervisor::new();
    let child = supervisor.spawn(&tree()).unwrap();
    let pgid = child.group().unwrap().id();

    let size = wait_for_group_size(pgid, 4, Duration::from_secs(3)).await;
    assert!(size >= 4, "expected a process tree of 4, found {}", size);

    let err = child
        .wait_with_timeout(Duration::from_millis(500))
        .await
        .unwrap_err();
    assert!(matches!(err, SupervisorError::TimedOut { .. }));

    let survivors = wait_for_group_gone(pgid, Duration::from_secs(3)).await;
    assert!(survivors.is_empty(), "survivors: {:?}", survivors);
}

#[tokio::test]
async fn test_terminate_kills_every_descendant() {
    let supervisor = ProcessSupervisor::new();
    let mut child = supervisor.spawn(&tree()).unwrap();
    let group = child.group().unwrap();

    assert!(wait_for_group_size(group.id(), 4, Duration::from_secs(3)).await >= 4);

    child.terminate().await;

    let survivors = wait_for_group_gone(group.id(), Duration::from_secs(3)).await;
    assert!(survivors.is_empty(), "survivors: {:?}", survivors);

    // Orphaned zombies may keep the group id alive until init reaps them,
    // so either outcome is fine; what matters is that it is not an error
    for _ in 0..2 {
        let outcome = group.kill().unwrap();
        assert!(matches!(
            outcome,
            KillOutcome::AlreadyExited | KillOutcome::Signalled
        ));
    }
    assert!(live_group_members(group.id()).is_empty());
}

#[tokio::test]
async fn test_natural_exit_leaves_no_group_behind() {
    let supervisor = ProcessSupervisor::new();
    let spec = CommandSpec::new("/bin/sh", std::env::temp_dir())
        .args(["-c", "/bin/sh -c 'sleep 0.2; true'; echo done"]);
    let child = supervisor.spawn(&spec).unwrap();
    let pgid = child.group().unwrap().id();

    let output = child.wait_with_timeout(Duration::from_secs(5)).await.unwrap();

    assert!(output.success());
    assert_eq!(output.stdout.trim(), "done");
    assert!(live_group_members(pgid).is_empty());
}
