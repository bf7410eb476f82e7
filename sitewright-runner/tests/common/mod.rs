//! Shared helpers for runner integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sitewright_core::domain::outcome::Outcome;
use sitewright_runner::service::NotifyError;
use sitewright_runner::{Config, OutcomeNotifier};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Notifier that records every delivery instead of sending it
pub struct RecordingNotifier {
    deliveries: AtomicUsize,
    tx: mpsc::UnboundedSender<(String, Outcome)>,
}

impl RecordingNotifier {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<(String, Outcome)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let notifier = Arc::new(Self {
            deliveries: AtomicUsize::new(0),
            tx,
        });
        (notifier, rx)
    }

    pub fn deliveries(&self) -> usize {
        self.deliveries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OutcomeNotifier for RecordingNotifier {
    async fn deliver(&self, callback_url: &str, outcome: &Outcome) -> Result<(), NotifyError> {
        self.deliveries.fetch_add(1, Ordering::SeqCst);
        let _ = self.tx.send((callback_url.to_string(), outcome.clone()));
        Ok(())
    }
}

/// Waits for the next recorded outcome
pub async fn next_outcome(
    rx: &mut mpsc::UnboundedReceiver<(String, Outcome)>,
    within: Duration,
) -> (String, Outcome) {
    tokio::time::timeout(within, rx.recv())
        .await
        .expect("no outcome delivered in time")
        .expect("notifier channel closed")
}

/// Asserts that nothing else gets delivered for a short while
pub async fn assert_no_more_outcomes(rx: &mut mpsc::UnboundedReceiver<(String, Outcome)>) {
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(rx.try_recv().is_err(), "more than one outcome delivered");
}

/// Writes an executable shell script
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Runner configuration rooted at `dir` with `create.sh` as build program
pub fn config_in(dir: &Path, timeout: Duration) -> Config {
    Config::new(dir)
        .with_build_script("create.sh")
        .with_build_timeout(timeout)
}

/// Live (non-zombie) members of a process group, read from /proc
pub fn live_group_members(pgid: i32) -> Vec<i32> {
    let mut members = Vec::new();
    let Ok(entries) = std::fs::read_dir("/proc") else {
        return members;
    };

    for entry in entries.flatten() {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<i32>() else {
            continue;
        };
        let Ok(stat) = std::fs::read_to_string(entry.path().join("stat")) else {
            continue;
        };
        // comm may contain spaces; the fields after its closing paren do not
        let Some(rest) = stat.rfind(')').and_then(|i| stat.get(i + 2..)) else {
            continue;
        };
        let fields: Vec<&str> = rest.split_whitespace().collect();
        // state, ppid, pgrp
        if fields.len() > 2
            && fields[2] == pgid.to_string()
            && fields[0] != "Z"
            && fields[0] != "X"
        {
            members.push(pid);
        }
    }

    members
}

/// Polls /proc until the group has at least `count` live members
pub async fn wait_for_group_size(pgid: i32, count: usize, within: Duration) -> usize {
    let deadline = Instant::now() + within;
    loop {
        let size = live_group_members(pgid).len();
        if size >= count || Instant::now() >= deadline {
            return size;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Polls /proc until the group has no live members; returns the survivors
pub async fn wait_for_group_gone(pgid: i32, within: Duration) -> Vec<i32> {
    let deadline = Instant::now() + within;
    loop {
        let members = live_group_members(pgid);
        if members.is_empty() || Instant::now() >= deadline {
            return members;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

/// Polls until `path` exists and holds a pid
pub async fn read_pid_file(path: &Path, within: Duration) -> i32 {
    let deadline = Instant::now() + within;
    loop {
        if let Ok(raw) = std::fs::read_to_string(path) {
            if let Ok(pid) = raw.trim().parse() {
                return pid;
            }
        }
        assert!(Instant::now() < deadline, "pid file {} never written", path.display());
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
