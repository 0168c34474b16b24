// src/child_table.rs
//
// The supervised-children ledger. Generalizes the teacher's ChildLock
// (process_manager.rs), which wraps a single tokio::process::Child behind a
// timeout-aware lock, into an ordered table of records each owning its own
// Child handle. A single outer mutex over the whole Vec gives the
// wait-and-signal atomicity spec.md's kill_by_index requires, without a
// second per-child lock layer: every access to a record's Child handle
// already happens while the table guard is held.

use tokio::process::Child;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillOutcome {
    Succ,
    Fail,
}

pub struct ChildRecord {
    pub index: usize,
    pub command_path: String,
    pub pid: Option<u32>,
    pub last_cpu_ticks: u64,
    pub alive: bool,
    /// One-way latch: true once a terminal line (`Exited` or `Terminated`)
    /// has been printed for this record, by either the Reporter or the
    /// Termination Controller. Starts true for records that never launched,
    /// so they are never visited by either component — matching
    /// original_source/macD.c, whose `pids` array never contained a failed
    /// launch in the first place.
    pub terminal_reported: bool,
    handle: Option<Child>,
}

impl ChildRecord {
    /// A record for a manifest entry that launched successfully.
    pub fn launched(index: usize, command_path: String, pid: u32, handle: Child, initial_cpu_ticks: u64) -> Self {
        ChildRecord {
            index,
            command_path,
            pid: Some(pid),
            last_cpu_ticks: initial_cpu_ticks,
            alive: true,
            terminal_reported: false,
            handle: Some(handle),
        }
    }

    /// A record for a manifest entry that failed to launch (bad program,
    /// fork failure, or early exit). `alive` starts false and
    /// `terminal_reported` starts true: the Reporter and Termination
    /// Controller never visit it.
    pub fn failed(index: usize, command_path: String) -> Self {
        ChildRecord {
            index,
            command_path,
            pid: None,
            last_cpu_ticks: 0,
            alive: false,
            terminal_reported: true,
            handle: None,
        }
    }

    /// Non-blocking liveness check. If the record was alive and is now
    /// found to have exited, latches `alive = false` and returns false.
    /// A record that is already non-alive (including one that never
    /// launched) always reports false without touching the handle.
    pub fn refresh_alive(&mut self) -> bool {
        if !self.alive {
            return false;
        }
        let still_running = match self.handle.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        };
        if !still_running {
            self.alive = false;
        }
        still_running
    }

    /// Attempts to kill the record's process if it is still running.
    /// Performs its own fresh liveness check rather than trusting a stale
    /// `alive` flag, matching spec.md's "non-blocking wait reports the PID
    /// still alive" precondition.
    pub async fn attempt_kill(&mut self) -> KillOutcome {
        let Some(child) = self.handle.as_mut() else {
            return KillOutcome::Fail;
        };
        match child.try_wait() {
            Ok(None) => {
                let _ = child.kill().await;
                self.alive = false;
                KillOutcome::Succ
            }
            _ => {
                self.alive = false;
                KillOutcome::Fail
            }
        }
    }
}

pub struct ChildTable {
    records: Mutex<Vec<ChildRecord>>,
}

impl ChildTable {
    pub fn new() -> Self {
        ChildTable {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Only ever called by the Launcher, before the table is published to
    /// the Reporter/Control Plane.
    pub async fn append(&self, record: ChildRecord) {
        self.records.lock().await.push(record);
    }

    /// Exclusive access to the full record set. Held across awaits freely:
    /// `tokio::sync::Mutex` doesn't block the executor thread while a
    /// guard-holding task is itself awaiting (e.g. `child.kill().await`).
    pub async fn lock(&self) -> MutexGuard<'_, Vec<ChildRecord>> {
        self.records.lock().await
    }
}

impl Default for ChildTable {
    fn default() -> Self {
        Self::new()
    }
}
