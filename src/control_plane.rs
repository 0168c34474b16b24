// src/control_plane.rs
//
// The local control socket: a fixed-path Unix stream listener with a 4-byte
// framed STAT/KILL/INDEX protocol. Generalizes the teacher's
// socket_communication.rs (tokio::net::UnixStream + AsyncReadExt/
// AsyncWriteExt over a length-prefixed JSON payload) down to this spec's
// fixed-length frames, and fixes the source's global "awaiting index" flag
// into per-session task-local state (spec.md §9).

use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};

use crate::child_table::{ChildTable, KillOutcome};
use crate::error::{ErrorKind, SupervisorError};
use crate::log;
use crate::logger::LogLevel;

pub const SERVER_SOCKET_PATH: &str = "macd.socket.server";
pub const CLIENT_SOCKET_PATH: &str = "macd.socket.client";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Idle,
    AwaitIndex,
}

/// Removes any stale path, binds, and starts listening. Setup failures here
/// are fatal to the supervisor (spec.md §7).
pub fn bind(path: &Path) -> Result<UnixListener, SupervisorError> {
    let _ = std::fs::remove_file(path);
    UnixListener::bind(path)
        .map_err(|e| SupervisorError::new(ErrorKind::SocketSetup, format!("{}: {}", path.display(), e)))
}

/// Accepts connections forever, handing each one to its own session task.
/// A per-session I/O error tears down only that session; the acceptor keeps
/// running (spec.md §4.6's "faithful reimplementation" failure option).
pub async fn accept_loop(listener: UnixListener, table: Arc<ChildTable>) {
    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let table = table.clone();
                tokio::spawn(async move {
                    handle_session(stream, table).await;
                });
            }
            Err(e) => {
                log!(LogLevel::Warn, "accept error: {}", e);
            }
        }
    }
}

async fn handle_session(mut stream: UnixStream, table: Arc<ChildTable>) {
    let mut state = SessionState::Idle;
    let mut buf = [0u8; 4];

    loop {
        if stream.read_exact(&mut buf).await.is_err() {
            return;
        }

        match state {
            SessionState::Idle => {
                let mut lower = buf;
                lower.make_ascii_lowercase();
                if &lower == b"stat" {
                    let count = running_count(&table).await as i32;
                    if stream.write_all(&count.to_le_bytes()).await.is_err() {
                        return;
                    }
                } else if &lower == b"kill" {
                    state = SessionState::AwaitIndex;
                }
                // any other 4-byte payload is a protocol no-op.
            }
            SessionState::AwaitIndex => {
                let index = u32::from_le_bytes(buf) as usize;
                let outcome = {
                    let mut guard = table.lock().await;
                    match guard.get_mut(index) {
                        Some(record) => record.attempt_kill().await,
                        None => KillOutcome::Fail,
                    }
                };
                let reply: &[u8; 4] = match outcome {
                    KillOutcome::Succ => b"SUCC",
                    KillOutcome::Fail => b"FAIL",
                };
                if stream.write_all(reply).await.is_err() {
                    return;
                }
                state = SessionState::Idle;
            }
        }
    }
}

/// A point-in-time running count, taken under the Child Table mutex.
/// Performs its own fresh liveness check per record (mirroring the
/// Reporter's own independent check) but never touches `terminal_reported`
/// — STAT never produces an Exited/Terminated report line.
async fn running_count(table: &ChildTable) -> usize {
    let mut guard = table.lock().await;
    guard.iter_mut().filter(|r| r.refresh_alive()).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::child_table::ChildRecord;
    use tempfile::tempdir;

    #[tokio::test]
    async fn stat_reports_running_count_and_kill_index_replies_succ_then_fail() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("macd.socket.server");
        let listener = bind(&socket_path).unwrap();

        let table = Arc::new(ChildTable::new());
        let child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        table
            .append(ChildRecord::launched(0, "sleep".into(), pid, child, 0))
            .await;

        let table_for_server = table.clone();
        tokio::spawn(async move { accept_loop(listener, table_for_server).await });

        let mut client = UnixStream::connect(&socket_path).await.unwrap();

        client.write_all(b"stat").await.unwrap();
        let mut resp = [0u8; 4];
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(i32::from_le_bytes(resp), 1);

        client.write_all(b"kill").await.unwrap();
        client.write_all(&0u32.to_le_bytes()).await.unwrap();
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(&resp, b"SUCC");

        client.write_all(b"kill").await.unwrap();
        client.write_all(&0u32.to_le_bytes()).await.unwrap();
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(&resp, b"FAIL");
    }

    #[tokio::test]
    async fn protocol_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("macd.socket.server");
        let listener = bind(&socket_path).unwrap();

        let table = Arc::new(ChildTable::new());
        tokio::spawn({
            let table = table.clone();
            async move { accept_loop(listener, table).await }
        });

        let mut client = UnixStream::connect(&socket_path).await.unwrap();
        client.write_all(b"StAt").await.unwrap();
        let mut resp = [0u8; 4];
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(i32::from_le_bytes(resp), 0);
    }

    #[tokio::test]
    async fn unrecognized_payload_is_a_silent_no_op() {
        let dir = tempdir().unwrap();
        let socket_path = dir.path().join("macd.socket.server");
        let listener = bind(&socket_path).unwrap();
        let table = Arc::new(ChildTable::new());
        tokio::spawn({
            let table = table.clone();
            async move { accept_loop(listener, table).await }
        });

        let mut client = UnixStream::connect(&socket_path).await.unwrap();
        client.write_all(b"xyzw").await.unwrap();
        // Follow with a STAT so the session is proven still alive and Idle.
        client.write_all(b"stat").await.unwrap();
        let mut resp = [0u8; 4];
        client.read_exact(&mut resp).await.unwrap();
        assert_eq!(i32::from_le_bytes(resp), 0);
    }
}
