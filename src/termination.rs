// src/termination.rs
//
// Shutdown-trigger observation and the final drain-and-report sequence.
// The interrupt handler itself stays signal-safe by leaning entirely on
// tokio's self-pipe-backed tokio::signal::unix::signal: the code that runs
// "inside" the signal is ordinary async code, and it does nothing but latch
// a tokio::sync::watch value, exactly the §9 design note's portable
// recommendation (only the flag is touched from the trigger path; printing
// happens later from run_shutdown, on the Reporter's own task).

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::time::Duration;

use crate::child_table::ChildTable;
use crate::clock::Clock;
use crate::log;
use crate::logger::LogLevel;
use crate::output::OutputSink;

/// Spawns the task that watches for a deadline elapsing or SIGINT arriving,
/// and returns the watch::Receiver the Reporter polls on each tick wait.
pub fn spawn_trigger_watcher(deadline_seconds: Option<u64>) -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let mut sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => s,
            Err(e) => {
                log!(LogLevel::Error, "failed to install SIGINT handler: {}", e);
                return;
            }
        };

        match deadline_seconds {
            Some(secs) => {
                tokio::select! {
                    _ = sigint.recv() => {
                        log!(LogLevel::Info, "Signal Received - latching shutdown");
                    }
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                        log!(LogLevel::Info, "deadline elapsed - latching shutdown");
                    }
                }
            }
            None => {
                sigint.recv().await;
                log!(LogLevel::Info, "Signal Received - latching shutdown");
            }
        }

        let _ = tx.send(true);
    });

    rx
}

/// Drains the Child Table, printing the exact shutdown sequence spec.md
/// prescribes, and returns the total elapsed seconds for the caller to use
/// as its process exit accounting.
pub async fn run_shutdown(
    table: &ChildTable,
    clock: &dyn Clock,
    output: &OutputSink,
    start_time: u64,
) -> u64 {
    output.write_line(&format!("Terminating, {}", clock.wall_clock_now()));

    {
        let mut guard = table.lock().await;
        for record in guard.iter_mut() {
            if record.terminal_reported {
                continue;
            }
            if record.refresh_alive() {
                record.attempt_kill().await;
                record.terminal_reported = true;
                output.write_line(&format!("[{}] Terminated", record.index));
            } else {
                record.terminal_reported = true;
                output.write_line(&format!("[{}] Exited", record.index));
            }
        }
    }

    let total = clock.monotonic_seconds().saturating_sub(start_time);
    output.write_line(&format!("Exiting (total time: {} seconds)", total));
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::child_table::ChildRecord;
    use crate::clock::WallClockReading;
    use std::sync::atomic::{AtomicU64, Ordering};

    struct FixedClock {
        seconds: AtomicU64,
    }

    impl Clock for FixedClock {
        fn monotonic_seconds(&self) -> u64 {
            self.seconds.load(Ordering::SeqCst)
        }
        fn wall_clock_now(&self) -> WallClockReading {
            WallClockReading {
                weekday: "Mon",
                month: "Jan",
                day: 1,
                year: 2026,
                hour12: 12,
                minute: 0,
                second: 0,
                am_pm: "AM",
            }
        }
    }

    #[tokio::test]
    async fn shutdown_kills_survivors_and_skips_placeholders() {
        let table = ChildTable::new();
        let child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();
        table
            .append(ChildRecord::launched(0, "sleep".into(), pid, child, 0))
            .await;
        table.append(ChildRecord::failed(1, String::new())).await;

        let clock = FixedClock {
            seconds: AtomicU64::new(5),
        };
        let output = OutputSink::stdout();
        let total = run_shutdown(&table, &clock, &output, 0).await;
        assert_eq!(total, 5);

        let guard = table.lock().await;
        assert!(!guard[0].alive);
        assert!(guard[0].terminal_reported);
        assert!(guard[1].terminal_reported);
    }

    #[tokio::test]
    async fn shutdown_does_not_double_report_an_already_reported_child() {
        let table = ChildTable::new();
        let mut record = ChildRecord::failed(0, "x".into());
        record.terminal_reported = true;
        table.append(record).await;

        let clock = FixedClock {
            seconds: AtomicU64::new(1),
        };
        let output = OutputSink::stdout();
        run_shutdown(&table, &clock, &output, 0).await;
        // no panic / no duplicate Exited line: the only observable
        // contract here is that the call completes without touching an
        // already-latched record's handle.
    }
}
