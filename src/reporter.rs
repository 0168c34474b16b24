// src/reporter.rs
//
// The five-second sampling loop. Runs as the supervisor's main future,
// generalizing the teacher's resource_monitor.rs update_loop (poll, sleep,
// repeat) into the tick structure spec.md describes, with an early-exit
// path driven by a tokio::sync::watch shutdown signal rather than a plain
// Notify, so a trigger fired between ticks is never missed.

use std::time::Duration;

use tokio::sync::watch;

use crate::child_table::ChildTable;
use crate::clock::Clock;
use crate::output::OutputSink;
use crate::procinfo::ProcessInfo;

const TICK: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportOutcome {
    AllExited { total_seconds: u64 },
    ShutdownTriggered,
}

pub async fn run(
    table: &ChildTable,
    clock: &dyn Clock,
    procinfo: &dyn ProcessInfo,
    output: &OutputSink,
    start_time: u64,
    mut shutdown: watch::Receiver<bool>,
) -> ReportOutcome {
    if table.lock().await.is_empty() {
        let total = clock.monotonic_seconds().saturating_sub(start_time);
        output.write_line(&format!("Exiting (total time: {} seconds)", total));
        output.write_line("...");
        return ReportOutcome::AllExited {
            total_seconds: total,
        };
    }

    loop {
        output.write_line("...");
        output.write_line(&format!("Normal report, {}", clock.wall_clock_now()));

        let all_exited = {
            let mut guard = table.lock().await;
            for record in guard.iter_mut() {
                if record.terminal_reported {
                    continue;
                }
                if record.refresh_alive() {
                    let pid = record.pid.expect("alive record always has a pid");
                    match procinfo.cpu_ticks(pid) {
                        Some(ticks) => {
                            let tps = procinfo.ticks_per_second().max(1);
                            let delta = ticks.saturating_sub(record.last_cpu_ticks);
                            let cpu_percent = (delta * 100) / (5 * tps);
                            record.last_cpu_ticks = ticks;
                            let mem = procinfo.resident_mb(pid).unwrap_or(0);
                            output.write_line(&format!(
                                "[{}] Running, cpu usage: {}%, mem usage: {} MB",
                                record.index, cpu_percent, mem
                            ));
                        }
                        None => {
                            // kernel-surface-unreadable: treat as exited.
                            record.alive = false;
                            record.terminal_reported = true;
                            output.write_line(&format!("[{}] Exited", record.index));
                        }
                    }
                } else {
                    record.terminal_reported = true;
                    output.write_line(&format!("[{}] Exited", record.index));
                }
            }
            guard.iter().all(|r| !r.alive)
        };

        if all_exited {
            let total = clock.monotonic_seconds().saturating_sub(start_time);
            output.write_line(&format!("Exiting (total time: {} seconds)", total));
            output.write_line("...");
            return ReportOutcome::AllExited {
                total_seconds: total,
            };
        }

        output.write_line("...");

        let deadline = tokio::time::Instant::now() + TICK;
        loop {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => break,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        // sender dropped; nothing more will trigger shutdown
                        continue;
                    }
                    if *shutdown.borrow() {
                        return ReportOutcome::ShutdownTriggered;
                    }
                }
            }
        }
    }
}
