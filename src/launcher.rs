// src/launcher.rs
//
// Forks and execs each manifest entry, publishing one ChildRecord per entry
// to the Child Table. Built atop tokio::process::Command, generalizing the
// teacher's spawn_complex_process (process_manager.rs), which already
// drives tokio::process::Command with Stdio::null()/Stdio::inherit() for
// quiet/verbose child output.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::child_table::{ChildRecord, ChildTable};
use crate::manifest::Manifest;
use crate::output::OutputSink;
use crate::procinfo::ProcessInfo;

const LAUNCH_SETTLE: Duration = Duration::from_millis(100);

pub async fn launch_all(
    manifest: &Manifest,
    quiet: bool,
    procinfo: &dyn ProcessInfo,
    output: &OutputSink,
    table: &ChildTable,
) {
    for (index, entry) in manifest.entries.iter().enumerate() {
        if entry.is_placeholder() {
            output.write_line(&format!("[{}] badprogram , failed to start", index));
            table.append(ChildRecord::failed(index, String::new())).await;
            continue;
        }

        let program = entry.command_path().to_string();
        let mut command = Command::new(&program);
        command.args(&entry.argv[1..]);
        if quiet {
            command.stdout(Stdio::null());
        }

        match command.spawn() {
            Ok(mut child) => {
                tokio::time::sleep(LAUNCH_SETTLE).await;
                match child.try_wait() {
                    Ok(None) => {
                        let pid = child.id().unwrap_or(0);
                        let initial_cpu = procinfo.cpu_ticks(pid).unwrap_or(0);
                        output.write_line(&format!(
                            "[{}] {}, started successfully (pid: {})",
                            index, program, pid
                        ));
                        table
                            .append(ChildRecord::launched(index, program, pid, child, initial_cpu))
                            .await;
                    }
                    _ => {
                        output.write_line(&format!(
                            "[{}] badprogram {}, failed to start",
                            index, program
                        ));
                        table.append(ChildRecord::failed(index, program)).await;
                    }
                }
            }
            Err(_) => {
                output.write_line(&format!(
                    "[{}] badprogram {}, failed to start",
                    index, program
                ));
                table.append(ChildRecord::failed(index, program)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procinfo::LinuxProcessInfo;

    #[tokio::test]
    async fn successful_launch_is_recorded_alive() {
        let manifest = Manifest::parse("sleep 2\n");
        let output = OutputSink::stdout();
        let table = ChildTable::new();
        let info = LinuxProcessInfo::new();
        launch_all(&manifest, false, &info, &output, &table).await;

        let mut guard = table.lock().await;
        assert_eq!(guard.len(), 1);
        assert!(guard[0].alive);
        assert!(guard[0].pid.is_some());
        guard[0].attempt_kill().await;
    }

    #[tokio::test]
    async fn missing_program_is_reported_as_bad_program() {
        let manifest = Manifest::parse("doesnotexist_xyz foo\n");
        let output = OutputSink::stdout();
        let table = ChildTable::new();
        let info = LinuxProcessInfo::new();
        launch_all(&manifest, false, &info, &output, &table).await;

        let guard = table.lock().await;
        assert_eq!(guard.len(), 1);
        assert!(!guard[0].alive);
        assert_eq!(guard[0].pid, None);
    }

    #[tokio::test]
    async fn empty_line_is_reported_as_bad_program_without_a_name() {
        let manifest = Manifest::parse("\n");
        let output = OutputSink::stdout();
        let table = ChildTable::new();
        let info = LinuxProcessInfo::new();
        launch_all(&manifest, false, &info, &output, &table).await;

        let guard = table.lock().await;
        assert_eq!(guard[0].command_path, "");
        assert!(!guard[0].alive);
    }

    #[tokio::test]
    async fn argument_less_command_launches() {
        let manifest = Manifest::parse("true\n");
        let output = OutputSink::stdout();
        let table = ChildTable::new();
        let info = LinuxProcessInfo::new();
        launch_all(&manifest, false, &info, &output, &table).await;

        let guard = table.lock().await;
        assert_eq!(guard.len(), 1);
        // `true` exits almost instantly; either outcome (observed still
        // running at the 100ms mark, or already reaped) is a legitimate
        // race in a real supervisor, so only shape is asserted here.
        assert!(guard[0].pid.is_some() || !guard[0].alive);
    }
}
