// src/bin/macd.rs
//
// The supervisor entry point. Wires Manifest -> Launcher -> Reporter ->
// Termination Controller together with the control-plane acceptor, in the
// order spec.md's data flow describes: Launcher populates the Child Table
// once, then the Reporter and the Control Plane both read/mutate it
// concurrently until a shutdown trigger fires.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;

use macd::child_table::ChildTable;
use macd::clock::{Clock, SystemClock};
use macd::control_plane::{self, SERVER_SOCKET_PATH};
use macd::launcher;
use macd::manifest::Manifest;
use macd::output::OutputSink;
use macd::procinfo::LinuxProcessInfo;
use macd::reporter::{self, ReportOutcome};
use macd::termination;

/// A lightweight process supervisor with a local control-socket interface.
#[derive(Parser, Debug)]
#[command(name = "macd")]
struct Args {
    /// Manifest file listing the children to supervise.
    #[arg(short = 'i', long = "input")]
    input: Option<PathBuf>,

    /// Output sink path (defaults to standard output).
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Redirect each child's standard output to the null device.
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let args = Args::parse();

    let Some(manifest_path) = args.input else {
        // Absence of -i is a no-op exit, not an error (spec.md §6).
        return;
    };

    let manifest = match Manifest::load(&manifest_path) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let output = match &args.output {
        Some(path) => match OutputSink::open_truncate(path) {
            Ok(sink) => sink,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => OutputSink::stdout(),
    };

    let clock = SystemClock::new();
    let procinfo = LinuxProcessInfo::new();
    let table = Arc::new(ChildTable::new());

    output.write_line(&format!("Starting report, {}", clock.wall_clock_now()));
    launcher::launch_all(&manifest, args.quiet, &procinfo, &output, &table).await;

    let listener = match control_plane::bind(Path::new(SERVER_SOCKET_PATH)) {
        Ok(listener) => listener,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    let accept_handle = {
        let table = table.clone();
        tokio::spawn(async move { control_plane::accept_loop(listener, table).await })
    };

    let start_time = clock.monotonic_seconds();
    let shutdown_rx = termination::spawn_trigger_watcher(manifest.deadline_seconds);

    let outcome = reporter::run(&table, &clock, &procinfo, &output, start_time, shutdown_rx).await;

    if let ReportOutcome::ShutdownTriggered = outcome {
        termination::run_shutdown(&table, &clock, &output, start_time).await;
    }

    accept_handle.abort();
    let _ = std::fs::remove_file(SERVER_SOCKET_PATH);

    std::process::exit(0);
}
