// src/output.rs
//
// A line-atomic sink for report/launch/shutdown text. The Reporter, the
// Launcher, and the Termination Controller all write to the same sink from
// different tasks; spec.md's shared-resource policy requires writes to stay
// line-atomic, so every write goes through one mutex rather than racing on
// a bare `Write` impl.

use std::fs::{File, OpenOptions};
use std::io::{self, Stdout, Write};
use std::path::Path;
use std::sync::Mutex;

enum Sink {
    Stdout(Stdout),
    File(File),
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(s) => s.write(buf),
            Sink::File(f) => f.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(s) => s.flush(),
            Sink::File(f) => f.flush(),
        }
    }
}

pub struct OutputSink {
    inner: Mutex<Sink>,
}

impl OutputSink {
    pub fn stdout() -> Self {
        OutputSink {
            inner: Mutex::new(Sink::Stdout(io::stdout())),
        }
    }

    pub fn open_truncate(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(OutputSink {
            inner: Mutex::new(Sink::File(file)),
        })
    }

    /// Writes `line` followed by a newline as a single atomic operation
    /// with respect to other callers of `write_line`.
    pub fn write_line(&self, line: &str) {
        let mut guard = self.inner.lock().unwrap_or_else(|p| p.into_inner());
        let _ = writeln!(guard, "{}", line);
        let _ = guard.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::NamedTempFile;

    #[test]
    fn write_line_appends_newline() {
        let tmp = NamedTempFile::new().unwrap();
        let sink = OutputSink::open_truncate(tmp.path()).unwrap();
        sink.write_line("hello");
        sink.write_line("world");
        let mut contents = String::new();
        File::open(tmp.path())
            .unwrap()
            .read_to_string(&mut contents)
            .unwrap();
        assert_eq!(contents, "hello\nworld\n");
    }
}
