// src/manifest.rs
//
// Parses the manifest file into an ordered sequence of entries, resolving
// the optional leading `timelimit N` directive. Grounded on
// original_source/macD.c's `read_timer`/`get_args` (strtok on a single-space
// delimiter, which collapses runs of spaces and ignores an empty token).

use std::fs;
use std::path::Path;

use crate::error::{ErrorKind, SupervisorError};

/// One non-directive manifest line, already split into argv. `argv` is
/// empty for an empty-line "bad program" placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub argv: Vec<String>,
}

impl ManifestEntry {
    /// The first whitespace token of the line, used in report output. Empty
    /// for a bad-program placeholder line.
    pub fn command_path(&self) -> &str {
        self.argv.first().map(|s| s.as_str()).unwrap_or("")
    }

    pub fn is_placeholder(&self) -> bool {
        self.argv.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Manifest {
    pub deadline_seconds: Option<u64>,
    pub entries: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Manifest, SupervisorError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            SupervisorError::new(ErrorKind::ManifestOpen, format!("{}: {}", path.display(), e))
        })?;
        Ok(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Manifest {
        let mut lines = contents.lines();
        let mut deadline_seconds = None;

        let mut first = lines.next();
        if let Some(line) = first {
            if let Some(n) = parse_timelimit(line) {
                deadline_seconds = Some(n);
                first = None;
            }
        }

        let mut entries = Vec::new();
        if let Some(line) = first {
            entries.push(split_entry(line));
        }
        for line in lines {
            entries.push(split_entry(line));
        }

        Manifest {
            deadline_seconds,
            entries,
        }
    }
}

fn parse_timelimit(line: &str) -> Option<u64> {
    let mut tokens = line.split(' ').filter(|t| !t.is_empty());
    if tokens.next()? != "timelimit" {
        return None;
    }
    tokens.next()?.parse().ok()
}

fn split_entry(line: &str) -> ManifestEntry {
    let argv: Vec<String> = line
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    ManifestEntry { argv }
}
