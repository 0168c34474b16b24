// src/error.rs
//
// Generalizes the teacher's ErrorArrayItem/Errors pair (dusa_collection_utils)
// into a crate-local type sized for this crate's much smaller error surface.

use std::fmt;

use crate::log;
use crate::logger::LogLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ManifestOpen,
    LaunchFailed,
    KernelSurfaceUnreadable,
    SocketSetup,
    SocketIo,
    Protocol,
    General,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::ManifestOpen => "manifest-open",
            ErrorKind::LaunchFailed => "launch-failed",
            ErrorKind::KernelSurfaceUnreadable => "kernel-surface-unreadable",
            ErrorKind::SocketSetup => "socket-setup",
            ErrorKind::SocketIo => "socket-io",
            ErrorKind::Protocol => "protocol",
            ErrorKind::General => "error",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug)]
pub struct SupervisorError {
    pub kind: ErrorKind,
    pub message: String,
}

impl SupervisorError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let err = SupervisorError {
            kind,
            message: message.into(),
        };
        log!(LogLevel::Error, "{}", err);
        err
    }
}

impl fmt::Display for SupervisorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error: {}", self.kind, self.message)
    }
}

impl std::error::Error for SupervisorError {}

impl From<std::io::Error> for SupervisorError {
    fn from(e: std::io::Error) -> Self {
        SupervisorError::new(ErrorKind::General, e.to_string())
    }
}

#[cfg(target_os = "linux")]
impl From<procfs::ProcError> for SupervisorError {
    fn from(e: procfs::ProcError) -> Self {
        SupervisorError::new(ErrorKind::KernelSurfaceUnreadable, e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SupervisorError>;
