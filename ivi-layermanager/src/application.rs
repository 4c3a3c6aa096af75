//! Bookkeeping of connected clients.

use std::fs;
use std::path::PathBuf;

use ivi_scene::{ClientHandle, Pid};

/// Name used when a client's process cannot be identified.
pub const UNKNOWN_PROCESS: &str = "<unknown>";

/// Attributes a connection to the process behind it.
///
/// Created by a communicator when a client connects and handed to
/// [`CommandExecutor::add_application_reference`](crate::CommandExecutor::add_application_reference).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationReference {
    handle: ClientHandle,
    pid: Pid,
    process_name: String,
}

impl ApplicationReference {
    /// Resolves the process name from `/proc/<pid>/comm`. A pid of `0` marks a
    /// client that has not completed its handshake.
    pub fn new(handle: ClientHandle, pid: Pid) -> Self {
        let process_name = if pid == 0 { None } else { read_process_name(pid) };
        Self::with_name(handle, pid, process_name.unwrap_or_else(|| UNKNOWN_PROCESS.to_string()))
    }

    pub fn with_name(handle: ClientHandle, pid: Pid, process_name: impl Into<String>) -> Self {
        Self { handle, pid, process_name: process_name.into() }
    }

    pub fn handle(&self) -> ClientHandle {
        self.handle
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn process_name(&self) -> &str {
        &self.process_name
    }

    /// Whether the client completed its handshake.
    pub fn is_authenticated(&self) -> bool {
        self.pid != 0
    }
}

fn read_process_name(pid: Pid) -> Option<String> {
    let path: PathBuf = ["/proc", &pid.to_string(), "comm"].iter().collect();
    let name = fs::read_to_string(path).ok()?;
    let name = name.trim();
    (!name.is_empty()).then(|| name.to_string())
}
