//! Opaque native collaborators.
//!
//! Process execution, file writing, and in-memory string streams are
//! invoked as external calls; the runtime wraps their successes as
//! values and their failures as `OSError`. Nothing here is interpreted —
//! these are the host-platform edges of the runtime.

use std::fs;
use std::io::Write;
use std::process::Command;

use crate::errors::{os_error, RuntimeError};
use crate::shared::{Heap, Shared};

/// Captured result of a spawned process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// Exit status; -1 when the process was terminated by a signal.
    pub status: i64,
}

/// Opaque native value.
#[derive(Clone, Debug)]
pub enum ExternalValue {
    /// Writable file handle; `None` once closed.
    File(Shared<Option<fs::File>>),
    /// Captured output of a finished process.
    Process(Heap<ProcessOutput>),
    /// In-memory growable text stream.
    StringStream(Shared<String>),
}

impl ExternalValue {
    /// Identity comparison; externals never compare structurally.
    pub fn ptr_eq(&self, other: &ExternalValue) -> bool {
        match (self, other) {
            (ExternalValue::File(a), ExternalValue::File(b)) => a.ptr_eq(b),
            (ExternalValue::Process(a), ExternalValue::Process(b)) => a.ptr_eq(b),
            (ExternalValue::StringStream(a), ExternalValue::StringStream(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn repr(&self) -> String {
        match self {
            ExternalValue::File(handle) => {
                if handle.borrow().is_some() {
                    "<file>".to_string()
                } else {
                    "<file (closed)>".to_string()
                }
            }
            ExternalValue::Process(output) => {
                format!("<process exit={}>", output.status)
            }
            ExternalValue::StringStream(_) => "<stringstream>".to_string(),
        }
    }
}

/// Run a program to completion, capturing stdout/stderr/exit status.
pub fn run_process(program: &str, args: &[String]) -> Result<ProcessOutput, RuntimeError> {
    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|e| os_error(format!("cannot run '{program}': {e}")))?;
    Ok(ProcessOutput {
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        status: output.status.code().map_or(-1, i64::from),
    })
}

/// Open (create or truncate) a file for writing.
pub fn create_file(path: &str) -> Result<ExternalValue, RuntimeError> {
    let file = fs::File::create(path)
        .map_err(|e| os_error(format!("cannot create '{path}': {e}")))?;
    Ok(ExternalValue::File(Shared::new(Some(file))))
}

/// Write text to an open file handle.
pub fn write_file(handle: &Shared<Option<fs::File>>, text: &str) -> Result<(), RuntimeError> {
    let mut guard = handle.borrow_mut();
    let Some(file) = guard.as_mut() else {
        return Err(os_error("write to a closed file"));
    };
    file.write_all(text.as_bytes())
        .map_err(|e| os_error(format!("write failed: {e}")))
}

/// Close a file handle; idempotent.
pub fn close_file(handle: &Shared<Option<fs::File>>) {
    *handle.borrow_mut() = None;
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn missing_program_is_os_error() {
        let err = run_process("definitely-not-a-real-binary-xyz", &[]).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Os { .. }));
    }

    #[test]
    fn string_stream_identity() {
        let a = ExternalValue::StringStream(Shared::new(String::new()));
        let b = a.clone();
        let c = ExternalValue::StringStream(Shared::new(String::new()));
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }

    #[test]
    fn closed_file_rejects_writes() {
        let handle = Shared::new(None);
        let err = write_file(&handle, "x").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Os { .. }));
    }
}
