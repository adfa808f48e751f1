//! Trace sink for call/return tracing.
//!
//! An optional append-only text sink. On each traced call the evaluator
//! emits a nesting-indented `name(params=values) <line>` line; on each
//! return, `return value, &byrefname=value <line>`; the sink is closed
//! when the outermost frame returns. Exact formatting lives in the
//! evaluator — the sink only appends lines.
//!
//! Enum dispatch keeps this cheap on the hot path; the silent variant is
//! checked before any formatting work happens.

use std::io::Write;
use std::rc::Rc;

use parking_lot::Mutex;

/// Trace sink implementation.
pub enum TraceSink {
    /// Discards everything; tracing disabled (default).
    Silent,
    /// Captures to a buffer, for tests and embedders.
    Buffer(Mutex<String>),
    /// Appends to an arbitrary writer (a trace file, typically).
    Writer(Mutex<Box<dyn Write>>),
}

impl TraceSink {
    /// Whether the evaluator should bother formatting trace lines.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        !matches!(self, TraceSink::Silent)
    }

    /// Append one line to the sink.
    pub fn line(&self, text: &str) {
        match self {
            TraceSink::Silent => {}
            TraceSink::Buffer(buffer) => {
                let mut buf = buffer.lock();
                buf.push_str(text);
                buf.push('\n');
            }
            TraceSink::Writer(writer) => {
                let mut w = writer.lock();
                // A broken trace writer must not take the program down.
                let _ = writeln!(w, "{text}");
            }
        }
    }

    /// Close the sink; called when the outermost frame returns.
    pub fn close(&self) {
        if let TraceSink::Writer(writer) = self {
            let _ = writer.lock().flush();
        }
    }

    /// Get captured output (empty for non-buffer sinks).
    pub fn get_output(&self) -> String {
        match self {
            TraceSink::Buffer(buffer) => buffer.lock().clone(),
            _ => String::new(),
        }
    }
}

/// Shared trace sink handle.
pub type SharedTraceSink = Rc<TraceSink>;

/// Create a disabled sink.
pub fn silent_sink() -> SharedTraceSink {
    Rc::new(TraceSink::Silent)
}

/// Create a capturing sink for tests and embedders.
pub fn buffer_sink() -> SharedTraceSink {
    Rc::new(TraceSink::Buffer(Mutex::new(String::new())))
}

/// Create a sink appending to `writer`.
pub fn writer_sink(writer: Box<dyn Write>) -> SharedTraceSink {
    Rc::new(TraceSink::Writer(Mutex::new(writer)))
}
