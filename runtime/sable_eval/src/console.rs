//! Console abstraction for `read` and `write`.
//!
//! `read` consumes one whitespace-delimited token from standard input;
//! `write` prints with no trailing newline added by the runtime. The
//! scripted variant feeds tokens from a preloaded string and captures
//! output, so tests run deterministically without touching process stdio.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::rc::Rc;

use parking_lot::Mutex;

/// Console implementation.
pub enum Console {
    /// Process stdin/stdout (default).
    Standard {
        /// Tokens split off the last line read but not yet consumed.
        pending: Mutex<VecDeque<String>>,
    },
    /// Scripted input and captured output, for tests.
    Scripted {
        input: Mutex<VecDeque<String>>,
        output: Mutex<String>,
    },
}

impl Console {
    /// Console over process stdio.
    pub fn standard() -> Self {
        Console::Standard {
            pending: Mutex::new(VecDeque::new()),
        }
    }

    /// Scripted console with `input` pre-split on whitespace.
    pub fn scripted(input: &str) -> Self {
        Console::Scripted {
            input: Mutex::new(input.split_whitespace().map(str::to_string).collect()),
            output: Mutex::new(String::new()),
        }
    }

    /// Read the next whitespace-delimited token.
    ///
    /// Returns `None` at end of input. Blocks on process stdin for the
    /// standard console — a blocked read blocks the whole program.
    pub fn read_token(&self) -> Option<String> {
        match self {
            Console::Standard { pending } => {
                let mut pending = pending.lock();
                loop {
                    if let Some(token) = pending.pop_front() {
                        return Some(token);
                    }
                    let mut line = String::new();
                    let read = std::io::stdin().lock().read_line(&mut line).ok()?;
                    if read == 0 {
                        return None;
                    }
                    pending.extend(line.split_whitespace().map(str::to_string));
                }
            }
            Console::Scripted { input, .. } => input.lock().pop_front(),
        }
    }

    /// Write `text` verbatim; no newline is appended.
    pub fn write(&self, text: &str) {
        match self {
            Console::Standard { .. } => {
                let mut stdout = std::io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
            Console::Scripted { output, .. } => output.lock().push_str(text),
        }
    }

    /// Get captured output (empty for the standard console).
    pub fn get_output(&self) -> String {
        match self {
            Console::Standard { .. } => String::new(),
            Console::Scripted { output, .. } => output.lock().clone(),
        }
    }
}

/// Shared console handle.
pub type SharedConsole = Rc<Console>;

/// Create a console over process stdio.
pub fn standard_console() -> SharedConsole {
    Rc::new(Console::standard())
}

/// Create a scripted console for tests.
pub fn scripted_console(input: &str) -> SharedConsole {
    Rc::new(Console::scripted(input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_console_yields_tokens_in_order() {
        let console = Console::scripted("  12 -3\n 4 ");
        assert_eq!(console.read_token().as_deref(), Some("12"));
        assert_eq!(console.read_token().as_deref(), Some("-3"));
        assert_eq!(console.read_token().as_deref(), Some("4"));
        assert_eq!(console.read_token(), None);
    }

    #[test]
    fn write_adds_no_newline() {
        let console = Console::scripted("");
        console.write("a");
        console.write("b");
        assert_eq!(console.get_output(), "ab");
    }
}
