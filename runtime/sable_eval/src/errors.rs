//! Runtime error taxonomy.
//!
//! Every failure the runtime can produce is a `RuntimeError` with a typed
//! `ErrorKind`. Factory functions populate both `kind` and `message`; the
//! `Display` impl of `ErrorKind` is the single source of message text.
//!
//! None of these are recovered inside the runtime: they unwind to the
//! top-level driver, which reports the kind label, the most specific
//! source line active at failure time, and the captured call trace.
//!
//! Control signals (break request, pending return) are NOT errors and do
//! not travel on this channel; they use the `Flow` result in the
//! evaluator and the return slot on the call stack.

use std::fmt;

use sable_ir::Line;

use crate::stack::TraceSnapshot;
use crate::value::Value;

/// Result of evaluation.
pub type EvalResult = Result<Value, RuntimeError>;

/// Typed error category.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Identifier not found anywhere in the record chain.
    Name { name: String },
    /// Method dispatch exhausted the class chain.
    NoSuchMethod { method: String, class: String },
    /// Operation applied to an incompatible value.
    Type { message: String },
    /// Value used in call position is not callable.
    NotCallable { class: String },
    /// Wrong number of arguments.
    Arity {
        name: String,
        expected: usize,
        got: usize,
    },
    /// Arguments of the wrong shape (bad group usage, non-variable
    /// argument for a by-reference parameter, ...).
    InvalidArguments { message: String },
    /// Index or key out of range or absent.
    Key { key: String },
    /// Division or modulo by a zero-valued numeric operand.
    ZeroDivision,
    /// Instantiation of an abstract class.
    AbstractClass { class: String },
    /// Instantiation of a class that forbids it.
    NewNotSupported { class: String },
    /// Attribute access failure, distinct from method dispatch failure.
    Attribute { attribute: String, class: String },
    /// Malformed input token on `read`.
    Format { token: String },
    /// Native/platform collaborator failure.
    Os { message: String },
    /// Interpreted recursion exhausted the frame budget.
    StackOverflow { depth: usize },
    /// `return` executed with no enclosing method frame.
    ReturnOutsideMethod,
    /// Left operand refused to coerce the right one. Intercepted by the
    /// operator path to retry the reflected operator; reported as a type
    /// error if it escapes.
    CannotCoerce { from: String, to: String },
}

impl ErrorKind {
    /// The taxonomy label used in top-level reports.
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Name { .. } => "NameError",
            Self::NoSuchMethod { .. } | Self::Type { .. } | Self::NotCallable { .. } => {
                "TypeError"
            }
            Self::Arity { .. } => "ArityError",
            Self::InvalidArguments { .. } => "InvalidArgumentsError",
            Self::Key { .. } => "KeyError",
            Self::ZeroDivision => "ZeroDivisionError",
            Self::AbstractClass { .. } => "AbstractClassError",
            Self::NewNotSupported { .. } => "NewNotSupportedError",
            Self::Attribute { .. } => "AttributeError",
            Self::Format { .. } => "FormatError",
            Self::Os { .. } => "OSError",
            Self::StackOverflow { .. } => "StackOverflowError",
            Self::ReturnOutsideMethod => "RuntimeError",
            Self::CannotCoerce { .. } => "TypeError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name { name } => write!(f, "undefined name '{name}'"),
            Self::NoSuchMethod { method, class } => {
                write!(f, "no method '{method}' on class {class}")
            }
            Self::Type { message } => write!(f, "{message}"),
            Self::NotCallable { class } => write!(f, "{class} value is not callable"),
            Self::Arity {
                name,
                expected,
                got,
            } => {
                let arg_word = if *expected == 1 {
                    "argument"
                } else {
                    "arguments"
                };
                if name.is_empty() {
                    write!(f, "expected {expected} {arg_word}, got {got}")
                } else {
                    write!(f, "{name} expects {expected} {arg_word}, got {got}")
                }
            }
            Self::InvalidArguments { message } => write!(f, "{message}"),
            Self::Key { key } => write!(f, "key {key} out of range"),
            Self::ZeroDivision => write!(f, "division by zero"),
            Self::AbstractClass { class } => {
                write!(f, "cannot instantiate abstract class {class}")
            }
            Self::NewNotSupported { class } => {
                write!(f, "class {class} does not support instantiation")
            }
            Self::Attribute { attribute, class } => {
                write!(f, "no attribute '{attribute}' on {class}")
            }
            Self::Format { token } => write!(f, "malformed input token '{token}'"),
            Self::Os { message } => write!(f, "{message}"),
            Self::StackOverflow { depth } => {
                write!(f, "stack overflow at depth {depth}")
            }
            Self::ReturnOutsideMethod => write!(f, "return outside of method"),
            Self::CannotCoerce { from, to } => {
                write!(f, "cannot coerce {to} operand for {from}")
            }
        }
    }
}

/// Runtime error carrying the kind, the originating line, and the call
/// trace captured at the failure site.
#[derive(Clone, Debug)]
pub struct RuntimeError {
    pub kind: ErrorKind,
    /// Human-readable message; equals `kind.to_string()`.
    pub message: String,
    /// Most specific source line active at failure time.
    pub line: Option<Line>,
    /// Call trace snapshot, attached where the stack is in scope.
    pub trace: Option<TraceSnapshot>,
}

impl RuntimeError {
    fn from_kind(kind: ErrorKind) -> Self {
        let message = kind.to_string();
        RuntimeError {
            kind,
            message,
            line: None,
            trace: None,
        }
    }

    /// Attach a source line if none is set yet.
    ///
    /// The innermost line wins: outer evaluation layers call this too,
    /// but only the first (most specific) line sticks.
    #[must_use]
    pub fn with_line(mut self, line: Line) -> Self {
        if self.line.is_none() && line.is_known() {
            self.line = Some(line);
        }
        self
    }

    /// Attach a call trace snapshot if none is set yet.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceSnapshot) -> Self {
        if self.trace.is_none() {
            self.trace = Some(trace);
        }
        self
    }

    /// Render the top-level report: kind label, message, line, trace.
    pub fn report(&self) -> String {
        let mut out = format!("{}: {}", self.kind.label(), self.message);
        if let Some(line) = self.line {
            out.push_str(&format!(" ({line})"));
        }
        if let Some(trace) = &self.trace {
            if !trace.is_empty() {
                out.push('\n');
                // Overflow reports use the truncated rendering; everything
                // else dumps the full trace.
                if matches!(self.kind, ErrorKind::StackOverflow { .. }) {
                    out.push_str(&trace.render_truncated(TraceSnapshot::TRUNCATE_PER_END));
                } else {
                    out.push_str(&trace.render_full());
                }
            }
        }
        out
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::error::Error for RuntimeError {}

// Name resolution

/// Identifier not found in the record chain.
#[cold]
pub fn name_error(name: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Name {
        name: name.to_string(),
    })
}

// Method dispatch and typing

/// Method dispatch exhausted the class chain.
#[cold]
pub fn no_such_method(method: &str, class: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::NoSuchMethod {
        method: method.to_string(),
        class: class.to_string(),
    })
}

/// General type error.
#[cold]
pub fn type_error(message: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Type {
        message: message.into(),
    })
}

/// Value is not callable.
#[cold]
pub fn not_callable(class: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::NotCallable {
        class: class.to_string(),
    })
}

// Argument binding

/// Wrong number of arguments.
#[cold]
pub fn arity_error(name: &str, expected: usize, got: usize) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Arity {
        name: name.to_string(),
        expected,
        got,
    })
}

/// Arguments of the wrong shape.
#[cold]
pub fn invalid_arguments(message: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::InvalidArguments {
        message: message.into(),
    })
}

// Indexing

/// Index or key out of range or absent.
#[cold]
pub fn key_error(key: impl fmt::Display) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Key {
        key: key.to_string(),
    })
}

// Numeric tower

/// Division or modulo by zero. Raised before any coercion attempt.
#[cold]
pub fn zero_division() -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::ZeroDivision)
}

/// Left operand refused to coerce the right one.
#[cold]
pub fn cannot_coerce(from: &str, to: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::CannotCoerce {
        from: from.to_string(),
        to: to.to_string(),
    })
}

// Instantiation

/// Instantiation of an abstract class.
#[cold]
pub fn abstract_class(class: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::AbstractClass {
        class: class.to_string(),
    })
}

/// Instantiation of a class that forbids it.
#[cold]
pub fn new_not_supported(class: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::NewNotSupported {
        class: class.to_string(),
    })
}

// Attributes

/// Attribute access failure.
#[cold]
pub fn attribute_error(attribute: &str, class: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Attribute {
        attribute: attribute.to_string(),
        class: class.to_string(),
    })
}

// External interfaces

/// Malformed input token on `read`.
#[cold]
pub fn format_error(token: &str) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Format {
        token: token.to_string(),
    })
}

/// Native collaborator failure.
#[cold]
pub fn os_error(message: impl Into<String>) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::Os {
        message: message.into(),
    })
}

// Control and resources

/// Interpreted recursion exhausted the frame budget.
#[cold]
pub fn stack_overflow(depth: usize) -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::StackOverflow { depth })
}

/// `return` executed with no enclosing method frame.
#[cold]
pub fn return_outside_method() -> RuntimeError {
    RuntimeError::from_kind(ErrorKind::ReturnOutsideMethod)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_sets_kind_and_message() {
        let err = name_error("x");
        assert_eq!(
            err.kind,
            ErrorKind::Name {
                name: "x".to_string()
            }
        );
        assert_eq!(err.message, "undefined name 'x'");
        assert_eq!(err.kind.label(), "NameError");
    }

    #[test]
    fn dispatch_failure_is_a_type_error() {
        let err = no_such_method("frob", "Integer");
        assert_eq!(err.kind.label(), "TypeError");
        assert_eq!(err.message, "no method 'frob' on class Integer");
    }

    #[test]
    fn innermost_line_wins() {
        let err = zero_division()
            .with_line(Line::new(7))
            .with_line(Line::new(3));
        assert_eq!(err.line, Some(Line::new(7)));
    }

    #[test]
    fn unknown_line_is_ignored() {
        let err = zero_division().with_line(Line::UNKNOWN);
        assert_eq!(err.line, None);
    }

    #[test]
    fn report_includes_label_and_line() {
        let err = key_error(9).with_line(Line::new(12));
        let report = err.report();
        assert!(report.starts_with("KeyError: key 9 out of range"));
        assert!(report.contains("line 12"));
    }

    #[test]
    fn message_matches_kind_display() {
        let errors = vec![
            name_error("a"),
            no_such_method("m", "C"),
            arity_error("f", 2, 3),
            key_error("k"),
            zero_division(),
            abstract_class("Enumerable"),
            new_not_supported("None"),
            attribute_error("x", "Point"),
            format_error("abc"),
            os_error("spawn failed"),
            stack_overflow(1000),
            return_outside_method(),
            cannot_coerce("Integer", "String"),
        ];
        for err in &errors {
            assert_eq!(err.message, err.kind.to_string());
        }
    }
}
