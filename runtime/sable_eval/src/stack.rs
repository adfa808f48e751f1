//! Call stack: activation frames and the parallel diagnostic trace.
//!
//! Each call pushes a frame holding the activation record (with `self`
//! and the `return` slot pre-bound) and a trace entry `{name, line}`.
//! The trace is what error reports render — in full for ordinary errors,
//! head/tail-truncated for stack overflow.
//!
//! `define_return` implements "return from the enclosing method through
//! nested blocks": from a lambda/block frame it walks outward to the
//! nearest enclosing method frame, sets *that* frame's return slot, and
//! stamps every frame in between as return-pending so execution unwinds.

use std::fmt;

use sable_ir::{Line, Name, StringInterner};

use crate::errors::{return_outside_method, stack_overflow, RuntimeError};
use crate::reference::{RecordRef, ReferenceRecord};
use crate::value::Value;

/// Default frame budget before the distinguished overflow failure.
pub const DEFAULT_MAX_DEPTH: usize = 2000;

/// One activation frame.
#[derive(Debug)]
pub struct Frame {
    /// Callable name, for diagnostics.
    pub name: Name,
    /// Activation record; `self` and `return` are pre-bound.
    pub record: RecordRef,
    /// Method/function frames own a return slot; lambda and block frames
    /// do not — `return` inside them targets the enclosing method.
    pub is_method: bool,
    /// Set once a return has been issued through this frame.
    return_pending: bool,
}

/// One diagnostic trace entry, kept parallel to the live frames.
#[derive(Clone, Debug)]
pub struct TraceEntry {
    pub name: Name,
    pub line: Line,
}

/// Live call stack.
pub struct CallStack {
    frames: Vec<Frame>,
    /// Parallel trace of {call-site name, call-site line}.
    trace: Vec<TraceEntry>,
    max_depth: usize,
    self_name: Name,
    return_name: Name,
}

impl CallStack {
    /// Create an empty stack with the given frame budget.
    pub fn new(max_depth: usize, interner: &StringInterner) -> Self {
        CallStack {
            frames: Vec::new(),
            trace: Vec::new(),
            max_depth,
            self_name: interner.intern("self"),
            return_name: interner.intern("return"),
        }
    }

    /// Current call depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Push a frame for a call.
    ///
    /// Creates the activation record parented to `parent` (the captured
    /// record for lambdas, the module for ordinary calls), pre-binds
    /// `self` (when a receiver is given) and the `return` slot, and
    /// records the trace entry. Fails with the distinguished overflow
    /// error when the frame budget is exhausted; the frame is not pushed.
    pub fn push_frame(
        &mut self,
        name: Name,
        receiver: Option<Value>,
        parent: RecordRef,
        line: Line,
        is_method: bool,
    ) -> Result<(), RuntimeError> {
        if self.frames.len() >= self.max_depth {
            return Err(stack_overflow(self.max_depth));
        }
        let record = ReferenceRecord::child_of(name, parent);
        {
            let mut record = record.borrow_mut();
            if let Some(receiver) = receiver {
                record.define(self.self_name, receiver);
            }
            record.define(self.return_name, Value::None);
        }
        self.frames.push(Frame {
            name,
            record,
            is_method,
            return_pending: false,
        });
        self.trace.push(TraceEntry { name, line });
        Ok(())
    }

    /// Pop the current frame, restoring the previous one, and hand back
    /// the popped frame's return-slot value.
    pub fn pop_frame(&mut self) -> Value {
        self.trace.pop();
        match self.frames.pop() {
            Some(frame) => frame
                .record
                .borrow()
                .lookup_local(self.return_name)
                .map(|r| r.get())
                .unwrap_or(Value::None),
            None => Value::None,
        }
    }

    /// The current activation record.
    ///
    /// # Panics
    /// Panics if the stack is empty; the evaluator always runs inside at
    /// least the entry frame.
    pub fn current_record(&self) -> RecordRef {
        match self.frames.last() {
            Some(frame) => frame.record.clone(),
            None => unreachable!("evaluation outside any frame"),
        }
    }

    /// Name of the current frame, for diagnostics.
    pub fn current_name(&self) -> Option<Name> {
        self.frames.last().map(|f| f.name)
    }

    /// Issue a return with `value`.
    ///
    /// If the current frame is a method frame, sets its own return slot.
    /// Otherwise walks outward to the nearest enclosing method frame,
    /// sets that frame's slot, and stamps every frame in between (and the
    /// method frame itself) as return-pending. Fails when no enclosing
    /// method frame exists.
    pub fn define_return(&mut self, value: Value) -> Result<(), RuntimeError> {
        let Some(method_index) = self.frames.iter().rposition(|f| f.is_method) else {
            return Err(return_outside_method());
        };
        self.frames[method_index]
            .record
            .borrow_mut()
            .define(self.return_name, value);
        for frame in &mut self.frames[method_index..] {
            frame.return_pending = true;
        }
        Ok(())
    }

    /// Whether the current frame is unwinding toward a method return.
    #[inline]
    pub fn return_pending(&self) -> bool {
        self.frames.last().is_some_and(|f| f.return_pending)
    }

    /// Drop every frame and trace entry. The top-level driver calls this
    /// after reporting an escaped error, so the evaluator is reusable.
    pub fn clear(&mut self) {
        self.frames.clear();
        self.trace.clear();
    }

    /// Capture the trace for diagnostics, most recent call first.
    pub fn capture(&self, interner: &StringInterner) -> TraceSnapshot {
        let frames = self
            .trace
            .iter()
            .rev()
            .map(|entry| TraceFrame {
                name: interner.lookup(entry.name).to_string(),
                line: entry.line,
            })
            .collect();
        TraceSnapshot { frames }
    }
}

/// One rendered trace frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraceFrame {
    pub name: String,
    pub line: Line,
}

/// Immutable snapshot of the call trace at a failure site.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceSnapshot {
    frames: Vec<TraceFrame>,
}

impl TraceSnapshot {
    /// Per-end item budget for the truncated rendering.
    pub const TRUNCATE_PER_END: usize = 10;

    pub fn frames(&self) -> &[TraceFrame] {
        &self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Full dump, one frame per line, most recent first.
    pub fn render_full(&self) -> String {
        let mut out = String::from("call trace:");
        for (index, frame) in self.frames.iter().enumerate() {
            out.push_str(&format!("\n  {index}: {}", frame.render()));
        }
        out
    }

    /// Head/tail summary with a fixed item budget per end, for deep
    /// stacks (overflow reports).
    pub fn render_truncated(&self, per_end: usize) -> String {
        if self.frames.len() <= per_end * 2 {
            return self.render_full();
        }
        let mut out = String::from("call trace:");
        for (index, frame) in self.frames.iter().take(per_end).enumerate() {
            out.push_str(&format!("\n  {index}: {}", frame.render()));
        }
        let omitted = self.frames.len() - per_end * 2;
        out.push_str(&format!("\n  ... {omitted} frames omitted ..."));
        let tail_start = self.frames.len() - per_end;
        for (offset, frame) in self.frames[tail_start..].iter().enumerate() {
            out.push_str(&format!("\n  {}: {}", tail_start + offset, frame.render()));
        }
        out
    }
}

impl TraceFrame {
    fn render(&self) -> String {
        if self.line.is_known() {
            format!("{} ({})", self.name, self.line)
        } else {
            self.name.clone()
        }
    }
}

impl fmt::Display for TraceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_full())
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn module(interner: &StringInterner) -> RecordRef {
        ReferenceRecord::root(interner.intern("main"))
    }

    #[test]
    fn push_binds_self_and_return() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(10, &interner);
        let f = interner.intern("f");

        stack
            .push_frame(f, Some(Value::int(7)), module(&interner), Line::new(1), true)
            .unwrap();
        let record = stack.current_record();
        assert_eq!(
            record.borrow().lookup_value(interner.intern("self")),
            Some(Value::int(7))
        );
        assert_eq!(
            record.borrow().lookup_value(interner.intern("return")),
            Some(Value::None)
        );
    }

    #[test]
    fn depth_limit_produces_overflow() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(2, &interner);
        let f = interner.intern("f");

        for _ in 0..2 {
            stack
                .push_frame(f, None, module(&interner), Line::new(1), true)
                .unwrap();
        }
        let err = stack
            .push_frame(f, None, module(&interner), Line::new(1), true)
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::StackOverflow { depth: 2 });
        assert_eq!(stack.depth(), 2);
    }

    #[test]
    fn define_return_in_method_frame_sets_own_slot() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(10, &interner);
        let f = interner.intern("f");

        stack
            .push_frame(f, None, module(&interner), Line::new(1), true)
            .unwrap();
        stack.define_return(Value::int(42)).unwrap();
        assert!(stack.return_pending());
        assert_eq!(stack.pop_frame(), Value::int(42));
    }

    #[test]
    fn define_return_from_nested_block_targets_enclosing_method() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(10, &interner);
        let f = interner.intern("f");
        let block = interner.intern("block");

        stack
            .push_frame(f, None, module(&interner), Line::new(1), true)
            .unwrap();
        stack
            .push_frame(block, None, stack.current_record(), Line::new(2), false)
            .unwrap();
        stack
            .push_frame(block, None, stack.current_record(), Line::new(3), false)
            .unwrap();

        stack.define_return(Value::int(9)).unwrap();
        // Every frame from the innermost block out to the method is stamped.
        assert!(stack.return_pending());
        stack.pop_frame();
        assert!(stack.return_pending());
        stack.pop_frame();
        assert!(stack.return_pending());
        assert_eq!(stack.pop_frame(), Value::int(9));
    }

    #[test]
    fn return_without_method_frame_fails() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(10, &interner);
        let block = interner.intern("block");

        stack
            .push_frame(block, None, module(&interner), Line::new(1), false)
            .unwrap();
        let err = stack.define_return(Value::None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ReturnOutsideMethod);
    }

    #[test]
    fn capture_lists_most_recent_first() {
        let interner = StringInterner::new();
        let mut stack = CallStack::new(10, &interner);
        let outer = interner.intern("outer");
        let inner = interner.intern("inner");

        stack
            .push_frame(outer, None, module(&interner), Line::new(1), true)
            .unwrap();
        stack
            .push_frame(inner, None, stack.current_record(), Line::new(5), true)
            .unwrap();

        let snapshot = stack.capture(&interner);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.frames()[0].name, "inner");
        assert_eq!(snapshot.frames()[1].name, "outer");
    }

    #[test]
    fn truncated_rendering_keeps_head_and_tail() {
        let frames: Vec<TraceFrame> = (0..30)
            .map(|i| TraceFrame {
                name: format!("f{i}"),
                line: Line::new(i + 1),
            })
            .collect();
        let snapshot = TraceSnapshot { frames };

        let rendered = snapshot.render_truncated(3);
        assert!(rendered.contains("f0"));
        assert!(rendered.contains("f2"));
        assert!(rendered.contains("24 frames omitted"));
        assert!(rendered.contains("f27"));
        assert!(rendered.contains("f29"));
        assert!(!rendered.contains("f10"));
    }

    #[test]
    fn shallow_trace_renders_in_full() {
        let frames: Vec<TraceFrame> = (0..4)
            .map(|i| TraceFrame {
                name: format!("f{i}"),
                line: Line::UNKNOWN,
            })
            .collect();
        let snapshot = TraceSnapshot { frames };
        assert_eq!(snapshot.render_truncated(3), snapshot.render_full());
    }
}
