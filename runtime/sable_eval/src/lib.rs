//! Sable Eval - tree-walking runtime for the Sable language.
//!
//! Given an already-parsed `sable_ir` program, this crate executes it:
//! it resolves names, dispatches methods, manages call frames, performs
//! numeric coercion, and implements the built-in object model.
//!
//! # Architecture
//!
//! - `Reference` / `ReferenceRecord`: chained name→reference tables —
//!   lexical scopes, per-class method tables, the module namespace
//! - `ClassRegistry`: the built-in class tree, bootstrapped in two
//!   phases and read-only afterwards
//! - `Params` / `Arguments`: declarative signatures and the binding
//!   algorithm (positional, keyword, splat groups, defaults, by-ref)
//! - `CallStack`: activation frames with a parallel diagnostic trace
//! - the numeric tower (`Int` ⊂ `BigInt` ⊂ `Rational` ⊂ `Float`) with
//!   reflected-operator coercion
//! - the enumerable protocol (`getItem`/`setItem`/`size`/`each`) over
//!   Array, Dictionary, Range, String
//! - `Evaluator`: walks the AST and owns all of the above
//!
//! # Entry points
//!
//! ```text
//! let interner = StringInterner::new();
//! let mut eval = Evaluator::builder(&interner)
//!     .with_console(scripted_console("1 2"))
//!     .build();
//! let result = eval.run_program(&program)?;
//! ```

mod class;
mod console;
pub mod errors;
mod eval;
mod methods;
mod native;
mod params;
mod reference;
mod shared;
mod stack;
mod stack_guard;
mod trace;
mod value;

pub use class::{BuiltinClasses, ClassHandle, ClassRegistry, Instantiability};
pub use console::{scripted_console, standard_console, Console, SharedConsole};
pub use errors::{ErrorKind, EvalResult, RuntimeError};
pub use eval::{Evaluator, EvaluatorBuilder, LambdaOutcome};
pub use native::{ExternalValue, ProcessOutput};
pub use params::{Arg, Arguments, Params, PositionalParam};
pub use reference::{RecordRef, Reference, ReferenceRecord};
pub use shared::{Heap, Shared};
pub use stack::{CallStack, TraceFrame, TraceSnapshot, DEFAULT_MAX_DEPTH};
pub use stack_guard::ensure_sufficient_stack;
pub use trace::{buffer_sink, silent_sink, writer_sink, SharedTraceSink, TraceSink};
pub use value::{
    DictValue, InstanceValue, LambdaValue, MethodBody, MethodValue, NativeFn, NumericKind,
    RangeValue, Rational, RegexValue, Value,
};
