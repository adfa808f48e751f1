//! Native collaborator classes: File, Process, StringStream, RegExp.
//!
//! These wrap opaque external calls; successes become values, failures
//! become `OSError`. The runtime never interprets their internals.

use sable_ir::StringInterner;

use crate::class::BuiltinClasses;
use crate::errors::{invalid_arguments, type_error, EvalResult};
use crate::eval::Evaluator;
use crate::methods::{define_method, define_static};
use crate::native::{self, ExternalValue};
use crate::params::Arguments;
use crate::shared::{Heap, Shared};
use crate::value::{RegexValue, Value};

pub(super) fn install(builtins: &BuiltinClasses, interner: &StringInterner) {
    let file = &builtins.file;
    define_static(file, interner, "new", file_new);
    define_method(file, interner, "write", file_write);
    define_method(file, interner, "close", file_close);

    let process = &builtins.process;
    define_static(process, interner, "run", process_run);
    define_method(process, interner, "stdout", process_stdout);
    define_method(process, interner, "stderr", process_stderr);
    define_method(process, interner, "status", process_status);

    let stream = &builtins.string_stream;
    define_static(stream, interner, "new", stream_new);
    define_method(stream, interner, "write", stream_write);
    define_method(stream, interner, "str", stream_str);

    let regexp = &builtins.regexp;
    define_static(regexp, interner, "new", regexp_new);
    define_method(regexp, interner, "matches", regexp_matches);
}

fn expect_string(value: Value, label: &str) -> Result<String, crate::errors::RuntimeError> {
    match value {
        Value::Str(s) => Ok((*s).clone()),
        other => Err(type_error(format!(
            "{label} expects a String, got {}",
            other.kind_name()
        ))),
    }
}

// File

fn file_new(_eval: &mut Evaluator<'_>, _receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("File", 1)?;
    let path = expect_string(args.at(0).unwrap_or(Value::None), "File")?;
    Ok(Value::External(native::create_file(&path)?))
}

fn file_handle(receiver: &Value) -> Result<Shared<Option<std::fs::File>>, crate::errors::RuntimeError> {
    match receiver {
        Value::External(ExternalValue::File(handle)) => Ok(handle.clone()),
        other => Err(type_error(format!(
            "expected a file receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn file_write(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("write", 1)?;
    let handle = file_handle(&receiver)?;
    let value = args.at(0).unwrap_or(Value::None);
    let text = eval.display_string(&value)?;
    native::write_file(&handle, &text)?;
    Ok(Value::None)
}

fn file_close(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("close", 0)?;
    let handle = file_handle(&receiver)?;
    native::close_file(&handle);
    Ok(Value::None)
}

// Process

/// `Process.run(program, *args)` — blocks until the process exits.
fn process_run(eval: &mut Evaluator<'_>, _receiver: Value, args: Arguments) -> EvalResult {
    if args.arity() == 0 {
        return Err(invalid_arguments("Process.run expects a program name"));
    }
    let program = expect_string(args.at(0).unwrap_or(Value::None), "Process.run")?;
    let mut rest = Vec::with_capacity(args.arity() - 1);
    for index in 1..args.arity() {
        let value = args.at(index).unwrap_or(Value::None);
        rest.push(eval.display_string(&value)?);
    }
    let output = native::run_process(&program, &rest)?;
    Ok(Value::External(ExternalValue::Process(Heap::new(output))))
}

fn process_output(receiver: &Value) -> Result<Heap<native::ProcessOutput>, crate::errors::RuntimeError> {
    match receiver {
        Value::External(ExternalValue::Process(output)) => Ok(output.clone()),
        other => Err(type_error(format!(
            "expected a process receiver, got {}",
            other.kind_name()
        ))),
    }
}

fn process_stdout(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("stdout", 0)?;
    Ok(Value::string(process_output(&receiver)?.stdout.clone()))
}

fn process_stderr(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("stderr", 0)?;
    Ok(Value::string(process_output(&receiver)?.stderr.clone()))
}

fn process_status(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("status", 0)?;
    Ok(Value::int(process_output(&receiver)?.status))
}

// StringStream

fn stream_new(_eval: &mut Evaluator<'_>, _receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("StringStream", 0)?;
    Ok(Value::External(ExternalValue::StringStream(Shared::new(
        String::new(),
    ))))
}

fn stream_write(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("write", 1)?;
    let Value::External(ExternalValue::StringStream(buffer)) = &receiver else {
        return Err(type_error("write expects a stringstream receiver"));
    };
    let value = args.at(0).unwrap_or(Value::None);
    let text = eval.display_string(&value)?;
    buffer.borrow_mut().push_str(&text);
    Ok(receiver.clone())
}

/// `str` override: the accumulated contents.
fn stream_str(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("str", 0)?;
    let Value::External(ExternalValue::StringStream(buffer)) = &receiver else {
        return Err(type_error("str expects a stringstream receiver"));
    };
    let contents = buffer.borrow().clone();
    Ok(Value::string(contents))
}

// RegExp

fn regexp_new(_eval: &mut Evaluator<'_>, _receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("RegExp", 1)?;
    let source = expect_string(args.at(0).unwrap_or(Value::None), "RegExp")?;
    let compiled = regex::Regex::new(&source)
        .map_err(|e| invalid_arguments(format!("invalid regular expression: {e}")))?;
    Ok(Value::Regex(Heap::new(RegexValue {
        source,
        compiled: Heap::new(compiled),
    })))
}

fn regexp_matches(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("matches", 1)?;
    let Value::Regex(regex) = &receiver else {
        return Err(type_error("matches expects a regexp receiver"));
    };
    let text = expect_string(args.at(0).unwrap_or(Value::None), "matches")?;
    Ok(Value::Bool(regex.compiled.is_match(&text)))
}
