//! Enumerable protocol: Array, Dictionary, Range, String.
//!
//! The uniform contract is `getItem`, `setItem` (immutables refuse),
//! `size`, and `each`. `each` invokes its lambda with the element (arity
//! 1) or with `(index, element)` (arity 2+), re-binding `self` to the
//! element; a break request stops iteration and yields the current
//! element.

use sable_ir::{Line, StringInterner};

use crate::class::BuiltinClasses;
use crate::errors::{
    invalid_arguments, key_error, name_error, type_error, zero_division, EvalResult,
};
use crate::eval::Evaluator;
use crate::methods::{define_method, define_static};
use crate::params::Arguments;
use crate::value::{coercion_refusal, RangeValue, Value};

pub(super) fn install(builtins: &BuiltinClasses, interner: &StringInterner) {
    let array = &builtins.array;
    define_method(array, interner, "getItem", array_get_item);
    define_method(array, interner, "setItem", array_set_item);
    define_method(array, interner, "size", array_size);
    define_method(array, interner, "each", array_each);
    define_method(array, interner, "push", array_push);
    define_method(array, interner, "add", array_concat);

    let dictionary = &builtins.dictionary;
    define_method(dictionary, interner, "getItem", dict_get_item);
    define_method(dictionary, interner, "setItem", dict_set_item);
    define_method(dictionary, interner, "size", dict_size);
    define_method(dictionary, interner, "each", dict_each);
    define_method(dictionary, interner, "keys", dict_keys);

    let range = &builtins.range;
    define_method(range, interner, "getItem", range_get_item);
    define_method(range, interner, "setItem", immutable_set_item);
    define_method(range, interner, "size", range_size);
    define_method(range, interner, "each", range_each);
    define_static(range, interner, "new", range_new);

    let string = &builtins.string;
    define_method(string, interner, "getItem", string_get_item);
    define_method(string, interner, "setItem", immutable_set_item);
    define_method(string, interner, "size", string_size);
    define_method(string, interner, "each", string_each);
    define_method(string, interner, "add", string_concat);
    define_method(string, interner, "lt", string_lt);
}

/// Drive a lambda over `(index-or-key, element)` pairs.
///
/// A break request from the lambda body stops iteration and returns the
/// current element; a pending method return stops it silently so the
/// enclosing method unwind continues.
pub(crate) fn run_each(
    eval: &mut Evaluator<'_>,
    block: &Value,
    pairs: Vec<(Value, Value)>,
) -> EvalResult {
    let Value::Lambda(lambda) = block else {
        return Err(invalid_arguments(format!(
            "each expects a lambda, got {}",
            block.kind_name()
        )));
    };
    let mut last = Value::None;
    for (key, element) in pairs {
        let args = match lambda.arity() {
            // A zero-arity block still sees the element as `self`.
            0 => Vec::new(),
            1 => vec![element.clone()],
            _ => vec![key, element.clone()],
        };
        let outcome = eval.call_lambda(
            lambda,
            Arguments::positional(args),
            Some(element.clone()),
            Line::UNKNOWN,
        )?;
        if outcome.broke {
            return Ok(element);
        }
        last = outcome.value;
        if eval.return_pending() {
            break;
        }
    }
    Ok(last)
}

/// `setItem` on an immutable enumerable.
fn immutable_set_item(_eval: &mut Evaluator<'_>, receiver: Value, _args: Arguments) -> EvalResult {
    Err(name_error(&format!(
        "setItem: not supported on {}",
        receiver.kind_name()
    )))
}

fn expect_index(value: &Value, label: &str) -> Result<usize, crate::errors::RuntimeError> {
    match value {
        Value::Int(n) if *n >= 0 => Ok(*n as usize),
        Value::Int(n) => Err(key_error(n)),
        other => Err(type_error(format!(
            "{label} expects an integer index, got {}",
            other.kind_name()
        ))),
    }
}

// Array

fn array_get_item(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("getItem", 1)?;
    let Value::Array(items) = &receiver else {
        return Err(type_error("getItem expects an array receiver"));
    };
    let index_value = args.at(0).unwrap_or(Value::None);
    let index = expect_index(&index_value, "getItem")?;
    items
        .borrow()
        .get(index)
        .cloned()
        .ok_or_else(|| key_error(index))
}

fn array_set_item(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("setItem", 2)?;
    let Value::Array(items) = &receiver else {
        return Err(type_error("setItem expects an array receiver"));
    };
    let index_value = args.at(0).unwrap_or(Value::None);
    let index = expect_index(&index_value, "setItem")?;
    let value = args.at(1).unwrap_or(Value::None);
    let mut items = items.borrow_mut();
    match items.get_mut(index) {
        Some(slot) => {
            *slot = value.clone();
            Ok(value)
        }
        None => Err(key_error(index)),
    }
}

fn array_size(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("size", 0)?;
    let Value::Array(items) = &receiver else {
        return Err(type_error("size expects an array receiver"));
    };
    let len = items.borrow().len();
    Ok(Value::int(len as i64))
}

fn array_each(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("each", 1)?;
    let Value::Array(items) = &receiver else {
        return Err(type_error("each expects an array receiver"));
    };
    let pairs: Vec<(Value, Value)> = items
        .borrow()
        .iter()
        .enumerate()
        .map(|(i, v)| (Value::int(i as i64), v.clone()))
        .collect();
    let block = args.at(0).unwrap_or(Value::None);
    run_each(eval, &block, pairs)
}

fn array_push(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("push", 1)?;
    let Value::Array(items) = &receiver else {
        return Err(type_error("push expects an array receiver"));
    };
    items.borrow_mut().push(args.at(0).unwrap_or(Value::None));
    Ok(receiver)
}

/// `+` on arrays concatenates into a fresh array.
fn array_concat(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("+", 1)?;
    let Value::Array(items) = &receiver else {
        return Err(type_error("+ expects an array receiver"));
    };
    let other = args.at(0).unwrap_or(Value::None);
    let Value::Array(other_items) = &other else {
        return Err(coercion_refusal("Array", &other));
    };
    let mut combined = items.borrow().clone();
    combined.extend(other_items.borrow().iter().cloned());
    Ok(Value::array(combined))
}

// Dictionary

fn dict_get_item(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("getItem", 1)?;
    let Value::Dict(entries) = &receiver else {
        return Err(type_error("getItem expects a dictionary receiver"));
    };
    let key = args.at(0).unwrap_or(Value::None);
    entries
        .borrow()
        .get(&key)
        .ok_or_else(|| key_error(key.repr(eval.interner())))
}

fn dict_set_item(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("setItem", 2)?;
    let Value::Dict(entries) = &receiver else {
        return Err(type_error("setItem expects a dictionary receiver"));
    };
    let key = args.at(0).unwrap_or(Value::None);
    let value = args.at(1).unwrap_or(Value::None);
    entries.borrow_mut().set(key, value.clone());
    Ok(value)
}

fn dict_size(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("size", 0)?;
    let Value::Dict(entries) = &receiver else {
        return Err(type_error("size expects a dictionary receiver"));
    };
    let len = entries.borrow().len();
    Ok(Value::int(len as i64))
}

fn dict_each(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("each", 1)?;
    let Value::Dict(entries) = &receiver else {
        return Err(type_error("each expects a dictionary receiver"));
    };
    let pairs: Vec<(Value, Value)> = entries.borrow().entries.clone();
    let block = args.at(0).unwrap_or(Value::None);
    run_each(eval, &block, pairs)
}

fn dict_keys(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("keys", 0)?;
    let Value::Dict(entries) = &receiver else {
        return Err(type_error("keys expects a dictionary receiver"));
    };
    let keys: Vec<Value> = entries
        .borrow()
        .entries
        .iter()
        .map(|(k, _)| k.clone())
        .collect();
    Ok(Value::array(keys))
}

// Range

fn range_get_item(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("getItem", 1)?;
    let Value::Range(range) = &receiver else {
        return Err(type_error("getItem expects a range receiver"));
    };
    let index_value = args.at(0).unwrap_or(Value::None);
    let index = expect_index(&index_value, "getItem")?;
    range.get(index).map(Value::Int).ok_or_else(|| key_error(index))
}

fn range_size(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("size", 0)?;
    let Value::Range(range) = &receiver else {
        return Err(type_error("size expects a range receiver"));
    };
    Ok(Value::int(range.size() as i64))
}

fn range_each(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("each", 1)?;
    let Value::Range(range) = &receiver else {
        return Err(type_error("each expects a range receiver"));
    };
    // The sequence is generated, never materialized as an array value.
    let pairs: Vec<(Value, Value)> = range
        .iter()
        .enumerate()
        .map(|(i, n)| (Value::int(i as i64), Value::Int(n)))
        .collect();
    let block = args.at(0).unwrap_or(Value::None);
    run_each(eval, &block, pairs)
}

/// `Range.new(start, end, step: 1, include: false)`; step may also be
/// given as a third positional argument.
fn range_new(eval: &mut Evaluator<'_>, _receiver: Value, args: Arguments) -> EvalResult {
    if args.arity() < 2 || args.arity() > 3 {
        return Err(invalid_arguments(
            "Range expects (start, end) with optional step",
        ));
    }
    let read_int = |value: Value, label: &str| match value {
        Value::Int(n) => Ok(n),
        other => Err(type_error(format!(
            "Range {label} must be an Integer, got {}",
            other.kind_name()
        ))),
    };
    let start = read_int(args.at(0).unwrap_or(Value::None), "start")?;
    let end = read_int(args.at(1).unwrap_or(Value::None), "end")?;
    let step_name = eval.interner().intern("step");
    let include_name = eval.interner().intern("include");
    let step = match args.at(2).or_else(|| args.keyword(step_name)) {
        Some(value) => read_int(value, "step")?,
        None => 1,
    };
    if step == 0 {
        return Err(zero_division());
    }
    let inclusive = match args.keyword(include_name) {
        Some(Value::Bool(b)) => b,
        Some(other) => {
            return Err(type_error(format!(
                "Range include must be a Boolean, got {}",
                other.kind_name()
            )))
        }
        None => false,
    };
    Ok(Value::range(RangeValue::with_step(start, end, step, inclusive)))
}

// String

fn string_get_item(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("getItem", 1)?;
    let Value::Str(s) = &receiver else {
        return Err(type_error("getItem expects a string receiver"));
    };
    let index_value = args.at(0).unwrap_or(Value::None);
    let index = expect_index(&index_value, "getItem")?;
    s.chars()
        .nth(index)
        .map(|c| Value::string(c.to_string()))
        .ok_or_else(|| key_error(index))
}

fn string_size(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("size", 0)?;
    let Value::Str(s) = &receiver else {
        return Err(type_error("size expects a string receiver"));
    };
    Ok(Value::int(s.chars().count() as i64))
}

fn string_each(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("each", 1)?;
    let Value::Str(s) = &receiver else {
        return Err(type_error("each expects a string receiver"));
    };
    let pairs: Vec<(Value, Value)> = s
        .chars()
        .enumerate()
        .map(|(i, c)| (Value::int(i as i64), Value::string(c.to_string())))
        .collect();
    let block = args.at(0).unwrap_or(Value::None);
    run_each(eval, &block, pairs)
}

/// `+` on strings concatenates; a non-string right operand is a coercion
/// refusal, giving it the chance to answer the reflected operator.
fn string_concat(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("+", 1)?;
    let Value::Str(s) = &receiver else {
        return Err(type_error("+ expects a string receiver"));
    };
    let other = args.at(0).unwrap_or(Value::None);
    let Value::Str(other_s) = &other else {
        return Err(coercion_refusal("String", &other));
    };
    let mut combined = String::with_capacity(s.len() + other_s.len());
    combined.push_str(s);
    combined.push_str(other_s);
    Ok(Value::string(combined))
}

/// Lexicographic ordering.
fn string_lt(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("lt", 1)?;
    let Value::Str(s) = &receiver else {
        return Err(type_error("lt expects a string receiver"));
    };
    let other = args.at(0).unwrap_or(Value::None);
    let Value::Str(other_s) = &other else {
        return Err(type_error(format!(
            "cannot order String against {}",
            other.kind_name()
        )));
    };
    Ok(Value::Bool(**s < **other_s))
}
