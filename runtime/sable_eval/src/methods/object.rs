//! Root class protocol.
//!
//! `Object` supplies the universal protocol — `str`, `bool`, `not`,
//! `eq`, `neq`, `le`, `gt`, `ge` — with the relational half *derived*
//! from the minimal abstract set (`bool`, `eq`, `lt`) through dispatch,
//! so an overridden `eq` or `lt` flows into every derived comparison.
//! `Object` deliberately does not define `lt`: classes without an order
//! fail ordered comparison with a TypeError at dispatch.

use sable_ir::StringInterner;

use crate::class::BuiltinClasses;
use crate::errors::{type_error, EvalResult};
use crate::eval::Evaluator;
use crate::methods::define_method;
use crate::params::Arguments;
use crate::value::Value;

pub(super) fn install(builtins: &BuiltinClasses, interner: &StringInterner) {
    let object = &builtins.object;
    define_method(object, interner, "str", object_str);
    define_method(object, interner, "bool", object_bool);
    define_method(object, interner, "not", object_not);
    define_method(object, interner, "eq", object_eq);
    define_method(object, interner, "neq", object_neq);
    define_method(object, interner, "le", object_le);
    define_method(object, interner, "gt", object_gt);
    define_method(object, interner, "ge", object_ge);

    // Class values answer a few reflective questions.
    let class = &builtins.class;
    define_method(class, interner, "name", class_name);
    define_method(class, interner, "superclass", class_superclass);

    // Enumerables derive truthiness from their size.
    define_method(&builtins.enumerable, interner, "bool", enumerable_bool);
}

/// Default textual representation.
fn object_str(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("str", 0)?;
    Ok(Value::string(receiver.repr(eval.interner())))
}

/// Default truthiness: everything is true except what says otherwise.
fn object_bool(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("bool", 0)?;
    Ok(Value::Bool(receiver.is_truthy()))
}

/// `not` is the negated `bool` projection, through dispatch.
fn object_not(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("not", 0)?;
    let truthy = eval.truthiness(&receiver)?;
    Ok(Value::Bool(!truthy))
}

/// Default equality: structural for values, identity for objects.
fn object_eq(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("eq", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    Ok(Value::Bool(receiver == other))
}

/// `neq` is derived: `not eq`.
fn object_neq(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("neq", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    let equal = eval.dispatch_eq(&receiver, &other)?;
    Ok(Value::Bool(!equal))
}

/// `le` is derived: `lt or eq`.
fn object_le(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("le", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    if eval.dispatch_lt(&receiver, &other)? {
        return Ok(Value::Bool(true));
    }
    Ok(Value::Bool(eval.dispatch_eq(&receiver, &other)?))
}

/// `gt` is derived: `not (lt or eq)`.
fn object_gt(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("gt", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    if eval.dispatch_lt(&receiver, &other)? {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(!eval.dispatch_eq(&receiver, &other)?))
}

/// `ge` is derived: `not lt`.
fn object_ge(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("ge", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    Ok(Value::Bool(!eval.dispatch_lt(&receiver, &other)?))
}

/// Class name as a string.
fn class_name(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("name", 0)?;
    match receiver {
        Value::Class(class) => Ok(Value::string(eval.interner().lookup(class.name()))),
        other => Err(type_error(format!(
            "name expects a class receiver, got {}",
            other.kind_name()
        ))),
    }
}

/// Superclass as a class value, or none at the root.
fn class_superclass(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("superclass", 0)?;
    match receiver {
        Value::Class(class) => Ok(class
            .superclass()
            .map(Value::Class)
            .unwrap_or(Value::None)),
        other => Err(type_error(format!(
            "superclass expects a class receiver, got {}",
            other.kind_name()
        ))),
    }
}

/// Enumerable truthiness: `size() != 0`, through dispatch so user
/// overrides of `size` participate.
fn enumerable_bool(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("bool", 0)?;
    let size = eval.dispatch_size(&receiver)?;
    Ok(Value::Bool(size != 0))
}
