//! Numeric method tables.
//!
//! Arithmetic dunders live on `Number` and share one dispatch algorithm
//! (`numeric_binary`). A left operand that cannot coerce its right one
//! answers with a coercion refusal, which the operator path turns into a
//! reflected call on the right operand — the `r`-prefixed methods here.

use std::cmp::Ordering;

use sable_ir::{BinaryOp, StringInterner};

use crate::class::BuiltinClasses;
use crate::errors::{type_error, EvalResult};
use crate::eval::Evaluator;
use crate::methods::define_method;
use crate::params::Arguments;
use crate::value::{numeric_binary, numeric_compare, numeric_eq, Value};

pub(super) fn install(builtins: &BuiltinClasses, interner: &StringInterner) {
    let number = &builtins.number;
    define_method(number, interner, "add", |e, r, a| binary(e, r, a, BinaryOp::Add, false));
    define_method(number, interner, "sub", |e, r, a| binary(e, r, a, BinaryOp::Sub, false));
    define_method(number, interner, "mul", |e, r, a| binary(e, r, a, BinaryOp::Mul, false));
    define_method(number, interner, "div", |e, r, a| binary(e, r, a, BinaryOp::Div, false));
    define_method(number, interner, "mod", |e, r, a| binary(e, r, a, BinaryOp::Mod, false));
    define_method(number, interner, "pow", |e, r, a| binary(e, r, a, BinaryOp::Pow, false));
    define_method(number, interner, "radd", |e, r, a| binary(e, r, a, BinaryOp::Add, true));
    define_method(number, interner, "rsub", |e, r, a| binary(e, r, a, BinaryOp::Sub, true));
    define_method(number, interner, "rmul", |e, r, a| binary(e, r, a, BinaryOp::Mul, true));
    define_method(number, interner, "rdiv", |e, r, a| binary(e, r, a, BinaryOp::Div, true));
    define_method(number, interner, "rmod", |e, r, a| binary(e, r, a, BinaryOp::Mod, true));
    define_method(number, interner, "rpow", |e, r, a| binary(e, r, a, BinaryOp::Pow, true));
    define_method(number, interner, "neg", number_neg);
    define_method(number, interner, "pos", number_pos);
    define_method(number, interner, "eq", number_eq);
    define_method(number, interner, "lt", number_lt);
    define_method(number, interner, "abs", number_abs);

    let rational = &builtins.rational;
    define_method(rational, interner, "numerator", rational_numerator);
    define_method(rational, interner, "denominator", rational_denominator);
}

/// Shared arithmetic entry point. `reflected` swaps the operands: the
/// receiver is then the right operand of the source-level expression.
fn binary(
    _eval: &mut Evaluator<'_>,
    receiver: Value,
    args: Arguments,
    op: BinaryOp,
    reflected: bool,
) -> EvalResult {
    args.expect_arity(op.as_symbol(), 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    if reflected {
        numeric_binary(op, &other, &receiver)
    } else {
        numeric_binary(op, &receiver, &other)
    }
}

fn number_neg(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("neg", 0)?;
    numeric_binary(BinaryOp::Sub, &Value::int(0), &receiver)
}

fn number_pos(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("pos", 0)?;
    Ok(receiver)
}

/// Mixed-kind equality through lattice promotion; non-numeric operands
/// simply compare unequal.
fn number_eq(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("eq", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    if !other.is_numeric() {
        return Ok(Value::Bool(false));
    }
    Ok(Value::Bool(numeric_eq(&receiver, &other)))
}

/// Mixed-kind ordering through lattice promotion. NaN never orders.
fn number_lt(eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("lt", 1)?;
    let other = args.at(0).unwrap_or(Value::None);
    if !other.is_numeric() {
        return Err(type_error(format!(
            "cannot order {} against {}",
            receiver.kind_name(),
            eval.registry().class_name_of(&other, eval.interner())
        )));
    }
    Ok(Value::Bool(
        numeric_compare(&receiver, &other) == Some(Ordering::Less),
    ))
}

fn number_abs(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("abs", 0)?;
    let negative = numeric_compare(&receiver, &Value::int(0)) == Some(Ordering::Less);
    if negative {
        numeric_binary(BinaryOp::Sub, &Value::int(0), &receiver)
    } else {
        Ok(receiver)
    }
}

fn rational_numerator(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("numerator", 0)?;
    match receiver {
        Value::Rational(r) => Ok(Value::big_int(r.numer.clone())),
        other => Err(type_error(format!(
            "numerator expects a Rational, got {}",
            other.kind_name()
        ))),
    }
}

fn rational_denominator(_eval: &mut Evaluator<'_>, receiver: Value, args: Arguments) -> EvalResult {
    args.expect_arity("denominator", 0)?;
    match receiver {
        Value::Rational(r) => Ok(Value::big_int(r.denom.clone())),
        other => Err(type_error(format!(
            "denominator expects a Rational, got {}",
            other.kind_name()
        ))),
    }
}
