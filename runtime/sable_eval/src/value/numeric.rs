//! Numeric tower: Integer, BigInteger, Rational, Float.
//!
//! The coercion lattice is Integer ⊂ BigInteger ⊂ Rational ⊂ Float. A
//! kind can coerce operands at or below its own rank; when the left
//! operand cannot coerce the right one, the operator path retries the
//! reflected operator on the right operand (`__add__` → `__radd__`).
//!
//! Normalization invariants enforced here:
//! - `BigInt` values that fit machine width demote to `Int`.
//! - Rationals are stored reduced, denominator positive; denominator 1
//!   collapses to an integer.
//! - Division/modulo by a zero-valued operand fails *before* coercion.

use std::cmp::Ordering;

use num_bigint::BigInt;
use num_integer::Integer as _;
use num_traits::{Signed, ToPrimitive, Zero};

use sable_ir::BinaryOp;

use crate::errors::{cannot_coerce, type_error, zero_division, EvalResult, RuntimeError};
use crate::shared::Heap;
use crate::value::{Rational, Value};

/// Position of a value in the coercion lattice.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum NumericKind {
    Integer,
    BigInteger,
    Rational,
    Float,
}

impl NumericKind {
    /// Classify a numeric value; `None` for non-numeric values.
    pub fn of(value: &Value) -> Option<NumericKind> {
        match value {
            Value::Int(_) => Some(NumericKind::Integer),
            Value::BigInt(_) => Some(NumericKind::BigInteger),
            Value::Rational(_) => Some(NumericKind::Rational),
            Value::Float(_) => Some(NumericKind::Float),
            _ => None,
        }
    }

    /// Whether this kind can represent operands of `other` without loss
    /// of protocol (at or below its lattice rank).
    pub fn can_coerce(self, other: NumericKind) -> bool {
        self >= other
    }

    pub const fn name(self) -> &'static str {
        match self {
            NumericKind::Integer => "Integer",
            NumericKind::BigInteger => "BigInteger",
            NumericKind::Rational => "Rational",
            NumericKind::Float => "Float",
        }
    }
}

/// Demote an arbitrary-precision integer to machine width when it fits.
pub(crate) fn demote_big(n: BigInt) -> Value {
    match n.to_i64() {
        Some(fits) => Value::Int(fits),
        None => Value::BigInt(Heap::new(n)),
    }
}

/// Build a reduced rational, collapsing to an integer when the
/// denominator is 1. Zero denominator is a `ZeroDivisionError`.
pub(crate) fn make_rational(numer: BigInt, denom: BigInt) -> Result<Value, RuntimeError> {
    if denom.is_zero() {
        return Err(zero_division());
    }
    let gcd = numer.gcd(&denom);
    let (mut numer, mut denom) = if gcd.is_zero() {
        (numer, denom)
    } else {
        (numer / &gcd, denom / &gcd)
    };
    if denom.is_negative() {
        numer = -numer;
        denom = -denom;
    }
    if denom == BigInt::from(1) {
        Ok(demote_big(numer))
    } else {
        Ok(Value::Rational(Heap::new(Rational { numer, denom })))
    }
}

/// Check whether a numeric value is zero (`isZero()` in the protocol).
fn is_zero(value: &Value) -> bool {
    match value {
        Value::Int(n) => *n == 0,
        Value::Float(f) => *f == 0.0,
        // BigInt and Rational values are normalized and never hold zero.
        _ => false,
    }
}

/// Widen to `BigInt`. Only valid for Integer/BigInteger kinds.
fn to_big(value: &Value) -> BigInt {
    match value {
        Value::Int(n) => BigInt::from(*n),
        Value::BigInt(n) => (**n).clone(),
        _ => unreachable!("to_big on non-integer value"),
    }
}

/// Widen to a (numerator, denominator) pair. Only valid for the exact
/// kinds (Integer, BigInteger, Rational).
fn to_rat(value: &Value) -> (BigInt, BigInt) {
    match value {
        Value::Int(n) => (BigInt::from(*n), BigInt::from(1)),
        Value::BigInt(n) => ((**n).clone(), BigInt::from(1)),
        Value::Rational(r) => (r.numer.clone(), r.denom.clone()),
        _ => unreachable!("to_rat on non-exact value"),
    }
}

/// Widen to `f64`.
fn to_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::BigInt(n) => n.to_f64().unwrap_or(f64::INFINITY),
        Value::Rational(r) => {
            let numer = r.numer.to_f64().unwrap_or(f64::INFINITY);
            let denom = r.denom.to_f64().unwrap_or(f64::INFINITY);
            numer / denom
        }
        Value::Float(f) => *f,
        _ => unreachable!("to_f64 on non-numeric value"),
    }
}

/// Apply an arithmetic operator to two numeric values, promoting both
/// operands to their common lattice kind.
///
/// Returns a `CannotCoerce` error (intercepted by the operator path,
/// which then tries the reflected operator) when an operand is not
/// numeric at all.
pub fn numeric_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult {
    let (Some(lk), Some(rk)) = (NumericKind::of(lhs), NumericKind::of(rhs)) else {
        let (from, to) = coerce_labels(lhs, rhs);
        return Err(cannot_coerce(from, to));
    };

    // Zero divisor fails before any coercion attempt.
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && is_zero(rhs) {
        return Err(zero_division());
    }

    if !lk.can_coerce(rk) && !rk.can_coerce(lk) {
        return Err(cannot_coerce(lk.name(), rk.name()));
    }
    let common = lk.max(rk);

    // Non-integer exponent always yields Float.
    if op == BinaryOp::Pow {
        return pow(lhs, rhs, common);
    }

    match common {
        NumericKind::Integer => int_binary(op, lhs, rhs),
        NumericKind::BigInteger => big_binary(op, &to_big(lhs), &to_big(rhs)),
        NumericKind::Rational => rat_binary(op, to_rat(lhs), to_rat(rhs)),
        NumericKind::Float => float_binary(op, to_f64(lhs), to_f64(rhs)),
    }
}

/// Machine-width arithmetic; overflow promotes to BigInteger.
fn int_binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> EvalResult {
    let (Some(a), Some(b)) = (lhs.as_int(), rhs.as_int()) else {
        unreachable!("int_binary on non-Int values");
    };
    match op {
        BinaryOp::Add => Ok(a
            .checked_add(b)
            .map(Value::Int)
            .unwrap_or_else(|| demote_big(BigInt::from(a) + BigInt::from(b)))),
        BinaryOp::Sub => Ok(a
            .checked_sub(b)
            .map(Value::Int)
            .unwrap_or_else(|| demote_big(BigInt::from(a) - BigInt::from(b)))),
        BinaryOp::Mul => Ok(a
            .checked_mul(b)
            .map(Value::Int)
            .unwrap_or_else(|| demote_big(BigInt::from(a) * BigInt::from(b)))),
        // Integer division produces a Rational, collapsed when exact.
        BinaryOp::Div => make_rational(BigInt::from(a), BigInt::from(b)),
        // Zero divisor was rejected by the caller; checked_rem is None
        // only for i64::MIN % -1, which is mathematically 0.
        BinaryOp::Mod => Ok(a.checked_rem(b).map(Value::Int).unwrap_or(Value::Int(0))),
        other => Err(type_error(format!(
            "operator '{}' is not arithmetic",
            other.as_symbol()
        ))),
    }
}

/// Arbitrary-precision arithmetic; results demote when they fit.
fn big_binary(op: BinaryOp, a: &BigInt, b: &BigInt) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(demote_big(a + b)),
        BinaryOp::Sub => Ok(demote_big(a - b)),
        BinaryOp::Mul => Ok(demote_big(a * b)),
        BinaryOp::Div => make_rational(a.clone(), b.clone()),
        BinaryOp::Mod => {
            if b.is_zero() {
                Err(zero_division())
            } else {
                Ok(demote_big(a % b))
            }
        }
        other => Err(type_error(format!(
            "operator '{}' is not arithmetic",
            other.as_symbol()
        ))),
    }
}

/// Exact fraction arithmetic; results reduce and collapse.
fn rat_binary(op: BinaryOp, (an, ad): (BigInt, BigInt), (bn, bd): (BigInt, BigInt)) -> EvalResult {
    match op {
        BinaryOp::Add => make_rational(&an * &bd + &bn * &ad, ad * bd),
        BinaryOp::Sub => make_rational(&an * &bd - &bn * &ad, ad * bd),
        BinaryOp::Mul => make_rational(an * bn, ad * bd),
        BinaryOp::Div => {
            if bn.is_zero() {
                Err(zero_division())
            } else {
                make_rational(an * bd, ad * bn)
            }
        }
        BinaryOp::Mod => {
            // a - b * floor(a / b), exact.
            if bn.is_zero() {
                return Err(zero_division());
            }
            let quotient = (&an * &bd).div_floor(&(&bn * &ad));
            make_rational(&an * &bd - &bn * &ad * quotient, ad * bd)
        }
        other => Err(type_error(format!(
            "operator '{}' is not arithmetic",
            other.as_symbol()
        ))),
    }
}

/// Double-precision arithmetic.
fn float_binary(op: BinaryOp, a: f64, b: f64) -> EvalResult {
    match op {
        BinaryOp::Add => Ok(Value::Float(a + b)),
        BinaryOp::Sub => Ok(Value::Float(a - b)),
        BinaryOp::Mul => Ok(Value::Float(a * b)),
        BinaryOp::Div => Ok(Value::Float(a / b)),
        BinaryOp::Mod => Ok(Value::Float(a % b)),
        other => Err(type_error(format!(
            "operator '{}' is not arithmetic",
            other.as_symbol()
        ))),
    }
}

/// Exponentiation. Integer exponents stay exact; anything else is Float.
fn pow(base: &Value, exponent: &Value, common: NumericKind) -> EvalResult {
    let int_exp = match exponent {
        Value::Int(e) => Some(*e),
        Value::BigInt(e) => e.to_i64(),
        _ => None,
    };
    let (Some(exp), true) = (int_exp, common != NumericKind::Float) else {
        return Ok(Value::Float(to_f64(base).powf(to_f64(exponent))));
    };

    let magnitude = u32::try_from(exp.unsigned_abs())
        .map_err(|_| type_error("exponent magnitude too large"))?;
    let (bn, bd) = to_rat(base);
    if exp >= 0 {
        make_rational(bn.pow(magnitude), bd.pow(magnitude))
    } else {
        if bn.is_zero() {
            return Err(zero_division());
        }
        make_rational(bd.pow(magnitude), bn.pow(magnitude))
    }
}

/// Equality across the numeric lattice.
pub fn numeric_eq(lhs: &Value, rhs: &Value) -> bool {
    numeric_compare(lhs, rhs) == Some(Ordering::Equal)
}

/// Ordering across the numeric lattice; `None` only for NaN comparisons.
pub fn numeric_compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    let (lk, rk) = (NumericKind::of(lhs)?, NumericKind::of(rhs)?);
    match lk.max(rk) {
        NumericKind::Integer => lhs.as_int()?.partial_cmp(&rhs.as_int()?),
        NumericKind::BigInteger => Some(to_big(lhs).cmp(&to_big(rhs))),
        NumericKind::Rational => {
            let (an, ad) = to_rat(lhs);
            let (bn, bd) = to_rat(rhs);
            // Denominators are positive, so cross-multiplication keeps order.
            Some((an * bd).cmp(&(bn * ad)))
        }
        NumericKind::Float => to_f64(lhs).partial_cmp(&to_f64(rhs)),
    }
}

fn coerce_labels(lhs: &Value, rhs: &Value) -> (&'static str, &'static str) {
    (
        NumericKind::of(lhs).map_or(lhs.kind_name(), NumericKind::name),
        NumericKind::of(rhs).map_or(rhs.kind_name(), NumericKind::name),
    )
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;

    fn binary(op: BinaryOp, a: Value, b: Value) -> Value {
        numeric_binary(op, &a, &b).unwrap()
    }

    #[test]
    fn integer_division_yields_collapsed_rational() {
        // Exact division collapses to an integer.
        assert_eq!(binary(BinaryOp::Div, Value::int(6), Value::int(3)), Value::int(2));
        // Inexact division keeps a reduced rational.
        match binary(BinaryOp::Div, Value::int(6), Value::int(4)) {
            Value::Rational(r) => {
                assert_eq!(r.numer, BigInt::from(3));
                assert_eq!(r.denom, BigInt::from(2));
            }
            other => panic!("expected rational, got {other:?}"),
        }
    }

    #[test]
    fn rational_reduces_with_positive_denominator() {
        match make_rational(BigInt::from(6), BigInt::from(-4)).unwrap() {
            Value::Rational(r) => {
                assert_eq!(r.numer, BigInt::from(-3));
                assert_eq!(r.denom, BigInt::from(2));
            }
            other => panic!("expected rational, got {other:?}"),
        }
    }

    #[test]
    fn division_round_trip() {
        // (a / b) * b == a
        let quotient = binary(BinaryOp::Div, Value::int(7), Value::int(3));
        assert_eq!(binary(BinaryOp::Mul, quotient, Value::int(3)), Value::int(7));
    }

    #[test]
    fn zero_division_fails_before_coercion() {
        let err = numeric_binary(BinaryOp::Div, &Value::int(5), &Value::int(0)).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ZeroDivision);
        let err = numeric_binary(BinaryOp::Mod, &Value::int(5), &Value::int(0)).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ZeroDivision);
        // Float zero divisor takes the same path: no coercion happens first.
        let err =
            numeric_binary(BinaryOp::Div, &Value::Float(5.0), &Value::Float(0.0)).unwrap_err();
        assert_eq!(err.kind, crate::errors::ErrorKind::ZeroDivision);
    }

    #[test]
    fn integer_overflow_promotes() {
        let result = binary(BinaryOp::Add, Value::int(i64::MAX), Value::int(1));
        match result {
            Value::BigInt(n) => assert_eq!(*n, BigInt::from(i64::MAX) + 1),
            other => panic!("expected BigInt, got {other:?}"),
        }
    }

    #[test]
    fn big_integer_demotes_when_it_fits() {
        let big = Value::big_int(BigInt::from(i64::MAX) + 1);
        let back = binary(BinaryOp::Sub, big, Value::int(1));
        assert_eq!(back, Value::int(i64::MAX));
    }

    #[test]
    fn mixed_kind_arithmetic_promotes_to_float() {
        assert_eq!(
            binary(BinaryOp::Add, Value::int(1), Value::Float(0.5)),
            Value::Float(1.5)
        );
    }

    #[test]
    fn rational_plus_int_stays_exact() {
        let half = Value::rational(BigInt::from(1), BigInt::from(2)).unwrap();
        match binary(BinaryOp::Add, half, Value::int(1)) {
            Value::Rational(r) => {
                assert_eq!(r.numer, BigInt::from(3));
                assert_eq!(r.denom, BigInt::from(2));
            }
            other => panic!("expected rational, got {other:?}"),
        }
    }

    #[test]
    fn pow_with_integer_exponent_is_exact() {
        assert_eq!(binary(BinaryOp::Pow, Value::int(2), Value::int(10)), Value::int(1024));
        // Negative exponent goes rational.
        match binary(BinaryOp::Pow, Value::int(2), Value::int(-2)) {
            Value::Rational(r) => {
                assert_eq!(r.numer, BigInt::from(1));
                assert_eq!(r.denom, BigInt::from(4));
            }
            other => panic!("expected rational, got {other:?}"),
        }
    }

    #[test]
    fn pow_with_non_integer_exponent_is_float() {
        let result = binary(BinaryOp::Pow, Value::int(4), Value::Float(0.5));
        assert_eq!(result, Value::Float(2.0));
    }

    #[test]
    fn comparisons_promote_through_the_lattice() {
        assert_eq!(
            numeric_compare(&Value::int(1), &Value::Float(1.5)),
            Some(Ordering::Less)
        );
        let third = Value::rational(BigInt::from(1), BigInt::from(3)).unwrap();
        assert_eq!(
            numeric_compare(&third, &Value::int(1)),
            Some(Ordering::Less)
        );
        assert!(numeric_eq(&Value::int(2), &Value::Float(2.0)));
    }

    #[test]
    fn nan_comparisons_are_undefined() {
        assert_eq!(
            numeric_compare(&Value::Float(f64::NAN), &Value::Float(1.0)),
            None
        );
    }
}
