//! Runtime values.
//!
//! Every runtime value is a `Value`; every value has a class in the
//! registry's class tree and answers the universal protocol (`str`,
//! `bool`, `eq`, ...) through its class's method table. Heap payloads go
//! through the factory methods here so the `Heap`/`Shared` policy stays
//! in one place.

mod callable;
mod numeric;
mod range;

pub use callable::{LambdaValue, MethodBody, MethodValue, NativeFn};
pub use numeric::{numeric_binary, numeric_compare, numeric_eq, NumericKind};
pub use range::RangeValue;

use std::fmt;

use num_bigint::BigInt;

use sable_ir::{Name, StringLookup};

use crate::class::ClassHandle;
use crate::native::ExternalValue;
use crate::reference::RecordRef;
use crate::shared::{Heap, Shared};

/// Reduced rational number.
///
/// Invariant: stored in lowest terms with a positive denominator. Values
/// with denominator 1 never exist as `Value::Rational`; construction
/// collapses them to integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rational {
    pub numer: BigInt,
    pub denom: BigInt,
}

/// Ordered dictionary.
///
/// Entries keep insertion order for deterministic iteration; key lookup
/// uses structural value equality.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DictValue {
    pub entries: Vec<(Value, Value)>,
}

impl DictValue {
    pub fn new() -> Self {
        DictValue {
            entries: Vec::new(),
        }
    }

    /// Get the value stored under `key`.
    pub fn get(&self, key: &Value) -> Option<Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Insert or overwrite the value under `key`.
    pub fn set(&mut self, key: Value, value: Value) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Instance of a user-defined (or instantiable built-in) class.
///
/// `Rc`-backed: identity is pointer identity, and the binding holding the
/// last reference owns it.
#[derive(Clone)]
pub struct InstanceValue {
    inner: Heap<InstanceData>,
}

pub struct InstanceData {
    pub class: ClassHandle,
    /// Instance variables.
    pub fields: RecordRef,
}

/// Instances can hold references to themselves; Debug stays shallow to
/// avoid walking the cycle.
impl fmt::Debug for InstanceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceValue")
            .field("class", &self.inner.class.name())
            .finish_non_exhaustive()
    }
}

impl InstanceValue {
    pub fn new(class: ClassHandle, fields: RecordRef) -> Self {
        InstanceValue {
            inner: Heap::new(InstanceData { class, fields }),
        }
    }

    pub fn class(&self) -> &ClassHandle {
        &self.inner.class
    }

    pub fn fields(&self) -> &RecordRef {
        &self.inner.fields
    }

    /// Identity comparison (same allocation).
    pub fn ptr_eq(&self, other: &InstanceValue) -> bool {
        self.inner.ptr_eq(&other.inner)
    }
}

/// Compiled regular expression value.
#[derive(Clone, Debug)]
pub struct RegexValue {
    pub source: String,
    pub compiled: Heap<regex::Regex>,
}

impl PartialEq for RegexValue {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Runtime value in the Sable interpreter.
#[derive(Clone, Debug)]
pub enum Value {
    // Primitives (inline, no heap allocation)
    None,
    Bool(bool),
    /// Machine-width integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// Interned symbol.
    Symbol(Name),

    // Immutable heap values
    /// Arbitrary-precision integer. Only holds values outside `i64`;
    /// arithmetic demotes back to `Int` whenever the result fits.
    BigInt(Heap<BigInt>),
    /// Reduced rational with denominator > 1.
    Rational(Heap<Rational>),
    Str(Heap<String>),
    Range(Heap<RangeValue>),
    Regex(Heap<RegexValue>),

    // Mutable shared collections
    Array(Shared<Vec<Value>>),
    Dict(Shared<DictValue>),

    // Object model
    Instance(InstanceValue),
    Class(ClassHandle),
    Method(Heap<MethodValue>),
    Lambda(Heap<LambdaValue>),

    // Opaque native collaborators
    External(ExternalValue),
}

// Factory methods

impl Value {
    /// Create an integer value, demoting from `BigInt` territory is the
    /// caller's business — this is the plain machine-width constructor.
    #[inline]
    pub fn int(n: i64) -> Self {
        Value::Int(n)
    }

    /// Create an integer from an arbitrary-precision value, demoting to
    /// machine width when it fits.
    pub fn big_int(n: BigInt) -> Self {
        numeric::demote_big(n)
    }

    /// Create a rational from a numerator and denominator, reducing to
    /// lowest terms (positive denominator) and collapsing to an integer
    /// when the denominator is 1.
    ///
    /// Returns a `ZeroDivisionError` when `denom` is zero.
    pub fn rational(numer: BigInt, denom: BigInt) -> Result<Self, crate::errors::RuntimeError> {
        numeric::make_rational(numer, denom)
    }

    /// Create a string value.
    #[inline]
    pub fn string(s: impl Into<String>) -> Self {
        Value::Str(Heap::new(s.into()))
    }

    /// Create an array value.
    #[inline]
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Shared::new(items))
    }

    /// Create a dictionary value.
    #[inline]
    pub fn dict(entries: DictValue) -> Self {
        Value::Dict(Shared::new(entries))
    }

    /// Create a range value.
    #[inline]
    pub fn range(range: RangeValue) -> Self {
        Value::Range(Heap::new(range))
    }

    /// Create a method value.
    #[inline]
    pub fn method(method: MethodValue) -> Self {
        Value::Method(Heap::new(method))
    }

    /// Create a lambda value.
    #[inline]
    pub fn lambda(lambda: LambdaValue) -> Self {
        Value::Lambda(Heap::new(lambda))
    }
}

// Queries

impl Value {
    /// Truthiness projection.
    ///
    /// Enumerables derive truthiness from `size() != 0`; numerics from
    /// being non-zero; `None` is false; everything else is true.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::BigInt(_) => true, // never holds zero (demoted to Int)
            Value::Float(f) => *f != 0.0,
            Value::Rational(_) => true, // never holds zero (collapsed)
            Value::Str(s) => !s.is_empty(),
            Value::Array(items) => !items.borrow().is_empty(),
            Value::Dict(entries) => !entries.borrow().is_empty(),
            Value::Range(range) => range.size() != 0,
            _ => true,
        }
    }

    /// Check whether this value participates in the numeric tower.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Value::Int(_) | Value::BigInt(_) | Value::Float(_) | Value::Rational(_)
        )
    }

    /// Built-in kind label, matching the built-in class names.
    ///
    /// For `Instance` values this is the generic label; use the registry
    /// for the precise class name.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::None => "None",
            Value::Bool(_) => "Boolean",
            Value::Int(_) => "Integer",
            Value::BigInt(_) => "BigInteger",
            Value::Float(_) => "Float",
            Value::Rational(_) => "Rational",
            Value::Symbol(_) => "Symbol",
            Value::Str(_) => "String",
            Value::Range(_) => "Range",
            Value::Regex(_) => "RegExp",
            Value::Array(_) => "Array",
            Value::Dict(_) => "Dictionary",
            Value::Instance(_) => "instance",
            Value::Class(_) => "Class",
            Value::Method(_) => "Method",
            Value::Lambda(_) => "Lambda",
            Value::External(_) => "External",
        }
    }

    /// Try to read a machine-width integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to read a string slice.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Textual representation used by the default `str` protocol and the
    /// trace sink. Container elements render recursively with the same
    /// rules; user `str` overrides apply only through method dispatch.
    pub fn repr(&self, names: &impl StringLookup) -> String {
        match self {
            Value::None => "none".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::BigInt(n) => n.to_string(),
            Value::Float(f) => {
                // Keep a trailing ".0" so floats are distinguishable.
                if f.fract() == 0.0 && f.is_finite() {
                    format!("{f:.1}")
                } else {
                    f.to_string()
                }
            }
            Value::Rational(r) => format!("{}/{}", r.numer, r.denom),
            Value::Symbol(name) => format!(":{}", names.lookup(*name)),
            Value::Str(s) => (**s).clone(),
            Value::Range(range) => range.repr(),
            Value::Regex(r) => format!("/{}/", r.source),
            Value::Array(items) => {
                let parts: Vec<String> =
                    items.borrow().iter().map(|v| v.repr(names)).collect();
                format!("[{}]", parts.join(", "))
            }
            Value::Dict(entries) => {
                let parts: Vec<String> = entries
                    .borrow()
                    .entries
                    .iter()
                    .map(|(k, v)| format!("{}: {}", k.repr(names), v.repr(names)))
                    .collect();
                format!("{{{}}}", parts.join(", "))
            }
            Value::Instance(instance) => {
                format!("<{} instance>", names.lookup(instance.class().name()))
            }
            Value::Class(class) => format!("<class {}>", names.lookup(class.name())),
            Value::Method(method) => format!("<method {}>", names.lookup(method.name)),
            Value::Lambda(lambda) => format!("<lambda/{}>", lambda.params.positional_count()),
            Value::External(external) => external.repr(),
        }
    }
}

/// Coercion refusal against `value`, naming its built-in kind. Used by
/// built-in operator methods to hand control to the reflected operator.
pub fn coercion_refusal(from: &'static str, value: &Value) -> crate::errors::RuntimeError {
    crate::errors::cannot_coerce(from, value.kind_name())
}

/// Structural equality with numeric lattice promotion.
///
/// Mixed numeric kinds compare through the coercion lattice (`1 ==
/// Rational(1/1)` can never arise since rationals collapse, but `1 ==
/// 1.0` holds). Instances, classes, and callables compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_numeric() && other.is_numeric() {
            return numeric_eq(self, other);
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => **a == **b,
            (Value::Range(a), Value::Range(b)) => **a == **b,
            (Value::Regex(a), Value::Regex(b)) => **a == **b,
            (Value::Array(a), Value::Array(b)) => {
                a.ptr_eq(b) || *a.borrow() == *b.borrow()
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.ptr_eq(b) || *a.borrow() == *b.borrow()
            }
            (Value::Instance(a), Value::Instance(b)) => a.ptr_eq(b),
            (Value::Class(a), Value::Class(b)) => a.ptr_eq(b),
            (Value::Method(a), Value::Method(b)) => a.ptr_eq(b),
            (Value::Lambda(a), Value::Lambda(b)) => a.ptr_eq(b),
            (Value::External(a), Value::External(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sable_ir::StringInterner;

    #[test]
    fn truthiness_follows_size_for_enumerables() {
        assert!(!Value::array(vec![]).is_truthy());
        assert!(Value::array(vec![Value::int(1)]).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(!Value::dict(DictValue::new()).is_truthy());
    }

    #[test]
    fn mixed_numeric_equality() {
        assert_eq!(Value::int(1), Value::Float(1.0));
        assert_ne!(Value::int(1), Value::Float(1.5));
        assert_ne!(Value::int(1), Value::string("1"));
    }

    #[test]
    fn array_equality_is_structural() {
        let a = Value::array(vec![Value::int(1), Value::int(2)]);
        let b = Value::array(vec![Value::int(1), Value::int(2)]);
        assert_eq!(a, b);
    }

    #[test]
    fn dict_set_overwrites() {
        let mut dict = DictValue::new();
        dict.set(Value::string("k"), Value::int(1));
        dict.set(Value::string("k"), Value::int(2));
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(&Value::string("k")), Some(Value::int(2)));
    }

    #[test]
    fn repr_of_basic_values() {
        let interner = StringInterner::new();
        assert_eq!(Value::None.repr(&interner), "none");
        assert_eq!(Value::int(3).repr(&interner), "3");
        assert_eq!(Value::Float(2.0).repr(&interner), "2.0");
        assert_eq!(Value::string("hi").repr(&interner), "hi");
        assert_eq!(
            Value::array(vec![Value::int(1), Value::int(2)]).repr(&interner),
            "[1, 2]"
        );
    }
}
