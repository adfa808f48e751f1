//! Binary and unary operators.
//!
//! Operator evaluation is not special-cased in the runtime: every operator
//! forwards to the corresponding dunder method on the left operand's class
//! (`+` → `__add__`, `<` → `__lt__`, …) through ordinary method dispatch.
//! The mappings here are the single source of truth for that forwarding.
//! `and`/`or` are the exception: they short-circuit in the evaluator and
//! have no method form.

/// Binary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,

    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,

    // Logical (short-circuit, no dunder)
    And,
    Or,
}

impl BinaryOp {
    /// Returns the source-level symbol for this operator.
    ///
    /// Used in error messages to show the exact operator that failed.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Pow => "**",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::And => "and",
            Self::Or => "or",
        }
    }

    /// Returns the dunder method this operator dispatches to, or `None`
    /// for the short-circuit logical operators.
    ///
    /// Comparison operators map onto the universal protocol names the
    /// root class derives from `bool`/`eq`/`lt`.
    pub const fn dunder(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("__add__"),
            Self::Sub => Some("__sub__"),
            Self::Mul => Some("__mul__"),
            Self::Div => Some("__div__"),
            Self::Mod => Some("__mod__"),
            Self::Pow => Some("__pow__"),
            Self::Eq => Some("__eq__"),
            Self::NotEq => Some("__neq__"),
            Self::Lt => Some("__lt__"),
            Self::LtEq => Some("__le__"),
            Self::Gt => Some("__gt__"),
            Self::GtEq => Some("__ge__"),
            Self::And | Self::Or => None,
        }
    }

    /// Returns the reflected dunder method tried when the left operand
    /// cannot coerce the right one (`a.__add__(b)` refused →
    /// `b.__radd__(a)`). Only arithmetic operators reflect.
    pub const fn reflected_dunder(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("__radd__"),
            Self::Sub => Some("__rsub__"),
            Self::Mul => Some("__rmul__"),
            Self::Div => Some("__rdiv__"),
            Self::Mod => Some("__rmod__"),
            Self::Pow => Some("__rpow__"),
            _ => None,
        }
    }
}

/// Unary operators.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum UnaryOp {
    /// Unary plus.
    Plus,
    /// Arithmetic negation.
    Neg,
    /// Logical not.
    Not,
}

impl UnaryOp {
    /// Returns the source-level symbol for this operator.
    pub const fn as_symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Neg => "-",
            Self::Not => "not",
        }
    }

    /// Returns the dunder method this operator dispatches to.
    pub const fn dunder(self) -> &'static str {
        match self {
            Self::Plus => "__pos__",
            Self::Neg => "__neg__",
            Self::Not => "__not__",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_ops_have_reflections() {
        for op in [
            BinaryOp::Add,
            BinaryOp::Sub,
            BinaryOp::Mul,
            BinaryOp::Div,
            BinaryOp::Mod,
            BinaryOp::Pow,
        ] {
            assert!(op.dunder().is_some());
            assert!(op.reflected_dunder().is_some());
        }
    }

    #[test]
    fn comparisons_do_not_reflect() {
        assert_eq!(BinaryOp::Lt.dunder(), Some("__lt__"));
        assert_eq!(BinaryOp::Lt.reflected_dunder(), None);
    }

    #[test]
    fn logical_ops_have_no_dunder() {
        assert_eq!(BinaryOp::And.dunder(), None);
        assert_eq!(BinaryOp::Or.dunder(), None);
    }
}
