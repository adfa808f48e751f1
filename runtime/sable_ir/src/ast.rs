//! Typed AST node vocabulary.
//!
//! The runtime consumes these nodes as-is; it never sees source text.
//! Front ends are expected to produce a `Program` with every node stamped
//! with its 1-based source line.
//!
//! The constructors on `Expr`/`Stmt` exist so tests (and embedders) can
//! assemble trees without spelling out every struct literal.

use crate::{BinaryOp, Line, Name, UnaryOp};

/// A complete parsed program: classes and free functions.
#[derive(Clone, Debug, PartialEq)]
pub struct Program {
    pub items: Vec<Item>,
}

/// Top-level item.
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Class(ClassDecl),
    Function(FunctionDecl),
}

/// Class declaration with its method list.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassDecl {
    pub name: Name,
    /// Superclass name; `None` means the class derives from the root.
    pub superclass: Option<Name>,
    /// Instance methods.
    pub methods: Vec<FunctionDecl>,
    /// Class-level ("static") methods.
    pub statics: Vec<FunctionDecl>,
    pub line: Line,
}

/// Function or method definition.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: Name,
    pub params: Vec<ParamDecl>,
    pub body: Block,
    pub line: Line,
}

/// Declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDecl {
    pub name: Name,
    pub kind: ParamKind,
    pub line: Line,
}

impl ParamDecl {
    /// Ordinary by-value positional parameter.
    pub fn value(name: Name) -> Self {
        ParamDecl {
            name,
            kind: ParamKind::Value,
            line: Line::UNKNOWN,
        }
    }

    /// By-reference positional parameter (`&x`).
    pub fn by_reference(name: Name) -> Self {
        ParamDecl {
            name,
            kind: ParamKind::Reference,
            line: Line::UNKNOWN,
        }
    }

    /// Keyword parameter with a default expression (`k: expr`).
    pub fn keyword(name: Name, default: Expr) -> Self {
        ParamDecl {
            name,
            kind: ParamKind::Keyword { default },
            line: Line::UNKNOWN,
        }
    }

    /// Positional group parameter (`*rest`).
    pub fn positional_group(name: Name) -> Self {
        ParamDecl {
            name,
            kind: ParamKind::PositionalGroup,
            line: Line::UNKNOWN,
        }
    }

    /// Keyword group parameter (`**opts`).
    pub fn keyword_group(name: Name) -> Self {
        ParamDecl {
            name,
            kind: ParamKind::KeywordGroup,
            line: Line::UNKNOWN,
        }
    }
}

/// Parameter kind markers.
///
/// A signature may carry at most one `PositionalGroup` and at most one
/// `KeywordGroup`; the binder enforces this when the signature is built.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamKind {
    /// By-value positional parameter.
    Value,
    /// By-reference positional parameter: callee and caller share the
    /// same `Reference` box.
    Reference,
    /// Keyword parameter with a default, evaluated at definition time.
    Keyword { default: Expr },
    /// Collects unmatched positional arguments into an array (`*rest`).
    PositionalGroup,
    /// Collects unmatched keyword arguments into a dictionary (`**opts`).
    KeywordGroup,
}

/// Statement sequence.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Block { stmts }
    }
}

/// Statement node.
#[derive(Clone, Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub line: Line,
}

impl Stmt {
    pub fn new(kind: StmtKind, line: Line) -> Self {
        Stmt { kind, line }
    }
}

/// Statement kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum StmtKind {
    /// Assignment to an identifier, index, or attribute target.
    Assign { target: AssignTarget, value: Expr },
    /// Expression evaluated for its effect (and its value, as the last
    /// statement of a lambda body).
    Expr(Expr),
    If {
        condition: Expr,
        then_branch: Block,
        else_branch: Option<Block>,
    },
    While {
        condition: Expr,
        body: Block,
    },
    /// Return from the nearest enclosing method, through nested blocks.
    Return(Option<Expr>),
    /// Break request: stops the innermost `each`/`while`.
    Break,
    /// Read one whitespace-delimited integer token into the target.
    Read { target: AssignTarget },
    /// Write the textual representation of the value, no trailing newline.
    Write(Expr),
}

/// Assignment / read target.
#[derive(Clone, Debug, PartialEq)]
pub enum AssignTarget {
    Name(Name),
    Index { object: Expr, index: Expr },
    Attribute { object: Expr, attribute: Name },
}

/// Expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: Line,
}

/// Expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    NoneLit,
    BoolLit(bool),
    IntLit(i64),
    FloatLit(f64),
    StrLit(String),
    SymbolLit(Name),
    Ident(Name),
    SelfExpr,
    Array(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    Lambda {
        params: Vec<ParamDecl>,
        body: Block,
    },
    Call {
        callee: Box<Expr>,
        args: CallArgs,
    },
    MethodCall {
        receiver: Box<Expr>,
        method: Name,
        args: CallArgs,
    },
    Attribute {
        object: Box<Expr>,
        attribute: Name,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Caller-side argument payload before binding.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CallArgs {
    pub positional: Vec<Expr>,
    pub keywords: Vec<(Name, Expr)>,
}

impl CallArgs {
    pub fn positional(args: Vec<Expr>) -> Self {
        CallArgs {
            positional: args,
            keywords: Vec::new(),
        }
    }
}

impl Expr {
    pub fn new(kind: ExprKind, line: Line) -> Self {
        Expr { kind, line }
    }

    /// Integer literal at an unknown line.
    pub fn int(value: i64) -> Self {
        Expr::new(ExprKind::IntLit(value), Line::UNKNOWN)
    }

    /// Boolean literal at an unknown line.
    pub fn bool(value: bool) -> Self {
        Expr::new(ExprKind::BoolLit(value), Line::UNKNOWN)
    }

    /// String literal at an unknown line.
    pub fn string(value: impl Into<String>) -> Self {
        Expr::new(ExprKind::StrLit(value.into()), Line::UNKNOWN)
    }

    /// Identifier reference at an unknown line.
    pub fn ident(name: Name) -> Self {
        Expr::new(ExprKind::Ident(name), Line::UNKNOWN)
    }

    /// Binary operation at an unknown line.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            Line::UNKNOWN,
        )
    }

    /// Unary operation at an unknown line.
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            Line::UNKNOWN,
        )
    }

    /// Call with positional arguments at an unknown line.
    pub fn call(callee: Expr, positional: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: Box::new(callee),
                args: CallArgs::positional(positional),
            },
            Line::UNKNOWN,
        )
    }

    /// Method call with positional arguments at an unknown line.
    pub fn method_call(receiver: Expr, method: Name, positional: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::MethodCall {
                receiver: Box::new(receiver),
                method,
                args: CallArgs::positional(positional),
            },
            Line::UNKNOWN,
        )
    }

    /// Index expression at an unknown line.
    pub fn index(object: Expr, index: Expr) -> Self {
        Expr::new(
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
            Line::UNKNOWN,
        )
    }

    /// Attach a source line, replacing the current one.
    #[must_use]
    pub fn at(mut self, line: Line) -> Self {
        self.line = line;
        self
    }
}

impl Stmt {
    /// Expression statement at an unknown line.
    pub fn expr(expr: Expr) -> Self {
        Stmt::new(StmtKind::Expr(expr), Line::UNKNOWN)
    }

    /// Assignment to a plain identifier at an unknown line.
    pub fn assign(name: Name, value: Expr) -> Self {
        Stmt::new(
            StmtKind::Assign {
                target: AssignTarget::Name(name),
                value,
            },
            Line::UNKNOWN,
        )
    }

    /// Return statement at an unknown line.
    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::new(StmtKind::Return(value), Line::UNKNOWN)
    }

    /// Attach a source line, replacing the current one.
    #[must_use]
    pub fn at(mut self, line: Line) -> Self {
        self.line = line;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StringInterner;

    #[test]
    fn expr_builders_compose() {
        let interner = StringInterner::new();
        let x = interner.intern("x");

        let expr = Expr::binary(BinaryOp::Add, Expr::ident(x), Expr::int(1)).at(Line::new(3));
        assert_eq!(expr.line, Line::new(3));
        match expr.kind {
            ExprKind::Binary { op, .. } => assert_eq!(op, BinaryOp::Add),
            other => panic!("expected binary node, got {other:?}"),
        }
    }

    #[test]
    fn param_builders_set_kind() {
        let interner = StringInterner::new();
        let rest = interner.intern("rest");
        assert_eq!(
            ParamDecl::positional_group(rest).kind,
            ParamKind::PositionalGroup
        );
        assert_eq!(
            ParamDecl::by_reference(rest).kind,
            ParamKind::Reference
        );
    }
}
