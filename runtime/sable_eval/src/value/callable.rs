//! Callable values: methods and lambdas.
//!
//! A method has a fixed owner (a class, or the module for free
//! functions) and either an AST body with a declared signature or a
//! native implementation. A lambda instead references the lexical record
//! it was defined in and the `self` that was current at creation.

use sable_ir::{ast::Block, Name};

use crate::errors::EvalResult;
use crate::eval::Evaluator;
use crate::params::{Arguments, Params};
use crate::reference::RecordRef;
use crate::shared::Heap;
use crate::value::Value;

/// Native method implementation.
///
/// Natives receive the evaluator (iteration natives call back into it),
/// the receiver, and the unbound caller arguments; arity checking is the
/// native's own business.
pub type NativeFn = fn(&mut Evaluator<'_>, Value, Arguments) -> EvalResult;

/// Method body: interpreted or native.
#[derive(Clone, Debug)]
pub enum MethodBody {
    /// AST-backed body with its declared parameter signature.
    Ast { params: Params, body: Heap<Block> },
    /// Built-in implementation.
    Native(NativeFn),
}

/// A method bound into a class table or the module namespace.
#[derive(Clone, Debug)]
pub struct MethodValue {
    pub name: Name,
    /// Owning class name, `None` for module-level functions. Diagnostics
    /// only; dispatch never consults it.
    pub owner: Option<Name>,
    pub body: MethodBody,
}

impl MethodValue {
    /// AST-backed method or function.
    pub fn ast(name: Name, owner: Option<Name>, params: Params, body: Block) -> Self {
        MethodValue {
            name,
            owner,
            body: MethodBody::Ast {
                params,
                body: Heap::new(body),
            },
        }
    }

    /// Native built-in method.
    pub fn native(name: Name, owner: Option<Name>, f: NativeFn) -> Self {
        MethodValue {
            name,
            owner,
            body: MethodBody::Native(f),
        }
    }
}

/// A lambda: a callable capturing its defining record and enclosing self.
///
/// Invocation parents the new frame to `captured_record`, so the body
/// reads and writes enclosing locals through the very references the
/// definition site holds — true closures, not copies. The call path may
/// substitute a different receiver for the implicit `self` (enumerables
/// do this) while locals still resolve through the captured record.
#[derive(Clone)]
pub struct LambdaValue {
    pub params: Params,
    pub body: Heap<Block>,
    /// Defining lexical record.
    pub captured_record: RecordRef,
    /// Enclosing `self` at creation, if any.
    pub captured_self: Option<Value>,
}

impl LambdaValue {
    pub fn new(
        params: Params,
        body: Block,
        captured_record: RecordRef,
        captured_self: Option<Value>,
    ) -> Self {
        LambdaValue {
            params,
            body: Heap::new(body),
            captured_record,
            captured_self,
        }
    }

    /// Declared positional arity; directs `each` between element and
    /// (index, element) invocation.
    pub fn arity(&self) -> usize {
        self.params.positional_count()
    }
}

/// Captured records routinely contain the lambda itself; Debug stays
/// shallow to avoid walking the cycle.
impl std::fmt::Debug for LambdaValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LambdaValue")
            .field("arity", &self.arity())
            .finish_non_exhaustive()
    }
}
