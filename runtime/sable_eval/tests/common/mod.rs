//! Shared helpers for building programs in tests.
//!
//! Front ends are out of scope for the runtime, so tests assemble the
//! typed AST directly with the `sable_ir` constructors.

use sable_eval::{scripted_console, EvalResult, Evaluator, Value};
use sable_ir::ast::{Block, ClassDecl, FunctionDecl, Item, ParamDecl, Program, Stmt};
use sable_ir::{Line, StringInterner};

pub fn program(items: Vec<Item>) -> Program {
    Program { items }
}

pub fn function(
    interner: &StringInterner,
    name: &str,
    params: Vec<ParamDecl>,
    stmts: Vec<Stmt>,
) -> Item {
    Item::Function(method(interner, name, params, stmts))
}

pub fn method(
    interner: &StringInterner,
    name: &str,
    params: Vec<ParamDecl>,
    stmts: Vec<Stmt>,
) -> FunctionDecl {
    FunctionDecl {
        name: interner.intern(name),
        params,
        body: Block::new(stmts),
        line: Line::new(1),
    }
}

pub fn class(
    interner: &StringInterner,
    name: &str,
    superclass: Option<&str>,
    methods: Vec<FunctionDecl>,
) -> Item {
    Item::Class(ClassDecl {
        name: interner.intern(name),
        superclass: superclass.map(|s| interner.intern(s)),
        methods,
        statics: Vec::new(),
        line: Line::new(1),
    })
}

/// Load a program and call `entry` with the given argument values.
pub fn run(
    interner: &StringInterner,
    items: Vec<Item>,
    entry: &str,
    args: Vec<Value>,
) -> EvalResult {
    let mut eval = Evaluator::builder(interner)
        .with_console(scripted_console(""))
        .build();
    eval.load_program(&program(items))
        .expect("program should load");
    eval.run_function(entry, args)
}

/// Load a program and run its `main`.
pub fn run_main(interner: &StringInterner, items: Vec<Item>) -> EvalResult {
    run(interner, items, "main", Vec::new())
}
