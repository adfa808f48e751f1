//! Tree-walking evaluator.
//!
//! The evaluator walks the typed AST, consulting the call stack for the
//! current reference record, resolving identifiers there, and driving
//! operator and method calls through the object model. It owns the call
//! stack, the module namespace, the class registry handle, and the trace
//! and console handlers.
//!
//! Program loading is two-phase, like the built-in bootstrap: user class
//! shells are allocated and named first, then superclass links are wired
//! and method tables populated, so classes may reference each other
//! freely in either order.

mod call;
mod exec;

pub use call::LambdaOutcome;

use std::rc::Rc;

use sable_ir::{ast, BinaryOp, Name, StringInterner, UnaryOp};

use crate::class::{ClassHandle, ClassRegistry, Instantiability};
use crate::console::{standard_console, SharedConsole};
use crate::errors::{name_error, type_error, EvalResult, RuntimeError};
use crate::params::Params;
use crate::reference::{RecordRef, ReferenceRecord};
use crate::stack::{CallStack, DEFAULT_MAX_DEPTH};
use crate::trace::{silent_sink, SharedTraceSink};
use crate::value::{MethodValue, Value};

/// Pre-interned names the evaluator dispatches on.
///
/// Interned once at construction so hot paths compare raw `u32`s instead
/// of re-interning strings.
#[derive(Clone, Copy)]
pub(crate) struct RuntimeNames {
    pub self_: Name,
    pub init: Name,
    pub new: Name,
    pub main: Name,
    pub str_: Name,
    pub bool_: Name,
    pub size: Name,
    pub get_item: Name,
    pub set_item: Name,
    pub lambda: Name,
    pub module: Name,
    // Operator dunders
    add: Name,
    sub: Name,
    mul: Name,
    div: Name,
    mod_: Name,
    pow: Name,
    radd: Name,
    rsub: Name,
    rmul: Name,
    rdiv: Name,
    rmod: Name,
    rpow: Name,
    eq: Name,
    neq: Name,
    lt: Name,
    le: Name,
    gt: Name,
    ge: Name,
    pos: Name,
    neg: Name,
    not: Name,
}

impl RuntimeNames {
    fn new(interner: &StringInterner) -> Self {
        RuntimeNames {
            self_: interner.intern("self"),
            init: interner.intern("init"),
            new: interner.intern("new"),
            main: interner.intern("main"),
            str_: interner.intern("str"),
            bool_: interner.intern("bool"),
            size: interner.intern("size"),
            get_item: interner.intern("getItem"),
            set_item: interner.intern("setItem"),
            lambda: interner.intern("lambda"),
            module: interner.intern("<module>"),
            add: interner.intern("__add__"),
            sub: interner.intern("__sub__"),
            mul: interner.intern("__mul__"),
            div: interner.intern("__div__"),
            mod_: interner.intern("__mod__"),
            pow: interner.intern("__pow__"),
            radd: interner.intern("__radd__"),
            rsub: interner.intern("__rsub__"),
            rmul: interner.intern("__rmul__"),
            rdiv: interner.intern("__rdiv__"),
            rmod: interner.intern("__rmod__"),
            rpow: interner.intern("__rpow__"),
            eq: interner.intern("__eq__"),
            neq: interner.intern("__neq__"),
            lt: interner.intern("__lt__"),
            le: interner.intern("__le__"),
            gt: interner.intern("__gt__"),
            ge: interner.intern("__ge__"),
            pos: interner.intern("__pos__"),
            neg: interner.intern("__neg__"),
            not: interner.intern("__not__"),
        }
    }

    /// Dunder name for a binary operator; `None` for the short-circuit
    /// logical operators.
    pub(crate) fn for_binary(&self, op: BinaryOp) -> Option<Name> {
        match op {
            BinaryOp::Add => Some(self.add),
            BinaryOp::Sub => Some(self.sub),
            BinaryOp::Mul => Some(self.mul),
            BinaryOp::Div => Some(self.div),
            BinaryOp::Mod => Some(self.mod_),
            BinaryOp::Pow => Some(self.pow),
            BinaryOp::Eq => Some(self.eq),
            BinaryOp::NotEq => Some(self.neq),
            BinaryOp::Lt => Some(self.lt),
            BinaryOp::LtEq => Some(self.le),
            BinaryOp::Gt => Some(self.gt),
            BinaryOp::GtEq => Some(self.ge),
            BinaryOp::And | BinaryOp::Or => None,
        }
    }

    /// Reflected dunder tried when the left operand refuses to coerce.
    pub(crate) fn reflected_for(&self, op: BinaryOp) -> Option<Name> {
        match op {
            BinaryOp::Add => Some(self.radd),
            BinaryOp::Sub => Some(self.rsub),
            BinaryOp::Mul => Some(self.rmul),
            BinaryOp::Div => Some(self.rdiv),
            BinaryOp::Mod => Some(self.rmod),
            BinaryOp::Pow => Some(self.rpow),
            _ => None,
        }
    }

    pub(crate) fn for_unary(&self, op: UnaryOp) -> Name {
        match op {
            UnaryOp::Plus => self.pos,
            UnaryOp::Neg => self.neg,
            UnaryOp::Not => self.not,
        }
    }

    pub(crate) fn eq_name(&self) -> Name {
        self.eq
    }

    pub(crate) fn lt_name(&self) -> Name {
        self.lt
    }
}

/// Tree-walking evaluator; one per interpreted program run.
pub struct Evaluator<'a> {
    interner: &'a StringInterner,
    registry: Rc<ClassRegistry>,
    pub(crate) names: RuntimeNames,
    pub(crate) stack: CallStack,
    /// Module namespace record: classes, functions, globals.
    module: RecordRef,
    pub(crate) trace: SharedTraceSink,
    pub(crate) console: SharedConsole,
}

/// Builder for evaluator configuration.
pub struct EvaluatorBuilder<'a> {
    interner: &'a StringInterner,
    console: SharedConsole,
    trace: SharedTraceSink,
    max_depth: usize,
}

impl<'a> EvaluatorBuilder<'a> {
    pub fn new(interner: &'a StringInterner) -> Self {
        EvaluatorBuilder {
            interner,
            console: standard_console(),
            trace: silent_sink(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Use a specific console (scripted, for tests).
    #[must_use]
    pub fn with_console(mut self, console: SharedConsole) -> Self {
        self.console = console;
        self
    }

    /// Attach a trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, trace: SharedTraceSink) -> Self {
        self.trace = trace;
        self
    }

    /// Override the interpreted frame budget.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> Evaluator<'a> {
        let registry = ClassRegistry::bootstrap(self.interner);
        let names = RuntimeNames::new(self.interner);
        let module = ReferenceRecord::root(names.module);
        {
            // Built-in classes resolve as ordinary identifiers.
            let mut record = module.borrow_mut();
            for class in registry.classes() {
                record.define(class.name(), Value::Class(class.clone()));
            }
        }
        Evaluator {
            interner: self.interner,
            registry,
            names,
            stack: CallStack::new(self.max_depth, self.interner),
            module,
            trace: self.trace,
            console: self.console,
        }
    }
}

impl<'a> Evaluator<'a> {
    /// Evaluator with default configuration (stdio console, no trace).
    pub fn new(interner: &'a StringInterner) -> Self {
        EvaluatorBuilder::new(interner).build()
    }

    pub fn builder(interner: &'a StringInterner) -> EvaluatorBuilder<'a> {
        EvaluatorBuilder::new(interner)
    }

    pub fn interner(&self) -> &'a StringInterner {
        self.interner
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// The module namespace record.
    pub fn module(&self) -> &RecordRef {
        &self.module
    }

    /// Captured console output (scripted console only).
    pub fn console_output(&self) -> String {
        self.console.get_output()
    }

    /// Captured trace output (buffer sink only).
    pub fn trace_output(&self) -> String {
        self.trace.get_output()
    }

    /// The record identifiers resolve against right now: the active
    /// frame's record, or the module namespace outside any call.
    pub(crate) fn scope(&self) -> RecordRef {
        if self.stack.is_empty() {
            self.module.clone()
        } else {
            self.stack.current_record()
        }
    }

    pub(crate) fn return_pending(&self) -> bool {
        self.stack.return_pending()
    }

    /// Load a program and run its entry function (`main`, or the first
    /// function defined). Errors come back with the most specific line
    /// and the captured call trace attached.
    pub fn run_program(&mut self, program: &ast::Program) -> EvalResult {
        let entry = self.load_program(program).map_err(|e| self.fail(e))?;
        let Some(entry) = entry else {
            return Err(self.fail(name_error("main")));
        };
        self.call_entry(entry, Vec::new())
    }

    /// Run one loaded function by name with host-supplied arguments.
    pub fn run_function(&mut self, name: &str, args: Vec<Value>) -> EvalResult {
        let name = self.interner.intern(name);
        let function = self.module.borrow().lookup_value(name);
        let Some(function) = function else {
            return Err(self.fail(name_error(self.interner.lookup(name))));
        };
        self.call_entry(function, args)
    }

    fn call_entry(&mut self, function: Value, args: Vec<Value>) -> EvalResult {
        let result = self.call_value_with(function, args);
        match result {
            Ok(value) => Ok(value),
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Attach diagnostics to an escaping error and reset the stack.
    fn fail(&mut self, error: RuntimeError) -> RuntimeError {
        let error = error.with_trace(self.stack.capture(self.interner));
        self.stack.clear();
        error
    }

    /// Load top-level items into the module namespace.
    ///
    /// Returns the entry function: `main` if defined, otherwise the first
    /// function item.
    pub fn load_program(
        &mut self,
        program: &ast::Program,
    ) -> Result<Option<Value>, RuntimeError> {
        // Phase one: allocate user class shells so classes can reference
        // each other (and functions can reference classes) in any order.
        let mut class_shells: Vec<(ClassHandle, &ast::ClassDecl)> = Vec::new();
        for item in &program.items {
            if let ast::Item::Class(decl) = item {
                let shell = ClassHandle::shell(decl.name, Instantiability::Normal);
                self.module
                    .borrow_mut()
                    .define(decl.name, Value::Class(shell.clone()));
                class_shells.push((shell, decl));
            }
        }

        // Functions: signatures are built (and keyword defaults
        // evaluated) at definition time, in module scope.
        let mut entry: Option<Value> = None;
        let mut first_function: Option<Value> = None;
        for item in &program.items {
            if let ast::Item::Function(decl) = item {
                let function = self.build_method(decl, None)?;
                self.module
                    .borrow_mut()
                    .define(decl.name, function.clone());
                if decl.name == self.names.main {
                    entry = Some(function.clone());
                }
                if first_function.is_none() {
                    first_function = Some(function);
                }
            }
        }

        // Phase two: wire superclass links and populate method tables.
        for (shell, decl) in &class_shells {
            let superclass = match decl.superclass {
                Some(name) => self.lookup_class(name)?,
                None => self.registry.builtins().object.clone(),
            };
            if superclass.has_ancestor(shell) {
                return Err(type_error(format!(
                    "class {} may not be its own ancestor",
                    self.interner.lookup(decl.name)
                ))
                .with_line(decl.line));
            }
            shell.set_superclass(&superclass);

            for method in &decl.methods {
                let value = self.build_method(method, Some(decl.name))?;
                self.define_in_table(shell.methods(), method.name, value);
            }
            for method in &decl.statics {
                let value = self.build_method(method, Some(decl.name))?;
                self.define_in_table(shell.statics(), method.name, value);
            }
        }

        Ok(entry.or(first_function))
    }

    /// Resolve a class by name: user classes in the module namespace
    /// first, then built-ins.
    fn lookup_class(&self, name: Name) -> Result<ClassHandle, RuntimeError> {
        if let Some(Value::Class(class)) = self.module.borrow().lookup_value(name) {
            return Ok(class);
        }
        if let Some(class) = self.registry.lookup(name) {
            return Ok(class);
        }
        Err(name_error(self.interner.lookup(name)))
    }

    fn build_method(
        &mut self,
        decl: &ast::FunctionDecl,
        owner: Option<Name>,
    ) -> Result<Value, RuntimeError> {
        let params = Params::build(&decl.params, |expr| self.eval_expr(expr))?;
        Ok(Value::method(MethodValue::ast(
            decl.name,
            owner,
            params,
            decl.body.clone(),
        )))
    }

    /// Register a user method under its bare name and the canonical
    /// dunder key, both holding the same `Reference` — the same double
    /// registration the built-in tables use, so a user `eq` or `add`
    /// participates in operator dispatch.
    fn define_in_table(&self, table: &RecordRef, name: Name, value: Value) {
        let text = self.interner.lookup(name);
        if text.starts_with("__") {
            table.borrow_mut().define(name, value);
        } else {
            let canonical = self.interner.intern(&format!("__{text}__"));
            table.borrow_mut().define_with_alias(canonical, name, value);
        }
    }
}
