//! Calls: functions, methods, lambdas, operators, and instantiation.
//!
//! Every call path funnels through `invoke`: resolve the callable, build
//! the caller-side `Arguments` (taking the callee's by-reference markers
//! into account), push a frame, bind, execute, and read the return slot
//! back out of the frame. Operator evaluation is method dispatch on the
//! left operand, with one twist: a coercion refusal retries the
//! reflected operator on the right operand.

use sable_ir::ast::{CallArgs, ExprKind};
use sable_ir::{BinaryOp, Line, Name};

use crate::class::{ClassHandle, Instantiability};
use crate::errors::{
    abstract_class, arity_error, invalid_arguments, name_error, new_not_supported, no_such_method,
    not_callable, type_error, ErrorKind, EvalResult, RuntimeError,
};
use crate::eval::exec::Flow;
use crate::eval::Evaluator;
use crate::params::{Arg, Arguments, Params};
use crate::reference::{Reference, ReferenceRecord};
use crate::value::{InstanceValue, LambdaValue, MethodBody, MethodValue, Value};

/// Result of one lambda invocation.
pub struct LambdaOutcome {
    /// Last value the body produced (explicit result or None).
    pub value: Value,
    /// Whether the body issued a break request.
    pub broke: bool,
}

impl<'a> Evaluator<'a> {
    /// Call an evaluated callee with AST-side arguments.
    pub(crate) fn eval_call(
        &mut self,
        callee: Value,
        args: &CallArgs,
        line: Line,
    ) -> EvalResult {
        match callee {
            Value::Method(method) => {
                let arguments = self.build_arguments(&method, args)?;
                self.invoke(&method, None, arguments, line)
            }
            Value::Lambda(lambda) => {
                let arguments = self.eval_args_by_value(args)?;
                Ok(self.call_lambda(&lambda, arguments, None, line)?.value)
            }
            Value::Class(class) => self.instantiate(&class, args, line),
            other => Err(not_callable(other.kind_name())),
        }
    }

    /// Call an entry function with host-supplied values.
    pub(crate) fn call_value_with(&mut self, callee: Value, args: Vec<Value>) -> EvalResult {
        match callee {
            Value::Method(method) => {
                self.invoke(&method, None, Arguments::positional(args), Line::UNKNOWN)
            }
            Value::Lambda(lambda) => Ok(self
                .call_lambda(&lambda, Arguments::positional(args), None, Line::UNKNOWN)?
                .value),
            other => Err(not_callable(other.kind_name())),
        }
    }

    /// Method call with AST-side arguments: resolve through the class
    /// chain, then invoke with the receiver bound as implicit `self`.
    pub(crate) fn eval_method_call(
        &mut self,
        receiver: Value,
        method: Name,
        args: &CallArgs,
        line: Line,
    ) -> EvalResult {
        let resolved = self.resolve_method(&receiver, method)?;
        match resolved {
            Value::Method(m) => {
                let arguments = self.build_arguments(&m, args)?;
                self.invoke(&m, Some(receiver), arguments, line)
            }
            Value::Lambda(l) => {
                let arguments = self.eval_args_by_value(args)?;
                Ok(self.call_lambda(&l, arguments, Some(receiver), line)?.value)
            }
            other => Err(not_callable(other.kind_name())),
        }
    }

    /// Method call with already-evaluated arguments; the entry point for
    /// natives and for the evaluator's own protocol dispatches.
    pub(crate) fn dispatch_values(
        &mut self,
        receiver: Value,
        method: Name,
        arguments: Arguments,
    ) -> EvalResult {
        let resolved = self.resolve_method(&receiver, method)?;
        match resolved {
            Value::Method(m) => self.invoke(&m, Some(receiver), arguments, Line::UNKNOWN),
            Value::Lambda(l) => Ok(self
                .call_lambda(&l, arguments, Some(receiver), Line::UNKNOWN)?
                .value),
            other => Err(not_callable(other.kind_name())),
        }
    }

    /// Resolve a method against a receiver: class receivers consult the
    /// static chain first; everything then falls back to the receiver's
    /// class chain. Exhausting the chain names the *original* class.
    fn resolve_method(&self, receiver: &Value, method: Name) -> Result<Value, RuntimeError> {
        if let Value::Class(class) = receiver {
            if let Some(found) = class.resolve_static(method) {
                return Ok(found);
            }
        }
        let class = self.registry().class_of(receiver);
        class.resolve_method(method).ok_or_else(|| {
            no_such_method(
                self.interner().lookup(method),
                self.interner().lookup(class.name()),
            )
        })
    }

    /// Operator dispatch with the reflected retry.
    pub(crate) fn binary_dispatch(
        &mut self,
        op: BinaryOp,
        left: Value,
        right: Value,
    ) -> EvalResult {
        let Some(method) = self.names.for_binary(op) else {
            // and/or short-circuit before reaching dispatch.
            return Err(type_error(format!(
                "operator '{}' has no method form",
                op.as_symbol()
            )));
        };
        let first = self.dispatch_values(
            left.clone(),
            method,
            Arguments::positional(vec![right.clone()]),
        );
        let refused = matches!(
            first,
            Err(RuntimeError {
                kind: ErrorKind::CannotCoerce { .. },
                ..
            })
        );
        if !refused {
            return first;
        }
        let Some(reflected) = self.names.reflected_for(op) else {
            return Err(self.operand_type_error(op, &left, &right));
        };
        match self.dispatch_values(right.clone(), reflected, Arguments::positional(vec![left.clone()]))
        {
            Ok(value) => Ok(value),
            Err(RuntimeError {
                kind: ErrorKind::CannotCoerce { .. } | ErrorKind::NoSuchMethod { .. },
                ..
            }) => Err(self.operand_type_error(op, &left, &right)),
            Err(other) => Err(other),
        }
    }

    fn operand_type_error(&self, op: BinaryOp, left: &Value, right: &Value) -> RuntimeError {
        type_error(format!(
            "cannot apply '{}' to {} and {}",
            op.as_symbol(),
            self.registry().class_name_of(left, self.interner()),
            self.registry().class_name_of(right, self.interner()),
        ))
    }

    /// Class instantiation: a static `new` wins; otherwise a default
    /// instance is allocated and `init` runs when the class defines one.
    fn instantiate(&mut self, class: &ClassHandle, args: &CallArgs, line: Line) -> EvalResult {
        if let Some(constructor) = class.resolve_static(self.names.new) {
            return match constructor {
                Value::Method(m) => {
                    let arguments = self.build_arguments(&m, args)?;
                    self.invoke(&m, Some(Value::Class(class.clone())), arguments, line)
                }
                other => Err(not_callable(other.kind_name())),
            };
        }
        let class_label = self.interner().lookup(class.name());
        match class.instantiability() {
            Instantiability::Abstract => Err(abstract_class(class_label)),
            Instantiability::NotSupported => Err(new_not_supported(class_label)),
            Instantiability::Normal => {
                let fields = ReferenceRecord::root(class.name());
                let instance = Value::Instance(InstanceValue::new(class.clone(), fields));
                if let Some(init) = class.resolve_method(self.names.init) {
                    match init {
                        Value::Method(m) => {
                            let arguments = self.build_arguments(&m, args)?;
                            self.invoke(&m, Some(instance.clone()), arguments, line)?;
                        }
                        other => return Err(not_callable(other.kind_name())),
                    }
                } else if !args.positional.is_empty() || !args.keywords.is_empty() {
                    return Err(arity_error(class_label, 0, args.positional.len()));
                }
                Ok(instance)
            }
        }
    }

    /// Evaluate caller arguments for a resolved method.
    ///
    /// Positions declared by-reference must be plain variables; the
    /// caller's own `Reference` is passed, so callee and caller share
    /// one slot. Everything else is evaluated to a value.
    fn build_arguments(
        &mut self,
        method: &MethodValue,
        args: &CallArgs,
    ) -> Result<Arguments, RuntimeError> {
        let params = match &method.body {
            MethodBody::Ast { params, .. } => Some(params.clone()),
            MethodBody::Native(_) => None,
        };
        let mut positional = Vec::with_capacity(args.positional.len());
        for (index, expr) in args.positional.iter().enumerate() {
            let by_reference = params
                .as_ref()
                .is_some_and(|p| p.is_by_reference(index));
            if by_reference {
                let ExprKind::Ident(name) = &expr.kind else {
                    return Err(invalid_arguments(
                        "argument for a by-reference parameter must be a variable",
                    )
                    .with_line(expr.line));
                };
                let reference = self
                    .scope()
                    .borrow()
                    .lookup_reference(*name)
                    .ok_or_else(|| {
                        name_error(self.interner().lookup(*name)).with_line(expr.line)
                    })?;
                positional.push(Arg::Reference(reference));
            } else {
                positional.push(Arg::Value(self.eval_expr(expr)?));
            }
        }
        let mut keywords = Vec::with_capacity(args.keywords.len());
        for (name, expr) in &args.keywords {
            keywords.push((*name, self.eval_expr(expr)?));
        }
        Ok(Arguments {
            positional,
            keywords,
        })
    }

    /// Evaluate every argument to a plain value (lambda calls).
    fn eval_args_by_value(&mut self, args: &CallArgs) -> Result<Arguments, RuntimeError> {
        let mut positional = Vec::with_capacity(args.positional.len());
        for expr in &args.positional {
            positional.push(Arg::Value(self.eval_expr(expr)?));
        }
        let mut keywords = Vec::with_capacity(args.keywords.len());
        for (name, expr) in &args.keywords {
            keywords.push((*name, self.eval_expr(expr)?));
        }
        Ok(Arguments {
            positional,
            keywords,
        })
    }

    /// Invoke a resolved method.
    ///
    /// AST bodies get a frame parented to the module (methods close over
    /// the module namespace, not the caller), argument binding, trace
    /// entry/return emission, and their return slot read back out.
    pub(crate) fn invoke(
        &mut self,
        method: &MethodValue,
        receiver: Option<Value>,
        arguments: Arguments,
        line: Line,
    ) -> EvalResult {
        match &method.body {
            MethodBody::Native(f) => f(self, receiver.unwrap_or(Value::None), arguments),
            MethodBody::Ast { params, body } => {
                let params = params.clone();
                let body = body.clone();

                let by_refs = self.collect_by_ref_echoes(&params, &arguments);
                let module = self.module().clone();
                self.stack
                    .push_frame(method.name, receiver, module, line, true)?;
                {
                    let record = self.stack.current_record();
                    let label = self.interner().lookup(method.name);
                    params.bind(&mut record.borrow_mut(), arguments, label, self.interner())?;
                }
                self.trace_entry(method.name, &params, line);

                let _ = self.exec_block(&body)?;

                let result = self.stack.pop_frame();
                self.trace_return(&result, &by_refs, line);
                if self.stack.is_empty() {
                    self.trace.close();
                }
                Ok(result)
            }
        }
    }

    /// Invoke a lambda against its captured record.
    ///
    /// `self_override` substitutes the implicit receiver (enumerables
    /// pass the current element); locals still resolve through the
    /// captured record. The lambda's value is the last one its body
    /// produced — `return` inside a lambda targets the enclosing method
    /// and surfaces as a pending return, not as the lambda's value.
    pub(crate) fn call_lambda(
        &mut self,
        lambda: &LambdaValue,
        arguments: Arguments,
        self_override: Option<Value>,
        line: Line,
    ) -> Result<LambdaOutcome, RuntimeError> {
        let receiver = self_override.or_else(|| lambda.captured_self.clone());
        self.stack.push_frame(
            self.names.lambda,
            receiver,
            lambda.captured_record.clone(),
            line,
            false,
        )?;
        {
            let record = self.stack.current_record();
            lambda
                .params
                .bind(&mut record.borrow_mut(), arguments, "lambda", self.interner())?;
        }
        let body = lambda.body.clone();
        let (flow, value) = self.exec_block(&body)?;
        self.stack.pop_frame();
        Ok(LambdaOutcome {
            value,
            broke: flow == Flow::Break,
        })
    }

    fn collect_by_ref_echoes(
        &self,
        params: &Params,
        arguments: &Arguments,
    ) -> Vec<(Name, Reference)> {
        if !self.trace.is_enabled() || !params.has_by_reference() {
            return Vec::new();
        }
        params
            .positional_params()
            .iter()
            .zip(arguments.positional.iter())
            .filter_map(|(param, arg)| match (param.by_reference, arg) {
                (true, Arg::Reference(reference)) => Some((param.name, reference.clone())),
                _ => None,
            })
            .collect()
    }

    /// Emit `name(p=v, ...) <line>` at the current nesting depth.
    fn trace_entry(&mut self, name: Name, params: &Params, line: Line) {
        if !self.trace.is_enabled() {
            return;
        }
        let record = self.stack.current_record();
        let indent = "  ".repeat(self.stack.depth().saturating_sub(1));
        let mut parts = Vec::new();
        for param in params.positional_params() {
            let value = record
                .borrow()
                .lookup_local(param.name)
                .map(|r| r.get())
                .unwrap_or(Value::None);
            let prefix = if param.by_reference { "&" } else { "" };
            parts.push(format!(
                "{prefix}{}={}",
                self.interner().lookup(param.name),
                value.repr(self.interner())
            ));
        }
        for (kw_name, _) in params.keyword_params() {
            let value = record
                .borrow()
                .lookup_local(*kw_name)
                .map(|r| r.get())
                .unwrap_or(Value::None);
            parts.push(format!(
                "{}={}",
                self.interner().lookup(*kw_name),
                value.repr(self.interner())
            ));
        }
        let text = format!(
            "{indent}{}({}){}",
            self.interner().lookup(name),
            parts.join(", "),
            line_suffix(line)
        );
        self.trace.line(&text);
    }

    /// Emit `return value, &x=value <line>` after the frame popped.
    fn trace_return(&mut self, result: &Value, by_refs: &[(Name, Reference)], line: Line) {
        if !self.trace.is_enabled() {
            return;
        }
        let indent = "  ".repeat(self.stack.depth());
        let mut text = format!("{indent}return {}", result.repr(self.interner()));
        for (name, reference) in by_refs {
            text.push_str(&format!(
                ", &{}={}",
                self.interner().lookup(*name),
                reference.get().repr(self.interner())
            ));
        }
        text.push_str(&line_suffix(line));
        self.trace.line(&text);
    }
}

fn line_suffix(line: Line) -> String {
    if line.is_known() {
        format!(" <{}>", line.get())
    } else {
        String::new()
    }
}
