//! Statement and expression evaluation.
//!
//! Statements execute against the current frame's record; `if`/`while`
//! bodies run in the same activation record (no block scoping). A break
//! request travels in-band through `Flow`; a pending return is tracked
//! on the call stack and checked between statements.

use sable_ir::ast::{AssignTarget, Block, Expr, ExprKind, Stmt, StmtKind};
use sable_ir::{BinaryOp, Name};

use crate::errors::{
    attribute_error, format_error, name_error, type_error, EvalResult, RuntimeError,
};
use crate::eval::Evaluator;
use crate::params::{Arguments, Params};
use crate::stack_guard::ensure_sufficient_stack;
use crate::value::{DictValue, LambdaValue, Value};

/// In-band control signal for statement sequences.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum Flow {
    Normal,
    /// Break request: stops the innermost `each`/`while`.
    Break,
}

impl<'a> Evaluator<'a> {
    /// Execute a statement sequence; yields the control signal and the
    /// last produced value (the result of a lambda body).
    pub(crate) fn exec_block(&mut self, block: &Block) -> Result<(Flow, Value), RuntimeError> {
        let mut last = Value::None;
        for stmt in &block.stmts {
            let flow = self.exec_stmt(stmt, &mut last)?;
            if flow == Flow::Break {
                return Ok((Flow::Break, last));
            }
            if self.return_pending() {
                break;
            }
        }
        Ok((Flow::Normal, last))
    }

    fn exec_stmt(&mut self, stmt: &Stmt, last: &mut Value) -> Result<Flow, RuntimeError> {
        match &stmt.kind {
            StmtKind::Assign { target, value } => {
                let value = self.eval_expr(value)?;
                self.assign(target, value).map_err(|e| e.with_line(stmt.line))?;
                Ok(Flow::Normal)
            }
            StmtKind::Expr(expr) => {
                *last = self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.eval_expr(condition)?;
                let truthy = self
                    .truthiness(&condition)
                    .map_err(|e| e.with_line(stmt.line))?;
                let branch = if truthy {
                    Some(then_branch)
                } else {
                    else_branch.as_ref()
                };
                match branch {
                    Some(block) => {
                        let (flow, value) = self.exec_block(block)?;
                        *last = value;
                        Ok(flow)
                    }
                    None => Ok(Flow::Normal),
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    let condition_value = self.eval_expr(condition)?;
                    if !self
                        .truthiness(&condition_value)
                        .map_err(|e| e.with_line(stmt.line))?
                    {
                        break;
                    }
                    let (flow, _) = self.exec_block(body)?;
                    // The loop consumes its own break requests.
                    if flow == Flow::Break || self.return_pending() {
                        break;
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                self.stack
                    .define_return(value)
                    .map_err(|e| e.with_line(stmt.line))?;
                Ok(Flow::Normal)
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Read { target } => {
                let token = self
                    .console
                    .read_token()
                    .ok_or_else(|| format_error("<end of input>").with_line(stmt.line))?;
                let parsed: i64 = token
                    .parse()
                    .map_err(|_| format_error(&token).with_line(stmt.line))?;
                self.assign(target, Value::int(parsed))
                    .map_err(|e| e.with_line(stmt.line))?;
                Ok(Flow::Normal)
            }
            StmtKind::Write(expr) => {
                let value = self.eval_expr(expr)?;
                let text = self
                    .display_string(&value)
                    .map_err(|e| e.with_line(stmt.line))?;
                self.console.write(&text);
                Ok(Flow::Normal)
            }
        }
    }

    /// Assign into an identifier, index, or attribute target.
    ///
    /// Identifier assignment mutates the nearest existing binding in the
    /// record chain (so closures write enclosing locals through the
    /// shared references) and only defines a new local when the name is
    /// unbound everywhere.
    pub(crate) fn assign(
        &mut self,
        target: &AssignTarget,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match target {
            AssignTarget::Name(name) => {
                let scope = self.scope();
                let existing = scope.borrow().lookup_reference(*name);
                match existing {
                    Some(reference) => reference.set(value),
                    None => scope.borrow_mut().define(*name, value),
                }
                Ok(())
            }
            AssignTarget::Index { object, index } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                self.dispatch_values(
                    object,
                    self.names.set_item,
                    Arguments::positional(vec![index, value]),
                )?;
                Ok(())
            }
            AssignTarget::Attribute { object, attribute } => {
                let object = self.eval_expr(object)?;
                let Value::Instance(instance) = &object else {
                    return Err(attribute_error(
                        self.interner().lookup(*attribute),
                        object.kind_name(),
                    ));
                };
                instance.fields().borrow_mut().define(*attribute, value);
                Ok(())
            }
        }
    }

    /// Evaluate an expression. Grows the host stack under deep recursion
    /// and stamps escaping errors with this node's line (innermost wins).
    pub fn eval_expr(&mut self, expr: &Expr) -> EvalResult {
        ensure_sufficient_stack(|| self.eval_expr_inner(expr)).map_err(|e| e.with_line(expr.line))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> EvalResult {
        match &expr.kind {
            ExprKind::NoneLit => Ok(Value::None),
            ExprKind::BoolLit(b) => Ok(Value::Bool(*b)),
            ExprKind::IntLit(n) => Ok(Value::int(*n)),
            ExprKind::FloatLit(f) => Ok(Value::Float(*f)),
            ExprKind::StrLit(s) => Ok(Value::string(s.clone())),
            ExprKind::SymbolLit(name) => Ok(Value::Symbol(*name)),
            ExprKind::Ident(name) => self.lookup_name(*name),
            ExprKind::SelfExpr => self.lookup_name(self.names.self_),
            ExprKind::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval_expr(item)?);
                }
                Ok(Value::array(values))
            }
            ExprKind::Dict(pairs) => {
                let mut entries = DictValue::new();
                for (key, value) in pairs {
                    let key = self.eval_expr(key)?;
                    let value = self.eval_expr(value)?;
                    entries.set(key, value);
                }
                Ok(Value::dict(entries))
            }
            ExprKind::Lambda { params, body } => {
                let params = Params::build(params, |e| self.eval_expr(e))?;
                let captured_record = self.scope();
                let captured_self = captured_record.borrow().lookup_value(self.names.self_);
                Ok(Value::lambda(LambdaValue::new(
                    params,
                    body.clone(),
                    captured_record,
                    captured_self,
                )))
            }
            ExprKind::Call { callee, args } => {
                let callee_value = self.eval_expr(callee)?;
                self.eval_call(callee_value, args, expr.line)
            }
            ExprKind::MethodCall {
                receiver,
                method,
                args,
            } => {
                let receiver = self.eval_expr(receiver)?;
                self.eval_method_call(receiver, *method, args, expr.line)
            }
            ExprKind::Attribute { object, attribute } => {
                let object = self.eval_expr(object)?;
                self.read_attribute(&object, *attribute)
            }
            ExprKind::Index { object, index } => {
                let object = self.eval_expr(object)?;
                let index = self.eval_expr(index)?;
                self.dispatch_values(
                    object,
                    self.names.get_item,
                    Arguments::positional(vec![index]),
                )
            }
            ExprKind::Unary { op, operand } => {
                let operand = self.eval_expr(operand)?;
                let method = self.names.for_unary(*op);
                self.dispatch_values(operand, method, Arguments::empty())
            }
            ExprKind::Binary { op, lhs, rhs } => self.eval_binary(*op, lhs, rhs),
        }
    }

    fn lookup_name(&mut self, name: Name) -> EvalResult {
        self.scope()
            .borrow()
            .lookup_value(name)
            .ok_or_else(|| name_error(self.interner().lookup(name)))
    }

    /// Attribute read: instance variables resolve in the instance's own
    /// record only; a miss is an AttributeError, distinct from method
    /// dispatch failure.
    fn read_attribute(&mut self, object: &Value, attribute: Name) -> EvalResult {
        match object {
            Value::Instance(instance) => instance
                .fields()
                .borrow()
                .lookup_local(attribute)
                .map(|r| r.get())
                .ok_or_else(|| {
                    attribute_error(
                        self.interner().lookup(attribute),
                        self.interner().lookup(instance.class().name()),
                    )
                }),
            other => Err(attribute_error(
                self.interner().lookup(attribute),
                other.kind_name(),
            )),
        }
    }

    /// Binary operators forward to dunder methods through ordinary
    /// dispatch; `and`/`or` short-circuit here and never evaluate the
    /// right operand when the left one decides.
    fn eval_binary(&mut self, op: BinaryOp, lhs: &Expr, rhs: &Expr) -> EvalResult {
        if op == BinaryOp::And {
            let left = self.eval_expr(lhs)?;
            if !self.truthiness(&left)? {
                return Ok(left);
            }
            return self.eval_expr(rhs);
        }
        if op == BinaryOp::Or {
            let left = self.eval_expr(lhs)?;
            if self.truthiness(&left)? {
                return Ok(left);
            }
            return self.eval_expr(rhs);
        }

        let left = self.eval_expr(lhs)?;
        let right = self.eval_expr(rhs)?;
        self.binary_dispatch(op, left, right)
    }

    /// Truthiness through the `bool` protocol.
    pub(crate) fn truthiness(&mut self, value: &Value) -> Result<bool, RuntimeError> {
        let result =
            self.dispatch_values(value.clone(), self.names.bool_, Arguments::empty())?;
        match result {
            Value::Bool(b) => Ok(b),
            other => Err(type_error(format!(
                "bool must produce a Boolean, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Textual representation through the `str` protocol.
    pub(crate) fn display_string(&mut self, value: &Value) -> Result<String, RuntimeError> {
        let result = self.dispatch_values(value.clone(), self.names.str_, Arguments::empty())?;
        match result {
            Value::Str(s) => Ok((*s).clone()),
            other => Err(type_error(format!(
                "str must produce a String, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Equality through the `eq` protocol, for derived comparisons.
    pub(crate) fn dispatch_eq(
        &mut self,
        lhs: &Value,
        rhs: &Value,
    ) -> Result<bool, RuntimeError> {
        let result = self.dispatch_values(
            lhs.clone(),
            self.names.eq_name(),
            Arguments::positional(vec![rhs.clone()]),
        )?;
        match result {
            Value::Bool(b) => Ok(b),
            other => Err(type_error(format!(
                "eq must produce a Boolean, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Ordering through the `lt` protocol, for derived comparisons.
    pub(crate) fn dispatch_lt(
        &mut self,
        lhs: &Value,
        rhs: &Value,
    ) -> Result<bool, RuntimeError> {
        let result = self.dispatch_values(
            lhs.clone(),
            self.names.lt_name(),
            Arguments::positional(vec![rhs.clone()]),
        )?;
        match result {
            Value::Bool(b) => Ok(b),
            other => Err(type_error(format!(
                "lt must produce a Boolean, got {}",
                other.kind_name()
            ))),
        }
    }

    /// Size through the `size` protocol, for derived truthiness.
    pub(crate) fn dispatch_size(&mut self, value: &Value) -> Result<i64, RuntimeError> {
        let result = self.dispatch_values(value.clone(), self.names.size, Arguments::empty())?;
        match result {
            Value::Int(n) => Ok(n),
            other => Err(type_error(format!(
                "size must produce an Integer, got {}",
                other.kind_name()
            ))),
        }
    }
}
