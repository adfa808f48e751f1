//! Parameter signatures and the argument-binding algorithm.
//!
//! `Params` is the declarative side of a callable: ordered positional
//! names (with by-reference markers), keyword defaults, and at most one
//! positional group and one keyword group. `Arguments` is the caller-side
//! payload. `bind` maps one onto the other into an activation record,
//! supporting Python-like `*args`/`**kwargs` ergonomics plus trailing
//! required positionals after a splat — `f(a, *rest, b)`.

use sable_ir::{ast, Name, StringLookup};

use crate::errors::{arity_error, invalid_arguments, EvalResult, RuntimeError};
use crate::reference::{Reference, ReferenceRecord};
use crate::value::{DictValue, Value};

/// One declared positional parameter.
#[derive(Clone, Debug)]
pub struct PositionalParam {
    pub name: Name,
    /// By-reference parameters alias the caller's `Reference` box.
    pub by_reference: bool,
}

/// Parameter signature of a callable.
///
/// Invariants, enforced at construction: parameter names are unique, and
/// there is at most one positional group and at most one keyword group.
#[derive(Clone, Debug, Default)]
pub struct Params {
    /// Positional parameters in declaration order; the first
    /// `before_group` precede the positional group, the rest follow it.
    positional: Vec<PositionalParam>,
    before_group: usize,
    after_group: usize,
    positional_group: Option<Name>,
    /// Keyword parameters with their defaults (evaluated at definition
    /// time).
    keywords: Vec<(Name, Value)>,
    keyword_group: Option<Name>,
}

impl Params {
    /// Signature with no parameters.
    pub fn empty() -> Self {
        Params::default()
    }

    /// Build a signature from AST parameter declarations.
    ///
    /// Keyword defaults are evaluated once, here, via `eval_default` —
    /// definition time, not call time.
    pub fn build(
        decls: &[ast::ParamDecl],
        mut eval_default: impl FnMut(&ast::Expr) -> EvalResult,
    ) -> Result<Params, RuntimeError> {
        let mut params = Params::default();
        let mut seen: Vec<Name> = Vec::with_capacity(decls.len());

        for decl in decls {
            if seen.contains(&decl.name) {
                return Err(invalid_arguments("duplicate parameter name in signature"));
            }
            seen.push(decl.name);
            if params.keyword_group.is_some() {
                return Err(invalid_arguments(
                    "keyword group must be the last parameter",
                ));
            }
            match &decl.kind {
                ast::ParamKind::Value | ast::ParamKind::Reference => {
                    let by_reference = matches!(decl.kind, ast::ParamKind::Reference);
                    params.positional.push(PositionalParam {
                        name: decl.name,
                        by_reference,
                    });
                    if params.positional_group.is_some() {
                        params.after_group += 1;
                    } else {
                        params.before_group += 1;
                    }
                }
                ast::ParamKind::Keyword { default } => {
                    let value = eval_default(default)?;
                    params.keywords.push((decl.name, value));
                }
                ast::ParamKind::PositionalGroup => {
                    if params.positional_group.is_some() {
                        return Err(invalid_arguments(
                            "at most one positional group per signature",
                        ));
                    }
                    params.positional_group = Some(decl.name);
                }
                ast::ParamKind::KeywordGroup => {
                    params.keyword_group = Some(decl.name);
                }
            }
        }
        Ok(params)
    }

    /// Number of declared positional parameters (groups excluded).
    pub fn positional_count(&self) -> usize {
        self.positional.len()
    }

    /// Positional parameters in declaration order.
    pub fn positional_params(&self) -> &[PositionalParam] {
        &self.positional
    }

    /// Keyword parameters with their definition-time defaults.
    pub fn keyword_params(&self) -> &[(Name, Value)] {
        &self.keywords
    }

    /// Whether any parameter is marked by-reference.
    pub fn has_by_reference(&self) -> bool {
        self.positional.iter().any(|p| p.by_reference)
    }

    /// The by-reference marker for the positional parameter at `index`.
    pub fn is_by_reference(&self, index: usize) -> bool {
        self.positional.get(index).is_some_and(|p| p.by_reference)
    }

    /// Total bound-name count a successful binding produces: every
    /// positional, every keyword, and one slot per declared group.
    fn declared_size(&self) -> usize {
        self.positional.len()
            + self.keywords.len()
            + usize::from(self.positional_group.is_some())
            + usize::from(self.keyword_group.is_some())
    }

    /// Bind caller arguments into `record`.
    ///
    /// The steps, in order: positional-overflow check, keyword-group
    /// collection, front positional binding, back positional binding
    /// (right-to-left), positional-group collection, keyword defaults,
    /// and the final bound-count accounting.
    pub fn bind(
        &self,
        record: &mut ReferenceRecord,
        args: Arguments,
        label: &str,
        names: &impl StringLookup,
    ) -> Result<(), RuntimeError> {
        let supplied = args.positional.len();

        // 1. Without a positional group there is nowhere for extra
        //    positional arguments to go.
        if self.positional_group.is_none() && supplied > self.positional.len() {
            return Err(arity_error(label, self.positional.len(), supplied));
        }

        let mut bound = 0usize;

        // 2. A keyword group swallows every keyword argument whose name
        //    is not declared, removing it from further matching.
        let mut keywords = args.keywords;
        if let Some(group_name) = self.keyword_group {
            let mut group = DictValue::new();
            keywords.retain(|(name, value)| {
                let declared = self.keywords.iter().any(|(k, _)| k == name);
                if !declared {
                    group.set(Value::string(names.lookup(*name)), value.clone());
                }
                declared
            });
            record.define(group_name, Value::dict(group));
            bound += 1;
        }

        // 3. Front positional parameters bind from the front.
        let front_take = self.before_group.min(supplied);
        for (index, arg) in args.positional.iter().take(front_take).enumerate() {
            self.bind_positional(record, index, arg, label)?;
            bound += 1;
        }

        // 4. Back positional parameters bind from the back of what is
        //    left, right-to-left, by name.
        let remaining = supplied - front_take;
        let back_take = self.after_group.min(remaining);
        for offset in 0..back_take {
            let param_index = self.positional.len() - 1 - offset;
            let arg_index = supplied - 1 - offset;
            self.bind_positional(record, param_index, &args.positional[arg_index], label)?;
            bound += 1;
        }

        // 5. Everything between the front-bound and back-bound slices
        //    lands in the positional group.
        if let Some(group_name) = self.positional_group {
            let leftover: Vec<Value> = args.positional[front_take..supplied - back_take]
                .iter()
                .map(Arg::value)
                .collect();
            record.define(group_name, Value::array(leftover));
            bound += 1;
        }

        // 6. Keyword parameters take the supplied value or their default.
        for (name, default) in &self.keywords {
            let supplied_kw = keywords
                .iter()
                .position(|(k, _)| k == name)
                .map(|i| keywords.remove(i).1);
            record.define(*name, supplied_kw.unwrap_or_else(|| default.clone()));
            bound += 1;
        }
        if let Some((name, _)) = keywords.first() {
            return Err(invalid_arguments(format!(
                "unexpected keyword argument '{}'",
                names.lookup(*name)
            )));
        }

        // 7. The bound count must exactly match the declared size.
        if bound != self.declared_size() {
            return Err(arity_error(label, self.declared_size(), bound));
        }
        Ok(())
    }

    fn bind_positional(
        &self,
        record: &mut ReferenceRecord,
        param_index: usize,
        arg: &Arg,
        _label: &str,
    ) -> Result<(), RuntimeError> {
        let param = &self.positional[param_index];
        match (param.by_reference, arg) {
            // By-reference: the record holds the caller's slot itself.
            (true, Arg::Reference(reference)) => {
                record.define_reference(param.name, reference.clone());
            }
            (true, Arg::Value(_)) => {
                return Err(invalid_arguments(
                    "argument for a by-reference parameter must be a variable",
                ));
            }
            // By-value: a fresh slot with a copy of the value.
            (false, arg) => record.define(param.name, arg.value()),
        }
        Ok(())
    }
}

/// One caller-supplied positional argument.
#[derive(Clone, Debug)]
pub enum Arg {
    Value(Value),
    /// The caller's own `Reference`, passed for a by-reference parameter.
    Reference(Reference),
}

impl Arg {
    /// Dereference to a plain value.
    pub fn value(&self) -> Value {
        match self {
            Arg::Value(v) => v.clone(),
            Arg::Reference(r) => r.get(),
        }
    }
}

/// Caller-side argument payload before binding.
#[derive(Clone, Debug, Default)]
pub struct Arguments {
    pub positional: Vec<Arg>,
    pub keywords: Vec<(Name, Value)>,
}

impl Arguments {
    pub fn empty() -> Self {
        Arguments::default()
    }

    /// Positional values only.
    pub fn positional(values: Vec<Value>) -> Self {
        Arguments {
            positional: values.into_iter().map(Arg::Value).collect(),
            keywords: Vec::new(),
        }
    }

    /// Number of positional arguments.
    pub fn arity(&self) -> usize {
        self.positional.len()
    }

    /// The positional argument at `index`, dereferenced.
    pub fn at(&self, index: usize) -> Option<Value> {
        self.positional.get(index).map(Arg::value)
    }

    /// Look up a keyword argument by name.
    pub fn keyword(&self, name: Name) -> Option<Value> {
        self.keywords
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.clone())
    }

    /// Native-method arity check.
    pub fn expect_arity(&self, label: &str, expected: usize) -> Result<(), RuntimeError> {
        if self.arity() == expected {
            Ok(())
        } else {
            Err(arity_error(label, expected, self.arity()))
        }
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use sable_ir::ast::{Expr, ParamDecl};
    use sable_ir::StringInterner;

    fn build(decls: &[ParamDecl]) -> Params {
        Params::build(decls, |expr| match &expr.kind {
            sable_ir::ast::ExprKind::IntLit(n) => Ok(Value::int(*n)),
            other => panic!("unexpected default expr {other:?}"),
        })
        .unwrap()
    }

    fn bind(params: &Params, args: Arguments, interner: &StringInterner) -> ReferenceRecord {
        let mut record = ReferenceRecord::new(Name::EMPTY);
        params.bind(&mut record, args, "f", interner).unwrap();
        record
    }

    #[test]
    fn splat_signature_binds_front_back_and_middle() {
        let interner = StringInterner::new();
        let (a, rest, b, k) = (
            interner.intern("a"),
            interner.intern("rest"),
            interner.intern("b"),
            interner.intern("k"),
        );
        // (a, *rest, b, k: 1)
        let params = build(&[
            ParamDecl::value(a),
            ParamDecl::positional_group(rest),
            ParamDecl::value(b),
            ParamDecl::keyword(k, Expr::int(1)),
        ]);

        // Called with (1, 2, 3, 4, k: 9).
        let mut args = Arguments::positional(vec![
            Value::int(1),
            Value::int(2),
            Value::int(3),
            Value::int(4),
        ]);
        args.keywords.push((k, Value::int(9)));
        let record = bind(&params, args, &interner);

        assert_eq!(record.lookup_value(a), Some(Value::int(1)));
        assert_eq!(record.lookup_value(b), Some(Value::int(4)));
        assert_eq!(
            record.lookup_value(rest),
            Some(Value::array(vec![Value::int(2), Value::int(3)]))
        );
        assert_eq!(record.lookup_value(k), Some(Value::int(9)));
    }

    #[test]
    fn splat_signature_with_minimal_call() {
        let interner = StringInterner::new();
        let (a, rest, b, k) = (
            interner.intern("a"),
            interner.intern("rest"),
            interner.intern("b"),
            interner.intern("k"),
        );
        let params = build(&[
            ParamDecl::value(a),
            ParamDecl::positional_group(rest),
            ParamDecl::value(b),
            ParamDecl::keyword(k, Expr::int(1)),
        ]);

        // Called with (1, 2): a=1, b=2, rest=[], k=1.
        let args = Arguments::positional(vec![Value::int(1), Value::int(2)]);
        let record = bind(&params, args, &interner);

        assert_eq!(record.lookup_value(a), Some(Value::int(1)));
        assert_eq!(record.lookup_value(b), Some(Value::int(2)));
        assert_eq!(record.lookup_value(rest), Some(Value::array(vec![])));
        assert_eq!(record.lookup_value(k), Some(Value::int(1)));
    }

    #[test]
    fn positional_overflow_without_group_is_arity_error() {
        let interner = StringInterner::new();
        let a = interner.intern("a");
        let params = build(&[ParamDecl::value(a)]);

        let mut record = ReferenceRecord::new(Name::EMPTY);
        let err = params
            .bind(
                &mut record,
                Arguments::positional(vec![Value::int(1), Value::int(2)]),
                "f",
                &interner,
            )
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Arity { expected: 1, got: 2, .. }));
    }

    #[test]
    fn missing_positional_is_arity_error() {
        let interner = StringInterner::new();
        let (a, b) = (interner.intern("a"), interner.intern("b"));
        let params = build(&[ParamDecl::value(a), ParamDecl::value(b)]);

        let mut record = ReferenceRecord::new(Name::EMPTY);
        let err = params
            .bind(
                &mut record,
                Arguments::positional(vec![Value::int(1)]),
                "f",
                &interner,
            )
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Arity { .. }));
    }

    #[test]
    fn keyword_group_collects_unknown_keywords() {
        let interner = StringInterner::new();
        let (k, opts, extra) = (
            interner.intern("k"),
            interner.intern("opts"),
            interner.intern("extra"),
        );
        let params = build(&[
            ParamDecl::keyword(k, Expr::int(0)),
            ParamDecl::keyword_group(opts),
        ]);

        let mut args = Arguments::empty();
        args.keywords.push((k, Value::int(5)));
        args.keywords.push((extra, Value::int(7)));
        let record = bind(&params, args, &interner);

        assert_eq!(record.lookup_value(k), Some(Value::int(5)));
        let dict = record.lookup_value(opts).unwrap();
        match dict {
            Value::Dict(entries) => {
                assert_eq!(
                    entries.borrow().get(&Value::string("extra")),
                    Some(Value::int(7))
                );
                assert_eq!(entries.borrow().len(), 1);
            }
            other => panic!("expected dict, got {other:?}"),
        }
    }

    #[test]
    fn unexpected_keyword_without_group_is_rejected() {
        let interner = StringInterner::new();
        let (a, bogus) = (interner.intern("a"), interner.intern("bogus"));
        let params = build(&[ParamDecl::value(a)]);

        let mut args = Arguments::positional(vec![Value::int(1)]);
        args.keywords.push((bogus, Value::int(2)));
        let mut record = ReferenceRecord::new(Name::EMPTY);
        let err = params.bind(&mut record, args, "f", &interner).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::InvalidArguments { .. }));
    }

    #[test]
    fn duplicate_group_declarations_are_rejected() {
        let interner = StringInterner::new();
        let (r1, r2) = (interner.intern("r1"), interner.intern("r2"));
        let result = Params::build(
            &[
                ParamDecl::positional_group(r1),
                ParamDecl::positional_group(r2),
            ],
            |_| Ok(Value::None),
        );
        assert!(result.is_err());
    }

    #[test]
    fn by_reference_binding_aliases_the_caller_slot() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let params = build(&[ParamDecl::by_reference(x)]);

        let caller_slot = Reference::new(Value::int(1));
        let mut args = Arguments::empty();
        args.positional.push(Arg::Reference(caller_slot.clone()));

        let mut record = ReferenceRecord::new(Name::EMPTY);
        params.bind(&mut record, args, "f", &interner).unwrap();

        // Mutating through the bound name mutates the caller's slot.
        record.define(x, Value::int(5));
        assert_eq!(caller_slot.get(), Value::int(5));
    }
}
