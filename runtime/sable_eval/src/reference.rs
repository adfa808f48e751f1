//! References and reference records.
//!
//! A `Reference` is the unit of aliasing: a single mutable slot holding
//! one value. A `ReferenceRecord` is a name→Reference table with an
//! optional parent, and serves three roles: lexical scopes/activation
//! records, per-class method tables (parent = superclass's record), and
//! the module namespace.
//!
//! Pass-by-reference is exactly this: the callee's record binds the
//! *same* `Reference` the caller holds, not a copy.

use rustc_hash::FxHashMap;

use sable_ir::Name;

use crate::shared::Shared;
use crate::value::Value;

/// Mutable single-slot box holding one value.
///
/// Clones alias the same slot; `set` through one handle is observed by
/// every holder.
#[derive(Clone, Debug)]
pub struct Reference(Shared<Value>);

impl Reference {
    /// Create a new slot holding `value`.
    pub fn new(value: Value) -> Self {
        Reference(Shared::new(value))
    }

    /// Read the current value (cloned out of the slot).
    #[inline]
    pub fn get(&self) -> Value {
        self.0.borrow().clone()
    }

    /// Replace the slot contents. Visible to every alias.
    #[inline]
    pub fn set(&self, value: Value) {
        *self.0.borrow_mut() = value;
    }

    /// Check whether two references alias the same slot.
    #[inline]
    pub fn aliases(&self, other: &Reference) -> bool {
        self.0.ptr_eq(&other.0)
    }
}

/// Shared handle to a reference record.
pub type RecordRef = Shared<ReferenceRecord>;

/// Chained name→Reference table.
///
/// Lookup walks `parent` until found or the chain ends; the caller turns
/// a miss into the appropriate error (NameError for scopes, TypeError for
/// method dispatch).
#[derive(Debug)]
pub struct ReferenceRecord {
    /// Record name, for diagnostics only.
    name: Name,
    /// Parent record (lexical scope, superclass table, or module).
    parent: Option<RecordRef>,
    entries: FxHashMap<Name, Reference>,
}

impl ReferenceRecord {
    /// Create a new record with no parent.
    pub fn new(name: Name) -> Self {
        ReferenceRecord {
            name,
            parent: None,
            entries: FxHashMap::default(),
        }
    }

    /// Create a new record chained to `parent`.
    pub fn with_parent(name: Name, parent: RecordRef) -> Self {
        ReferenceRecord {
            name,
            parent: Some(parent),
            entries: FxHashMap::default(),
        }
    }

    /// Create a shared record with no parent.
    pub fn root(name: Name) -> RecordRef {
        Shared::new(ReferenceRecord::new(name))
    }

    /// Create a shared record chained to `parent`.
    pub fn child_of(name: Name, parent: RecordRef) -> RecordRef {
        Shared::new(ReferenceRecord::with_parent(name, parent))
    }

    /// Record name, for diagnostics.
    pub fn name(&self) -> Name {
        self.name
    }

    /// Replace the parent link. Used by the second bootstrap phase when
    /// superclass chains are wired.
    pub fn set_parent(&mut self, parent: Option<RecordRef>) {
        self.parent = parent;
    }

    /// Define `name` in this record.
    ///
    /// Creates a new `Reference` if absent; otherwise **mutates the
    /// existing Reference's contents**, so existing aliases observe the
    /// new value.
    pub fn define(&mut self, name: Name, value: Value) {
        if let Some(existing) = self.entries.get(&name) {
            existing.set(value);
        } else {
            self.entries.insert(name, Reference::new(value));
        }
    }

    /// Bind `name` to an existing reference, aliasing its slot.
    ///
    /// This is the by-reference parameter binding: the record ends up
    /// holding the very slot the caller passed in.
    pub fn define_reference(&mut self, name: Name, reference: Reference) {
        self.entries.insert(name, reference);
    }

    /// Register a built-in under its canonical dunder key and a bare
    /// alias, both holding the *same* `Reference`.
    ///
    /// Redefining through `define` on either key updates the shared slot;
    /// the double registration is an ergonomic shortcut, not aliasing of
    /// future re-bindings.
    pub fn define_with_alias(&mut self, canonical: Name, alias: Name, value: Value) {
        let reference = Reference::new(value);
        self.entries.insert(canonical, reference.clone());
        self.entries.insert(alias, reference);
    }

    /// Look up the `Reference` bound to `name`, walking parents.
    pub fn lookup_reference(&self, name: Name) -> Option<Reference> {
        if let Some(reference) = self.entries.get(&name) {
            return Some(reference.clone());
        }
        if let Some(parent) = &self.parent {
            return parent.borrow().lookup_reference(name);
        }
        None
    }

    /// Look up and dereference `name`, walking parents.
    pub fn lookup_value(&self, name: Name) -> Option<Value> {
        self.lookup_reference(name).map(|r| r.get())
    }

    /// Look up `name` in this record only (no parent fallback).
    pub fn lookup_local(&self, name: Name) -> Option<Reference> {
        self.entries.get(&name).cloned()
    }

    /// Number of bindings in this record (not counting parents).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check whether this record has no own bindings.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[expect(clippy::unwrap_used, reason = "tests unwrap for brevity")]
mod tests {
    use super::*;
    use sable_ir::StringInterner;

    #[test]
    fn define_then_lookup() {
        let interner = StringInterner::new();
        let x = interner.intern("x");

        let mut record = ReferenceRecord::new(Name::EMPTY);
        record.define(x, Value::int(42));
        assert_eq!(record.lookup_value(x), Some(Value::int(42)));
    }

    #[test]
    fn redefine_mutates_existing_reference() {
        let interner = StringInterner::new();
        let x = interner.intern("x");

        let mut record = ReferenceRecord::new(Name::EMPTY);
        record.define(x, Value::int(1));
        let held = record.lookup_reference(x).unwrap();

        record.define(x, Value::int(2));
        // The alias taken before the redefinition observes the new value.
        assert_eq!(held.get(), Value::int(2));
    }

    #[test]
    fn lookup_falls_back_to_parent() {
        let interner = StringInterner::new();
        let x = interner.intern("x");
        let y = interner.intern("y");

        let parent = ReferenceRecord::root(Name::EMPTY);
        parent.borrow_mut().define(x, Value::int(1));

        let child = ReferenceRecord::child_of(Name::EMPTY, parent);
        child.borrow_mut().define(y, Value::int(2));

        assert_eq!(child.borrow().lookup_value(x), Some(Value::int(1)));
        assert_eq!(child.borrow().lookup_value(y), Some(Value::int(2)));
    }

    #[test]
    fn child_shadows_parent() {
        let interner = StringInterner::new();
        let x = interner.intern("x");

        let parent = ReferenceRecord::root(Name::EMPTY);
        parent.borrow_mut().define(x, Value::int(1));

        let child = ReferenceRecord::child_of(Name::EMPTY, parent.clone());
        child.borrow_mut().define(x, Value::int(2));

        assert_eq!(child.borrow().lookup_value(x), Some(Value::int(2)));
        assert_eq!(parent.borrow().lookup_value(x), Some(Value::int(1)));
    }

    #[test]
    fn missing_name_is_none() {
        let interner = StringInterner::new();
        let ghost = interner.intern("ghost");
        let record = ReferenceRecord::new(Name::EMPTY);
        assert!(record.lookup_value(ghost).is_none());
    }

    #[test]
    fn bound_reference_aliases_caller_slot() {
        let interner = StringInterner::new();
        let a = interner.intern("a");
        let x = interner.intern("x");

        let caller = ReferenceRecord::root(Name::EMPTY);
        caller.borrow_mut().define(a, Value::int(1));
        let slot = caller.borrow().lookup_reference(a).unwrap();

        let callee = ReferenceRecord::root(Name::EMPTY);
        callee.borrow_mut().define_reference(x, slot);

        // Mutation through the callee's name is visible to the caller.
        callee.borrow_mut().define(x, Value::int(5));
        assert_eq!(caller.borrow().lookup_value(a), Some(Value::int(5)));
    }

    #[test]
    fn dunder_and_alias_share_one_reference() {
        let interner = StringInterner::new();
        let canonical = interner.intern("__str__");
        let alias = interner.intern("str");

        let mut record = ReferenceRecord::new(Name::EMPTY);
        record.define_with_alias(canonical, alias, Value::int(7));

        let a = record.lookup_reference(canonical).unwrap();
        let b = record.lookup_reference(alias).unwrap();
        assert!(a.aliases(&b));

        // define through one key updates both views.
        record.define(alias, Value::int(9));
        assert_eq!(record.lookup_value(canonical), Some(Value::int(9)));
    }
}
