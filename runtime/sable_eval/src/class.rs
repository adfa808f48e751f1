//! The class model and the built-in class registry.
//!
//! Classes form a rooted single-inheritance tree. Each class owns a
//! method table that is a `ReferenceRecord` whose parent is the
//! superclass's record, so method resolution *is* record lookup: a miss
//! at the leaf retries at the superclass and dies at the root.
//!
//! Bootstrap is two-phase to resolve the circularity of the object model
//! (the root `Class` value is itself an instance of `Class`): phase one
//! allocates every built-in class shell, phase two wires superclass
//! links and populates method tables. `ClassRegistry::bootstrap` runs
//! both phases once; the registry is read-only afterwards and is owned
//! by the evaluator, passed explicitly — there is no global state.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use sable_ir::{Name, StringInterner};

use crate::reference::{RecordRef, ReferenceRecord};
use crate::value::Value;

/// How a class responds to instantiation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Instantiability {
    /// `Class(args)` creates an instance (user classes).
    Normal,
    /// Declared abstract: instantiation is an `AbstractClassError`.
    Abstract,
    /// Built-in value classes: instantiation is a `NewNotSupportedError`
    /// unless a static `new` is installed.
    NotSupported,
}

/// A class: name, superclass link, and method tables.
#[derive(Debug)]
pub struct ClassDef {
    name: Name,
    /// Wired in phase two; only the root stays `None`.
    superclass: RefCell<Option<ClassHandle>>,
    /// Instance method table, parented to the superclass's table.
    methods: RecordRef,
    /// Class-level ("static") method table, parented likewise.
    statics: RecordRef,
    instantiability: Instantiability,
}

/// Shared handle to a class; identity is pointer identity.
#[derive(Clone, Debug)]
pub struct ClassHandle(Rc<ClassDef>);

impl ClassHandle {
    /// Phase one: allocate a class shell with empty, unparented tables.
    pub fn shell(name: Name, instantiability: Instantiability) -> Self {
        ClassHandle(Rc::new(ClassDef {
            name,
            superclass: RefCell::new(None),
            methods: ReferenceRecord::root(name),
            statics: ReferenceRecord::root(name),
            instantiability,
        }))
    }

    pub fn name(&self) -> Name {
        self.0.name
    }

    pub fn superclass(&self) -> Option<ClassHandle> {
        self.0.superclass.borrow().clone()
    }

    /// Instance method table.
    pub fn methods(&self) -> &RecordRef {
        &self.0.methods
    }

    /// Class-level method table.
    pub fn statics(&self) -> &RecordRef {
        &self.0.statics
    }

    pub fn instantiability(&self) -> Instantiability {
        self.0.instantiability
    }

    #[inline]
    pub fn ptr_eq(&self, other: &ClassHandle) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Phase two: wire the superclass link and chain both tables to the
    /// superclass's tables.
    pub fn set_superclass(&self, superclass: &ClassHandle) {
        *self.0.superclass.borrow_mut() = Some(superclass.clone());
        self.0
            .methods
            .borrow_mut()
            .set_parent(Some(superclass.0.methods.clone()));
        self.0
            .statics
            .borrow_mut()
            .set_parent(Some(superclass.0.statics.clone()));
    }

    /// Whether `ancestor` appears on this class's superclass chain
    /// (a class is its own ancestor for this check's purposes).
    pub fn has_ancestor(&self, ancestor: &ClassHandle) -> bool {
        let mut current = Some(self.clone());
        while let Some(class) = current {
            if class.ptr_eq(ancestor) {
                return true;
            }
            current = class.superclass();
        }
        false
    }

    /// Resolve a method, walking the superclass chain.
    pub fn resolve_method(&self, name: Name) -> Option<Value> {
        self.0.methods.borrow().lookup_value(name)
    }

    /// Resolve a class-level method, walking the superclass chain.
    pub fn resolve_static(&self, name: Name) -> Option<Value> {
        self.0.statics.borrow().lookup_value(name)
    }
}

/// Handles to every built-in class, filled during bootstrap.
#[derive(Clone, Debug)]
pub struct BuiltinClasses {
    pub object: ClassHandle,
    pub class: ClassHandle,
    pub none: ClassHandle,
    pub boolean: ClassHandle,
    pub number: ClassHandle,
    pub integer: ClassHandle,
    pub big_integer: ClassHandle,
    pub float: ClassHandle,
    pub rational: ClassHandle,
    pub symbol: ClassHandle,
    pub enumerable: ClassHandle,
    pub string: ClassHandle,
    pub array: ClassHandle,
    pub dictionary: ClassHandle,
    pub range: ClassHandle,
    pub method: ClassHandle,
    pub lambda: ClassHandle,
    pub regexp: ClassHandle,
    pub file: ClassHandle,
    pub process: ClassHandle,
    pub string_stream: ClassHandle,
}

/// Built-in class registry.
///
/// Populated once by `bootstrap`, read-only afterwards. User classes
/// live in the module namespace, not here; the registry resolves
/// built-in class names and maps values to their classes.
pub struct ClassRegistry {
    by_name: FxHashMap<Name, ClassHandle>,
    builtins: BuiltinClasses,
}

impl ClassRegistry {
    /// Run both bootstrap phases and return the finished registry.
    pub fn bootstrap(interner: &StringInterner) -> Rc<ClassRegistry> {
        // Phase one: allocate shells. Nothing is wired yet, which is what
        // lets `Class` be an instance of `Class`.
        let shell = |name: &str, inst| ClassHandle::shell(interner.intern(name), inst);
        use Instantiability::{Abstract, NotSupported};

        let builtins = BuiltinClasses {
            object: shell("Object", NotSupported),
            class: shell("Class", NotSupported),
            none: shell("None", NotSupported),
            boolean: shell("Boolean", NotSupported),
            number: shell("Number", Abstract),
            integer: shell("Integer", NotSupported),
            big_integer: shell("BigInteger", NotSupported),
            float: shell("Float", NotSupported),
            rational: shell("Rational", NotSupported),
            symbol: shell("Symbol", NotSupported),
            enumerable: shell("Enumerable", Abstract),
            string: shell("String", NotSupported),
            array: shell("Array", NotSupported),
            dictionary: shell("Dictionary", NotSupported),
            range: shell("Range", NotSupported),
            method: shell("Method", NotSupported),
            lambda: shell("Lambda", NotSupported),
            regexp: shell("RegExp", NotSupported),
            file: shell("File", NotSupported),
            process: shell("Process", NotSupported),
            string_stream: shell("StringStream", NotSupported),
        };

        // Phase two, step one: wire superclass links. The hierarchy is a
        // tree rooted at Object.
        let b = &builtins;
        for class in [
            &b.class,
            &b.none,
            &b.boolean,
            &b.number,
            &b.symbol,
            &b.enumerable,
            &b.method,
            &b.lambda,
            &b.regexp,
            &b.file,
            &b.process,
            &b.string_stream,
        ] {
            class.set_superclass(&b.object);
        }
        for class in [&b.integer, &b.big_integer, &b.float, &b.rational] {
            class.set_superclass(&b.number);
        }
        for class in [&b.string, &b.array, &b.dictionary, &b.range] {
            class.set_superclass(&b.enumerable);
        }

        // Phase two, step two: populate the method tables.
        crate::methods::install(b, interner);

        let mut by_name = FxHashMap::default();
        for class in [
            &b.object,
            &b.class,
            &b.none,
            &b.boolean,
            &b.number,
            &b.integer,
            &b.big_integer,
            &b.float,
            &b.rational,
            &b.symbol,
            &b.enumerable,
            &b.string,
            &b.array,
            &b.dictionary,
            &b.range,
            &b.method,
            &b.lambda,
            &b.regexp,
            &b.file,
            &b.process,
            &b.string_stream,
        ] {
            by_name.insert(class.name(), class.clone());
        }

        Rc::new(ClassRegistry { by_name, builtins })
    }

    /// Built-in class handles.
    pub fn builtins(&self) -> &BuiltinClasses {
        &self.builtins
    }

    /// Resolve a built-in class by name.
    pub fn lookup(&self, name: Name) -> Option<ClassHandle> {
        self.by_name.get(&name).cloned()
    }

    /// Every built-in class. The evaluator seeds the module namespace
    /// from this so class names resolve as ordinary identifiers.
    pub fn classes(&self) -> impl Iterator<Item = &ClassHandle> {
        self.by_name.values()
    }

    /// The class of a value.
    pub fn class_of(&self, value: &Value) -> ClassHandle {
        let b = &self.builtins;
        match value {
            Value::None => b.none.clone(),
            Value::Bool(_) => b.boolean.clone(),
            Value::Int(_) => b.integer.clone(),
            Value::BigInt(_) => b.big_integer.clone(),
            Value::Float(_) => b.float.clone(),
            Value::Rational(_) => b.rational.clone(),
            Value::Symbol(_) => b.symbol.clone(),
            Value::Str(_) => b.string.clone(),
            Value::Array(_) => b.array.clone(),
            Value::Dict(_) => b.dictionary.clone(),
            Value::Range(_) => b.range.clone(),
            Value::Regex(_) => b.regexp.clone(),
            Value::Instance(instance) => instance.class().clone(),
            Value::Class(_) => b.class.clone(),
            Value::Method(_) => b.method.clone(),
            Value::Lambda(_) => b.lambda.clone(),
            Value::External(external) => match external {
                crate::native::ExternalValue::File(_) => b.file.clone(),
                crate::native::ExternalValue::Process(_) => b.process.clone(),
                crate::native::ExternalValue::StringStream(_) => b.string_stream.clone(),
            },
        }
    }

    /// The class name of a value, as text.
    pub fn class_name_of(&self, value: &Value, interner: &StringInterner) -> String {
        interner.lookup(self.class_of(value).name()).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_wires_a_rooted_tree() {
        let interner = StringInterner::new();
        let registry = ClassRegistry::bootstrap(&interner);
        let b = registry.builtins();

        assert!(b.object.superclass().is_none());
        assert!(b.integer.has_ancestor(&b.number));
        assert!(b.integer.has_ancestor(&b.object));
        assert!(b.array.has_ancestor(&b.enumerable));
        assert!(!b.number.has_ancestor(&b.enumerable));
    }

    #[test]
    fn class_of_maps_builtin_values() {
        let interner = StringInterner::new();
        let registry = ClassRegistry::bootstrap(&interner);
        let b = registry.builtins();

        assert!(registry.class_of(&Value::int(1)).ptr_eq(&b.integer));
        assert!(registry.class_of(&Value::string("x")).ptr_eq(&b.string));
        assert!(registry
            .class_of(&Value::Class(b.range.clone()))
            .ptr_eq(&b.class));
    }

    #[test]
    fn method_resolution_walks_the_chain() {
        let interner = StringInterner::new();
        let registry = ClassRegistry::bootstrap(&interner);
        let b = registry.builtins();

        // `__neq__` is installed on Object only; Integer resolves it
        // through the chained records.
        let neq = interner.intern("__neq__");
        assert!(b.object.resolve_method(neq).is_some());
        assert!(b.integer.resolve_method(neq).is_some());
    }

    #[test]
    fn lookup_by_name() {
        let interner = StringInterner::new();
        let registry = ClassRegistry::bootstrap(&interner);
        let range = interner.intern("Range");
        assert!(registry.lookup(range).is_some());
        let ghost = interner.intern("Ghost");
        assert!(registry.lookup(ghost).is_none());
    }
}
