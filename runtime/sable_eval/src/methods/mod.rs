//! Built-in method tables.
//!
//! Every built-in behavior of the runtime is an ordinary method in a
//! class's `ReferenceRecord` table, installed here during the second
//! bootstrap phase. There is no special-cased operator evaluation:
//! `+` resolves `__add__` through the same tables user methods live in.
//!
//! Each built-in is registered under its canonical dunder key and a bare
//! alias, both holding the same `Reference`.

mod enumerable;
mod external;
mod numeric;
mod object;

use sable_ir::StringInterner;

use crate::class::{BuiltinClasses, ClassHandle};
use crate::value::{MethodValue, NativeFn, Value};

/// Populate every built-in class table. Runs once, at bootstrap.
pub(crate) fn install(builtins: &BuiltinClasses, interner: &StringInterner) {
    object::install(builtins, interner);
    numeric::install(builtins, interner);
    enumerable::install(builtins, interner);
    external::install(builtins, interner);
}

/// Register a native instance method under `__name__` and `name`.
pub(crate) fn define_method(
    class: &ClassHandle,
    interner: &StringInterner,
    name: &str,
    f: NativeFn,
) {
    let bare = interner.intern(name);
    let canonical = interner.intern(&format!("__{name}__"));
    let method = Value::method(MethodValue::native(bare, Some(class.name()), f));
    class
        .methods()
        .borrow_mut()
        .define_with_alias(canonical, bare, method);
}

/// Register a native class-level method under `__name__` and `name`.
pub(crate) fn define_static(
    class: &ClassHandle,
    interner: &StringInterner,
    name: &str,
    f: NativeFn,
) {
    let bare = interner.intern(name);
    let canonical = interner.intern(&format!("__{name}__"));
    let method = Value::method(MethodValue::native(bare, Some(class.name()), f));
    class
        .statics()
        .borrow_mut()
        .define_with_alias(canonical, bare, method);
}
