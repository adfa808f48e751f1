//! String interner backing `Name` identifiers.
//!
//! Interned strings are leaked to obtain `'static` lifetime, so lookups
//! can hand out references without lifetime plumbing. The runtime interns
//! identifiers, method names, and symbol literals; the set of distinct
//! strings in a program is small and lives for the whole process.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::Name;

/// Error when interning a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternError {
    /// Interner exceeded `u32` capacity.
    Overflow { count: usize },
}

impl std::fmt::Display for InternError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InternError::Overflow { count } => {
                write!(f, "interner exceeded capacity: {count} strings")
            }
        }
    }
}

impl std::error::Error for InternError {}

struct InternTable {
    /// Map from string content to index.
    map: FxHashMap<&'static str, u32>,
    /// Storage for string contents, indexed by `Name::raw()`.
    strings: Vec<&'static str>,
}

/// String interner producing `Name` handles.
///
/// O(1) lookup and equality comparison for interned strings. The empty
/// string is pre-interned as `Name::EMPTY`, and the identifiers the
/// runtime itself dispatches on (`self`, `return`, dunder method names)
/// are pre-interned so hot paths never hit the write lock.
pub struct StringInterner {
    table: RwLock<InternTable>,
}

impl StringInterner {
    /// Create a new interner with pre-interned runtime names.
    pub fn new() -> Self {
        let mut table = InternTable {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty: &'static str = "";
        table.map.insert(empty, 0);
        table.strings.push(empty);

        let interner = Self {
            table: RwLock::new(table),
        };
        interner.pre_intern_runtime_names();
        interner
    }

    /// Try to intern a string, returning its `Name` or an error on overflow.
    pub fn try_intern(&self, s: &str) -> Result<Name, InternError> {
        // Fast path: already interned.
        {
            let guard = self.table.read();
            if let Some(&index) = guard.map.get(s) {
                return Ok(Name::from_raw(index));
            }
        }

        let mut guard = self.table.write();

        // Double-check after acquiring the write lock.
        if let Some(&index) = guard.map.get(s) {
            return Ok(Name::from_raw(index));
        }

        // Leak the string to get 'static lifetime.
        let leaked: &'static str = Box::leak(s.to_owned().into_boxed_str());

        let index = u32::try_from(guard.strings.len()).map_err(|_| InternError::Overflow {
            count: guard.strings.len(),
        })?;
        guard.strings.push(leaked);
        guard.map.insert(leaked, index);
        Ok(Name::from_raw(index))
    }

    /// Intern a string, returning its `Name`.
    ///
    /// # Panics
    /// Panics if the interner exceeds `u32` capacity. Use `try_intern`
    /// for fallible interning.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        self.try_intern(s).unwrap_or_else(|e| panic!("{}", e))
    }

    /// Look up the string for a `Name`.
    pub fn lookup(&self, name: Name) -> &str {
        self.lookup_static(name)
    }

    /// Look up the string for a `Name`, returning a `'static` reference.
    ///
    /// Safe because interned strings are leaked and never deallocated.
    pub fn lookup_static(&self, name: Name) -> &'static str {
        let guard = self.table.read();
        guard.strings[name.raw() as usize]
    }

    /// Number of interned strings.
    pub fn len(&self) -> usize {
        self.table.read().strings.len()
    }

    /// Check if the interner only holds the empty string.
    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    /// Pre-intern names the runtime dispatches on directly.
    fn pre_intern_runtime_names(&self) {
        const RUNTIME_NAMES: &[&str] = &[
            // Implicit bindings
            "self",
            "return",
            // Entry point
            "main",
            // Universal protocol (root class)
            "str",
            "bool",
            "not",
            "eq",
            "neq",
            "lt",
            "le",
            "gt",
            "ge",
            // Enumerable protocol
            "getItem",
            "setItem",
            "size",
            "each",
            // Instantiation
            "new",
            // Operator dunders
            "__add__",
            "__sub__",
            "__mul__",
            "__div__",
            "__mod__",
            "__pow__",
            "__eq__",
            "__lt__",
        ];
        for name in RUNTIME_NAMES {
            self.intern(name);
        }
    }
}

impl Default for StringInterner {
    fn default() -> Self {
        Self::new()
    }
}

/// Trait for looking up interned string names.
///
/// Lets value types format themselves against any interner-like source
/// without depending on `StringInterner` directly.
pub trait StringLookup {
    /// Look up the string for an interned name.
    fn lookup(&self, name: Name) -> &str;
}

impl StringLookup for StringInterner {
    fn lookup(&self, name: Name) -> &str {
        StringInterner::lookup(self, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_and_lookup() {
        let interner = StringInterner::new();

        let hello = interner.intern("hello");
        let world = interner.intern("world");
        let hello2 = interner.intern("hello");

        assert_eq!(hello, hello2);
        assert_ne!(hello, world);

        assert_eq!(interner.lookup(hello), "hello");
        assert_eq!(interner.lookup(world), "world");
    }

    #[test]
    fn empty_string_is_name_empty() {
        let interner = StringInterner::new();
        let empty = interner.intern("");
        assert_eq!(empty, Name::EMPTY);
        assert_eq!(interner.lookup(Name::EMPTY), "");
    }

    #[test]
    fn runtime_names_pre_interned() {
        let interner = StringInterner::new();
        let before = interner.len();
        interner.intern("self");
        interner.intern("__add__");
        // Pre-interned, so no growth.
        assert_eq!(interner.len(), before);
    }

    #[test]
    fn lookup_static_outlives_guard() {
        let interner = StringInterner::new();
        let name = interner.intern("durable");
        let s: &'static str = interner.lookup_static(name);
        interner.intern("another");
        assert_eq!(s, "durable");
    }
}
