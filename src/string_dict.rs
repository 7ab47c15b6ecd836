//! String dictionary for deduplicating `JsString` instances.
//!
//! The lexer interns identifiers and literals through it, and the runtime
//! interns property names used by the intrinsics, so equal names share one
//! `Rc<str>` allocation.

use rustc_hash::FxHashMap;

use crate::value::{CheapClone, JsString};

/// A dictionary for deduplicating JsString instances.
pub struct StringDict {
    strings: FxHashMap<Box<str>, JsString>,
}

impl StringDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self {
            strings: FxHashMap::default(),
        }
    }

    /// Create a dictionary pre-populated with the names the runtime touches
    /// on almost every evaluation.
    pub fn with_common_strings() -> Self {
        let mut dict = Self::new();
        for s in COMMON_STRINGS {
            dict.get_or_insert(s);
        }
        dict
    }

    /// Get an existing string or insert a new one.
    pub fn get_or_insert(&mut self, s: &str) -> JsString {
        if let Some(existing) = self.strings.get(s) {
            return existing.cheap_clone();
        }
        let js_str = JsString::from(s);
        self.strings.insert(s.into(), js_str.cheap_clone());
        js_str
    }

    /// Get an existing string without inserting.
    pub fn get(&self, s: &str) -> Option<JsString> {
        self.strings.get(s).map(|s| s.cheap_clone())
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for StringDict {
    fn default() -> Self {
        Self::new()
    }
}

const COMMON_STRINGS: &[&str] = &[
    // Object properties
    "length",
    "prototype",
    "constructor",
    "__proto__",
    "name",
    "message",
    "cause",
    "stack",
    "arguments",
    "callee",
    "caller",
    // Property descriptors
    "value",
    "writable",
    "enumerable",
    "configurable",
    "get",
    "set",
    // Conversions
    "toString",
    "valueOf",
    "toJSON",
    "default",
    // Iteration and promises
    "next",
    "done",
    "return",
    "throw",
    "then",
    "resolve",
    "reject",
    // typeof results
    "undefined",
    "null",
    "boolean",
    "number",
    "string",
    "object",
    "function",
    "symbol",
];
