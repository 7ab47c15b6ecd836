//! JavaScript value representation
//!
//! The core `Value` type plus the primitive payloads (`JsString`, `JsSymbol`)
//! and property keys. Objects are arena handles; everything that needs to look
//! inside an object goes through the interpreter.

use std::fmt;
use std::rc::Rc;

use crate::interpreter::ObjectId;

/// Trait for types that have cheap (O(1), reference-counted) clones.
///
/// This trait makes it explicit when a clone is cheap (just incrementing a reference count
/// or copying a handle) vs when it might be expensive (copying data).
pub trait CheapClone: Clone {
    /// Create a cheap clone of this value.
    fn cheap_clone(&self) -> Self {
        self.clone()
    }
}

impl<T: ?Sized> CheapClone for Rc<T> {}

/// An ECMAScript language value
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
    Symbol(JsSymbol),
    Object(ObjectId),
}

impl CheapClone for Value {}

impl Value {
    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is null or undefined
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Null | Value::Undefined)
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Value::Object(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&JsString> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// ToBoolean. Never observable, so it lives on the value itself.
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Symbol(_) | Value::Object(_) => true,
        }
    }

    /// IsStrictlyEqual (`===`)
    pub fn strict_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }

    /// SameValue: like `===` but NaN equals NaN and +0 differs from -0.
    pub fn same_value(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => {
                if a.is_nan() && b.is_nan() {
                    return true;
                }
                a == b && a.is_sign_negative() == b.is_sign_negative()
            }
            _ => self.strict_equals(other),
        }
    }

    /// SameValueZero: like SameValue but +0 equals -0.
    pub fn same_value_zero(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => (a.is_nan() && b.is_nan()) || a == b,
            _ => self.strict_equals(other),
        }
    }
}

/// Values compare with SameValueZero semantics, so `NaN == NaN` holds in
/// host code and tests.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.same_value_zero(other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(s) => write!(f, "{}", s.descriptive_string()),
            Value::Object(id) => write!(f, "Object({:?})", id),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(JsString::from(s))
    }
}

impl From<JsString> for Value {
    fn from(s: JsString) -> Self {
        Value::String(s)
    }
}

impl From<JsSymbol> for Value {
    fn from(s: JsSymbol) -> Self {
        Value::Symbol(s)
    }
}

impl From<ObjectId> for Value {
    fn from(id: ObjectId) -> Self {
        Value::Object(id)
    }
}

impl From<Option<ObjectId>> for Value {
    fn from(id: Option<ObjectId>) -> Self {
        match id {
            Some(id) => Value::Object(id),
            None => Value::Null,
        }
    }
}

// ===== Strings =====

/// Reference-counted string for efficient string handling
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JsString(Rc<str>);

// JsString wraps Rc<str>, so clone is cheap (just reference count increment)
impl CheapClone for JsString {}

impl JsString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length in UTF-16 code units, which is what `length` reports.
    pub fn utf16_len(&self) -> usize {
        if self.0.is_ascii() {
            self.0.len()
        } else {
            self.0.chars().map(char::len_utf16).sum()
        }
    }

    pub fn code_units(&self) -> Vec<u16> {
        self.0.encode_utf16().collect()
    }

    /// Build a string from UTF-16 code units. Lone surrogates become U+FFFD.
    pub fn from_utf16(units: &[u16]) -> Self {
        JsString::from(String::from_utf16_lossy(units))
    }

    pub fn concat(&self, other: &JsString) -> JsString {
        if self.is_empty() {
            return other.cheap_clone();
        }
        if other.is_empty() {
            return self.cheap_clone();
        }
        let mut s = String::with_capacity(self.0.len() + other.0.len());
        s.push_str(&self.0);
        s.push_str(&other.0);
        JsString::from(s)
    }

    pub fn parse<F: std::str::FromStr>(&self) -> Result<F, F::Err> {
        self.0.parse()
    }
}

impl Default for JsString {
    fn default() -> Self {
        JsString::from("")
    }
}

impl AsRef<str> for JsString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for JsString {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for JsString {
    fn eq(&self, other: &str) -> bool {
        self.0.as_ref() == other
    }
}

impl PartialEq<&str> for JsString {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_ref() == *other
    }
}

impl From<&str> for JsString {
    fn from(s: &str) -> Self {
        JsString(s.into())
    }
}

impl From<String> for JsString {
    fn from(s: String) -> Self {
        JsString(s.into())
    }
}

impl fmt::Debug for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0)
    }
}

impl fmt::Display for JsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ===== Symbols =====

#[derive(Debug)]
struct SymbolData {
    id: u64,
    description: Option<JsString>,
}

/// ECMAScript Symbol primitive. Identity is the allocation id, never the
/// description.
#[derive(Clone)]
pub struct JsSymbol(Rc<SymbolData>);

impl CheapClone for JsSymbol {}

impl JsSymbol {
    pub fn new(id: u64, description: Option<JsString>) -> Self {
        JsSymbol(Rc::new(SymbolData { id, description }))
    }

    pub fn id(&self) -> u64 {
        self.0.id
    }

    pub fn description(&self) -> Option<&JsString> {
        self.0.description.as_ref()
    }

    /// SymbolDescriptiveString: `Symbol(desc)`.
    pub fn descriptive_string(&self) -> JsString {
        match &self.0.description {
            Some(desc) => JsString::from(format!("Symbol({})", desc)),
            None => JsString::from("Symbol()"),
        }
    }
}

impl PartialEq for JsSymbol {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for JsSymbol {}

impl std::hash::Hash for JsSymbol {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for JsSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.descriptive_string(), self.0.id)
    }
}

// ===== Property keys =====

/// Property key. `Index` is used exactly for canonical array indices
/// (0 ..= 2^32 - 2); every other string, including "4294967295", is `String`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    Index(u32),
    String(JsString),
    Symbol(JsSymbol),
}

impl CheapClone for PropertyKey {}

impl PropertyKey {
    pub fn is_symbol(&self) -> bool {
        matches!(self, PropertyKey::Symbol(_))
    }

    pub fn is_string(&self) -> bool {
        !self.is_symbol()
    }

    pub fn as_index(&self) -> Option<u32> {
        match self {
            PropertyKey::Index(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_symbol(&self) -> Option<&JsSymbol> {
        match self {
            PropertyKey::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Check if this key equals a string literal (avoids allocation)
    #[inline]
    pub fn eq_str(&self, s: &str) -> bool {
        match self {
            PropertyKey::String(js_str) => js_str.as_str() == s,
            PropertyKey::Index(_) | PropertyKey::Symbol(_) => false,
        }
    }

    /// The key as a string, or `None` for symbols.
    pub fn to_js_string(&self) -> Option<JsString> {
        match self {
            PropertyKey::String(s) => Some(s.cheap_clone()),
            PropertyKey::Index(i) => Some(JsString::from(i.to_string())),
            PropertyKey::Symbol(_) => None,
        }
    }

    /// The key as a language value (strings for index keys).
    pub fn to_value(&self) -> Value {
        match self {
            PropertyKey::String(s) => Value::String(s.cheap_clone()),
            PropertyKey::Index(i) => Value::String(JsString::from(i.to_string())),
            PropertyKey::Symbol(s) => Value::Symbol(s.cheap_clone()),
        }
    }

    /// The key formatted for a function `name` ("[desc]" for symbols).
    pub fn to_function_name(&self) -> JsString {
        match self {
            PropertyKey::Symbol(s) => match s.description() {
                Some(desc) => JsString::from(format!("[{}]", desc)),
                None => JsString::default(),
            },
            other => other.to_js_string().unwrap_or_default(),
        }
    }
}

fn parse_array_index(s: &str) -> Option<u32> {
    let first = s.bytes().next()?;
    if !first.is_ascii_digit() || (first == b'0' && s.len() > 1) {
        return None;
    }
    if !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match s.parse::<u32>() {
        Ok(idx) if idx != u32::MAX => Some(idx),
        _ => None,
    }
}

impl From<&str> for PropertyKey {
    #[inline]
    fn from(s: &str) -> Self {
        match parse_array_index(s) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(JsString::from(s)),
        }
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        match parse_array_index(&s) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(JsString::from(s)),
        }
    }
}

impl From<JsString> for PropertyKey {
    #[inline]
    fn from(s: JsString) -> Self {
        match parse_array_index(s.as_str()) {
            Some(idx) => PropertyKey::Index(idx),
            None => PropertyKey::String(s),
        }
    }
}

impl From<u32> for PropertyKey {
    fn from(idx: u32) -> Self {
        if idx == u32::MAX {
            PropertyKey::String(JsString::from(idx.to_string()))
        } else {
            PropertyKey::Index(idx)
        }
    }
}

impl From<usize> for PropertyKey {
    fn from(idx: usize) -> Self {
        match u32::try_from(idx) {
            Ok(i) => PropertyKey::from(i),
            Err(_) => PropertyKey::String(JsString::from(idx.to_string())),
        }
    }
}

impl From<JsSymbol> for PropertyKey {
    fn from(s: JsSymbol) -> Self {
        PropertyKey::Symbol(s)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{}", s),
            PropertyKey::Index(i) => write!(f, "{}", i),
            PropertyKey::Symbol(s) => write!(f, "{}", s.descriptive_string()),
        }
    }
}

// ===== Number formatting =====

/// Number::toString(x) for radix 10.
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let mut buf = ryu_js::Buffer::new();
    buf.format(n).to_string()
}

pub fn number_to_js_string(n: f64) -> JsString {
    JsString::from(number_to_string(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_index_keys() {
        assert_eq!(PropertyKey::from("0"), PropertyKey::Index(0));
        assert_eq!(PropertyKey::from("42"), PropertyKey::Index(42));
        assert!(matches!(PropertyKey::from("042"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::from("-1"), PropertyKey::String(_)));
        assert!(matches!(PropertyKey::from("1.5"), PropertyKey::String(_)));
        assert!(matches!(
            PropertyKey::from("4294967295"),
            PropertyKey::String(_)
        ));
        assert_eq!(
            PropertyKey::from("4294967294"),
            PropertyKey::Index(4_294_967_294)
        );
        assert!(matches!(PropertyKey::from(u32::MAX), PropertyKey::String(_)));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number_to_string(1e21), "1e+21");
        assert_eq!(number_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(number_to_string(f64::NAN), "NaN");
    }

    #[test]
    fn same_value_distinguishes_zeroes() {
        assert!(!Value::Number(0.0).same_value(&Value::Number(-0.0)));
        assert!(Value::Number(0.0).same_value_zero(&Value::Number(-0.0)));
        assert!(Value::Number(f64::NAN).same_value(&Value::Number(f64::NAN)));
        assert!(!Value::Number(f64::NAN).strict_equals(&Value::Number(f64::NAN)));
    }

    #[test]
    fn utf16_length() {
        assert_eq!(JsString::from("abc").utf16_len(), 3);
        assert_eq!(JsString::from("😀").utf16_len(), 2);
    }
}
