//! Type conversion abstract operations
//!
//! ToPrimitive, ToNumber, ToString, ToObject, ToPropertyKey and the integer
//! conversions, plus IsLooselyEqual which is defined in terms of them.

use crate::error::{JsError, JsResult};
use crate::interpreter::object::ObjectKind;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::{number_to_js_string, CheapClone, JsString, PropertyKey, Value};

/// Largest integer a Number represents exactly, 2^53 - 1.
pub const MAX_SAFE_INTEGER: f64 = 9007199254740991.0;

/// The preferred type passed to ToPrimitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hint {
    Default,
    Number,
    String,
}

impl Hint {
    fn as_str(self) -> &'static str {
        match self {
            Hint::Default => "default",
            Hint::Number => "number",
            Hint::String => "string",
        }
    }
}

/// WhiteSpace and LineTerminator code points, as StringToNumber trims them.
pub fn is_js_whitespace(c: char) -> bool {
    matches!(
        c,
        '\u{0009}'
            | '\u{000B}'
            | '\u{000C}'
            | '\u{0020}'
            | '\u{00A0}'
            | '\u{FEFF}'
            | '\u{000A}'
            | '\u{000D}'
            | '\u{2028}'
            | '\u{2029}'
    ) || (c != '\u{0085}' && c.is_whitespace() && !c.is_ascii())
}

/// StringToNumber
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(is_js_whitespace);
    if trimmed.is_empty() {
        return 0.0;
    }
    let radix_body = |prefix_lower: &str, prefix_upper: &str| {
        trimmed
            .strip_prefix(prefix_lower)
            .or_else(|| trimmed.strip_prefix(prefix_upper))
    };
    for (lower, upper, radix) in [("0x", "0X", 16), ("0o", "0O", 8), ("0b", "0B", 2)] {
        if let Some(body) = radix_body(lower, upper) {
            return parse_radix_digits(body, radix);
        }
    }
    let (sign, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if unsigned == "Infinity" {
        return sign * f64::INFINITY;
    }
    if !is_str_decimal_literal(unsigned) {
        return f64::NAN;
    }
    unsigned.parse::<f64>().map_or(f64::NAN, |n| sign * n)
}

/// Digits of a non-decimal integer literal; NaN on any invalid digit.
fn parse_radix_digits(body: &str, radix: u32) -> f64 {
    if body.is_empty() {
        return f64::NAN;
    }
    let mut value = 0.0f64;
    for c in body.chars() {
        let Some(digit) = c.to_digit(radix) else {
            return f64::NAN;
        };
        value = value * f64::from(radix) + f64::from(digit);
    }
    value
}

/// StrUnsignedDecimalLiteral without the `Infinity` form.
fn is_str_decimal_literal(s: &str) -> bool {
    let (mantissa, exponent) = match s.find(['e', 'E']) {
        Some(pos) => (s.get(..pos).unwrap_or(""), s.get(pos + 1..)),
        None => (s, None),
    };
    let mut parts = mantissa.splitn(2, '.');
    let int_part = parts.next().unwrap_or("");
    let frac_part = parts.next();
    let digits = |p: &str| p.bytes().all(|b| b.is_ascii_digit());
    if !digits(int_part) || !frac_part.is_none_or(digits) {
        return false;
    }
    if int_part.is_empty() && frac_part.is_none_or(str::is_empty) {
        return false;
    }
    match exponent {
        None => true,
        Some(exp) => {
            let exp = exp.strip_prefix(['+', '-']).unwrap_or(exp);
            !exp.is_empty() && digits(exp)
        }
    }
}

/// ToIntegerOrInfinity on an already-converted number.
pub fn integer_or_infinity(n: f64) -> f64 {
    if n.is_nan() || n == 0.0 {
        return 0.0;
    }
    if n.is_infinite() {
        return n;
    }
    n.trunc()
}

/// ToUint32 on an already-converted number.
pub fn f64_to_uint32(n: f64) -> u32 {
    if !n.is_finite() || n == 0.0 {
        return 0;
    }
    n.trunc().rem_euclid(4294967296.0) as u32
}

/// ToInt32 on an already-converted number.
pub fn f64_to_int32(n: f64) -> i32 {
    f64_to_uint32(n) as i32
}

impl Interpreter {
    /// ToPrimitive(input, preferredType)
    pub fn to_primitive(&self, value: &Value, hint: Hint) -> JsResult<Value> {
        let Value::Object(obj) = value else {
            return Ok(value.cheap_clone());
        };
        let key = PropertyKey::Symbol(self.well_known().to_primitive.cheap_clone());
        if let Some(exotic) = self.get_method(value, &key)? {
            let result = self.call(&exotic, value, &[Value::from(hint.as_str())])?;
            if result.is_object() {
                return Err(JsError::type_error("Cannot convert object to primitive value"));
            }
            return Ok(result);
        }
        let hint = if hint == Hint::String {
            Hint::String
        } else {
            Hint::Number
        };
        self.ordinary_to_primitive(*obj, hint)
    }

    /// OrdinaryToPrimitive(O, hint)
    pub fn ordinary_to_primitive(&self, obj: ObjectId, hint: Hint) -> JsResult<Value> {
        let order = if hint == Hint::String {
            ["toString", "valueOf"]
        } else {
            ["valueOf", "toString"]
        };
        for name in order {
            let method = self.get(obj, &self.key(name))?;
            if self.is_callable(&method) {
                let result = self.call(&method, &Value::Object(obj), &[])?;
                if !result.is_object() {
                    return Ok(result);
                }
            }
        }
        Err(JsError::type_error("Cannot convert object to primitive value"))
    }

    /// ToNumber(argument)
    pub fn to_number(&self, value: &Value) -> JsResult<f64> {
        Ok(match value {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Boolean(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => string_to_number(s.as_str()),
            Value::Symbol(_) => {
                return Err(JsError::type_error("Cannot convert a Symbol value to a number"));
            }
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Hint::Number)?;
                return self.to_number(&primitive);
            }
        })
    }

    /// ToIntegerOrInfinity(argument)
    pub fn to_integer_or_infinity(&self, value: &Value) -> JsResult<f64> {
        Ok(integer_or_infinity(self.to_number(value)?))
    }

    /// ToInt32(argument)
    pub fn to_int32(&self, value: &Value) -> JsResult<i32> {
        Ok(f64_to_int32(self.to_number(value)?))
    }

    /// ToUint32(argument)
    pub fn to_uint32(&self, value: &Value) -> JsResult<u32> {
        Ok(f64_to_uint32(self.to_number(value)?))
    }

    /// ToLength(argument)
    pub fn to_length(&self, value: &Value) -> JsResult<u64> {
        let len = self.to_integer_or_infinity(value)?;
        if len <= 0.0 {
            return Ok(0);
        }
        Ok(len.min(MAX_SAFE_INTEGER) as u64)
    }

    /// ToIndex(value)
    pub fn to_index(&self, value: &Value) -> JsResult<usize> {
        if value.is_undefined() {
            return Ok(0);
        }
        let integer = self.to_integer_or_infinity(value)?;
        if !(0.0..=MAX_SAFE_INTEGER).contains(&integer) {
            return Err(JsError::range_error("Invalid index"));
        }
        Ok(integer as usize)
    }

    /// ToString(argument)
    pub fn to_string(&self, value: &Value) -> JsResult<JsString> {
        Ok(match value {
            Value::Undefined => self.intern("undefined"),
            Value::Null => self.intern("null"),
            Value::Boolean(true) => self.intern("true"),
            Value::Boolean(false) => self.intern("false"),
            Value::Number(n) => number_to_js_string(*n),
            Value::String(s) => s.cheap_clone(),
            Value::Symbol(_) => {
                return Err(JsError::type_error("Cannot convert a Symbol value to a string"));
            }
            Value::Object(_) => {
                let primitive = self.to_primitive(value, Hint::String)?;
                return self.to_string(&primitive);
            }
        })
    }

    /// ToObject(argument)
    pub fn to_object(&self, value: &Value) -> JsResult<ObjectId> {
        let (proto, kind) = match value {
            Value::Object(obj) => return Ok(*obj),
            Value::Undefined | Value::Null => {
                return Err(JsError::type_error(format!(
                    "Cannot convert {} to object",
                    self.display(value)
                )));
            }
            Value::String(s) => return self.string_create(s.cheap_clone(), None),
            Value::Boolean(b) => (self.intrinsic(|i| i.boolean_prototype)?, ObjectKind::Boolean(*b)),
            Value::Number(n) => (self.intrinsic(|i| i.number_prototype)?, ObjectKind::Number(*n)),
            Value::Symbol(s) => (
                self.intrinsic(|i| i.symbol_prototype)?,
                ObjectKind::Symbol(s.cheap_clone()),
            ),
        };
        Ok(self.object_create(Some(proto), kind))
    }

    /// RequireObjectCoercible(argument)
    pub fn require_object_coercible(&self, value: &Value) -> JsResult<()> {
        if value.is_nullish() {
            return Err(JsError::type_error(format!(
                "Cannot convert {} to object",
                self.display(value)
            )));
        }
        Ok(())
    }

    /// ToPropertyKey(argument)
    pub fn to_property_key(&self, value: &Value) -> JsResult<PropertyKey> {
        match value {
            Value::String(s) => Ok(PropertyKey::from(s.cheap_clone())),
            Value::Symbol(s) => Ok(PropertyKey::Symbol(s.cheap_clone())),
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 && *n < 4294967295.0 => {
                Ok(PropertyKey::Index(*n as u32))
            }
            Value::Object(_) => {
                let key = self.to_primitive(value, Hint::String)?;
                self.to_property_key(&key)
            }
            other => Ok(PropertyKey::from(self.to_string(other)?)),
        }
    }

    /// IsLooselyEqual(x, y)
    pub fn is_loosely_equal(&self, x: &Value, y: &Value) -> JsResult<bool> {
        match (x, y) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => Ok(true),
            (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Boolean(_), Value::Boolean(_))
            | (Value::Symbol(_), Value::Symbol(_))
            | (Value::Object(_), Value::Object(_)) => Ok(x.strict_equals(y)),
            (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => {
                Ok(*n == string_to_number(s.as_str()))
            }
            (Value::Boolean(b), other) | (other, Value::Boolean(b)) => {
                self.is_loosely_equal(&Value::Number(f64::from(u8::from(*b))), other)
            }
            (Value::Object(_), Value::Number(_) | Value::String(_) | Value::Symbol(_)) => {
                let primitive = self.to_primitive(x, Hint::Default)?;
                self.is_loosely_equal(&primitive, y)
            }
            (Value::Number(_) | Value::String(_) | Value::Symbol(_), Value::Object(_)) => {
                let primitive = self.to_primitive(y, Hint::Default)?;
                self.is_loosely_equal(x, &primitive)
            }
            _ => Ok(false),
        }
    }
}
