//! The String constructor and String.prototype
//!
//! Strings are stored as UTF-8 but indexed in UTF-16 code units, so
//! index-based methods work on `code_units()` and rebuild the result.

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::conversions::is_js_whitespace;
use crate::interpreter::object::ObjectKind;
use crate::interpreter::operators::compare_code_units;
use crate::interpreter::Interpreter;
use crate::value::{CheapClone, JsString, PropertyKey, Value};

use unicode_normalization::{
    IsNormalized, UnicodeNormalization, is_nfc_quick, is_nfd_quick, is_nfkc_quick, is_nfkd_quick,
};

/// Upper bound on the length of a string built by `repeat` and `padStart`.
const MAX_STRING_LENGTH: usize = (1 << 30) - 25;

/// String(value)
pub fn string_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = match call.args.first() {
        None => JsString::default(),
        Some(Value::Symbol(symbol)) if call.new_target.is_none() => symbol.descriptive_string(),
        Some(value) => interp.to_string(value)?,
    };
    let Some(new_target) = call.new_target else {
        return Ok(Value::String(s));
    };
    let proto = interp.get_prototype_from_constructor(new_target, |i| i.string_prototype)?;
    Ok(Value::Object(interp.string_create(s, Some(proto))?))
}

/// thisStringValue(value)
fn this_string_value(interp: &Interpreter, value: &Value) -> JsResult<JsString> {
    match value {
        Value::String(s) => Ok(s.cheap_clone()),
        Value::Object(obj) => interp
            .object(*obj, |d| match &d.kind {
                ObjectKind::String(s) => Some(s.cheap_clone()),
                _ => None,
            })?
            .ok_or_else(|| JsError::type_error("String.prototype.valueOf requires that 'this' be a String")),
        _ => Err(JsError::type_error("String.prototype.valueOf requires that 'this' be a String")),
    }
}

/// RequireObjectCoercible(this) then ToString.
fn this_str(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<JsString> {
    interp.require_object_coercible(call.this)?;
    interp.to_string(call.this)
}

/// IsRegExp(argument): objects with a truthy `@@match`.
fn is_regexp(interp: &Interpreter, value: &Value) -> JsResult<bool> {
    let Value::Object(obj) = value else {
        return Ok(false);
    };
    let key = PropertyKey::Symbol(interp.well_known().match_.cheap_clone());
    Ok(interp.get(*obj, &key)?.to_boolean())
}

fn string_arg_not_regexp(interp: &Interpreter, value: &Value, method: &str) -> JsResult<JsString> {
    if is_regexp(interp, value)? {
        return Err(JsError::type_error(format!(
            "First argument to String.prototype.{} must not be a regular expression",
            method
        )));
    }
    interp.to_string(value)
}

/// StringIndexOf(string, searchValue, fromIndex) over code units.
fn index_of(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return (from <= haystack.len()).then_some(from);
    }
    let last = haystack.len().checked_sub(needle.len())?;
    (from..=last).find(|&i| haystack.get(i..i + needle.len()) == Some(needle))
}

fn last_index_of(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    let last = haystack.len().checked_sub(needle.len())?;
    (0..=from.min(last))
        .rev()
        .find(|&i| haystack.get(i..i + needle.len()) == Some(needle))
}

fn units_to_value(units: &[u16]) -> Value {
    Value::String(JsString::from_utf16(units))
}

fn units_slice(units: &[u16], start: usize, end: usize) -> Value {
    units_to_value(units.get(start..end.max(start)).unwrap_or_default())
}

/// Clamp a relative position argument into `0..=len`.
fn relative_position(interp: &Interpreter, value: &Value, len: usize, default: usize) -> JsResult<usize> {
    if value.is_undefined() {
        return Ok(default);
    }
    let n = interp.to_integer_or_infinity(value)?;
    Ok(if n < 0.0 {
        (len as f64 + n).max(0.0) as usize
    } else {
        n.min(len as f64) as usize
    })
}

/// Clamp an absolute position argument into `0..=len`.
fn clamped_position(interp: &Interpreter, value: &Value, len: usize) -> JsResult<usize> {
    Ok(interp.to_integer_or_infinity(value)?.clamp(0.0, len as f64) as usize)
}

// ============ STATICS ============

/// String.fromCharCode(...codeUnits)
fn string_from_char_code(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = call
        .args
        .iter()
        .map(|v| interp.to_number(v).map(|n| crate::interpreter::conversions::f64_to_uint32(n) as u16))
        .collect::<JsResult<Vec<u16>>>()?;
    Ok(units_to_value(&units))
}

/// String.fromCodePoint(...codePoints)
fn string_from_code_point(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let mut out = Vec::new();
    for value in call.args {
        let n = interp.to_number(value)?;
        if n.fract() != 0.0 || !(0.0..=1_114_111.0).contains(&n) {
            return Err(JsError::range_error(format!(
                "Invalid code point {}",
                interp.display(value)
            )));
        }
        let code_point = n as u32;
        match char::from_u32(code_point) {
            Some(c) => {
                let mut buf = [0u16; 2];
                out.extend_from_slice(c.encode_utf16(&mut buf));
            }
            None => out.push(code_point as u16),
        }
    }
    Ok(units_to_value(&out))
}

/// String.raw(template, ...substitutions)
fn string_raw(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let cooked = interp.to_object(&call.arg(0))?;
    let raw = interp.get(cooked, &interp.key("raw"))?;
    let literals = interp.to_object(&raw)?;
    let count = interp.length_of_array_like(literals)?;
    let mut out = String::new();
    for index in 0..count {
        let segment = interp.get(literals, &PropertyKey::from(index as usize))?;
        out.push_str(interp.to_string(&segment)?.as_str());
        if index + 1 == count {
            break;
        }
        if let Some(sub) = call.args.get(index as usize + 1) {
            out.push_str(interp.to_string(sub)?.as_str());
        }
    }
    Ok(Value::from(out))
}

// ============ ACCESS ============

fn string_at(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let relative = interp.to_integer_or_infinity(&call.arg(0))?;
    let k = if relative >= 0.0 { relative } else { units.len() as f64 + relative };
    if k < 0.0 || k >= units.len() as f64 {
        return Ok(Value::Undefined);
    }
    Ok(units_slice(&units, k as usize, k as usize + 1))
}

fn string_char_at(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let pos = interp.to_integer_or_infinity(&call.arg(0))?;
    if pos < 0.0 || pos >= units.len() as f64 {
        return Ok(Value::from(""));
    }
    Ok(units_slice(&units, pos as usize, pos as usize + 1))
}

fn string_char_code_at(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let pos = interp.to_integer_or_infinity(&call.arg(0))?;
    if pos < 0.0 {
        return Ok(Value::Number(f64::NAN));
    }
    Ok(Value::Number(
        units.get(pos as usize).map_or(f64::NAN, |u| f64::from(*u)),
    ))
}

fn string_code_point_at(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let pos = interp.to_integer_or_infinity(&call.arg(0))?;
    if pos < 0.0 {
        return Ok(Value::Undefined);
    }
    let pos = pos as usize;
    let Some(&first) = units.get(pos) else {
        return Ok(Value::Undefined);
    };
    let code_point = match units.get(pos + 1) {
        Some(&second) if (0xD800..0xDC00).contains(&first) && (0xDC00..0xE000).contains(&second) => {
            0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
        }
        _ => u32::from(first),
    };
    Ok(Value::Number(f64::from(code_point)))
}

// ============ SEARCH ============

fn string_index_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let search = interp.to_string(&call.arg(0))?.code_units();
    let pos = clamped_position(interp, &call.arg(1), units.len())?;
    Ok(Value::Number(index_of(&units, &search, pos).map_or(-1.0, |i| i as f64)))
}

fn string_last_index_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let search = interp.to_string(&call.arg(0))?.code_units();
    let num_pos = interp.to_number(&call.arg(1))?;
    let pos = if num_pos.is_nan() {
        units.len()
    } else {
        crate::interpreter::conversions::integer_or_infinity(num_pos).clamp(0.0, units.len() as f64) as usize
    };
    Ok(Value::Number(last_index_of(&units, &search, pos).map_or(-1.0, |i| i as f64)))
}

fn string_includes(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let search = string_arg_not_regexp(interp, &call.arg(0), "includes")?.code_units();
    let pos = clamped_position(interp, &call.arg(1), units.len())?;
    Ok(Value::Boolean(index_of(&units, &search, pos).is_some()))
}

fn string_starts_with(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let search = string_arg_not_regexp(interp, &call.arg(0), "startsWith")?.code_units();
    let start = clamped_position(interp, &call.arg(1), units.len())?;
    let matches = units.get(start..).is_some_and(|rest| rest.starts_with(&search));
    Ok(Value::Boolean(matches))
}

fn string_ends_with(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let search = string_arg_not_regexp(interp, &call.arg(0), "endsWith")?.code_units();
    let end = match call.arg(1) {
        Value::Undefined => units.len(),
        end => clamped_position(interp, &end, units.len())?,
    };
    let matches = units.get(..end).is_some_and(|head| head.ends_with(&search));
    Ok(Value::Boolean(matches))
}

fn string_locale_compare(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = this_str(interp, call)?;
    let that = interp.to_string(&call.arg(0))?;
    let ordering = compare_code_units(s.as_str(), that.as_str());
    Ok(Value::Number(ordering as i8 as f64))
}

// ============ EXTRACTION ============

fn string_slice(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let len = units.len();
    let from = relative_position(interp, &call.arg(0), len, 0)?;
    let to = relative_position(interp, &call.arg(1), len, len)?;
    Ok(units_slice(&units, from, to))
}

fn string_substring(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let len = units.len();
    let start = clamped_position(interp, &call.arg(0), len)?;
    let end = match call.arg(1) {
        Value::Undefined => len,
        end => clamped_position(interp, &end, len)?,
    };
    Ok(units_slice(&units, start.min(end), start.max(end)))
}

fn string_substr(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let units = this_str(interp, call)?.code_units();
    let len = units.len();
    let start = relative_position(interp, &call.arg(0), len, 0)?;
    let count = match call.arg(1) {
        Value::Undefined => len,
        n => interp.to_integer_or_infinity(&n)?.clamp(0.0, len as f64) as usize,
    };
    Ok(units_slice(&units, start, (start + count).min(len)))
}

fn string_concat(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let mut s = this_str(interp, call)?;
    for arg in call.args {
        s = s.concat(&interp.to_string(arg)?);
    }
    Ok(Value::String(s))
}

// ============ TRANSFORMATION ============

fn string_to_lower_case(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::from(this_str(interp, call)?.as_str().to_lowercase()))
}

fn string_to_upper_case(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::from(this_str(interp, call)?.as_str().to_uppercase()))
}

fn string_trim(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::from(this_str(interp, call)?.as_str().trim_matches(is_js_whitespace)))
}

fn string_trim_start(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::from(this_str(interp, call)?.as_str().trim_start_matches(is_js_whitespace)))
}

fn string_trim_end(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::from(this_str(interp, call)?.as_str().trim_end_matches(is_js_whitespace)))
}

fn string_repeat(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = this_str(interp, call)?;
    let n = interp.to_integer_or_infinity(&call.arg(0))?;
    if n < 0.0 || n == f64::INFINITY {
        return Err(JsError::range_error(format!("Invalid count value: {}", n)));
    }
    if s.is_empty() || n == 0.0 {
        return Ok(Value::from(""));
    }
    if n * s.utf16_len() as f64 > MAX_STRING_LENGTH as f64 {
        return Err(JsError::range_error("Invalid string length"));
    }
    Ok(Value::from(s.as_str().repeat(n as usize)))
}

/// StringPad(S, maxLength, fillString, placement)
fn pad(interp: &Interpreter, call: &NativeCall<'_>, at_start: bool) -> JsResult<Value> {
    let s = this_str(interp, call)?;
    let max_length = interp.to_length(&call.arg(0))?;
    let len = s.utf16_len() as u64;
    if max_length <= len {
        return Ok(Value::String(s));
    }
    let filler = match call.arg(1) {
        Value::Undefined => vec![0x20u16],
        fill => interp.to_string(&fill)?.code_units(),
    };
    if filler.is_empty() {
        return Ok(Value::String(s));
    }
    if max_length > MAX_STRING_LENGTH as u64 {
        return Err(JsError::range_error("Invalid string length"));
    }
    let fill_len = (max_length - len) as usize;
    let padding: Vec<u16> = filler.iter().copied().cycle().take(fill_len).collect();
    let units = s.code_units();
    let joined: Vec<u16> = if at_start {
        padding.into_iter().chain(units).collect()
    } else {
        units.into_iter().chain(padding).collect()
    };
    Ok(units_to_value(&joined))
}

fn string_pad_start(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    pad(interp, call, true)
}

fn string_pad_end(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    pad(interp, call, false)
}

/// GetSubstitution for a string pattern (no captures).
fn get_substitution(matched: &[u16], string: &[u16], position: usize, replacement: &[u16]) -> Vec<u16> {
    let mut out = Vec::with_capacity(replacement.len());
    let tail_pos = (position + matched.len()).min(string.len());
    let mut i = 0;
    while let Some(&unit) = replacement.get(i) {
        if unit != u16::from(b'$') {
            out.push(unit);
            i += 1;
            continue;
        }
        match replacement.get(i + 1).copied() {
            Some(0x24) => {
                out.push(0x24);
                i += 2;
            }
            Some(0x26) => {
                out.extend_from_slice(matched);
                i += 2;
            }
            Some(0x60) => {
                out.extend_from_slice(string.get(..position).unwrap_or_default());
                i += 2;
            }
            Some(0x27) => {
                out.extend_from_slice(string.get(tail_pos..).unwrap_or_default());
                i += 2;
            }
            _ => {
                out.push(unit);
                i += 1;
            }
        }
    }
    out
}

fn replace_impl(interp: &Interpreter, call: &NativeCall<'_>, all: bool) -> JsResult<Value> {
    interp.require_object_coercible(call.this)?;
    let search_value = call.arg(0);
    let replace_value = call.arg(1);
    if !search_value.is_nullish() {
        if all && is_regexp(interp, &search_value)? {
            let flags = interp.get_v(&search_value, &interp.key("flags"))?;
            interp.require_object_coercible(&flags)?;
            if !interp.to_string(&flags)?.as_str().contains('g') {
                return Err(JsError::type_error("replaceAll must be called with a global RegExp"));
            }
        }
        let key = PropertyKey::Symbol(interp.well_known().replace.cheap_clone());
        if let Some(replacer) = interp.get_method(&search_value, &key)? {
            return interp.call(&replacer, &search_value, &[call.this.cheap_clone(), replace_value]);
        }
    }
    let string = interp.to_string(call.this)?;
    let search_string = interp.to_string(&search_value)?;
    let functional = interp.is_callable(&replace_value);
    let template = if functional {
        Vec::new()
    } else {
        interp.to_string(&replace_value)?.code_units()
    };

    let units = string.code_units();
    let search = search_string.code_units();
    let advance = search.len().max(1);
    let mut positions = Vec::new();
    let mut next = index_of(&units, &search, 0);
    while let Some(position) = next {
        positions.push(position);
        if !all {
            break;
        }
        next = index_of(&units, &search, position + advance);
    }
    if positions.is_empty() {
        return Ok(Value::String(string));
    }

    let mut end_of_last_match = 0;
    let mut result: Vec<u16> = Vec::with_capacity(units.len());
    for position in positions {
        result.extend_from_slice(units.get(end_of_last_match..position).unwrap_or_default());
        let replacement = if functional {
            let value = interp.call(
                &replace_value,
                &Value::Undefined,
                &[
                    Value::String(search_string.cheap_clone()),
                    Value::Number(position as f64),
                    Value::String(string.cheap_clone()),
                ],
            )?;
            interp.to_string(&value)?.code_units()
        } else {
            get_substitution(&search, &units, position, &template)
        };
        result.extend(replacement);
        end_of_last_match = position + search.len();
    }
    result.extend_from_slice(units.get(end_of_last_match..).unwrap_or_default());
    Ok(units_to_value(&result))
}

fn string_replace(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    replace_impl(interp, call, false)
}

fn string_replace_all(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    replace_impl(interp, call, true)
}

fn string_split(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    interp.require_object_coercible(call.this)?;
    let separator = call.arg(0);
    let limit = call.arg(1);
    if !separator.is_nullish() {
        let key = PropertyKey::Symbol(interp.well_known().split.cheap_clone());
        if let Some(splitter) = interp.get_method(&separator, &key)? {
            return interp.call(&splitter, &separator, &[call.this.cheap_clone(), limit]);
        }
    }
    let string = interp.to_string(call.this)?;
    let lim = match limit {
        Value::Undefined => u32::MAX,
        limit => interp.to_uint32(&limit)?,
    } as usize;
    let separator_string = interp.to_string(&separator)?;
    if lim == 0 {
        return Ok(Value::Object(interp.create_array_from_list(Vec::new())?));
    }
    if separator.is_undefined() {
        return Ok(Value::Object(interp.create_array_from_list(vec![Value::String(string)])?));
    }
    let units = string.code_units();
    let sep = separator_string.code_units();
    if sep.is_empty() {
        let parts = units.iter().take(lim).map(|u| units_to_value(&[*u])).collect();
        return Ok(Value::Object(interp.create_array_from_list(parts)?));
    }
    if units.is_empty() {
        return Ok(Value::Object(interp.create_array_from_list(vec![Value::String(string)])?));
    }
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(position) = index_of(&units, &sep, start) {
        parts.push(units_slice(&units, start, position));
        if parts.len() >= lim {
            return Ok(Value::Object(interp.create_array_from_list(parts)?));
        }
        start = position + sep.len();
    }
    parts.push(units_slice(&units, start, units.len()));
    Ok(Value::Object(interp.create_array_from_list(parts)?))
}

fn string_normalize(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = this_str(interp, call)?;
    let form = match call.arg(0) {
        Value::Undefined => JsString::from("NFC"),
        form => interp.to_string(&form)?,
    };
    let text = s.as_str();
    let (quick, normalized): (IsNormalized, fn(&str) -> String) = match form.as_str() {
        "NFC" => (is_nfc_quick(text.chars()), |t| t.nfc().collect()),
        "NFD" => (is_nfd_quick(text.chars()), |t| t.nfd().collect()),
        "NFKC" => (is_nfkc_quick(text.chars()), |t| t.nfkc().collect()),
        "NFKD" => (is_nfkd_quick(text.chars()), |t| t.nfkd().collect()),
        _ => {
            return Err(JsError::range_error(format!(
                "The normalization form should be one of NFC, NFD, NFKC, NFKD, got {}",
                form
            )));
        }
    };
    if matches!(quick, IsNormalized::Yes) {
        return Ok(Value::String(s));
    }
    Ok(Value::String(interp.intern(&normalized(text))))
}

fn string_to_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::String(this_string_value(interp, call.this)?))
}

fn string_iterator(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = this_str(interp, call)?;
    Ok(Value::Object(interp.create_string_iterator(s)?))
}

pub fn init_string(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let proto = realm.intrinsics.string_prototype;
    let ctor = realm.intrinsics.string_constructor;
    interp.register_constructor(ctor, "String", 1, Some(proto))?;
    interp.register_method(ctor, "fromCharCode", string_from_char_code, 1)?;
    interp.register_method(ctor, "fromCodePoint", string_from_code_point, 1)?;
    interp.register_method(ctor, "raw", string_raw, 1)?;

    let methods: [(&str, super::NativeFn, usize); 33] = [
        ("at", string_at, 1),
        ("charAt", string_char_at, 1),
        ("charCodeAt", string_char_code_at, 1),
        ("codePointAt", string_code_point_at, 1),
        ("concat", string_concat, 1),
        ("endsWith", string_ends_with, 1),
        ("includes", string_includes, 1),
        ("indexOf", string_index_of, 1),
        ("lastIndexOf", string_last_index_of, 1),
        ("localeCompare", string_locale_compare, 1),
        ("normalize", string_normalize, 0),
        ("padEnd", string_pad_end, 1),
        ("padStart", string_pad_start, 1),
        ("repeat", string_repeat, 1),
        ("replace", string_replace, 2),
        ("replaceAll", string_replace_all, 2),
        ("slice", string_slice, 2),
        ("split", string_split, 2),
        ("startsWith", string_starts_with, 1),
        ("substr", string_substr, 2),
        ("substring", string_substring, 2),
        ("toLocaleLowerCase", string_to_lower_case, 0),
        ("toLocaleUpperCase", string_to_upper_case, 0),
        ("toLowerCase", string_to_lower_case, 0),
        ("toString", string_to_string, 0),
        ("toUpperCase", string_to_upper_case, 0),
        ("trim", string_trim, 0),
        ("trimEnd", string_trim_end, 0),
        ("trimStart", string_trim_start, 0),
        ("valueOf", string_to_string, 0),
        ("trimLeft", string_trim_start, 0),
        ("trimRight", string_trim_end, 0),
        ("toWellFormed", string_to_well_formed, 0),
    ];
    for (name, behavior, length) in methods {
        interp.register_method(proto, name, behavior, length)?;
    }
    interp.register_symbol_method(proto, interp.well_known().iterator.cheap_clone(), string_iterator, 0)?;
    Ok(())
}

/// Every string here is already well formed.
fn string_to_well_formed(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::String(this_str(interp, call)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn units(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn code_unit_search() {
        assert_eq!(index_of(&units("abcabc"), &units("c"), 0), Some(2));
        assert_eq!(index_of(&units("abcabc"), &units("c"), 3), Some(5));
        assert_eq!(index_of(&units("abc"), &units(""), 3), Some(3));
        assert_eq!(index_of(&units("abc"), &units(""), 4), None);
        assert_eq!(last_index_of(&units("abcabc"), &units("a"), 6), Some(3));
        assert_eq!(last_index_of(&units("abcabc"), &units("a"), 2), Some(0));
        assert_eq!(index_of(&units("😀x"), &units("x"), 0), Some(2));
    }

    #[test]
    fn substitution_patterns() {
        let string = units("abc");
        let out = get_substitution(&units("b"), &string, 1, &units("[$&|$`|$'|$$|$1]"));
        assert_eq!(String::from_utf16_lossy(&out), "[b|a|c|$|$1]");
    }
}
