//! Function properties of the global object

use crate::error::{ErrorKind, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::conversions::is_js_whitespace;
use crate::interpreter::{Interpreter, ObjectId};
use crate::value::Value;

/// uriUnescaped
const URI_UNESCAPED: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_.!~*'()";
/// uriReserved plus `#`
const URI_RESERVED: &str = ";/?:@&=+$,#";

pub fn init_global_functions(interp: &Interpreter, global: ObjectId) -> JsResult<()> {
    // The same function objects as Number.parseInt and Number.parseFloat.
    let number = interp.intrinsic(|i| i.number_constructor)?;
    for name in ["parseInt", "parseFloat"] {
        let f = interp.get(number, &interp.key(name))?;
        interp.register_value(global, name, f)?;
    }
    interp.register_method(global, "isNaN", global_is_nan, 1)?;
    interp.register_method(global, "isFinite", global_is_finite, 1)?;
    interp.register_method(global, "encodeURI", global_encode_uri, 1)?;
    interp.register_method(global, "encodeURIComponent", global_encode_uri_component, 1)?;
    interp.register_method(global, "decodeURI", global_decode_uri, 1)?;
    interp.register_method(global, "decodeURIComponent", global_decode_uri_component, 1)?;
    Ok(())
}

/// The digits of `s` in `radix` up to the first invalid character, `None`
/// when there is none.
pub(crate) fn parse_int_digits(s: &str, radix: u32) -> Option<f64> {
    let mut result = 0.0_f64;
    let mut found = false;
    for c in s.chars() {
        let Some(digit) = c.to_digit(radix) else {
            break;
        };
        found = true;
        result = result * f64::from(radix) + f64::from(digit);
    }
    found.then_some(result)
}

/// parseInt(string, radix)
fn parse_int(input: &str, radix: i32) -> f64 {
    let s = input.trim_start_matches(is_js_whitespace);
    let (sign, s) = match s.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, s.strip_prefix('+').unwrap_or(s)),
    };
    let mut strip_prefix = true;
    let radix = match radix {
        0 => 10,
        16 => 16,
        r if (2..=36).contains(&r) => {
            strip_prefix = false;
            r
        }
        _ => return f64::NAN,
    };
    let (radix, s) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(rest) if strip_prefix => (16, rest),
        _ => (radix, s),
    };
    match parse_int_digits(s, radix.unsigned_abs()) {
        Some(n) => sign * n,
        None => f64::NAN,
    }
}

/// parseFloat(string): the longest prefix that is a StrDecimalLiteral.
fn parse_float(input: &str) -> f64 {
    let s = input.trim_start_matches(is_js_whitespace);
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned.starts_with("Infinity") {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut mantissa_digits = end - digits_start;
    if bytes.get(end) == Some(&b'.') {
        let fraction_start = end + 1;
        let mut fraction_end = fraction_start;
        while bytes.get(fraction_end).is_some_and(u8::is_ascii_digit) {
            fraction_end += 1;
        }
        mantissa_digits += fraction_end - fraction_start;
        if mantissa_digits > 0 {
            end = fraction_end;
        }
    }
    if mantissa_digits == 0 {
        return f64::NAN;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    s.get(..end)
        .and_then(|prefix| prefix.parse::<f64>().ok())
        .unwrap_or(f64::NAN)
}

pub(super) fn global_parse_int(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let input = interp.to_string(&call.arg(0))?;
    let radix = interp.to_int32(&call.arg(1))?;
    Ok(Value::Number(parse_int(input.as_str(), radix)))
}

pub(super) fn global_parse_float(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let input = interp.to_string(&call.arg(0))?;
    Ok(Value::Number(parse_float(input.as_str())))
}

fn global_is_nan(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(interp.to_number(&call.arg(0))?.is_nan()))
}

fn global_is_finite(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(interp.to_number(&call.arg(0))?.is_finite()))
}

/// Encode(string, extraUnescaped)
fn encode(s: &str, extra_unescaped: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if URI_UNESCAPED.contains(c) || extra_unescaped.contains(c) {
            out.push(c);
        } else {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).bytes() {
                out.push_str(&format!("%{:02X}", byte));
            }
        }
    }
    out
}

fn hex_byte(bytes: &[u8], at: usize) -> Option<u8> {
    if bytes.get(at) != Some(&b'%') {
        return None;
    }
    let hi = char::from(*bytes.get(at + 1)?).to_digit(16)?;
    let lo = char::from(*bytes.get(at + 2)?).to_digit(16)?;
    u8::try_from(hi * 16 + lo).ok()
}

/// Decode(string, preserveEscapeSet); `None` on a malformed sequence.
fn decode(s: &str, preserve: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut k = 0;
    while k < bytes.len() {
        if bytes.get(k) != Some(&b'%') {
            let c = s.get(k..)?.chars().next()?;
            out.push(c);
            k += c.len_utf8();
            continue;
        }
        let lead = hex_byte(bytes, k)?;
        if lead < 0x80 {
            let c = char::from(lead);
            if preserve.contains(c) {
                out.push_str(s.get(k..k + 3)?);
            } else {
                out.push(c);
            }
            k += 3;
            continue;
        }
        let n = match lead.leading_ones() {
            2 => 2,
            3 => 3,
            4 => 4,
            _ => return None,
        };
        let mut encoded = vec![lead];
        for i in 1..n {
            let byte = hex_byte(bytes, k + 3 * i)?;
            if byte & 0xC0 != 0x80 {
                return None;
            }
            encoded.push(byte);
        }
        out.push_str(std::str::from_utf8(&encoded).ok()?);
        k += 3 * n;
    }
    Some(out)
}

fn global_encode_uri(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = interp.to_string(&call.arg(0))?;
    Ok(Value::from(encode(s.as_str(), URI_RESERVED)))
}

fn global_encode_uri_component(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = interp.to_string(&call.arg(0))?;
    Ok(Value::from(encode(s.as_str(), "")))
}

fn global_decode_uri(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = interp.to_string(&call.arg(0))?;
    match decode(s.as_str(), URI_RESERVED) {
        Some(decoded) => Ok(Value::from(decoded)),
        None => interp.throw(ErrorKind::URIError, "URI malformed"),
    }
}

fn global_decode_uri_component(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let s = interp.to_string(&call.arg(0))?;
    match decode(s.as_str(), "") {
        Some(decoded) => Ok(Value::from(decoded)),
        None => interp.throw(ErrorKind::URIError, "URI malformed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_prefixes_and_radix() {
        assert_eq!(parse_int("  42px", 0), 42.0);
        assert_eq!(parse_int("0x1F", 0), 31.0);
        assert_eq!(parse_int("0x1F", 16), 31.0);
        assert_eq!(parse_int("-0b11", 0), -0.0);
        assert_eq!(parse_int("z", 36), 35.0);
        assert!(parse_int("10", 1).is_nan());
        assert!(parse_int("", 0).is_nan());
    }

    #[test]
    fn parse_float_longest_prefix() {
        assert_eq!(parse_float("3.14abc"), 3.14);
        assert_eq!(parse_float(".5"), 0.5);
        assert_eq!(parse_float("1e3x"), 1000.0);
        assert_eq!(parse_float("1e"), 1.0);
        assert_eq!(parse_float("-Infinityx"), f64::NEG_INFINITY);
        assert!(parse_float(".").is_nan());
    }

    #[test]
    fn uri_round_trip() {
        let encoded = encode("a b/ü", "");
        assert_eq!(encoded, "a%20b%2F%C3%BC");
        assert_eq!(decode(&encoded, "").as_deref(), Some("a b/ü"));
        assert_eq!(decode("%2F", URI_RESERVED).as_deref(), Some("%2F"));
        assert_eq!(decode("%E0%A4%A", ""), None);
    }
}
