//! The Number constructor and Number.prototype

use crate::error::{JsError, JsResult};
use crate::interpreter::builtins::NativeCall;
use crate::interpreter::object::ObjectKind;
use crate::interpreter::Interpreter;
use crate::value::{number_to_string, Value};

const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// Number(value)
pub fn number_constructor(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let n = match call.args.first() {
        Some(value) => interp.to_number(value)?,
        None => 0.0,
    };
    let Some(new_target) = call.new_target else {
        return Ok(Value::Number(n));
    };
    let obj = interp.ordinary_create_from_constructor(Some(new_target), |i| i.number_prototype, ObjectKind::Number(n))?;
    Ok(Value::Object(obj))
}

/// thisNumberValue(value)
fn this_number_value(interp: &Interpreter, value: &Value, method: &str) -> JsResult<f64> {
    let n = match value {
        Value::Number(n) => Some(*n),
        Value::Object(obj) => interp.object(*obj, |d| match &d.kind {
            ObjectKind::Number(n) => Some(*n),
            _ => None,
        })?,
        _ => None,
    };
    n.ok_or_else(|| {
        JsError::type_error(format!(
            "Number.prototype.{} requires that 'this' be a Number",
            method
        ))
    })
}

fn is_integral(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if n.is_finite() && n.trunc() == *n => Some(*n),
        _ => None,
    }
}

fn number_is_finite(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(matches!(call.arg(0), Value::Number(n) if n.is_finite())))
}

fn number_is_nan(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(matches!(call.arg(0), Value::Number(n) if n.is_nan())))
}

fn number_is_integer(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(is_integral(&call.arg(0)).is_some()))
}

fn number_is_safe_integer(_interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Boolean(
        is_integral(&call.arg(0)).is_some_and(|n| n.abs() <= MAX_SAFE_INTEGER),
    ))
}

/// Number.prototype.toString(radix)
fn number_to_string_method(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let x = this_number_value(interp, call.this, "toString")?;
    let radix = match call.arg(0) {
        Value::Undefined => 10.0,
        radix => interp.to_integer_or_infinity(&radix)?,
    };
    if !(2.0..=36.0).contains(&radix) {
        return Err(JsError::range_error("toString() radix must be between 2 and 36"));
    }
    if radix == 10.0 {
        return Ok(Value::from(number_to_string(x)));
    }
    Ok(Value::from(to_radix_string(x, radix as u32)))
}

fn number_to_locale_string(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let x = this_number_value(interp, call.this, "toLocaleString")?;
    Ok(Value::from(number_to_string(x)))
}

fn number_value_of(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    Ok(Value::Number(this_number_value(interp, call.this, "valueOf")?))
}

/// Number.prototype.toFixed(fractionDigits)
fn number_to_fixed(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let x = this_number_value(interp, call.this, "toFixed")?;
    let f = interp.to_integer_or_infinity(&call.arg(0))?;
    if !(0.0..=100.0).contains(&f) {
        return Err(JsError::range_error("toFixed() digits argument must be between 0 and 100"));
    }
    if !x.is_finite() || x.abs() >= 1e21 {
        return Ok(Value::from(number_to_string(x)));
    }
    Ok(Value::from(to_fixed(x, f as usize)))
}

/// Number.prototype.toExponential(fractionDigits)
fn number_to_exponential(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let x = this_number_value(interp, call.this, "toExponential")?;
    let fraction_digits = call.arg(0);
    let f = interp.to_integer_or_infinity(&fraction_digits)?;
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    if !(0.0..=100.0).contains(&f) {
        return Err(JsError::range_error("toExponential() argument must be between 0 and 100"));
    }
    let (digits, exponent) = if fraction_digits.is_undefined() {
        shortest_digits(x)
    } else {
        rounded_digits(x, f as usize + 1)
    };
    Ok(Value::from(format_exponential(x < 0.0, &digits, exponent)))
}

/// Number.prototype.toPrecision(precision)
fn number_to_precision(interp: &Interpreter, call: &NativeCall<'_>) -> JsResult<Value> {
    let x = this_number_value(interp, call.this, "toPrecision")?;
    if call.arg(0).is_undefined() {
        return Ok(Value::from(number_to_string(x)));
    }
    let p = interp.to_integer_or_infinity(&call.arg(0))?;
    if !x.is_finite() {
        return Ok(Value::from(number_to_string(x)));
    }
    if !(1.0..=100.0).contains(&p) {
        return Err(JsError::range_error("toPrecision() argument must be between 1 and 100"));
    }
    let p = p as usize;
    let (digits, e) = rounded_digits(x, p);
    let sign = if x < 0.0 { "-" } else { "" };
    if e < -6 || e >= p as i32 {
        return Ok(Value::from(format_exponential(x < 0.0, &digits, e)));
    }
    let digits: String = digits.iter().map(|d| char::from(b'0' + d)).collect();
    let text = if e >= 0 {
        let int_len = e as usize + 1;
        let (int_part, frac_part) = digits.split_at(int_len.min(digits.len()));
        if frac_part.is_empty() {
            int_part.to_string()
        } else {
            format!("{}.{}", int_part, frac_part)
        }
    } else {
        format!("0.{}{}", "0".repeat((-e - 1) as usize), digits)
    };
    Ok(Value::from(format!("{}{}", sign, text)))
}

/// The exact decimal expansion of `|x|` split at the decimal point.
fn exact_decimal(x: f64) -> (Vec<u8>, Vec<u8>) {
    let text = format!("{:.1074}", x.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let digits = |s: &str| s.bytes().map(|b| b.wrapping_sub(b'0')).collect::<Vec<u8>>();
    let mut frac = digits(frac_part);
    while frac.last() == Some(&0) {
        frac.pop();
    }
    (digits(int_part), frac)
}

/// Add one to a little decimal number, returning whether it overflowed.
fn increment(digits: &mut [u8]) -> bool {
    for d in digits.iter_mut().rev() {
        if *d == 9 {
            *d = 0;
        } else {
            *d += 1;
            return false;
        }
    }
    true
}

/// Round `|x|` half-up to `f` fraction digits.
fn to_fixed(x: f64, f: usize) -> String {
    let (mut int_digits, frac) = exact_decimal(x);
    let mut kept: Vec<u8> = frac.iter().copied().chain(std::iter::repeat(0)).take(f).collect();
    if frac.get(f).is_some_and(|d| *d >= 5) {
        let mut all: Vec<u8> = int_digits.iter().chain(kept.iter()).copied().collect();
        if increment(&mut all) {
            all.insert(0, 1);
        }
        let split = all.len() - f;
        kept = all.split_off(split);
        int_digits = all;
    }
    let int_text: String = int_digits.iter().map(|d| char::from(b'0' + d)).collect();
    let frac_text: String = kept.iter().map(|d| char::from(b'0' + d)).collect();
    let sign = if x < 0.0 { "-" } else { "" };
    if f == 0 {
        format!("{}{}", sign, int_text)
    } else {
        format!("{}{}.{}", sign, int_text, frac_text)
    }
}

/// `n` significant digits of `|x|` rounded half-up, with the decimal
/// exponent of the first digit.
fn rounded_digits(x: f64, n: usize) -> (Vec<u8>, i32) {
    if x == 0.0 {
        return (vec![0; n], 0);
    }
    let (int_digits, frac) = exact_decimal(x);
    let mut all: Vec<u8> = int_digits.iter().chain(frac.iter()).copied().collect();
    let leading = all.iter().take_while(|d| **d == 0).count();
    let mut exponent = int_digits.len() as i32 - leading as i32 - 1;
    all.drain(..leading);
    let round_up = all.get(n).is_some_and(|d| *d >= 5);
    all.resize(n, 0);
    if round_up && increment(&mut all) {
        all.insert(0, 1);
        all.truncate(n);
        exponent += 1;
    }
    (all, exponent)
}

/// The shortest round-tripping digits of `|x|` and the exponent of the
/// first digit.
fn shortest_digits(x: f64) -> (Vec<u8>, i32) {
    let text = format!("{:e}", x.abs());
    let (mantissa, exponent) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let digits = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    (digits, exponent.parse().unwrap_or(0))
}

fn format_exponential(negative: bool, digits: &[u8], exponent: i32) -> String {
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    let mut chars = digits.iter().map(|d| char::from(b'0' + d));
    out.extend(chars.next());
    let rest: String = chars.collect();
    if !rest.is_empty() {
        out.push('.');
        out.push_str(&rest);
    }
    out.push('e');
    out.push(if exponent < 0 { '-' } else { '+' });
    out.push_str(&exponent.unsigned_abs().to_string());
    out
}

fn next_up(x: f64) -> f64 {
    f64::from_bits(x.to_bits() + 1)
}

fn radix_digit(d: u32) -> char {
    char::from_digit(d, 36).unwrap_or('0')
}

/// Number::toString(x, radix) for radix other than 10: the shortest digit
/// string that reads back as `x`.
fn to_radix_string(x: f64, radix: u32) -> String {
    if x.is_nan() {
        return "NaN".to_string();
    }
    if x == 0.0 {
        return "0".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let negative = x < 0.0;
    let value = x.abs();
    let base = f64::from(radix);
    let mut integer = value.floor();
    let mut fraction = value - integer;
    let mut delta = (0.5 * (next_up(value) - value)).max(next_up(0.0));

    let mut fraction_digits: Vec<u32> = Vec::new();
    if fraction >= delta {
        loop {
            fraction *= base;
            delta *= base;
            let digit = fraction.floor() as u32;
            fraction_digits.push(digit);
            fraction -= f64::from(digit);
            if (fraction > 0.5 || (fraction == 0.5 && digit & 1 == 1)) && fraction + delta > 1.0 {
                loop {
                    match fraction_digits.pop() {
                        None => {
                            integer += 1.0;
                            break;
                        }
                        Some(d) if d + 1 < radix => {
                            fraction_digits.push(d + 1);
                            break;
                        }
                        Some(_) => {}
                    }
                }
                break;
            }
            if fraction < delta {
                break;
            }
        }
    }

    let mut integer_digits = Vec::new();
    loop {
        let remainder = integer % base;
        integer_digits.push(radix_digit(remainder as u32));
        integer = (integer - remainder) / base;
        if integer < 1.0 {
            break;
        }
    }
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.extend(integer_digits.iter().rev());
    if !fraction_digits.is_empty() {
        out.push('.');
        out.extend(fraction_digits.iter().map(|d| radix_digit(*d)));
    }
    out
}

pub fn init_number(interp: &Interpreter) -> JsResult<()> {
    let realm = interp.current_realm()?;
    let proto = realm.intrinsics.number_prototype;
    let ctor = realm.intrinsics.number_constructor;
    interp.register_constructor(ctor, "Number", 1, Some(proto))?;

    let constants = [
        ("EPSILON", f64::EPSILON),
        ("MAX_SAFE_INTEGER", MAX_SAFE_INTEGER),
        ("MAX_VALUE", f64::MAX),
        ("MIN_SAFE_INTEGER", -MAX_SAFE_INTEGER),
        ("MIN_VALUE", next_up(0.0)),
        ("NaN", f64::NAN),
        ("NEGATIVE_INFINITY", f64::NEG_INFINITY),
        ("POSITIVE_INFINITY", f64::INFINITY),
    ];
    for (name, value) in constants {
        interp.register_constant(ctor, name, Value::Number(value))?;
    }
    interp.register_method(ctor, "isFinite", number_is_finite, 1)?;
    interp.register_method(ctor, "isInteger", number_is_integer, 1)?;
    interp.register_method(ctor, "isNaN", number_is_nan, 1)?;
    interp.register_method(ctor, "isSafeInteger", number_is_safe_integer, 1)?;
    interp.register_method(ctor, "parseFloat", super::global::global_parse_float, 1)?;
    interp.register_method(ctor, "parseInt", super::global::global_parse_int, 2)?;

    interp.register_method(proto, "toExponential", number_to_exponential, 1)?;
    interp.register_method(proto, "toFixed", number_to_fixed, 1)?;
    interp.register_method(proto, "toLocaleString", number_to_locale_string, 0)?;
    interp.register_method(proto, "toPrecision", number_to_precision, 1)?;
    interp.register_method(proto, "toString", number_to_string_method, 1)?;
    interp.register_method(proto, "valueOf", number_value_of, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_rounds_half_up() {
        assert_eq!(to_fixed(2.5, 0), "3");
        assert_eq!(to_fixed(1.005, 2), "1.00");
        assert_eq!(to_fixed(1.45, 1), "1.4");
        assert_eq!(to_fixed(99.99, 1), "100.0");
        assert_eq!(to_fixed(-0.0001, 2), "-0.00");
        assert_eq!(to_fixed(-0.0, 2), "0.00");
        assert_eq!(to_fixed(-1.5, 0), "-2");
        assert_eq!(to_fixed(0.1, 3), "0.100");
    }

    #[test]
    fn significant_digits() {
        assert_eq!(rounded_digits(123.456, 4), (vec![1, 2, 3, 5], 2));
        assert_eq!(rounded_digits(0.000999, 2), (vec![1, 0], -3));
        assert_eq!(rounded_digits(9.99, 2), (vec![1, 0], 1));
        assert_eq!(format_exponential(false, &[1, 2], 3), "1.2e+3");
        assert_eq!(format_exponential(true, &[5], -7), "-5e-7");
    }

    #[test]
    fn radix_conversion() {
        assert_eq!(to_radix_string(255.0, 16), "ff");
        assert_eq!(to_radix_string(-8.0, 2), "-1000");
        assert_eq!(to_radix_string(0.5, 2), "0.1");
        assert_eq!(to_radix_string(35.0, 36), "z");
    }
}
