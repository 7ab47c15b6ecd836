//! Number and Boolean tests

use super::{eval, s, throws_error};
use ecmavm::Value;

#[test]
fn test_numeric_literals() {
    assert_eq!(eval("0x1F"), Value::Number(31.0));
    assert_eq!(eval("0o17"), Value::Number(15.0));
    assert_eq!(eval("0b101"), Value::Number(5.0));
    assert_eq!(eval("1_000_000"), Value::Number(1_000_000.0));
    assert_eq!(eval("1.5e3"), Value::Number(1500.0));
    assert_eq!(eval(".5"), Value::Number(0.5));
}

#[test]
fn test_number_to_string() {
    assert_eq!(eval("String(0.1 + 0.2)"), s("0.30000000000000004"));
    assert_eq!(eval("String(1e21)"), s("1e+21"));
    assert_eq!(eval("String(1e-7)"), s("1e-7"));
    assert_eq!(eval("String(-0)"), s("0"));
    assert_eq!(eval("String(123456789012345680000)"), s("123456789012345680000"));
    assert_eq!(eval("(255).toString(16)"), s("ff"));
    assert_eq!(eval("(-255).toString(2)"), s("-11111111"));
    assert_eq!(eval("(0.5).toString(2)"), s("0.1"));
    assert!(throws_error("(1).toString(1)", "RangeError"));
}

#[test]
fn test_to_fixed_and_precision() {
    assert_eq!(eval("(1.005).toFixed(2)"), s("1.00"));
    assert_eq!(eval("(123.456).toFixed(1)"), s("123.5"));
    assert_eq!(eval("(1e21).toFixed(2)"), s("1e+21"));
    assert_eq!(eval("(123.456).toPrecision(4)"), s("123.5"));
    assert_eq!(eval("(123456).toExponential(2)"), s("1.23e+5"));
    assert!(throws_error("(1).toFixed(101)", "RangeError"));
}

#[test]
fn test_to_number() {
    assert_eq!(eval("Number('  42  ')"), Value::Number(42.0));
    assert_eq!(eval("Number('0x10')"), Value::Number(16.0));
    assert_eq!(eval("Number('')"), Value::Number(0.0));
    assert_eq!(eval("Number(null)"), Value::Number(0.0));
    assert_eq!(eval("Number.isNaN(Number(undefined))"), Value::Boolean(true));
    assert_eq!(eval("Number.isNaN(Number('12px'))"), Value::Boolean(true));
    assert_eq!(eval("Number([5])"), Value::Number(5.0));
    assert_eq!(eval("+true"), Value::Number(1.0));
    assert!(throws_error("+Symbol()", "TypeError"));
}

#[test]
fn test_number_statics() {
    assert_eq!(eval("Number.isInteger(5.0)"), Value::Boolean(true));
    assert_eq!(eval("Number.isInteger(5.5)"), Value::Boolean(false));
    assert_eq!(eval("Number.isFinite('5')"), Value::Boolean(false));
    assert_eq!(eval("Number.isNaN('x')"), Value::Boolean(false));
    assert_eq!(eval("Number.isSafeInteger(2 ** 53)"), Value::Boolean(false));
    assert_eq!(eval("Number.isSafeInteger(2 ** 53 - 1)"), Value::Boolean(true));
    assert_eq!(eval("Number.MAX_SAFE_INTEGER"), Value::Number(9007199254740991.0));
    assert_eq!(eval("Number.EPSILON > 0"), Value::Boolean(true));
    assert_eq!(eval("Number.parseInt === parseInt"), Value::Boolean(true));
}

#[test]
fn test_number_wrapper_objects() {
    assert_eq!(eval("typeof new Number(1)"), s("object"));
    assert_eq!(eval("new Number(1) + 1"), Value::Number(2.0));
    assert_eq!(eval("new Number(7).valueOf()"), Value::Number(7.0));
    assert!(throws_error("Number.prototype.valueOf.call('1')", "TypeError"));
}

#[test]
fn test_arithmetic_edge_cases() {
    assert_eq!(eval("1 / 0"), Value::Number(f64::INFINITY));
    assert_eq!(eval("Object.is(-0 * 1, -0)"), Value::Boolean(true));
    assert_eq!(eval("-7 % 3"), Value::Number(-1.0));
    assert_eq!(eval("2 ** -1"), Value::Number(0.5));
    assert_eq!(eval("(-8) ** (1 / 3)").as_number().map(f64::is_nan), Some(true));
    assert_eq!(eval("1 << 31"), Value::Number(-2147483648.0));
    assert_eq!(eval("-1 >>> 28"), Value::Number(15.0));
}

#[test]
fn test_boolean() {
    assert_eq!(eval("Boolean('')"), Value::Boolean(false));
    assert_eq!(eval("Boolean('0')"), Value::Boolean(true));
    assert_eq!(eval("Boolean(NaN)"), Value::Boolean(false));
    assert_eq!(eval("!!new Boolean(false)"), Value::Boolean(true));
    assert_eq!(eval("new Boolean(false).valueOf()"), Value::Boolean(false));
    assert_eq!(eval("true.toString()"), s("true"));
    assert!(throws_error("Boolean.prototype.toString.call(1)", "TypeError"));
}
