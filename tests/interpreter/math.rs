//! Math tests

use super::{eval, s};
use ecmavm::Value;

fn is_nan(source: &str) -> bool {
    eval(source).as_number().is_some_and(f64::is_nan)
}

#[test]
fn test_constants() {
    assert_eq!(eval("Math.PI"), Value::Number(std::f64::consts::PI));
    assert_eq!(eval("Math.E"), Value::Number(std::f64::consts::E));
    assert_eq!(eval("Math.SQRT2"), Value::Number(std::f64::consts::SQRT_2));
    assert_eq!(eval("Object.getOwnPropertyDescriptor(Math, 'PI').writable"), Value::Boolean(false));
    assert_eq!(eval("Object.prototype.toString.call(Math)"), s("[object Math]"));
}

#[test]
fn test_rounding() {
    assert_eq!(eval("Math.round(2.5)"), Value::Number(3.0));
    assert_eq!(eval("Math.round(-2.5)"), Value::Number(-2.0));
    assert_eq!(eval("Object.is(Math.round(-0.4), -0)"), Value::Boolean(true));
    assert_eq!(eval("Math.floor(-1.5)"), Value::Number(-2.0));
    assert_eq!(eval("Math.ceil(1.1)"), Value::Number(2.0));
    assert_eq!(eval("Math.trunc(-4.7)"), Value::Number(-4.0));
    assert_eq!(eval("Math.sign(-3)"), Value::Number(-1.0));
}

#[test]
fn test_min_max() {
    assert_eq!(eval("Math.max(1, 5, 3)"), Value::Number(5.0));
    assert_eq!(eval("Math.min()"), Value::Number(f64::INFINITY));
    assert_eq!(eval("Math.max()"), Value::Number(f64::NEG_INFINITY));
    assert!(is_nan("Math.max(1, NaN)"));
    assert_eq!(eval("Object.is(Math.max(-0, 0), 0)"), Value::Boolean(true));
    assert_eq!(eval("Object.is(Math.min(0, -0), -0)"), Value::Boolean(true));
    assert_eq!(eval("Math.max.length"), Value::Number(2.0));
}

#[test]
fn test_powers_and_roots() {
    assert_eq!(eval("Math.pow(2, 10)"), Value::Number(1024.0));
    assert!(is_nan("Math.pow(1, Infinity)"));
    assert_eq!(eval("Math.sqrt(16)"), Value::Number(4.0));
    assert_eq!(eval("Math.cbrt(27)"), Value::Number(3.0));
    assert_eq!(eval("Math.hypot(3, 4)"), Value::Number(5.0));
    assert_eq!(eval("Math.hypot(NaN, Infinity)"), Value::Number(f64::INFINITY));
    assert_eq!(eval("Math.abs(-7)"), Value::Number(7.0));
}

#[test]
fn test_integer_helpers() {
    assert_eq!(eval("Math.imul(3, 4)"), Value::Number(12.0));
    assert_eq!(eval("Math.imul(0xffffffff, 5)"), Value::Number(-5.0));
    assert_eq!(eval("Math.clz32(1)"), Value::Number(31.0));
    assert_eq!(eval("Math.clz32(0)"), Value::Number(32.0));
    assert_eq!(eval("Math.fround(5.5)"), Value::Number(5.5));
}

#[test]
fn test_transcendental() {
    assert_eq!(eval("Math.log(Math.E)"), Value::Number(1.0));
    assert_eq!(eval("Math.log2(8)"), Value::Number(3.0));
    assert_eq!(eval("Math.log10(1000)"), Value::Number(3.0));
    assert_eq!(eval("Math.sin(0)"), Value::Number(0.0));
    assert_eq!(eval("Math.cos(0)"), Value::Number(1.0));
    assert_eq!(eval("Math.atan2(1, 1)"), Value::Number(std::f64::consts::FRAC_PI_4));
    assert!(is_nan("Math.acos(2)"));
}

#[test]
fn test_math_coerces_arguments() {
    assert_eq!(eval("Math.abs('-3')"), Value::Number(3.0));
    assert_eq!(eval("Math.max({ valueOf: () => 9 }, 1)"), Value::Number(9.0));
    assert!(is_nan("Math.floor()"));
}
