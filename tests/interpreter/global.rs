//! Global object tests: value properties and global functions

use super::{eval, s, throws_error};
use ecmavm::Value;

fn is_nan(source: &str) -> bool {
    eval(source).as_number().is_some_and(f64::is_nan)
}

#[test]
fn test_global_this() {
    assert_eq!(eval("typeof globalThis"), s("object"));
    assert_eq!(eval("var declared = 1; globalThis.declared"), Value::Number(1.0));
    assert_eq!(eval("let lexical = 1; globalThis.lexical"), Value::Undefined);
    assert_eq!(eval("function fn() {} typeof globalThis.fn"), s("function"));
    assert_eq!(eval("var v; Object.getOwnPropertyDescriptor(globalThis, 'v').configurable"), Value::Boolean(false));
    assert_eq!(eval("globalThis.implicit = 5; implicit"), Value::Number(5.0));
}

#[test]
fn test_var_and_lexical_conflicts() {
    assert!(throws_error("let x; var x;", "SyntaxError"));
    assert!(throws_error("let NaN = 1;", "SyntaxError"));
}

#[test]
fn test_parse_int() {
    assert_eq!(eval("parseInt('42px')"), Value::Number(42.0));
    assert_eq!(eval("parseInt('  -17')"), Value::Number(-17.0));
    assert_eq!(eval("parseInt('0x1f')"), Value::Number(31.0));
    assert_eq!(eval("parseInt('ff', 16)"), Value::Number(255.0));
    assert_eq!(eval("parseInt('101', 2)"), Value::Number(5.0));
    assert_eq!(eval("parseInt('9', 8)").as_number().map(f64::is_nan), Some(true));
    assert!(is_nan("parseInt('abc')"));
    assert!(is_nan("parseInt('10', 37)"));
    assert_eq!(eval("parseInt(0.0000005)"), Value::Number(5.0));
}

#[test]
fn test_parse_float() {
    assert_eq!(eval("parseFloat('3.14abc')"), Value::Number(3.14));
    assert_eq!(eval("parseFloat('  .5')"), Value::Number(0.5));
    assert_eq!(eval("parseFloat('-1e3')"), Value::Number(-1000.0));
    assert_eq!(eval("parseFloat('Infinityx')"), Value::Number(f64::INFINITY));
    assert!(is_nan("parseFloat('x1')"));
    assert_eq!(eval("parseFloat === Number.parseFloat"), Value::Boolean(true));
}

#[test]
fn test_is_nan_and_is_finite() {
    assert_eq!(eval("isNaN('abc')"), Value::Boolean(true));
    assert_eq!(eval("isNaN('12')"), Value::Boolean(false));
    assert_eq!(eval("isFinite('12')"), Value::Boolean(true));
    assert_eq!(eval("isFinite(Infinity)"), Value::Boolean(false));
}

#[test]
fn test_uri_functions() {
    assert_eq!(eval("encodeURIComponent('a b&c/é')"), s("a%20b%26c%2F%C3%A9"));
    assert_eq!(eval("encodeURI('http://x.y/a b?q=1&r=é')"), s("http://x.y/a%20b?q=1&r=%C3%A9"));
    assert_eq!(eval("decodeURIComponent('a%20b%26c')"), s("a b&c"));
    assert_eq!(eval("decodeURI('%26%20')"), s("%26 "));
    assert!(throws_error("decodeURIComponent('%E0%A4%A')", "URIError"));
}

#[test]
fn test_global_value_properties() {
    assert_eq!(eval("Infinity"), Value::Number(f64::INFINITY));
    assert!(is_nan("NaN"));
    assert_eq!(eval("undefined"), Value::Undefined);
    assert_eq!(eval("typeof undefined"), s("undefined"));
}
