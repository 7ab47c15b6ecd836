//! Basic language feature tests: arithmetic, precedence, comparison, variables, conversions

use super::{eval, s, throws_error};
use ecmavm::Value;

#[test]
fn test_arithmetic() {
    assert_eq!(eval("1 + 2"), Value::Number(3.0));
    assert_eq!(eval("10 - 4"), Value::Number(6.0));
    assert_eq!(eval("3 * 4"), Value::Number(12.0));
    assert_eq!(eval("15 / 3"), Value::Number(5.0));
    assert_eq!(eval("2 ** 3 ** 2"), Value::Number(512.0));
    assert_eq!(eval("-7 % 3"), Value::Number(-1.0));
}

#[test]
fn test_precedence() {
    assert_eq!(eval("1 + 2 * 3"), Value::Number(7.0));
    assert_eq!(eval("(1 + 2) * 3"), Value::Number(9.0));
    assert_eq!(eval("1 + 2 + '3'"), s("33"));
    assert_eq!(eval("'1' + 2 + 3"), s("123"));
}

#[test]
fn test_comparison() {
    assert_eq!(eval("1 < 2"), Value::Boolean(true));
    assert_eq!(eval("'10' < '9'"), Value::Boolean(true));
    assert_eq!(eval("'10' < 9"), Value::Boolean(false));
    assert_eq!(eval("NaN <= NaN"), Value::Boolean(false));
    assert_eq!(eval("null >= 0"), Value::Boolean(true));
}

#[test]
fn test_loose_equality() {
    assert_eq!(eval("null == undefined"), Value::Boolean(true));
    assert_eq!(eval("null == 0"), Value::Boolean(false));
    assert_eq!(eval("'1' == 1"), Value::Boolean(true));
    assert_eq!(eval("true == 1"), Value::Boolean(true));
    assert_eq!(eval("({ valueOf() { return 3; } }) == 3"), Value::Boolean(true));
    assert_eq!(eval("NaN == NaN"), Value::Boolean(false));
}

#[test]
fn test_strict_equality() {
    assert_eq!(eval("'1' === 1"), Value::Boolean(false));
    assert_eq!(eval("0 === -0"), Value::Boolean(true));
    assert_eq!(eval("const o = {}; o === o"), Value::Boolean(true));
    assert_eq!(eval("({}) === ({})"), Value::Boolean(false));
}

#[test]
fn test_variables() {
    assert_eq!(eval("let x = 5; x"), Value::Number(5.0));
    assert_eq!(eval("let x = 5; x = 10; x"), Value::Number(10.0));
    assert_eq!(eval("var a = 1; var a; a"), Value::Number(1.0));
}

#[test]
fn test_var_hoisting() {
    assert_eq!(eval("const before = typeof v; var v = 1; before"), s("undefined"));
    assert_eq!(eval("f(); function f() { return 1; } f()"), Value::Number(1.0));
}

#[test]
fn test_temporal_dead_zone() {
    assert!(throws_error("x; let x = 1;", "ReferenceError"));
    assert!(throws_error("{ y = 2; let y; }", "ReferenceError"));
    assert!(throws_error("const c = 1; c = 2;", "TypeError"));
}

#[test]
fn test_undeclared_reference() {
    assert!(throws_error("missing + 1", "missing is not defined"));
    assert_eq!(eval("typeof missing"), s("undefined"));
}

#[test]
fn test_conditional() {
    assert_eq!(eval("true ? 1 : 2"), Value::Number(1.0));
    assert_eq!(eval("false ? 1 : 2"), Value::Number(2.0));
}

#[test]
fn test_logical_operators() {
    assert_eq!(eval("0 || 'fallback'"), s("fallback"));
    assert_eq!(eval("1 && 2"), Value::Number(2.0));
    assert_eq!(eval("0 ?? 5"), Value::Number(0.0));
    assert_eq!(eval("null ?? 5"), Value::Number(5.0));
    assert_eq!(eval("let a = null; a ??= 3; a"), Value::Number(3.0));
    assert_eq!(eval("let b = 1; b ||= 3; b"), Value::Number(1.0));
    assert_eq!(eval("let c = 1; c &&= 4; c"), Value::Number(4.0));
}

#[test]
fn test_typeof() {
    assert_eq!(eval("typeof 1"), s("number"));
    assert_eq!(eval("typeof 'a'"), s("string"));
    assert_eq!(eval("typeof null"), s("object"));
    assert_eq!(eval("typeof Symbol()"), s("symbol"));
    assert_eq!(eval("typeof function () {}"), s("function"));
    assert_eq!(eval("typeof class {}"), s("function"));
}

#[test]
fn test_bitwise() {
    assert_eq!(eval("5 & 3"), Value::Number(1.0));
    assert_eq!(eval("5 | 3"), Value::Number(7.0));
    assert_eq!(eval("5 ^ 3"), Value::Number(6.0));
    assert_eq!(eval("~5"), Value::Number(-6.0));
    assert_eq!(eval("-1 >>> 28"), Value::Number(15.0));
    assert_eq!(eval("1 << 31"), Value::Number(-2147483648.0));
}

#[test]
fn test_update_expressions() {
    assert_eq!(eval("let i = 1; i++ + ++i"), Value::Number(4.0));
    assert_eq!(eval("const o = { n: '5' }; o.n++; o.n"), Value::Number(6.0));
}

#[test]
fn test_template_literals() {
    assert_eq!(eval("const n = 2; `a${n + 1}b`"), s("a3b"));
    assert_eq!(
        eval("function tag(strings, ...values) { return strings.raw[0] + values[0]; } tag`x\\n${7}`"),
        s("x\\n7")
    );
}

#[test]
fn test_optional_chaining() {
    assert_eq!(eval("const o = null; o?.a.b.c"), Value::Undefined);
    assert_eq!(eval("const o = { f() { return 1; } }; o.g?.()"), Value::Undefined);
    assert_eq!(eval("const o = { a: { b: 2 } }; o?.a?.['b']"), Value::Number(2.0));
}

#[test]
fn test_comma_and_void() {
    assert_eq!(eval("(1, 2, 3)"), Value::Number(3.0));
    assert_eq!(eval("void 0"), Value::Undefined);
}

#[test]
fn test_in_and_instanceof() {
    assert_eq!(eval("'a' in { a: 1 }"), Value::Boolean(true));
    assert_eq!(eval("0 in [1]"), Value::Boolean(true));
    assert_eq!(eval("[] instanceof Array"), Value::Boolean(true));
    assert_eq!(eval("({}) instanceof Array"), Value::Boolean(false));
    assert!(throws_error("'a' in 'abc'", "TypeError"));
}

#[test]
fn test_type_annotations_are_stripped() {
    assert_eq!(
        eval(
            r#"
            interface Point { x: number; y: number }
            type Pair = [number, number];
            function add(p: Point): number { return p.x + p.y; }
            const value = add({ x: 1, y: 2 } as Point)!;
            value
        "#
        ),
        Value::Number(3.0)
    );
}
