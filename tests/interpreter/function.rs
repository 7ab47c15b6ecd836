//! Function tests: declarations, closures, arrows, this binding, arguments, bind/call/apply

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_function_declaration_and_call() {
    assert_eq!(eval("function add(a, b) { return a + b; } add(2, 3)"), Value::Number(5.0));
    assert_eq!(eval("function noReturn() {} noReturn()"), Value::Undefined);
}

#[test]
fn test_closures_capture_bindings() {
    assert_eq!(
        eval(
            r#"
            function counter() {
                let n = 0;
                return { inc: () => ++n, get: () => n };
            }
            const c = counter();
            c.inc(); c.inc();
            c.get()
        "#
        ),
        Value::Number(2.0)
    );
}

#[test]
fn test_default_parameters() {
    assert_eq!(eval("function f(a, b = a * 2) { return b; } f(3)"), Value::Number(6.0));
    assert_eq!(eval("function f(a = 1) { return a; } f(undefined)"), Value::Number(1.0));
    assert_eq!(eval("function f(a = 1) { return a; } f(null)"), Value::Null);
    assert!(throws_error("function f(a = b, b = 1) { return a; } f()", "ReferenceError"));
}

#[test]
fn test_rest_parameters() {
    assert_eq!(eval_json("function f(a, ...rest) { return rest; } f(1, 2, 3)"), json!([2, 3]));
    assert_eq!(eval("function f(a, ...rest) {} f.length"), Value::Number(1.0));
}

#[test]
fn test_function_length_and_name() {
    assert_eq!(eval("function f(a, b = 1, c) {} f.length"), Value::Number(1.0));
    assert_eq!(eval("const g = function () {}; g.name"), s("g"));
    assert_eq!(eval("const h = () => {}; h.name"), s("h"));
    assert_eq!(eval("const o = { m() {} }; o.m.name"), s("m"));
    assert_eq!(eval("const o = { get v() { return 1; } }; Object.getOwnPropertyDescriptor(o, 'v').get.name"), s("get v"));
    assert_eq!(eval("const sym = Symbol('desc'); const o = { [sym]() {} }; o[sym].name"), s("[desc]"));
}

#[test]
fn test_arrow_functions_capture_this() {
    assert_eq!(
        eval(
            r#"
            const o = {
                value: 7,
                later() { return [1].map(() => this.value)[0]; },
            };
            o.later()
        "#
        ),
        Value::Number(7.0)
    );
}

#[test]
fn test_this_in_sloppy_and_strict_functions() {
    assert_eq!(eval("function f() { return this === globalThis; } f()"), Value::Boolean(true));
    assert_eq!(eval("function f() { 'use strict'; return this; } f()"), Value::Undefined);
    assert_eq!(eval("function f() { return typeof this; } f.call(5)"), s("object"));
    assert_eq!(eval("function f() { 'use strict'; return typeof this; } f.call(5)"), s("number"));
}

#[test]
fn test_arguments_object() {
    assert_eq!(eval("function f() { return arguments.length; } f(1, 2, 3)"), Value::Number(3.0));
    assert_eq!(eval("function f(a) { arguments[0] = 9; return a; } f(1)"), Value::Number(9.0));
    assert_eq!(eval("function f(a) { a = 5; return arguments[0]; } f(1)"), Value::Number(5.0));
    assert_eq!(
        eval("function f(a) { 'use strict'; arguments[0] = 9; return a; } f(1)"),
        Value::Number(1.0)
    );
    assert_eq!(
        eval("function f() { return Object.prototype.toString.call(arguments); } f()"),
        s("[object Arguments]")
    );
    assert_eq!(eval_json("function f() { return [...arguments]; } f(1, 2)"), json!([1, 2]));
}

#[test]
fn test_strict_arguments_callee_throws() {
    assert!(throws_error("function f() { 'use strict'; return arguments.callee; } f()", "TypeError"));
}

#[test]
fn test_call_apply_bind() {
    assert_eq!(eval("function f(a, b) { return this.x + a + b; } f.call({ x: 1 }, 2, 3)"), Value::Number(6.0));
    assert_eq!(eval("function f(a, b) { return this.x + a + b; } f.apply({ x: 1 }, [2, 3])"), Value::Number(6.0));
    assert_eq!(
        eval("function f(a, b) { return this.x + a + b; } const g = f.bind({ x: 1 }, 2); g(3)"),
        Value::Number(6.0)
    );
}

#[test]
fn test_bound_function_properties() {
    assert_eq!(eval("function foo(a, b, c) {} foo.bind(null, 1).length"), Value::Number(2.0));
    assert_eq!(eval("function foo() {} foo.bind(null).name"), s("bound foo"));
    assert_eq!(
        eval("function P(x) { this.x = x; } const B = P.bind(null, 4); new B().x"),
        Value::Number(4.0)
    );
    assert_eq!(
        eval("function P() {} const B = P.bind(null); new B() instanceof P"),
        Value::Boolean(true)
    );
}

#[test]
fn test_constructor_functions() {
    assert_eq!(
        eval(
            r#"
            function Point(x, y) { this.x = x; this.y = y; }
            Point.prototype.sum = function () { return this.x + this.y; };
            new Point(2, 3).sum()
        "#
        ),
        Value::Number(5.0)
    );
    assert_eq!(eval("function F() { return { override: true }; } new F().override"), Value::Boolean(true));
    assert_eq!(eval("function F() { return 1; } typeof new F()"), s("object"));
}

#[test]
fn test_new_target() {
    assert_eq!(eval("let seen; function F() { seen = new.target === F; } new F(); seen"), Value::Boolean(true));
    assert_eq!(eval("function F() { return new.target; } F()"), Value::Undefined);
}

#[test]
fn test_arrow_is_not_constructor() {
    assert!(throws_error("const A = () => {}; new A()", "TypeError"));
    assert!(throws_error("const o = { m() {} }; new o.m()", "TypeError"));
}

#[test]
fn test_calling_non_function() {
    assert!(throws_error("const x = 1; x()", "is not a function"));
    assert!(throws_error("undefined.foo", "TypeError"));
}

#[test]
fn test_recursion() {
    assert_eq!(eval("function fib(n) { return n < 2 ? n : fib(n - 1) + fib(n - 2); } fib(15)"), Value::Number(610.0));
}

#[test]
fn test_function_to_string() {
    assert_eq!(
        eval("function add(a, b) { return a + b; } add.toString()"),
        s("function add(a, b) { return a + b; }")
    );
    assert_eq!(eval("Math.max.toString().includes('[native code]')"), Value::Boolean(true));
}

#[test]
fn test_has_instance() {
    assert_eq!(
        eval("const Even = { [Symbol.hasInstance](n) { return n % 2 === 0; } }; 4 instanceof Even"),
        Value::Boolean(true)
    );
}

#[test]
fn test_function_constructor_is_disabled() {
    assert!(throws_error("new Function('return 1')", "EvalError"));
}
