//! Strict mode tests

use super::{eval, s, throws_error};
use ecmavm::Value;

#[test]
fn test_directive_prologue() {
    assert!(throws_error("'use strict'; undeclared = 1;", "ReferenceError"));
    assert_eq!(eval("'not a directive'; 'use strict'; leaked = 1; leaked"), Value::Number(1.0));
    assert!(throws_error("function f() { 'use strict'; leaked = 1; } f()", "ReferenceError"));
    assert_eq!(eval("function f() { 'use strict'; return (function () { return this; })(); } f()"), Value::Undefined);
}

#[test]
fn test_sloppy_this_is_global() {
    assert_eq!(eval("function f() { return this; } f() === globalThis"), Value::Boolean(true));
    assert_eq!(eval("(() => this)() === globalThis"), Value::Boolean(true));
}

#[test]
fn test_strict_assignment_failures() {
    assert!(throws_error("'use strict'; undefined = 1;", "TypeError"));
    assert!(throws_error("'use strict'; const o = Object.freeze({}); o.x = 1;", "TypeError"));
    assert!(throws_error("'use strict'; const o = { get x() { return 1; } }; o.x = 2;", "TypeError"));
    assert!(throws_error("'use strict'; 'str'.length = 1;", "TypeError"));
}

#[test]
fn test_const_assignment_always_throws() {
    assert!(throws_error("const c = 1; c = 2;", "TypeError"));
    assert!(throws_error("'use strict'; const c = 1; c++;", "TypeError"));
}

#[test]
fn test_sloppy_function_name_binding_is_immutable() {
    assert_eq!(eval("const f = function g() { g = 1; return typeof g; }; f()"), s("function"));
    assert!(throws_error("const f = function g() { 'use strict'; g = 1; }; f()", "TypeError"));
}

#[test]
fn test_strict_early_errors() {
    assert!(throws_error("'use strict'; with ({}) {}", "SyntaxError"));
    assert!(throws_error("'use strict'; var let = 1;", "SyntaxError"));
    assert!(throws_error("'use strict'; function f(a, a) {}", "SyntaxError"));
    assert!(throws_error("'use strict'; delete x;", "SyntaxError"));
    assert!(throws_error("'use strict'; var eval = 1;", "SyntaxError"));
    assert_eq!(eval("function f(a, a) { return a; } f(1, 2)"), Value::Number(2.0));
}

#[test]
fn test_strict_arguments_not_mapped() {
    assert_eq!(eval("function f(a) { 'use strict'; a = 2; return arguments[0]; } f(1)"), Value::Number(1.0));
    assert_eq!(eval("function f(a = 0) { a = 2; return arguments[0]; } f(1)"), Value::Number(1.0));
}

#[test]
fn test_delete_non_configurable_in_strict_mode() {
    assert!(throws_error("'use strict'; delete Math.PI", "TypeError"));
    assert_eq!(eval("delete Math.PI"), Value::Boolean(false));
}
