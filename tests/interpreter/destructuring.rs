//! Destructuring tests: binding patterns, assignment patterns and iterator closing

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_object_binding_pattern() {
    assert_eq!(eval("const { a, b: renamed } = { a: 1, b: 2 }; a + renamed"), Value::Number(3.0));
    assert_eq!(eval("const { a = 5 } = {}; a"), Value::Number(5.0));
    assert_eq!(eval("const { a = 5 } = { a: null }; a"), Value::Null);
    assert_eq!(eval("const { ['k' + 1]: v } = { k1: 'computed' }; v"), s("computed"));
    assert_eq!(eval("const { length } = 'abc'; length"), Value::Number(3.0));
}

#[test]
fn test_object_rest() {
    assert_eq!(
        eval_json("const { a, ...rest } = { a: 1, b: 2, c: 3 }; rest"),
        json!({ "b": 2, "c": 3 })
    );
    assert_eq!(
        eval("const proto = { inherited: 1 }; const { ...copy } = Object.create(proto); 'inherited' in copy"),
        Value::Boolean(false)
    );
}

#[test]
fn test_destructuring_requires_object_coercible() {
    assert!(throws_error("const { a } = null;", "TypeError"));
    assert!(throws_error("const {} = undefined;", "TypeError"));
    assert_eq!(eval("const {} = 0; 'ok'"), s("ok"));
}

#[test]
fn test_array_binding_pattern() {
    assert_eq!(eval_json("const [a, , b] = [1, 2, 3]; [a, b]"), json!([1, 3]));
    assert_eq!(eval_json("const [a, ...rest] = 'xyz'; [a, rest]"), json!(["x", ["y", "z"]]));
    assert_eq!(eval_json("const [a = 1, b = a + 1] = []; [a, b]"), json!([1, 2]));
    assert_eq!(eval_json("const [[x], { y }] = [[1], { y: 2 }]; [x, y]"), json!([1, 2]));
    assert!(throws_error("const [a] = {};", "TypeError"));
}

#[test]
fn test_defaults_apply_only_to_undefined() {
    assert_eq!(eval_json("const [a = 1, b = 2] = [null, undefined]; [a, b]"), json!([null, 2]));
    assert_eq!(
        eval("let calls = 0; const f = () => ++calls; const [a = f()] = [0]; calls"),
        Value::Number(0.0)
    );
}

#[test]
fn test_default_names_anonymous_functions() {
    assert_eq!(eval("const { fn = function () {} } = {}; fn.name"), s("fn"));
    assert_eq!(eval("const [arrow = () => {}] = []; arrow.name"), s("arrow"));
}

#[test]
fn test_iterator_closed_after_binding() {
    assert_eq!(
        eval(
            r#"
            let returns = 0;
            const iterable = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: 1, done: false }; },
                        return() { returns++; return {}; },
                    };
                },
            };
            const [a] = iterable;
            a * 10 + returns
        "#
        ),
        Value::Number(11.0)
    );
}

#[test]
fn test_exhausted_iterator_is_not_closed() {
    assert_eq!(
        eval(
            r#"
            let returns = 0;
            const iterable = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: undefined, done: true }; },
                        return() { returns++; return {}; },
                    };
                },
            };
            const [a, b] = iterable;
            returns
        "#
        ),
        Value::Number(0.0)
    );
    assert_eq!(
        eval(
            r#"
            let returns = 0;
            const iterable = {
                [Symbol.iterator]() {
                    let i = 0;
                    return {
                        next() { return { value: i++, done: i > 3 }; },
                        return() { returns++; return {}; },
                    };
                },
            };
            const [...all] = iterable;
            returns + all.length
        "#
        ),
        Value::Number(3.0)
    );
}

#[test]
fn test_iterator_closed_on_abrupt_binding() {
    assert_eq!(
        eval(
            r#"
            let returns = 0;
            const iterable = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: undefined, done: false }; },
                        return() { returns++; return {}; },
                    };
                },
            };
            try {
                const [{ x }] = iterable;
            } catch (e) {
                returns + ':' + (e instanceof TypeError);
            }
        "#
        ),
        s("1:true")
    );
    assert_eq!(
        eval(
            r#"
            let returns = 0;
            const iterable = {
                [Symbol.iterator]() {
                    return {
                        next() { return { value: undefined, done: false }; },
                        return() { returns++; return {}; },
                    };
                },
            };
            const thrower = () => { throw new Error('default'); };
            try {
                const [a = thrower()] = iterable;
            } catch (e) {
                returns + ':' + e.message;
            }
        "#
        ),
        s("1:default")
    );
}

#[test]
fn test_throwing_next_does_not_close() {
    assert_eq!(
        eval(
            r#"
            let returns = 0;
            const iterable = {
                [Symbol.iterator]() {
                    return {
                        next() { throw new Error('next'); },
                        return() { returns++; return {}; },
                    };
                },
            };
            try { const [a] = iterable; } catch (e) { returns; }
        "#
        ),
        Value::Number(0.0)
    );
}

#[test]
fn test_assignment_patterns() {
    assert_eq!(eval_json("let a = 1, b = 2; [a, b] = [b, a]; [a, b]"), json!([2, 1]));
    assert_eq!(eval_json("const o = {}; ({ x: o.first, y: o['second'] } = { x: 1, y: 2 }); o"), json!({ "first": 1, "second": 2 }));
    assert_eq!(eval_json("const arr = []; [arr[1], arr[0]] = 'ab'; arr"), json!(["b", "a"]));
    assert_eq!(eval_json("let a, rest; ({ a, ...rest } = { a: 1, b: 2 }); rest"), json!({ "b": 2 }));
    assert_eq!(eval("let x; const r = ([x] = [5]); Array.isArray(r) && x === 5"), Value::Boolean(true));
}

#[test]
fn test_parameter_patterns() {
    assert_eq!(
        eval("function f({ a, b = 2 } = {}, [c] = [3]) { return a === undefined && b + c; } f()"),
        Value::Number(5.0)
    );
    assert_eq!(eval("const f = ({ x }) => x; f({ x: 'arrow' })"), s("arrow"));
}

#[test]
fn test_for_of_destructuring() {
    assert_eq!(
        eval("let out = ''; for (const [k, v] of Object.entries({ a: 1, b: 2 })) out += k + v; out"),
        s("a1b2")
    );
    assert_eq!(
        eval("let sum = 0; for (const { n } of [{ n: 1 }, { n: 2 }]) sum += n; sum"),
        Value::Number(3.0)
    );
}
