//! Control flow tests: if/else, switch, loops, labels, try/catch/finally, completion values

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

// =============================================================================
// Conditionals and switch
// =============================================================================

#[test]
fn test_if_else() {
    assert_eq!(eval("let r = 0; if (true) { r = 1; } else { r = 2; } r"), Value::Number(1.0));
    assert_eq!(eval("let r = 0; if (0) r = 1; else if ('') r = 2; else r = 3; r"), Value::Number(3.0));
}

#[test]
fn test_switch_fallthrough_and_default() {
    assert_eq!(
        eval(
            r#"
            function classify(n) {
                let out = '';
                switch (n) {
                    case 1:
                        out += 'one';
                    case 2:
                        out += 'two';
                        break;
                    default:
                        out += 'other';
                    case 3:
                        out += 'three';
                }
                return out;
            }
            [classify(1), classify(2), classify(3), classify(9)].join(',')
        "#
        ),
        s("onetwo,two,three,otherthree")
    );
}

#[test]
fn test_switch_uses_strict_equality() {
    assert_eq!(eval("switch ('1') { case 1: 'number'; break; case '1': 'string'; }"), s("string"));
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn test_for_loop() {
    assert_eq!(eval("let sum = 0; for (let i = 0; i < 5; i++) sum += i; sum"), Value::Number(10.0));
}

#[test]
fn test_for_let_creates_binding_per_iteration() {
    assert_eq!(
        eval_json("const fs = []; for (let i = 0; i < 3; i++) fs.push(() => i); fs.map(f => f())"),
        json!([0, 1, 2])
    );
    assert_eq!(
        eval_json("const fs = []; for (var i = 0; i < 3; i++) fs.push(() => i); fs.map(f => f())"),
        json!([3, 3, 3])
    );
}

#[test]
fn test_while_and_do_while() {
    assert_eq!(eval("let i = 0; while (i < 10) i += 3; i"), Value::Number(12.0));
    assert_eq!(eval("let n = 0; do { n++; } while (false); n"), Value::Number(1.0));
}

#[test]
fn test_for_in_enumerates_own_and_inherited() {
    assert_eq!(
        eval_json(
            r#"
            const proto = { inherited: 1 };
            const o = Object.create(proto);
            o.b = 2; o.a = 1; o[2] = 0; o[1] = 0;
            const keys = [];
            for (const k in o) keys.push(k);
            keys
        "#
        ),
        json!(["1", "2", "b", "a", "inherited"])
    );
}

#[test]
fn test_for_in_skips_nullish() {
    assert_eq!(eval("let n = 0; for (const k in null) n++; n"), Value::Number(0.0));
}

#[test]
fn test_for_of_array_and_string() {
    assert_eq!(eval("let t = 0; for (const x of [1, 2, 3]) t += x; t"), Value::Number(6.0));
    assert_eq!(eval("let out = ''; for (const c of 'a😀b') out += '[' + c + ']'; out"), s("[a][😀][b]"));
}

#[test]
fn test_for_of_closes_iterator_on_break() {
    assert_eq!(
        eval(
            r#"
            let closed = false;
            const iterable = {
                [Symbol.iterator]() {
                    let i = 0;
                    return {
                        next() { return { value: i++, done: false }; },
                        return() { closed = true; return {}; },
                    };
                },
            };
            for (const x of iterable) { if (x === 2) break; }
            closed
        "#
        ),
        Value::Boolean(true)
    );
}

#[test]
fn test_labeled_break_and_continue() {
    assert_eq!(
        eval(
            r#"
            let hits = 0;
            outer: for (let i = 0; i < 3; i++) {
                for (let j = 0; j < 3; j++) {
                    if (j === 1) continue outer;
                    if (i === 2) break outer;
                    hits++;
                }
            }
            hits
        "#
        ),
        Value::Number(2.0)
    );
}

#[test]
fn test_labeled_block_break() {
    assert_eq!(eval("let r = 1; block: { r = 2; break block; r = 3; } r"), Value::Number(2.0));
}

// =============================================================================
// Completion values
// =============================================================================

#[test]
fn test_completion_values() {
    assert_eq!(eval("1; if (true) {}"), Value::Undefined);
    assert_eq!(eval("2; do { 3; break; } while (false)"), Value::Number(3.0));
    assert_eq!(eval("var x = 4; for (const i of []) {}"), Value::Undefined);
    assert_eq!(eval("5; try { 6 } finally { 7 }"), Value::Number(6.0));
    assert_eq!(eval("8; var y = 9;"), Value::Number(8.0));
}

// =============================================================================
// Exceptions
// =============================================================================

#[test]
fn test_try_catch() {
    assert_eq!(eval("try { throw 'boom'; } catch (e) { e + '!' }"), s("boom!"));
    assert_eq!(eval("try { null.x; } catch (e) { e instanceof TypeError }"), Value::Boolean(true));
    assert_eq!(eval("try { throw 1; } catch { 'optional binding' }"), s("optional binding"));
}

#[test]
fn test_finally_overrides_return() {
    assert_eq!(
        eval("function f() { try { return 1; } finally { return 2; } } f()"),
        Value::Number(2.0)
    );
    assert_eq!(
        eval("let log = ''; function f() { try { return 'a'; } finally { log += 'f'; } } f() + log"),
        s("af")
    );
}

#[test]
fn test_finally_runs_on_break() {
    assert_eq!(
        eval("let n = 0; for (;;) { try { break; } finally { n++; } } n"),
        Value::Number(1.0)
    );
}

#[test]
fn test_catch_destructuring() {
    assert_eq!(eval("try { throw { code: 42 }; } catch ({ code }) { code }"), Value::Number(42.0));
}

#[test]
fn test_uncaught_throw() {
    assert!(throws_error("throw new RangeError('too far')", "RangeError: too far"));
    assert!(throws_error("throw 'plain'", "plain"));
}

#[test]
fn test_with_statement() {
    assert_eq!(eval("const o = { a: 1 }; let r; with (o) { r = a + 1; } r"), Value::Number(2.0));
    assert_eq!(
        eval(
            r#"
            const o = { a: 1, [Symbol.unscopables]: { a: true } };
            var a = 'outer';
            let r;
            with (o) { r = a; }
            r
        "#
        ),
        s("outer")
    );
}
