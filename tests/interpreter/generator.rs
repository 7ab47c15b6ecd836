//! Generator tests: GeneratorStart/Resume/ResumeAbrupt, yield*, generator function objects

use super::{eval, eval_json, s, throws_error};
use ecmavm::Value;
use serde_json::json;

#[test]
fn test_basic_generator() {
    assert_eq!(
        eval_json(
            r#"
            function* g() { yield 1; yield 2; return 3; }
            const it = g();
            [it.next(), it.next(), it.next(), it.next()]
        "#
        ),
        json!([
            { "value": 1, "done": false },
            { "value": 2, "done": false },
            { "value": 3, "done": true },
            { "done": true }
        ])
    );
}

#[test]
fn test_body_runs_lazily() {
    assert_eq!(
        eval("let started = false; function* g() { started = true; yield; } const it = g(); started"),
        Value::Boolean(false)
    );
}

#[test]
fn test_next_argument_becomes_yield_value() {
    assert_eq!(
        eval_json(
            r#"
            function* g() { const a = yield 'first'; const b = yield a * 2; return a + b; }
            const it = g();
            [it.next('ignored').value, it.next(5).value, it.next(1).value]
        "#
        ),
        json!(["first", 10, 6])
    );
}

#[test]
fn test_return_runs_finally() {
    assert_eq!(
        eval_json(
            r#"
            const log = [];
            function* g() { try { yield 1; yield 2; } finally { log.push('cleanup'); } }
            const it = g();
            it.next();
            const r = it.return(42);
            [r, log, it.next()]
        "#
        ),
        json!([{ "value": 42, "done": true }, ["cleanup"], { "done": true }])
    );
}

#[test]
fn test_finally_can_override_return() {
    assert_eq!(
        eval_json(
            r#"
            function* g() { try { yield 1; } finally { yield 'from finally'; } }
            const it = g();
            it.next();
            [it.return(5), it.next()]
        "#
        ),
        json!([{ "value": "from finally", "done": false }, { "value": 5, "done": true }])
    );
}

#[test]
fn test_throw_into_generator() {
    assert_eq!(
        eval(
            r#"
            function* g() {
                try { yield 1; } catch (e) { yield 'caught ' + e; }
            }
            const it = g();
            it.next();
            it.throw('boom').value
        "#
        ),
        s("caught boom")
    );
    assert!(throws_error("function* g() { yield 1; } g().throw(new TypeError('early'))", "early"));
}

#[test]
fn test_return_before_start_completes() {
    assert_eq!(
        eval_json(
            r#"
            let ran = false;
            function* g() { ran = true; yield 1; }
            const it = g();
            [it.return('done'), it.next(), ran]
        "#
        ),
        json!([{ "value": "done", "done": true }, { "done": true }, false])
    );
}

#[test]
fn test_reentrant_next_throws() {
    assert!(throws_error(
        "let it; function* g() { it.next(); yield 1; } it = g(); it.next()",
        "TypeError"
    ));
}

#[test]
fn test_yield_star_delegates() {
    assert_eq!(
        eval_json(
            r#"
            function* inner() { const x = yield 'a'; yield x; return 'inner done'; }
            function* outer() { const r = yield* inner(); yield r; }
            const it = outer();
            [it.next().value, it.next('sent').value, it.next().value]
        "#
        ),
        json!(["a", "sent", "inner done"])
    );
    assert_eq!(eval_json("function* g() { yield* [1, 2]; yield* 'ab'; } [...g()]"), json!([1, 2, "a", "b"]));
}

#[test]
fn test_yield_star_forwards_return() {
    assert_eq!(
        eval_json(
            r#"
            const log = [];
            function* inner() { try { yield 1; } finally { log.push('inner'); } }
            function* outer() { try { yield* inner(); } finally { log.push('outer'); } }
            const it = outer();
            it.next();
            it.return();
            log
        "#
        ),
        json!(["inner", "outer"])
    );
}

#[test]
fn test_generators_are_iterable() {
    assert_eq!(
        eval_json(
            r#"
            function* range(n) { for (let i = 0; i < n; i++) yield i; }
            [...range(4)]
        "#
        ),
        json!([0, 1, 2, 3])
    );
    assert_eq!(eval("function* g() {} const it = g(); it[Symbol.iterator]() === it"), Value::Boolean(true));
}

#[test]
fn test_generator_methods() {
    assert_eq!(
        eval_json(
            r#"
            class Tree {
                constructor(...items) { this.items = items; }
                *[Symbol.iterator]() { yield* this.items; }
            }
            const o = { *pairs() { yield [1, 2]; } };
            [[...new Tree(1, 2)], [...o.pairs()]]
        "#
        ),
        json!([[1, 2], [[1, 2]]])
    );
}

#[test]
fn test_generator_function_objects() {
    assert_eq!(
        eval("function* g() {} Object.getPrototypeOf(g).constructor.name"),
        s("GeneratorFunction")
    );
    assert_eq!(
        eval("function* g() {} Object.getPrototypeOf(g()) === g.prototype"),
        Value::Boolean(true)
    );
    assert_eq!(
        eval("function* g() {} Object.prototype.toString.call(g())"),
        s("[object Generator]")
    );
    assert_eq!(eval("function* g() {} g.hasOwnProperty('caller')"), Value::Boolean(false));
    assert!(throws_error("function* g() {} new g()", "TypeError"));
}

#[test]
fn test_generator_prototype_methods_check_receiver() {
    assert!(throws_error(
        "function* g() {} Object.getPrototypeOf(g.prototype).next.call({})",
        "TypeError"
    ));
}
