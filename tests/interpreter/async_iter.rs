//! Async iteration tests: async generators, for-await-of and async-from-sync iterators

use super::create_test_runtime;
use ecmavm::Value;
use serde_json::json;

/// Run `setup`, drain the job queue, then evaluate `result` as JSON.
fn settled(setup: &str, result: &str) -> serde_json::Value {
    let runtime = create_test_runtime();
    runtime.eval(setup).unwrap();
    let value = runtime.eval(result).unwrap();
    runtime.value_to_json(&value).unwrap().unwrap_or(serde_json::Value::Null)
}

#[test]
fn test_async_generator_next_returns_promises() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            async function* g() { yield 1; yield await Promise.resolve(2); return 3; }
            const it = g();
            Promise.all([it.next(), it.next(), it.next(), it.next()]).then(r => { out = r; });
        "#,
            "out"
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
fn test_yield_awaits_promises() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function* g() { yield Promise.resolve('unwrapped'); }
            g().next().then(r => { out = r.value; });
        "#,
            "out"
        ),
        json!("unwrapped")
    );
}

#[test]
fn test_for_await_over_async_generator() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            async function* ticks(n) { for (let i = 0; i < n; i++) yield i; }
            (async () => { for await (const t of ticks(3)) out.push(t); })();
        "#,
            "out"
        ),
        json!([0, 1, 2])
    );
}

#[test]
fn test_for_await_over_sync_iterable() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            (async () => {
                for await (const v of [1, Promise.resolve(2), 3]) out.push(v);
            })();
        "#,
            "out"
        ),
        json!([1, 2, 3])
    );
}

#[test]
fn test_for_await_rejection_propagates() {
    assert_eq!(
        settled(
            r#"
            var out;
            (async () => {
                try {
                    for await (const v of [Promise.reject('bad')]) out = v;
                } catch (e) {
                    out = 'caught ' + e;
                }
            })();
        "#,
            "out"
        ),
        json!("caught bad")
    );
}

#[test]
fn test_break_closes_async_iterator() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            async function* g() {
                try { yield 1; yield 2; } finally { log.push('closed'); }
            }
            (async () => {
                for await (const v of g()) { log.push(v); break; }
                log.push('after');
            })();
        "#,
            "log"
        ),
        json!([1, "closed", "after"])
    );
}

#[test]
fn test_requests_are_queued() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            async function* g() {
                log.push('start');
                const x = yield 'a';
                log.push('got ' + x);
                yield 'b';
            }
            const it = g();
            it.next('ignored').then(r => log.push(r.value));
            it.next('second').then(r => log.push(r.value));
            it.return('end').then(r => log.push('return ' + r.value + ' ' + r.done));
        "#,
            "log"
        ),
        json!(["start", "got second", "a", "b", "return end true"])
    );
}

#[test]
fn test_return_on_suspended_start() {
    assert_eq!(
        settled(
            r#"
            var out;
            let ran = false;
            async function* g() { ran = true; yield 1; }
            g().return(Promise.resolve('early')).then(r => { out = [r.value, r.done, ran]; });
        "#,
            "out"
        ),
        json!(["early", true, false])
    );
}

#[test]
fn test_throw_on_suspended_start_rejects() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            async function* g() { yield 1; }
            const it = g();
            it.throw('thrown').catch(e => out.push(e));
            it.next().then(r => out.push(r.done));
        "#,
            "out"
        ),
        json!(["thrown", true])
    );
}

#[test]
fn test_yield_star_over_async_iterable() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            async function* inner() { yield 'x'; yield 'y'; }
            async function* outer() { yield* inner(); yield* ['z']; }
            (async () => { for await (const v of outer()) out.push(v); })();
        "#,
            "out"
        ),
        json!(["x", "y", "z"])
    );
}

#[test]
fn test_custom_async_iterator() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            const source = {
                [Symbol.asyncIterator]() {
                    let i = 0;
                    return { next: () => Promise.resolve({ value: i, done: i++ >= 2 }) };
                },
            };
            (async () => { for await (const v of source) out.push(v); })();
        "#,
            "out"
        ),
        json!([0, 1])
    );
}

#[test]
fn test_async_generator_objects() {
    let runtime = create_test_runtime();
    assert_eq!(
        runtime
            .eval("async function* g() {} Object.prototype.toString.call(g())")
            .unwrap(),
        Value::from("[object AsyncGenerator]")
    );
    assert_eq!(
        runtime
            .eval("async function* g() {} const it = g(); it[Symbol.asyncIterator]() === it")
            .unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        runtime
            .eval("async function* g() {} Object.getPrototypeOf(g).constructor.name")
            .unwrap(),
        Value::from("AsyncGeneratorFunction")
    );
}

#[test]
fn test_next_on_bad_receiver_rejects() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function* g() {}
            const next = Object.getPrototypeOf(g.prototype).next;
            next.call({}).catch(e => { out = e instanceof TypeError; });
        "#,
            "out"
        ),
        json!(true)
    );
}
