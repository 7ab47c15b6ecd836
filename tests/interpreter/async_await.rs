//! Async function tests: AsyncFunctionStart, Await, ordering against other jobs

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
fn test_async_function_returns_promise() {
    let runtime = create_test_runtime();
    assert_eq!(
        runtime.eval("async function f() { return 1; } f() instanceof Promise").unwrap(),
        Value::Boolean(true)
    );
    assert_eq!(
        settled("var out; async function f() { return 1; } f().then(v => { out = v; });", "out"),
        json!(1)
    );
}

#[test]
fn test_await_values_and_promises() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function f() {
                const a = await 1;
                const b = await Promise.resolve(2);
                const c = await { then(r) { r(3); } };
                return a + b + c;
            }
            f().then(v => { out = v; });
        "#,
            "out"
        ),
        json!(6)
    );
}

#[test]
fn test_body_runs_synchronously_until_first_await() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            async function f() { log.push('start'); await null; log.push('resumed'); }
            f();
            log.push('after call');
        "#,
            "log"
        ),
        json!(["start", "after call", "resumed"])
    );
}

#[test]
fn test_await_interleaves_with_then() {
    assert_eq!(
        settled(
            r#"
            var log = [];
            async function a() { log.push('a1'); await undefined; log.push('a2'); await undefined; log.push('a3'); }
            a();
            Promise.resolve().then(() => log.push('p1')).then(() => log.push('p2'));
        "#,
            "log"
        ),
        json!(["a1", "a2", "p1", "a3", "p2"])
    );
}

#[test]
fn test_throw_rejects_promise() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function f() { throw new RangeError('nope'); }
            f().catch(e => { out = e.name + ': ' + e.message; });
        "#,
            "out"
        ),
        json!("RangeError: nope")
    );
}

#[test]
fn test_await_rejection_is_catchable() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function f() {
                try {
                    await Promise.reject('rejected');
                } catch (e) {
                    return 'caught ' + e;
                } finally {
                    out = 'finally ran';
                }
            }
            f().then(v => { out += ' / ' + v; });
        "#,
            "out"
        ),
        json!("finally ran / caught rejected")
    );
}

#[test]
fn test_async_arrows_and_methods() {
    assert_eq!(
        settled(
            r#"
            var out = [];
            const arrow = async x => (await x) * 2;
            const obj = { async m() { return this.v; }, v: 'method' };
            class C { async m() { return 'class'; } static async s() { return 'static'; } }
            Promise.all([arrow(4), obj.m(), new C().m(), C.s()]).then(v => { out = v; });
        "#,
            "out"
        ),
        json!([8, "method", "class", "static"])
    );
}

#[test]
fn test_async_arrow_captures_this_and_arguments() {
    assert_eq!(
        settled(
            r#"
            var out;
            function outer() {
                const inner = async () => [this.tag, arguments[0]];
                return inner();
            }
            outer.call({ tag: 't' }, 'arg').then(v => { out = v; });
        "#,
            "out"
        ),
        json!(["t", "arg"])
    );
}

#[test]
fn test_parameter_errors_reject() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function f({ x }) { return x; }
            f(null).catch(e => { out = e instanceof TypeError; });
        "#,
            "out"
        ),
        json!(true)
    );
}

#[test]
fn test_await_in_loops() {
    assert_eq!(
        settled(
            r#"
            var out;
            async function sum(values) {
                let total = 0;
                for (const v of values) total += await v;
                return total;
            }
            sum([1, Promise.resolve(2), 3]).then(v => { out = v; });
        "#,
            "out"
        ),
        json!(6)
    );
}

#[test]
fn test_async_function_objects() {
    let runtime = create_test_runtime();
    assert_eq!(
        runtime
            .eval("async function f() {} Object.getPrototypeOf(f).constructor.name")
            .unwrap(),
        Value::from("AsyncFunction")
    );
    assert_eq!(
        runtime.eval("async function f() {} f.hasOwnProperty('prototype')").unwrap(),
        Value::Boolean(false)
    );
    assert!(runtime.eval("async function f() {} new f()").is_err());
}

#[test]
fn test_top_level_await_is_rejected() {
    let runtime = create_test_runtime();
    let err = runtime.eval("await 1").unwrap_err();
    assert!(err.to_string().contains("SyntaxError"));
}
